//! HTTP API server for order orchestration.
//!
//! Exposes order creation, settlement and lookup over REST, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{InMemoryOrderStore, OrderStore, PostgresOrderStore};
use orchestrator::{
    EventDispatcher, HttpInventoryValidator, HttpPaymentProcessor, InMemoryInventoryValidator,
    InMemoryPaymentProcessor, InventoryValidator, OrchestratorConfig, OrderOrchestrator,
    PaymentProcessor,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use error::StartupError;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}/payment", post(routes::orders::pay))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over the given backends.
pub fn create_state(
    store: Arc<dyn OrderStore>,
    inventory: Arc<dyn InventoryValidator>,
    payment: Arc<dyn PaymentProcessor>,
    events: EventDispatcher,
    config: OrchestratorConfig,
) -> Arc<AppState> {
    Arc::new(AppState {
        orchestrator: OrderOrchestrator::new(store, inventory, payment, events, config),
    })
}

/// Creates application state backed entirely by in-memory components.
pub fn create_default_state(
    inventory: InMemoryInventoryValidator,
    payment: InMemoryPaymentProcessor,
    events: EventDispatcher,
) -> Arc<AppState> {
    create_state(
        Arc::new(InMemoryOrderStore::new()),
        Arc::new(inventory),
        Arc::new(payment),
        events,
        OrchestratorConfig::default(),
    )
}

/// Selects backends from configuration and builds the application state.
///
/// PostgreSQL is used when `DATABASE_URL` is set (migrations are applied on
/// connect); each collaborator uses HTTP when its URL is set and the
/// in-memory implementation otherwise.
pub async fn build_state(
    config: &Config,
    events: EventDispatcher,
) -> Result<Arc<AppState>, StartupError> {
    let store: Arc<dyn OrderStore> = match &config.database_url {
        Some(url) => {
            let store = PostgresOrderStore::connect(url).await?;
            store.run_migrations().await?;
            tracing::info!("using PostgreSQL order store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, orders are kept in memory");
            Arc::new(InMemoryOrderStore::new())
        }
    };

    let inventory: Arc<dyn InventoryValidator> = match &config.inventory_service_url {
        Some(url) => {
            tracing::info!(%url, "using HTTP inventory service");
            Arc::new(HttpInventoryValidator::new(url.as_str(), config.call_timeout)?)
        }
        None => {
            tracing::warn!(
                products = config.inventory_stock.len(),
                "INVENTORY_SERVICE_URL not set, using in-memory catalog"
            );
            Arc::new(InMemoryInventoryValidator::with_stock(
                config.inventory_stock.iter().cloned(),
            ))
        }
    };

    let payment: Arc<dyn PaymentProcessor> = match &config.payment_service_url {
        Some(url) => {
            tracing::info!(%url, "using HTTP payment service");
            Arc::new(HttpPaymentProcessor::new(url.as_str(), config.call_timeout)?)
        }
        None => {
            tracing::warn!("PAYMENT_SERVICE_URL not set, every payment succeeds");
            Arc::new(InMemoryPaymentProcessor::new())
        }
    };

    Ok(create_state(
        store,
        inventory,
        payment,
        events,
        config.orchestrator(),
    ))
}
