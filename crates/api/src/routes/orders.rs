//! Order creation, settlement and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use domain::{Money, Order, OrderItem, OrderStatus};
use order_store::OrderStore;
use orchestrator::{InventoryValidator, OrderOrchestrator, PaymentProcessor};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Orchestrator over runtime-selected backends.
pub type AppOrchestrator = OrderOrchestrator<
    Arc<dyn OrderStore>,
    Arc<dyn InventoryValidator>,
    Arc<dyn PaymentProcessor>,
>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub orchestrator: AppOrchestrator,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Deserialize)]
pub struct ProcessPaymentRequest {
    pub payment_method: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderCreatedResponse {
    pub order_id: String,
    pub status: OrderStatus,
    pub total_cents: i64,
}

#[derive(Serialize)]
pub struct PaymentResponse {
    pub payment_id: String,
    pub status: OrderStatus,
    pub payment_url: String,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub payment_id: Option<String>,
    pub payment_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            user_id: order.user_id().to_string(),
            status: order.status(),
            items: order
                .items()
                .iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id.to_string(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price.cents(),
                })
                .collect(),
            total_cents: order.total().cents(),
            payment_id: order.payment_id().map(String::from),
            payment_url: order.payment_url().map(String::from),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

// -- Handlers --

/// POST /orders: validate stock and create a pending order.
#[tracing::instrument(skip_all, fields(user_id = %req.user_id))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let items = req
        .items
        .into_iter()
        .map(|item| {
            OrderItem::new(
                item.product_id,
                item.quantity,
                Money::from_cents(item.unit_price_cents),
            )
        })
        .collect();

    let order = state
        .orchestrator
        .create_order(UserId::new(req.user_id), items)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderCreatedResponse {
            order_id: order.id().to_string(),
            status: order.status(),
            total_cents: order.total().cents(),
        }),
    ))
}

/// POST /orders/{id}/payment: settle an order.
#[tracing::instrument(skip(state, req))]
pub async fn pay(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ProcessPaymentRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;

    let order = state
        .orchestrator
        .process_payment(order_id, req.payment_method)
        .await?;

    Ok(Json(PaymentResponse {
        payment_id: order.payment_id().unwrap_or_default().to_string(),
        status: order.status(),
        payment_url: order.payment_url().unwrap_or_default().to_string(),
    }))
}

/// GET /orders/{id}: load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.orchestrator.get_order(order_id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// A malformed id cannot name a stored order, so it reads as not found.
fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::NotFound(format!("Order not found: {id}")))
}
