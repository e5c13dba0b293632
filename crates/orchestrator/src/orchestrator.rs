//! Order orchestrator driving creation and settlement.

use std::future::Future;
use std::time::{Duration, Instant};

use chrono::Utc;
use common::{OrderId, UserId};
use domain::{Order, OrderCreated, OrderItem, PaymentProcessed, validate_order_request};
use order_store::{OrderStore, StoreError};

use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, Result};
use crate::events::EventDispatcher;
use crate::services::inventory::{InventoryValidator, StockRequest};
use crate::services::payment::{PaymentProcessor, PaymentRequest};

/// Shared deadline for one top-level operation.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    call_timeout: Duration,
    recovery_timeout: Duration,
}

impl Deadline {
    fn start(config: &OrchestratorConfig) -> Self {
        Self {
            at: Instant::now() + config.operation_timeout,
            call_timeout: config.call_timeout,
            recovery_timeout: config.recovery_timeout,
        }
    }

    /// Time allowed for the next call: the per-call bound, capped by
    /// whatever is left of the operation deadline.
    fn budget(&self) -> Duration {
        self.call_timeout
            .min(self.at.saturating_duration_since(Instant::now()))
    }

    /// Runs `fut` within the current budget. `None` means it timed out.
    async fn bounded<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::time::timeout(self.budget(), fut).await.ok()
    }

    /// Runs a compensating write with its own budget, ignoring the
    /// operation deadline.
    async fn recovery<F: Future>(&self, fut: F) -> Option<F::Output> {
        let budget = self.recovery_timeout.min(self.call_timeout);
        tokio::time::timeout(budget, fut).await.ok()
    }
}

/// Coordinates an order across inventory, storage and payment.
///
/// Each operation runs its steps strictly in sequence on the calling task.
/// The orchestrator holds no state of its own between calls; the order store
/// owns every persisted order and is accessed by plain read-then-write.
pub struct OrderOrchestrator<S, I, P>
where
    S: OrderStore,
    I: InventoryValidator,
    P: PaymentProcessor,
{
    store: S,
    inventory: I,
    payment: P,
    events: EventDispatcher,
    config: OrchestratorConfig,
}

impl<S, I, P> OrderOrchestrator<S, I, P>
where
    S: OrderStore,
    I: InventoryValidator,
    P: PaymentProcessor,
{
    /// Creates a new orchestrator.
    pub fn new(
        store: S,
        inventory: I,
        payment: P,
        events: EventDispatcher,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            inventory,
            payment,
            events,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Creates a pending order after checking stock for every item.
    ///
    /// Nothing is persisted unless the inventory service reports every item
    /// available. The unit prices in `items` are trusted as supplied. An
    /// `order.created` event is dispatched after the order is stored.
    #[tracing::instrument(skip_all, fields(user_id = %user_id, item_count = items.len()))]
    pub async fn create_order(&self, user_id: UserId, items: Vec<OrderItem>) -> Result<Order> {
        let start = Instant::now();
        let result = self.try_create_order(user_id, items).await;
        metrics::histogram!("order_operation_duration_seconds", "op" => "create_order")
            .record(start.elapsed().as_secs_f64());

        match &result {
            Ok(order) => {
                metrics::counter!("orders_created_total").increment(1);
                tracing::info!(order_id = %order.id(), total = %order.total(), "order created");
            }
            Err(e) => {
                metrics::counter!("orders_rejected_total", "kind" => e.kind()).increment(1);
                tracing::warn!(kind = e.kind(), error = %e, "order creation failed");
            }
        }
        result
    }

    async fn try_create_order(&self, user_id: UserId, items: Vec<OrderItem>) -> Result<Order> {
        let deadline = Deadline::start(&self.config);

        validate_order_request(&user_id, &items)
            .map_err(|e| OrchestratorError::InvalidOrder(e.to_string()))?;

        self.check_stock(&deadline, &items).await?;

        let order = Order::new(user_id, items, Utc::now())
            .map_err(|e| OrchestratorError::InvalidOrder(e.to_string()))?;

        self.storage_call(&deadline, self.store.create(&order))
            .await?;

        self.events.dispatch(&OrderCreated::from_order(&order));
        Ok(order)
    }

    /// Attempts settlement of an order and records the outcome.
    ///
    /// If the payment call itself fails, the order is marked `Failed` and a
    /// best-effort write of that status is attempted *before*
    /// `PaymentProcessingFailed` is returned: an error from this method does
    /// not mean the stored order is unchanged.
    ///
    /// Calls on an order that already reached a terminal status are not
    /// refused, and concurrent calls for the same order are not coordinated.
    #[tracing::instrument(skip_all, fields(order_id = %order_id))]
    pub async fn process_payment(
        &self,
        order_id: OrderId,
        payment_method: impl Into<String>,
    ) -> Result<Order> {
        let start = Instant::now();
        let result = self
            .try_process_payment(order_id, payment_method.into())
            .await;
        metrics::histogram!("order_operation_duration_seconds", "op" => "process_payment")
            .record(start.elapsed().as_secs_f64());

        match &result {
            Ok(order) => {
                metrics::counter!("payments_processed_total", "status" => order.status().as_str())
                    .increment(1);
                tracing::info!(status = %order.status(), payment_id = ?order.payment_id(), "payment processed");
            }
            Err(e) => {
                tracing::warn!(kind = e.kind(), error = %e, "payment processing failed");
            }
        }
        result
    }

    async fn try_process_payment(&self, order_id: OrderId, payment_method: String) -> Result<Order> {
        let deadline = Deadline::start(&self.config);

        let mut order = self
            .storage_call(&deadline, self.store.find_by_id(order_id))
            .await?
            .ok_or(OrchestratorError::OrderNotFound(order_id))?;

        if order.is_terminal() {
            tracing::warn!(status = %order.status(), "settling an order that already reached a terminal status");
        }

        let request = PaymentRequest {
            order_id,
            user_id: order.user_id().clone(),
            amount: order.total(),
            currency: self.config.currency.clone(),
            payment_method,
        };

        let response = match deadline.bounded(self.payment.create_payment(request)).await {
            Some(Ok(response)) => response,
            Some(Err(e)) => return Err(self.fail_settlement(&deadline, order, e.to_string()).await),
            None => {
                return Err(self
                    .fail_settlement(&deadline, order, "payment call timed out".to_string())
                    .await);
            }
        };

        order.record_settlement(
            response.payment_id.as_str(),
            response.payment_url.as_str(),
            &response.status,
            Utc::now(),
        );

        self.storage_call(&deadline, self.store.update(&order))
            .await?;

        self.events
            .dispatch(&PaymentProcessed::from_order(&order, response.status, Utc::now()));
        Ok(order)
    }

    /// Loads an order by id for callers that need to re-read state.
    #[tracing::instrument(skip_all, fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        let deadline = Deadline::start(&self.config);
        self.storage_call(&deadline, self.store.find_by_id(order_id))
            .await?
            .ok_or(OrchestratorError::OrderNotFound(order_id))
    }

    async fn check_stock(&self, deadline: &Deadline, items: &[OrderItem]) -> Result<()> {
        let requests: Vec<StockRequest> = items
            .iter()
            .map(|item| StockRequest {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
            })
            .collect();

        let validation = match deadline.bounded(self.inventory.validate(requests)).await {
            Some(Ok(validation)) => validation,
            Some(Err(e)) => return Err(OrchestratorError::ValidationUnavailable(e.to_string())),
            None => {
                return Err(OrchestratorError::ValidationUnavailable(
                    "stock validation timed out".to_string(),
                ));
            }
        };

        if !validation.all_available() {
            return Err(OrchestratorError::ProductValidationFailed {
                unavailable: validation.unavailable,
                message: validation.message,
            });
        }
        Ok(())
    }

    /// Marks the order failed after a settlement call error.
    ///
    /// The status write is best-effort: its failure is logged only. It runs
    /// under the recovery budget because the payment call may have consumed
    /// the whole operation deadline.
    async fn fail_settlement(
        &self,
        deadline: &Deadline,
        mut order: Order,
        reason: String,
    ) -> OrchestratorError {
        metrics::counter!("payment_failures_total").increment(1);
        order.mark_failed(Utc::now());

        match deadline.recovery(self.store.update(&order)).await {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                tracing::error!(order_id = %order.id(), error = %e, "failed to persist failed status");
            }
            None => {
                tracing::error!(order_id = %order.id(), "timed out persisting failed status");
            }
        }

        OrchestratorError::PaymentProcessingFailed {
            order_id: order.id(),
            reason,
        }
    }

    async fn storage_call<T, F>(&self, deadline: &Deadline, fut: F) -> Result<T>
    where
        F: Future<Output = order_store::Result<T>>,
    {
        match deadline.bounded(fut).await {
            Some(result) => result.map_err(OrchestratorError::from),
            None => Err(OrchestratorError::Storage(StoreError::Unavailable(
                "deadline exceeded".to_string(),
            ))),
        }
    }
}
