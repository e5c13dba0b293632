//! Payment processor trait and in-memory implementation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::{Money, SETTLEMENT_SUCCESS};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// A settlement request for one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub user_id: UserId,
    #[serde(rename = "amount_cents")]
    pub amount: Money,
    pub currency: String,
    pub payment_method: String,
}

/// The processor's answer to a settlement request.
///
/// `status` is compared against the literal `"success"`; every other value
/// is a non-successful settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub payment_id: String,
    #[serde(default)]
    pub payment_url: String,
    pub status: String,
}

/// Trait for payment settlement.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Attempts to settle the given amount.
    async fn create_payment(&self, request: PaymentRequest)
    -> Result<PaymentResponse, ServiceError>;
}

#[async_trait]
impl<T: PaymentProcessor + ?Sized> PaymentProcessor for Arc<T> {
    async fn create_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentResponse, ServiceError> {
        (**self).create_payment(request).await
    }
}

#[derive(Debug)]
struct InMemoryPaymentState {
    outcome: String,
    payment_url: String,
    fail: bool,
    delay: Option<Duration>,
    next_id: u32,
    requests: Vec<PaymentRequest>,
}

impl Default for InMemoryPaymentState {
    fn default() -> Self {
        Self {
            outcome: SETTLEMENT_SUCCESS.to_string(),
            payment_url: String::new(),
            fail: false,
            delay: None,
            next_id: 0,
            requests: Vec::new(),
        }
    }
}

/// In-memory payment processor with a scripted outcome.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentProcessor {
    state: Arc<Mutex<InMemoryPaymentState>>,
    calls: Arc<AtomicUsize>,
}

impl InMemoryPaymentProcessor {
    /// Creates a processor that settles every request successfully.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the outcome string returned by subsequent calls.
    pub fn set_outcome(&self, outcome: impl Into<String>) {
        self.lock().outcome = outcome.into();
    }

    /// Sets the redirect URL returned by subsequent calls.
    pub fn set_payment_url(&self, url: impl Into<String>) {
        self.lock().payment_url = url.into();
    }

    /// Configures the processor to fail every call at the transport level.
    pub fn set_fail(&self, fail: bool) {
        self.lock().fail = fail;
    }

    /// Delays every answer by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    /// Returns the number of create_payment calls received.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns the requests that were answered, oldest first.
    pub fn requests(&self) -> Vec<PaymentRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryPaymentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PaymentProcessor for InMemoryPaymentProcessor {
    async fn create_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentResponse, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.lock().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        if state.fail {
            return Err(ServiceError::Transport(
                "payment service unreachable".to_string(),
            ));
        }

        state.next_id += 1;
        let payment_id = format!("PAY-{:04}", state.next_id);
        state.requests.push(request);

        Ok(PaymentResponse {
            payment_id,
            payment_url: state.payment_url.clone(),
            status: state.outcome.clone(),
        })
    }
}
