//! HTTP adapters for the inventory and payment services.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ServiceError;

use super::inventory::{InventoryValidator, StockRequest, StockValidation};
use super::payment::{PaymentProcessor, PaymentRequest, PaymentResponse};

/// Shared JSON-over-HTTP plumbing for collaborator adapters.
#[derive(Debug, Clone)]
struct JsonClient {
    client: reqwest::Client,
    base_url: String,
}

impl JsonClient {
    fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Rejected(format!(
                "{url} returned {status}: {body}"
            )));
        }

        response.json::<T>().await.map_err(map_reqwest_error)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Timeout
    } else {
        ServiceError::Transport(e.to_string())
    }
}

#[derive(Serialize)]
struct ValidateProductsRequest<'a> {
    items: &'a [StockRequest],
}

/// Inventory validator calling `POST {base}/products/validate`.
#[derive(Debug, Clone)]
pub struct HttpInventoryValidator {
    http: JsonClient,
}

impl HttpInventoryValidator {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            http: JsonClient::new(base_url, timeout)?,
        })
    }
}

#[async_trait]
impl InventoryValidator for HttpInventoryValidator {
    #[tracing::instrument(skip(self, items), fields(item_count = items.len()))]
    async fn validate(&self, items: Vec<StockRequest>) -> Result<StockValidation, ServiceError> {
        self.http
            .post("/products/validate", &ValidateProductsRequest { items: &items })
            .await
    }
}

/// Payment processor calling `POST {base}/payments`.
#[derive(Debug, Clone)]
pub struct HttpPaymentProcessor {
    http: JsonClient,
}

impl HttpPaymentProcessor {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            http: JsonClient::new(base_url, timeout)?,
        })
    }
}

#[async_trait]
impl PaymentProcessor for HttpPaymentProcessor {
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id))]
    async fn create_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentResponse, ServiceError> {
        self.http.post("/payments", &request).await
    }
}
