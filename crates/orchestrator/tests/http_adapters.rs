//! Tests for the HTTP collaborator adapters against a local stub server.

use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use common::{OrderId, UserId};
use domain::Money;
use orchestrator::{
    HttpInventoryValidator, HttpPaymentProcessor, InventoryValidator, PaymentProcessor,
    PaymentRequest, ServiceError, StockRequest,
};
use serde_json::{Value, json};

async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn validate_stub(Json(body): Json<Value>) -> Json<Value> {
    let items = body["items"].as_array().cloned().unwrap_or_default();
    let unavailable: Vec<Value> = items
        .iter()
        .filter(|item| item["product_id"] == "SKU-OUT")
        .map(|item| json!({ "product_id": item["product_id"], "available": 0 }))
        .collect();
    let message = if unavailable.is_empty() {
        ""
    } else {
        "some products are unavailable or out of stock"
    };

    Json(json!({
        "valid": unavailable.is_empty(),
        "unavailable": unavailable,
        "message": message,
    }))
}

async fn payment_stub(Json(body): Json<Value>) -> Json<Value> {
    let status = if body["amount_cents"] == 1998 && body["currency"] == "USD" {
        "success"
    } else {
        "declined"
    };
    Json(json!({
        "payment_id": format!("pay-{}", body["order_id"].as_str().unwrap_or_default()),
        "payment_url": "https://pay.example/checkout",
        "status": status,
    }))
}

fn payment_request(order_id: OrderId) -> PaymentRequest {
    PaymentRequest {
        order_id,
        user_id: UserId::new("user-42"),
        amount: Money::from_cents(1998),
        currency: "USD".to_string(),
        payment_method: "credit_card".to_string(),
    }
}

#[tokio::test]
async fn test_inventory_adapter_reports_available_stock() {
    let base = spawn_stub(Router::new().route("/products/validate", post(validate_stub))).await;
    let validator = HttpInventoryValidator::new(base, Duration::from_secs(2)).unwrap();

    let result = validator
        .validate(vec![StockRequest {
            product_id: "SKU-001".into(),
            quantity: 2,
        }])
        .await
        .unwrap();

    assert!(result.all_available());
}

#[tokio::test]
async fn test_inventory_adapter_reports_unavailable_items() {
    let base = spawn_stub(Router::new().route("/products/validate", post(validate_stub))).await;
    let validator = HttpInventoryValidator::new(format!("{base}/"), Duration::from_secs(2)).unwrap();

    let result = validator
        .validate(vec![
            StockRequest {
                product_id: "SKU-001".into(),
                quantity: 1,
            },
            StockRequest {
                product_id: "SKU-OUT".into(),
                quantity: 1,
            },
        ])
        .await
        .unwrap();

    assert!(!result.all_available());
    assert_eq!(result.unavailable.len(), 1);
    assert_eq!(result.unavailable[0].product_id.as_str(), "SKU-OUT");
}

#[tokio::test]
async fn test_inventory_adapter_maps_error_status_to_rejected() {
    let app = Router::new().route(
        "/products/validate",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let base = spawn_stub(app).await;
    let validator = HttpInventoryValidator::new(base, Duration::from_secs(2)).unwrap();

    let err = validator.validate(Vec::new()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Rejected(ref msg) if msg.contains("500")));
}

#[tokio::test]
async fn test_payment_adapter_round_trip() {
    let base = spawn_stub(Router::new().route("/payments", post(payment_stub))).await;
    let processor = HttpPaymentProcessor::new(base, Duration::from_secs(2)).unwrap();
    let order_id = OrderId::new();

    let response = processor
        .create_payment(payment_request(order_id))
        .await
        .unwrap();

    assert_eq!(response.status, "success");
    assert_eq!(response.payment_id, format!("pay-{order_id}"));
    assert_eq!(response.payment_url, "https://pay.example/checkout");
}

#[tokio::test]
async fn test_payment_adapter_timeout() {
    let app = Router::new().route(
        "/payments",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({ "payment_id": "late", "status": "success" }))
        }),
    );
    let base = spawn_stub(app).await;
    let processor = HttpPaymentProcessor::new(base, Duration::from_millis(100)).unwrap();

    let err = processor
        .create_payment(payment_request(OrderId::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Timeout));
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let processor =
        HttpPaymentProcessor::new(format!("http://{addr}"), Duration::from_secs(2)).unwrap();
    let err = processor
        .create_payment(payment_request(OrderId::new()))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Transport(_)));
}
