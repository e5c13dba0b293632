//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use metrics_exporter_prometheus::PrometheusHandle;
use orchestrator::{
    EventDispatcher, InMemoryEventPublisher, InMemoryInventoryValidator, InMemoryPaymentProcessor,
};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    inventory: InMemoryInventoryValidator,
    payment: InMemoryPaymentProcessor,
    events: InMemoryEventPublisher,
}

fn setup() -> TestApp {
    let inventory = InMemoryInventoryValidator::with_stock([("SKU-001", 10), ("SKU-002", 1)]);
    let payment = InMemoryPaymentProcessor::new();
    let events = InMemoryEventPublisher::new();
    let (dispatcher, _worker) = EventDispatcher::spawn(events.clone());

    let state = api::create_default_state(inventory.clone(), payment.clone(), dispatcher);
    let app = api::create_app(state, get_metrics_handle());

    TestApp {
        app,
        inventory,
        payment,
        events,
    }
}

async fn send(app: &axum::Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn create_order(app: &axum::Router) -> String {
    let response = send(
        app,
        post_json(
            "/orders",
            serde_json::json!({
                "user_id": "user-42",
                "items": [{ "product_id": "SKU-001", "quantity": 2, "unit_price_cents": 999 }]
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await["order_id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_health_check() {
    let t = setup();

    let response = send(&t.app, get("/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_create_order() {
    let t = setup();

    let response = send(
        &t.app,
        post_json(
            "/orders",
            serde_json::json!({
                "user_id": "user-42",
                "items": [{ "product_id": "SKU-001", "quantity": 2, "unit_price_cents": 999 }]
            }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = json_body(response).await;
    assert_eq!(json["status"], "pending");
    assert_eq!(json["total_cents"], 1998);
    assert!(json["order_id"].as_str().is_some());
    assert_eq!(t.inventory.call_count(), 1);
}

#[tokio::test]
async fn test_create_and_get_order() {
    let t = setup();
    let order_id = create_order(&t.app).await;

    let response = send(&t.app, get(&format!("/orders/{order_id}"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["id"], order_id);
    assert_eq!(json["user_id"], "user-42");
    assert_eq!(json["status"], "pending");
    assert_eq!(json["total_cents"], 1998);
    assert_eq!(json["items"][0]["product_id"], "SKU-001");
    assert_eq!(json["items"][0]["quantity"], 2);
    assert!(json["payment_id"].is_null());
}

#[tokio::test]
async fn test_create_order_missing_user_is_bad_request() {
    let t = setup();

    let response = send(
        &t.app,
        post_json(
            "/orders",
            serde_json::json!({
                "items": [{ "product_id": "SKU-001", "quantity": 1, "unit_price_cents": 100 }]
            }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["kind"], "InvalidOrder");
    assert_eq!(t.inventory.call_count(), 0);
}

#[tokio::test]
async fn test_create_order_without_items_is_bad_request() {
    let t = setup();

    let response = send(
        &t.app,
        post_json("/orders", serde_json::json!({ "user_id": "user-42", "items": [] })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_order_with_overflowing_total_is_bad_request() {
    let t = setup();

    let response = send(
        &t.app,
        post_json(
            "/orders",
            serde_json::json!({
                "user_id": "user-42",
                "items": [{ "product_id": "SKU-001", "quantity": 2, "unit_price_cents": i64::MAX / 2 + 1 }]
            }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["kind"], "InvalidOrder");
    assert_eq!(t.inventory.call_count(), 0);
}

#[tokio::test]
async fn test_out_of_stock_is_unprocessable() {
    let t = setup();

    let response = send(
        &t.app,
        post_json(
            "/orders",
            serde_json::json!({
                "user_id": "user-42",
                "items": [{ "product_id": "SKU-002", "quantity": 3, "unit_price_cents": 100 }]
            }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = json_body(response).await;
    assert_eq!(json["kind"], "ProductValidationFailed");
    assert_eq!(json["unavailable"][0]["product_id"], "SKU-002");
    assert_eq!(json["unavailable"][0]["available"], 1);
}

#[tokio::test]
async fn test_inventory_down_is_service_unavailable() {
    let t = setup();
    t.inventory.set_fail(true);

    let response = send(
        &t.app,
        post_json(
            "/orders",
            serde_json::json!({
                "user_id": "user-42",
                "items": [{ "product_id": "SKU-001", "quantity": 1, "unit_price_cents": 100 }]
            }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["kind"], "ValidationUnavailable");
}

#[tokio::test]
async fn test_process_payment() {
    let t = setup();
    t.payment.set_payment_url("https://pay.example/checkout");
    let order_id = create_order(&t.app).await;

    let response = send(
        &t.app,
        post_json(
            &format!("/orders/{order_id}/payment"),
            serde_json::json!({ "payment_method": "credit_card" }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "paid");
    assert_eq!(json["payment_id"], "PAY-0001");
    assert_eq!(json["payment_url"], "https://pay.example/checkout");

    let json = json_body(send(&t.app, get(&format!("/orders/{order_id}"))).await).await;
    assert_eq!(json["status"], "paid");
    assert_eq!(json["payment_id"], "PAY-0001");

    assert!(
        t.events
            .wait_for("payment.processed", 1, std::time::Duration::from_secs(1))
            .await
    );
}

#[tokio::test]
async fn test_declined_payment_is_reported_not_errored() {
    let t = setup();
    t.payment.set_outcome("declined");
    let order_id = create_order(&t.app).await;

    let response = send(
        &t.app,
        post_json(
            &format!("/orders/{order_id}/payment"),
            serde_json::json!({ "payment_method": "credit_card" }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "failed");
}

#[tokio::test]
async fn test_payment_service_error_is_bad_gateway() {
    let t = setup();
    let order_id = create_order(&t.app).await;
    t.payment.set_fail(true);

    let response = send(
        &t.app,
        post_json(
            &format!("/orders/{order_id}/payment"),
            serde_json::json!({ "payment_method": "credit_card" }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["kind"], "PaymentProcessingFailed");

    let json = json_body(send(&t.app, get(&format!("/orders/{order_id}"))).await).await;
    assert_eq!(json["status"], "failed");
}

#[tokio::test]
async fn test_payment_for_unknown_order() {
    let t = setup();
    let missing = common::OrderId::new();

    let response = send(
        &t.app,
        post_json(
            &format!("/orders/{missing}/payment"),
            serde_json::json!({ "payment_method": "credit_card" }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["kind"], "OrderNotFound");
    assert_eq!(t.payment.call_count(), 0);
}

#[tokio::test]
async fn test_get_nonexistent_order() {
    let t = setup();
    let missing = common::OrderId::new();

    let response = send(&t.app, get(&format!("/orders/{missing}"))).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_order_id_format() {
    let t = setup();

    let response = send(&t.app, get("/orders/not-a-uuid")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let t = setup();
    create_order(&t.app).await;

    let response = send(&t.app, get("/metrics")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("orders_created_total"));
}
