use actix_web::{http::StatusCode, test::TestRequest};
use coingate_tools::CoinGateApiError;
use serde_json::{json, Value};

use super::{
    helpers::{send, unused_allowlist, unused_upstream, API_KEY, CALLBACK_URL},
    mocks::MockOrderManager,
};

fn post(uri: &str, body: &str) -> TestRequest {
    TestRequest::post()
        .uri(uri)
        .insert_header(("X-API-Key", API_KEY))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body.to_string())
}

fn get(uri: &str) -> TestRequest {
    TestRequest::get().uri(uri).insert_header(("X-API-Key", API_KEY))
}

fn upstream_order() -> Value {
    json!({
        "id": 1858,
        "status": "new",
        "order_id": "ORD-1",
        "price_amount": "10.0",
        "price_currency": "USD",
        "payment_url": "https://pay-sandbox.coingate.com/invoice/4949cf0a-fccb-4cc2-9342-7af1890cc664"
    })
}

#[actix_web::test]
async fn create_order() {
    let _ = env_logger::try_init().ok();
    let mut api = MockOrderManager::new();
    api.expect_create_order()
        .withf(|order| {
            serde_json::to_value(order).unwrap()
                == json!({
                    "order_id": "ORD-1",
                    "price_amount": 10,
                    "price_currency": "USD",
                    "callback_url": CALLBACK_URL
                })
        })
        .times(1)
        .returning(|_| Ok(upstream_order()));
    let body = r#"{"order_id": "ORD-1", "amount": 10, "currency": "USD"}"#;
    let (status, body) = send(post("/api/v1/orders", body), api, unused_allowlist()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), upstream_order());
}

#[actix_web::test]
async fn create_order_with_optional_fields() {
    let _ = env_logger::try_init().ok();
    let mut api = MockOrderManager::new();
    api.expect_create_order()
        .withf(|order| {
            order.callback_url.as_deref() == Some(CALLBACK_URL)
                && order.title.as_deref() == Some("Order #1")
                && order.description.as_deref() == Some("Two pairs of socks")
                && order.cancel_url.as_deref() == Some("https://shop.example.com/cancel")
                && order.success_url.as_deref() == Some("https://shop.example.com/success")
        })
        .times(1)
        .returning(|_| Ok(upstream_order()));
    let body = json!({
        "order_id": "ORD-1",
        "amount": "10.00",
        "currency": "USD",
        "callback_url": "https://somewhere.else.example.com/",
        "cancel_url": "https://shop.example.com/cancel",
        "success_url": "https://shop.example.com/success",
        "title": "Order #1",
        "description": "Two pairs of socks"
    });
    let (status, _) = send(post("/api/v1/orders", &body.to_string()), api, unused_allowlist()).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[actix_web::test]
async fn create_order_upstream_failure() {
    let _ = env_logger::try_init().ok();
    let mut api = MockOrderManager::new();
    api.expect_create_order().times(1).returning(|_| Err(CoinGateApiError::EmptyResponse));
    let body = r#"{"order_id": "ORD-1", "amount": 10, "currency": "USD"}"#;
    let (status, body) = send(post("/api/v1/orders", body), api, unused_allowlist()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"Failed to create order with CoinGate"}"#);
}

#[actix_web::test]
async fn create_order_missing_parameters() {
    let _ = env_logger::try_init().ok();
    let bodies = [
        r#"{"order_id": "ORD-1", "currency": "USD"}"#,
        r#"{"order_id": "ORD-1", "currency": "USD", "title": "t", "description": "d"}"#,
        r#"{"currency": "USD"}"#,
        r#"{"order_id": "ORD-1", "amount": "", "currency": "USD"}"#,
        r#"{}"#,
        "",
    ];
    for body in bodies {
        let (status, res) = send(post("/api/v1/orders", body), unused_upstream(), unused_allowlist()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(res, r#"{"error":"Missing required parameters (amount, currency, order_id)"}"#);
    }
}

#[actix_web::test]
async fn create_order_malformed_json() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        send(post("/api/v1/orders", r#"{"order_id": "ORD-1", "amount"#), unused_upstream(), unused_allowlist()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"Payload deserialization error."#));
}

#[actix_web::test]
async fn create_order_positional_array_is_rejected() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        send(post("/api/v1/orders", r#"["ORD-9", 10, "USD"]"#), unused_upstream(), unused_allowlist()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Payload deserialization error. The order must be a JSON object"}"#);
}

#[actix_web::test]
async fn retrieve_order() {
    let _ = env_logger::try_init().ok();
    let mut api = MockOrderManager::new();
    api.expect_retrieve_order().withf(|id| id == "1858").times(1).returning(|_| Ok(upstream_order()));
    let (status, body) = send(get("/api/v1/orders/1858"), api, unused_allowlist()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), upstream_order());
}

#[actix_web::test]
async fn retrieve_order_not_found() {
    let _ = env_logger::try_init().ok();
    let mut api = MockOrderManager::new();
    api.expect_retrieve_order()
        .withf(|id| id == "X")
        .times(1)
        .returning(|_| Err(CoinGateApiError::QueryError { status: 404, message: "OrderNotFound".into() }));
    let (status, body) = send(get("/api/v1/orders/X"), api, unused_allowlist()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Order with ID X not found or failed to retrieve"}"#);
}

#[actix_web::test]
async fn cancel_order() {
    let _ = env_logger::try_init().ok();
    let mut api = MockOrderManager::new();
    api.expect_cancel_order()
        .withf(|id| id == "1858")
        .times(1)
        .returning(|_| Ok(json!({"id": 1858, "status": "canceled"})));
    let (status, body) = send(post("/api/v1/orders/1858/cancel", ""), api, unused_allowlist()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"id": 1858, "status": "canceled"}));
}

#[actix_web::test]
async fn cancel_order_failure() {
    let _ = env_logger::try_init().ok();
    let mut api = MockOrderManager::new();
    api.expect_cancel_order()
        .withf(|id| id == "Y")
        .times(1)
        .returning(|_| Err(CoinGateApiError::RestRequestError("connection reset".into())));
    let (status, body) = send(post("/api/v1/orders/Y/cancel", ""), api, unused_allowlist()).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, r#"{"error":"Failed to cancel order with ID Y"}"#);
}
