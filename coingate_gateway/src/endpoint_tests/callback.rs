use std::net::SocketAddr;

use actix_web::{http::StatusCode, test, test::TestRequest, web, App, HttpRequest};
use coingate_tools::CoinGateApiError;

use super::{
    helpers::{allowlist, options, send, send_all, unused_upstream, API_KEY},
    mocks::MockIpSource,
};
use crate::{config::ServerOptions, middleware::CallbackGate, routes::callback_source};

const RECEIVED: &str = r#"{"success":true,"message":"Callback received"}"#;
const UNAUTHORIZED: &str = r#"{"error":"Unauthorized"}"#;
const PAYLOAD: &str = "id=1858&order_id=ORD-1&status=paid&price_amount=10.0&price_currency=USD";

fn coingate_ips() -> MockIpSource {
    let mut source = MockIpSource::new();
    source
        .expect_fetch_callback_ips()
        .times(1)
        .returning(|| Ok(vec!["3.3.3.3".to_string(), "52.58.148.40".to_string()]));
    source
}

fn callback_from(peer: &str) -> TestRequest {
    let addr: SocketAddr = format!("{peer}:443").parse().unwrap();
    TestRequest::post().uri("/api/v1/orders/callback").peer_addr(addr).set_payload(PAYLOAD)
}

#[actix_web::test]
async fn callback_from_trusted_address() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send(callback_from("52.58.148.40"), unused_upstream(), allowlist(coingate_ips())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, RECEIVED);
}

#[actix_web::test]
async fn callback_from_untrusted_address() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send(callback_from("6.6.6.6"), unused_upstream(), allowlist(coingate_ips())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, UNAUTHORIZED);
}

#[actix_web::test]
async fn callback_does_not_need_an_api_key() {
    let _ = env_logger::try_init().ok();
    let requests = vec![
        callback_from("3.3.3.3"),
        callback_from("3.3.3.3").insert_header(("X-API-Key", "wrong_key")),
        // A valid key does not stand in for a trusted address
        callback_from("6.6.6.6").insert_header(("X-API-Key", API_KEY)),
    ];
    let results = send_all(requests, unused_upstream(), allowlist(coingate_ips()), options()).await;
    assert_eq!(results[0], (StatusCode::OK, RECEIVED.to_string()));
    assert_eq!(results[1], (StatusCode::OK, RECEIVED.to_string()));
    assert_eq!(results[2], (StatusCode::UNAUTHORIZED, UNAUTHORIZED.to_string()));
}

#[actix_web::test]
async fn any_payload_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let requests = vec![
        callback_from("3.3.3.3"),
        callback_from("3.3.3.3").set_payload(""),
        callback_from("3.3.3.3").set_payload(r#"{"id": 1858, "status": "paid"}"#),
        callback_from("3.3.3.3").set_payload("{not json"),
    ];
    let results = send_all(requests, unused_upstream(), allowlist(coingate_ips()), options()).await;
    for (status, body) in results {
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, RECEIVED);
    }
}

#[actix_web::test]
async fn allowlist_is_fetched_once_for_many_callbacks() {
    let _ = env_logger::try_init().ok();
    // `coingate_ips` only allows a single fetch
    let requests = vec![
        callback_from("3.3.3.3"),
        callback_from("6.6.6.6"),
        callback_from("52.58.148.40"),
        callback_from("3.3.3.3"),
    ];
    let results = send_all(requests, unused_upstream(), allowlist(coingate_ips()), options()).await;
    let statuses = results.into_iter().map(|(s, _)| s).collect::<Vec<_>>();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::UNAUTHORIZED, StatusCode::OK, StatusCode::OK]);
}

#[actix_web::test]
async fn callbacks_are_rejected_when_the_allowlist_is_unavailable() {
    let _ = env_logger::try_init().ok();
    let mut source = MockIpSource::new();
    source
        .expect_fetch_callback_ips()
        .times(2)
        .returning(|| Err(CoinGateApiError::QueryError { status: 503, message: "Service Unavailable".into() }));
    let requests = vec![callback_from("3.3.3.3"), callback_from("52.58.148.40")];
    let results = send_all(requests, unused_upstream(), allowlist(source), options()).await;
    for (status, body) in results {
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, UNAUTHORIZED);
    }
}

#[actix_web::test]
async fn forwarded_address_is_used_only_when_enabled() {
    let _ = env_logger::try_init().ok();
    let proxied = || callback_from("10.0.0.1").insert_header(("X-Forwarded-For", "3.3.3.3, 10.0.0.1"));
    let results = send_all(vec![proxied()], unused_upstream(), allowlist(coingate_ips()), options()).await;
    assert_eq!(results[0].0, StatusCode::UNAUTHORIZED);

    let options = ServerOptions { use_x_forwarded_for: true, ..options() };
    let results = send_all(vec![proxied()], unused_upstream(), allowlist(coingate_ips()), options).await;
    assert_eq!(results[0], (StatusCode::OK, RECEIVED.to_string()));
}

#[actix_web::test]
async fn callback_without_peer_address_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut source = MockIpSource::new();
    source.expect_fetch_callback_ips().never();
    let req = TestRequest::post().uri("/api/v1/orders/callback").set_payload(PAYLOAD);
    let (status, body) = send(req, unused_upstream(), allowlist(source)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, UNAUTHORIZED);
}

#[actix_web::test]
async fn handler_sees_the_forwarded_caller_not_the_proxy() {
    let _ = env_logger::try_init().ok();
    let gate = CallbackGate::new(allowlist(coingate_ips()), true, false);
    let app = App::new().service(
        web::resource("/api/v1/orders/callback")
            .wrap(gate)
            .to(|req: HttpRequest| async move { callback_source(&req) }),
    );
    let service = test::init_service(app).await;
    let req = callback_from("10.0.0.1").insert_header(("X-Forwarded-For", "52.58.148.40, 10.0.0.1")).to_request();
    let body = test::call_and_read_body(&service, req).await;
    assert_eq!(body, "52.58.148.40");
}
