//! Integration tests for `TelegramClient` using wiremock HTTP mocks.

use std::time::Duration;

use dealwatch_core::{DealItem, ScanCycleStats};
use dealwatch_telegram::{DealNotifier, TelegramClient, TelegramError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "123456:test-token";

fn test_client(base_url: &str) -> TelegramClient {
    TelegramClient::with_base_url(TOKEN, "-100200300", 30, base_url)
        .expect("client construction should not fail")
}

fn ok_message() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "ok": true,
        "result": {"message_id": 1, "chat": {"id": -100_200_300}}
    }))
}

fn deal(image_url: Option<&str>) -> DealItem {
    DealItem {
        name: "Visvim FBT".to_owned(),
        price: 14_800,
        brand_name: "Visvim".to_owned(),
        image_url: image_url.map(str::to_owned),
        item_url: "https://jp.mercari.com/item/m77".to_owned(),
        age_minutes: 3.0,
    }
}

#[tokio::test]
async fn deal_with_image_is_sent_as_photo() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendPhoto")))
        .and(body_partial_json(json!({
            "chat_id": "-100200300",
            "photo": "https://static.mercdn.net/m77_1.jpg",
            "parse_mode": "HTML"
        })))
        .respond_with(ok_message())
        .expect(1)
        .mount(&server)
        .await;

    test_client(&server.uri())
        .send_deal(&deal(Some("https://static.mercdn.net/m77_1.jpg")))
        .await
        .expect("sendPhoto should succeed");
}

#[tokio::test]
async fn deal_without_image_is_sent_as_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .and(body_partial_json(json!({"parse_mode": "HTML"})))
        .respond_with(ok_message())
        .expect(1)
        .mount(&server)
        .await;

    test_client(&server.uri())
        .send_deal(&deal(None))
        .await
        .expect("sendMessage should succeed");
}

#[tokio::test]
async fn not_ok_envelope_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        })))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .send_message("hi")
        .await
        .unwrap_err();
    match err {
        TelegramError::Api(msg) => assert!(msg.contains("chat not found"), "{msg}"),
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn too_many_requests_carries_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "ok": false,
            "error_code": 429,
            "description": "Too Many Requests: retry after 5",
            "parameters": {"retry_after": 5}
        })))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .send_message("hi")
        .await
        .unwrap_err();
    assert!(
        matches!(err, TelegramError::RateLimited { retry_after_secs: 5 }),
        "{err:?}"
    );
}

#[tokio::test]
async fn transport_errors_do_not_leak_token() {
    let client = TelegramClient::with_base_url(TOKEN, "1", 2, "http://127.0.0.1:9").unwrap();
    let err = client.send_message("hi").await.unwrap_err();
    assert!(matches!(err, TelegramError::Http(_)));
    assert!(!err.to_string().contains("test-token"), "{err}");
}

#[tokio::test]
async fn scan_summary_is_skipped_when_nothing_new() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ok_message())
        .expect(0)
        .mount(&server)
        .await;

    let stats = ScanCycleStats {
        found: 20,
        fresh: 4,
        ..ScanCycleStats::default()
    };
    test_client(&server.uri())
        .send_scan_summary(&stats, Duration::from_secs(30))
        .await
        .unwrap();
}

#[tokio::test]
async fn scan_summary_is_sent_when_new_items_found() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ok_message())
        .expect(1)
        .mount(&server)
        .await;

    let stats = ScanCycleStats {
        found: 20,
        fresh: 4,
        unseen: 2,
        kept: 2,
        sent: 2,
    };
    test_client(&server.uri())
        .send_scan_summary(&stats, Duration::from_secs(30))
        .await
        .unwrap();
}

#[tokio::test]
async fn get_updates_returns_messages() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/getUpdates")))
        .and(body_partial_json(json!({"offset": 11, "timeout": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": [
                {"update_id": 11, "message": {"message_id": 3, "chat": {"id": -100_200_300}, "text": "/check"}},
                {"update_id": 12, "message": {"message_id": 4, "chat": {"id": 999}, "text": "hello"}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let updates = test_client(&server.uri()).get_updates(11, 0).await.unwrap();

    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].command().as_deref(), Some("/check"));
    assert_eq!(updates[0].chat_id(), Some(-100_200_300));
    assert!(updates[1].command().is_none());
}

#[tokio::test]
async fn test_connection_sends_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ok_message())
        .expect(1)
        .mount(&server)
        .await;

    test_client(&server.uri()).test_connection().await.unwrap();
}
