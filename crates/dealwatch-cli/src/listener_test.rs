use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

const TOKEN: &str = "42:listener";
const CHAT: &str = "4242";

fn quick() -> ListenerSettings {
    ListenerSettings {
        poll_timeout_secs: 0,
        idle: Duration::from_millis(10),
        error_backoff: Duration::from_millis(10),
    }
}

fn message_update(update_id: i64, chat_id: i64, text: &str) -> Value {
    json!({
        "update_id": update_id,
        "message": {"message_id": update_id * 10, "chat": {"id": chat_id}, "text": text}
    })
}

async fn mount_updates(server: &MockServer, updates: Vec<Value>) {
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/getUpdates")))
        .and(body_partial_json(json!({"offset": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": updates})))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/getUpdates")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": []})))
        .mount(server)
        .await;
}

async fn sent_messages(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path().ends_with("/sendMessage"))
        .map(|r| serde_json::from_slice(&r.body).expect("sendMessage body is json"))
        .collect()
}

async fn poll_offsets(server: &MockServer) -> Vec<i64> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path().ends_with("/getUpdates"))
        .filter_map(|r| serde_json::from_slice::<Value>(&r.body).ok())
        .filter_map(|b| b["offset"].as_i64())
        .collect()
}

async fn run_until_polled_twice(server: &MockServer, store: SeenStore, status: RunStatus) {
    let client = Arc::new(
        TelegramClient::with_base_url(TOKEN, CHAT, 5, &server.uri()).expect("client builds"),
    );
    let (_tx, rx) = watch::channel(status);
    let listener = CommandListener::new(client, store, rx, quick());
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(listener.run(cancel.clone()));

    for _ in 0..200 {
        if poll_offsets(server).await.len() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("listener stops after cancel")
        .expect("listener task does not panic");
}

#[tokio::test]
async fn check_command_from_configured_chat_gets_status_report() {
    let server = MockServer::start().await;
    mount_updates(&server, vec![message_update(7, 4242, "/check")]).await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})))
        .mount(&server)
        .await;

    let store = SeenStore::open_in_memory().await.unwrap();
    store.mark_seen("m1", "Kapital", "boro", 9_000).await.unwrap();
    store.mark_seen("m2", "Kapital", "denim", 8_000).await.unwrap();

    run_until_polled_twice(&server, store, RunStatus::started(Utc::now())).await;

    let sent = sent_messages(&server).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["chat_id"], CHAT);
    let text = sent[0]["text"].as_str().unwrap();
    assert!(text.contains("Items tracked: 2"), "{text}");
    assert!(text.contains("Last scan: Never"), "{text}");

    let offsets = poll_offsets(&server).await;
    assert_eq!(offsets[0], 0);
    assert_eq!(offsets[1], 8, "next poll acknowledges update 7");
}

#[tokio::test]
async fn commands_from_other_chats_and_plain_text_are_ignored() {
    let server = MockServer::start().await;
    mount_updates(
        &server,
        vec![
            message_update(1, 999, "/status"),
            message_update(2, 4242, "hello bot"),
            message_update(3, 4242, "/start"),
        ],
    )
    .await;

    let store = SeenStore::open_in_memory().await.unwrap();
    run_until_polled_twice(&server, store, RunStatus::started(Utc::now())).await;

    assert!(sent_messages(&server).await.is_empty());
    assert_eq!(poll_offsets(&server).await[1], 4);
}

#[tokio::test]
async fn cancel_interrupts_a_pending_long_poll() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/getUpdates")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true, "result": []}))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let client = Arc::new(TelegramClient::with_base_url(TOKEN, CHAT, 60, &server.uri()).unwrap());
    let (_tx, rx) = watch::channel(RunStatus::started(Utc::now()));
    let store = SeenStore::open_in_memory().await.unwrap();
    let listener = CommandListener::new(client, store, rx, ListenerSettings::default());
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(listener.run(cancel.clone()));

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("listener should not wait out the long poll")
        .unwrap();
}
