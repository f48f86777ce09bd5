mod support;

use lynx::adapters::notify::{TelegramConfig, TelegramNotifier};
use lynx::domain::UserId;
use lynx::ports::Notifier;

use support::{FakeServer, Reply};

#[tokio::test]
async fn test_posts_message_to_user_chat() {
    let server = FakeServer::start().await;
    server.enqueue(
        "/botsecret/sendMessage",
        Reply::json(200, serde_json::json!({ "ok": true })),
    );
    let notifier = TelegramNotifier::new(TelegramConfig {
        api_base_url: server.url(),
        ..TelegramConfig::new("secret")
    })
    .unwrap();

    notifier.notify(&UserId::new("42"), "Trading stopped").await;

    let requests = server.requests_to("/botsecret/sendMessage");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].body, "chat_id=42&text=Trading+stopped");
}

#[tokio::test]
async fn test_api_error_does_not_propagate() {
    let server = FakeServer::start().await;
    server.enqueue("/botsecret/sendMessage", Reply::status(403));
    let notifier = TelegramNotifier::new(TelegramConfig {
        api_base_url: server.url(),
        ..TelegramConfig::new("secret")
    })
    .unwrap();

    notifier.notify(&UserId::new("42"), "hello").await;
    assert_eq!(server.requests().len(), 1);
}
