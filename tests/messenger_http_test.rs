use anyhow::Result;
use httpmock::prelude::*;
use serde_json::json;
use std::time::Duration;
use tg_courier::core::link::LinkTarget;
use tg_courier::domain::model::{Message, Session};
use tg_courier::{BotApiClient, BotConfig, Messenger};

fn config_for(server: &MockServer, extra: &str) -> Result<BotConfig> {
    let content = format!(
        r#"
[telegram]
bot_token = "42:integration"
api_base_url = "{}"
{}
"#,
        server.base_url(),
        extra
    );
    Ok(BotConfig::from_toml_str(&content)?)
}

#[tokio::test]
async fn test_send_message_through_configured_client() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/bot42:integration/sendMessage")
            .json_body_partial(
                r#"{"chat_id": -100500, "text": "done", "reply_parameters": {"message_id": 9}}"#,
            );
        then.status(200).json_body(json!({
            "ok": true,
            "result": {"message_id": 10, "chat": {"id": -100500}, "text": "done"}
        }));
    });

    let config = config_for(&server, "")?;
    let messenger = Messenger::new(BotApiClient::from_config(&config), config.messaging_settings());

    let sent = messenger
        .send_message(&Message::reference(-100500, 9), "done", None, true)
        .await?;

    api_mock.assert();
    assert_eq!(sent.id, 10);
    Ok(())
}

#[tokio::test]
async fn test_non_blocking_send_reports_rate_limit() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/bot42:integration/sendMessage");
        then.status(429).json_body(json!({
            "ok": false,
            "error_code": 429,
            "description": "Too Many Requests: retry after 30",
            "parameters": {"retry_after": 30}
        }));
    });

    let config = config_for(&server, "")?;
    let messenger = Messenger::new(BotApiClient::from_config(&config), config.messaging_settings());

    let err = messenger
        .send_message(&Message::reference(1, 1), "status", None, false)
        .await
        .unwrap_err();

    assert_eq!(api_mock.hits(), 1);
    assert_eq!(err.retry_after(), Some(Duration::from_secs(30)));
    Ok(())
}

#[tokio::test]
async fn test_resolve_public_link_via_probe_chat() -> Result<()> {
    let server = MockServer::start();
    let forward_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/bot42:integration/forwardMessage")
            .json_body_partial(
                r#"{"chat_id": -100777, "from_chat_id": -1001234, "message_id": 56}"#,
            );
        then.status(200).json_body(json!({
            "ok": true,
            "result": {"message_id": 900, "chat": {"id": -100777}, "text": "mirror me"}
        }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/bot42:integration/deleteMessage");
        then.status(200).json_body(json!({"ok": true, "result": true}));
    });

    let config = config_for(&server, "probe_chat_id = -100777")?;
    let messenger = Messenger::new(BotApiClient::from_config(&config), config.messaging_settings());

    let resolved = messenger
        .get_tg_link_message("https://t.me/c/1234/56")
        .await?;

    forward_mock.assert();
    assert_eq!(resolved.session, Session::Bot);
    match resolved.target {
        LinkTarget::Single(message) => {
            assert_eq!(message.chat_id, -1001234);
            assert_eq!(message.id, 56);
            assert_eq!(message.text.as_deref(), Some("mirror me"));
        }
        LinkTarget::Range(_) => panic!("expected a single message"),
    }
    Ok(())
}

#[tokio::test]
async fn test_resolve_link_bot_cannot_read() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/bot42:integration/forwardMessage");
        then.status(400).json_body(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        }));
    });

    let config = config_for(&server, "probe_chat_id = -100777")?;
    let messenger = Messenger::new(BotApiClient::from_config(&config), config.messaging_settings());

    let err = messenger
        .get_tg_link_message("https://t.me/c/1234/56")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Bad Request: chat not found");
    Ok(())
}
