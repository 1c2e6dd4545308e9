// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! OpenRouterClient 对接模拟的聊天补全接口

use std::time::Duration;

use mockito::Matcher;
use serde_json::json;
use vision_assistant::chat::{
    ChatBackend, ChatError, ChatMessage, ChatSession, ClientConfig, OpenRouterClient, Role,
};

fn client(server: &mockito::Server) -> OpenRouterClient {
    OpenRouterClient::new(ClientConfig {
        api_url: format!("{}/api/v1/chat/completions", server.url()),
        api_key: "sk-test".to_string(),
        model: "test/model".to_string(),
        referer: "https://example.com/app".to_string(),
        title: "Vision Assistant Pro".to_string(),
        timeout: Duration::from_secs(5),
    })
}

fn reply_body(content: &str) -> String {
    json!({
        "id": "gen-1",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content } }
        ]
    })
    .to_string()
}

#[test]
fn sends_headers_and_full_history() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_header("http-referer", "https://example.com/app")
        .match_header("x-title", "Vision Assistant Pro")
        .match_body(Matcher::Json(json!({
            "model": "test/model",
            "messages": [
                { "role": "user", "content": "hi" },
                { "role": "assistant", "content": "hello" },
                { "role": "user", "content": "what do you see?" }
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(reply_body("A cat."))
        .create();

    let messages = vec![
        ChatMessage::user("hi"),
        ChatMessage::assistant("hello"),
        ChatMessage::user("what do you see?"),
    ];
    let reply = client(&server).complete(&messages).unwrap();
    assert_eq!(reply, "A cat.");
    mock.assert();
}

#[test]
fn http_error_status_is_reported() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/api/v1/chat/completions")
        .with_status(401)
        .with_body(r#"{"error":{"message":"No auth credentials found"}}"#)
        .create();

    let err = client(&server)
        .complete(&[ChatMessage::user("hi")])
        .unwrap_err();
    match err {
        ChatError::Status { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("No auth credentials"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn missing_choices_is_malformed() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/api/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices": []}"#)
        .create();

    let err = client(&server)
        .complete(&[ChatMessage::user("hi")])
        .unwrap_err();
    assert!(matches!(err, ChatError::MalformedResponse(_)));
}

#[test]
fn unreachable_endpoint_is_transport_error() {
    // 绑定后立即释放的端口, 连接会被拒绝
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let url = format!("http://127.0.0.1:{}/api/v1/chat/completions", port);

    let client = OpenRouterClient::new(ClientConfig {
        api_url: url,
        api_key: "sk-test".to_string(),
        model: "test/model".to_string(),
        referer: String::new(),
        title: String::new(),
        timeout: Duration::from_secs(2),
    });
    let err = client.complete(&[ChatMessage::user("hi")]).unwrap_err();
    assert!(matches!(err, ChatError::Transport(_)));
}

#[test]
fn session_round_trip_over_http() {
    let mut server = mockito::Server::new();
    let first = server
        .mock("POST", "/api/v1/chat/completions")
        .match_body(Matcher::PartialJson(json!({
            "messages": [{ "role": "user", "content": "hello" }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(reply_body("Hi there!"))
        .create();

    let session = ChatSession::new(client(&server));
    assert_eq!(session.respond("hello"), "Hi there!");
    first.assert();
    first.remove();

    let failing = server
        .mock("POST", "/api/v1/chat/completions")
        .with_status(500)
        .with_body("upstream down")
        .create();
    let reply = session.respond("still there?");
    assert!(reply.starts_with("Error: HTTP 500"));
    failing.assert();

    let roles: Vec<Role> = session.history().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
}
