use std::time::Duration;

use chat_api::{normalize_chat_url, ChatApiClient, ChatApiConfig};

#[test]
fn smoke_client_constructs_from_config() {
    let config = ChatApiConfig::new("http://127.0.0.1:9000")
        .with_user_agent("chat-tests/1.0")
        .with_timeout(Duration::from_secs(30))
        .insert_header("X-Trace", "abc");

    let client = ChatApiClient::new(config).expect("client creation should succeed");
    assert_eq!(
        normalize_chat_url("http://127.0.0.1:9000"),
        client.normalized_endpoint()
    );
    assert_eq!(
        Some("chat-tests/1.0".to_string()),
        client.config().user_agent
    );
    assert_eq!(Some(Duration::from_secs(30)), client.config().timeout);
}

#[test]
fn headers_include_json_content_type_and_extras() {
    let config = ChatApiConfig::new("http://127.0.0.1:9000")
        .with_headers([("X-Trace".to_string(), " abc ".to_string())]);
    let client = ChatApiClient::new(config).expect("client");
    let headers = client.build_headers().expect("headers");

    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["accept"], "text/event-stream, application/json");
    assert_eq!(headers["x-trace"], "abc");
    assert!(headers["user-agent"]
        .to_str()
        .expect("ascii user agent")
        .starts_with("chat_api/"));
}

#[test]
fn invalid_header_value_is_reported() {
    let config = ChatApiConfig::default().insert_header("x-bad", "line\nbreak");
    let client = ChatApiClient::new(config).expect("client");
    assert!(client.build_headers().is_err());
}
