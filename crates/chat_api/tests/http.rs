use chat_api::{normalize_chat_url, ChatApiClient, ChatApiConfig, ChatApiError, ChatMessage, ChatRequest};
use serde_json::{json, Value};

#[test]
fn http_request_posts_json_history_to_chat_endpoint() {
    let config = ChatApiConfig::new("https://chat.example.dev");
    let client = ChatApiClient::new(config).expect("client");
    let request = ChatRequest::new(vec![ChatMessage::user("hi")]);

    let http_request = client
        .build_request(&request)
        .expect("build request")
        .build()
        .expect("request");

    assert_eq!(
        http_request.url().as_str(),
        normalize_chat_url("https://chat.example.dev")
    );
    assert_eq!(http_request.method(), "POST");
    assert_eq!(
        http_request.headers()["content-type"],
        "application/json"
    );

    let body = http_request
        .body()
        .and_then(|body| body.as_bytes())
        .expect("json body is buffered");
    let body: Value = serde_json::from_slice(body).expect("body is json");
    assert_eq!(body, json!({"messages": [{"role": "user", "content": "hi"}]}));
}

#[test]
fn http_request_rejects_unparseable_base_url() {
    let config = ChatApiConfig::new("not a url");
    let client = ChatApiClient::new(config).expect("client");
    let error = client
        .build_request(&ChatRequest::default())
        .expect_err("base url must parse");
    assert!(matches!(error, ChatApiError::InvalidBaseUrl(_)));
}
