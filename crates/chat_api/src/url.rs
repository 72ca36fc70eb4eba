/// Default origin for chat requests (local worker dev server).
pub const DEFAULT_CHAT_BASE_URL: &str = "http://localhost:8787";

/// Path of the chat endpoint on the origin.
pub const CHAT_PATH: &str = "/api/chat";

/// Normalize a base URL to the chat endpoint.
///
/// Normalization rules:
/// 1) keep `/api/chat` unchanged
/// 2) append `/chat` when path ends in `/api`
/// 3) append `/api/chat` otherwise
pub fn normalize_chat_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_CHAT_BASE_URL
    } else {
        input.trim()
    };

    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with(CHAT_PATH) {
        return trimmed.to_string();
    }
    if trimmed.ends_with("/api") {
        return format!("{trimmed}/chat");
    }
    format!("{trimmed}{CHAT_PATH}")
}
