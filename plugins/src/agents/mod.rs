//! HTTP-backed planning/coding/verification capability clients.

mod client;

pub use client::AgentServiceClient;

const BODY_PREVIEW_LIMIT: usize = 256;

pub(crate) fn preview(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    if trimmed.chars().count() <= BODY_PREVIEW_LIMIT {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    out.push_str("...");
    out
}
