use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LlmSettings;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("HTTP {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("Invalid API response format: {0}")]
    InvalidResponse(String),
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn summarize_error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .or_else(|| value.get("message").and_then(|v| v.as_str()));
        if let Some(message) = message {
            return truncate_for_log(message, 500);
        }
        return truncate_for_log(&value.to_string(), 500);
    }

    truncate_for_log(trimmed, 500)
}

pub fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim().trim_end_matches('/'))
}

pub fn build_chat_payload(settings: &LlmSettings, system_prompt: &str, user_content: &str) -> Value {
    json!({
        "model": settings.model,
        "messages": [
            { "role": "system", "content": system_prompt },
            { "role": "user", "content": user_content }
        ],
        "temperature": settings.temperature,
        "stream": false
    })
}

fn extract_message_content(response: &Value) -> Result<String, LlmError> {
    response
        .get("choices")
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("message"))
        .and_then(|v| v.get("content"))
        .and_then(|v| v.as_str())
        .map(|content| content.trim().to_string())
        .ok_or_else(|| {
            LlmError::InvalidResponse(format!(
                "missing choices[0].message.content in {}",
                truncate_for_log(&response.to_string(), 300)
            ))
        })
}

async fn send_chat_request(settings: &LlmSettings, payload: &Value) -> Result<String, LlmError> {
    let url = chat_completions_url(&settings.base_url);
    debug!("Chat completion request: url={} model={}", url, settings.model);

    let response = get_http_client()
        .post(&url)
        .header("Authorization", format!("Bearer {}", settings.api_key))
        .timeout(Duration::from_secs(settings.timeout_seconds))
        .json(payload)
        .send()
        .await
        .map_err(|err| {
            if err.is_timeout() {
                LlmError::Timeout(settings.timeout_seconds)
            } else {
                LlmError::Connection(err.to_string())
            }
        })?;

    let status = response.status();
    if status.as_u16() != 200 {
        let body = response.text().await.unwrap_or_default();
        let detail = summarize_error_body(&body);
        warn!("Chat completion error: status={}, detail={}", status, detail);
        return Err(LlmError::Status {
            status: status.as_u16(),
            detail,
        });
    }

    let value = response
        .json::<Value>()
        .await
        .map_err(|err| LlmError::InvalidResponse(err.to_string()))?;
    extract_message_content(&value)
}

/// Sends one chat-completion request and returns the trimmed message text.
/// No retries are attempted.
pub async fn call_chat_completion(
    settings: &LlmSettings,
    system_prompt: &str,
    user_content: &str,
    operation: &str,
) -> Result<String, LlmError> {
    let payload = build_chat_payload(settings, system_prompt, user_content);
    log_llm_timing("chat_completions", &settings.model, operation, || {
        send_chat_request(settings, &payload)
    })
    .await
}
