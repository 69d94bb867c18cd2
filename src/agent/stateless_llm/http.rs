//! Shared HTTP client construction and status mapping for hosted models.

use std::time::Duration;

use serde::de::DeserializeOwned;

use super::stateless_llm_interface::LlmError;
use crate::utils::text::truncate_chars;

const MAX_ERROR_BODY_CHARS: usize = 500;

/// Build the pooled client every provider shares.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(10)
        .build()?;
    Ok(client)
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> LlmError {
    match status {
        401 | 403 => LlmError::Authentication(error_message(body)),
        429 => LlmError::RateLimited,
        _ => LlmError::api(status, error_message(body)),
    }
}

/// Prefer `{"error": {"message": ...}}` from Google/OpenAI-style bodies.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| truncate_chars(body.trim(), MAX_ERROR_BODY_CHARS))
}

/// Fail with the mapped error unless the response has a 2xx status.
pub async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body_text = resp.text().await.unwrap_or_default();
    Err(status_to_error(status.as_u16(), &body_text))
}

/// Check the status, then decode the body. A body that is not the expected
/// JSON is a `Serialization` error, which is not retried.
pub async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, LlmError> {
    let body = ensure_success(resp).await?.text().await?;
    Ok(serde_json::from_str(&body)?)
}
