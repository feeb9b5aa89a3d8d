//! HTTP error classification shared by the remote oracle adapters.

use reqwest::header::HeaderValue;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::ports::AIError;

const DEFAULT_RETRY_AFTER_SECS: u32 = 30;

/// Builds the reqwest client used by a provider.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, AIError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AIError::InvalidRequest(format!("failed to create HTTP client: {e}")))
}

/// Maps a failed send into the port's error vocabulary.
pub(crate) fn send_error(err: reqwest::Error, timeout: Duration) -> AIError {
    if err.is_timeout() {
        AIError::Timeout {
            timeout_secs: timeout.as_secs() as u32,
        }
    } else if err.is_connect() {
        AIError::network(format!("connection failed: {err}"))
    } else {
        AIError::network(err.to_string())
    }
}

/// Passes successful responses through and turns the rest into `AIError`.
pub(crate) async fn check_status(response: Response) -> Result<Response, AIError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = parse_retry_after(response.headers().get("retry-after"));
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body, retry_after))
}

pub(crate) fn status_error(status: StatusCode, body: &str, retry_after: Option<u32>) -> AIError {
    let message = error_message(body);
    match status.as_u16() {
        401 | 403 => AIError::AuthenticationFailed,
        429 => AIError::rate_limited(retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS)),
        400 if is_context_error(&message) => AIError::context_too_long(0, 0),
        400 | 404 | 422 => AIError::InvalidRequest(message),
        500..=599 => AIError::unavailable(format!("server error {status}: {message}")),
        _ => AIError::network(format!("unexpected status {status}: {message}")),
    }
}

fn is_context_error(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("maximum context length")
        || lower.contains("context_length_exceeded")
        || lower.contains("exceeds the maximum number of tokens")
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Pulls the human-readable message out of an `{"error": {...}}` body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|wrapper| {
            let msg = wrapper.error.message?;
            Some(match wrapper.error.status {
                Some(status) if !status.is_empty() => format!("{status}: {msg}"),
                _ => msg,
            })
        })
        .unwrap_or_else(|| body.to_string())
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<u32> {
    header?.to_str().ok()?.trim().parse::<u32>().ok()
}
