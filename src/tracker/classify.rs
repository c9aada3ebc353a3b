//! Normalizes the tracker's three independent failure signals (status code,
//! structured error body, transport failure) into one success payload or one
//! error message. Pure data-in/data-out; the upstream service's habit of
//! returning 200 alongside an embedded error body is absorbed here so handler
//! code never sees it.

use super::{RequestOutcome, StatusCode, TrackerResponse, TransportFailure};
use serde_json::Value;

const FORBIDDEN_MESSAGE: &str = "403 Forbidden. Verify your credentials?";
const UNAUTHORIZED_MESSAGE: &str = "401 Unauthorized. Check your credentials?";

/// Classifies one request outcome. `Ok` carries the raw response payload
/// (null when the tracker sent no body); `Err` carries the display message.
pub fn classify(outcome: RequestOutcome) -> Result<Value, String> {
    match outcome {
        Ok(response) => classify_response(response),
        Err(failure) => Err(classify_failure(failure)),
    }
}

fn classify_response(response: TrackerResponse) -> Result<Value, String> {
    let TrackerResponse { status, body } = response;
    if status.is_success() {
        // A 2xx status is necessary but not sufficient: the tracker can embed
        // errors in an otherwise successful body.
        if let Some(message) = body.as_ref().and_then(embedded_error_text) {
            return Err(message);
        }
        return Ok(body.unwrap_or(Value::Null));
    }
    Err(failure_message(&status, body.as_ref()))
}

fn failure_message(status: &StatusCode, body: Option<&Value>) -> String {
    match status.as_str() {
        "403" => FORBIDDEN_MESSAGE.to_string(),
        "401" => UNAUTHORIZED_MESSAGE.to_string(),
        _ => body
            .and_then(embedded_error_text)
            .unwrap_or_else(|| fallback_message(status)),
    }
}

fn fallback_message(status: &StatusCode) -> String {
    format!("{status} API error")
}

fn classify_failure(failure: TransportFailure) -> String {
    let parsed = failure
        .body
        .as_deref()
        .and_then(|raw| serde_json::from_str::<Value>(raw).ok());
    if let Some(message) = parsed.as_ref().and_then(embedded_error_text) {
        return message;
    }
    fallback_message(&failure.status.unwrap_or_else(StatusCode::unknown))
}

/// Error text carried inside a body: a sequence of messages joined with
/// spaces, else a field-to-message mapping rendered as `field: message`.
fn embedded_error_text(body: &Value) -> Option<String> {
    if let Some(messages) = body.get("errorMessages").and_then(Value::as_array) {
        if !messages.is_empty() {
            let joined = messages
                .iter()
                .map(text_of)
                .collect::<Vec<_>>()
                .join(" ");
            return Some(joined);
        }
    }
    if let Some(fields) = body.get("errors").and_then(Value::as_object) {
        if !fields.is_empty() {
            let joined = fields
                .iter()
                .map(|(field, message)| format!("{field}: {}", text_of(message)))
                .collect::<Vec<_>>()
                .join(" ");
            return Some(joined);
        }
    }
    None
}

fn text_of(value: &Value) -> String {
    match value.as_str() {
        Some(text) => text.to_string(),
        None => value.to_string(),
    }
}
