//! The tracker collaborator seam: the request-outcome types every call
//! produces, the `TrackerApi` trait handlers talk to, and the classifier that
//! normalizes outcomes into success payloads or error messages.

pub mod classify;
pub mod format;
pub mod http;

use serde_json::Value;

/// A status code kept in its wire form. Some upstream layers hand codes over
/// already stringified, so success is a prefix check on the text, not a
/// numeric range check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCode(String);

impl StatusCode {
    pub fn unknown() -> Self {
        Self("unknown".to_string())
    }

    pub fn is_success(&self) -> bool {
        self.0.starts_with('2')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        Self(code.to_string())
    }
}

impl From<&str> for StatusCode {
    fn from(code: &str) -> Self {
        Self(code.trim().to_string())
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A completed exchange with the tracker: status plus the parsed body, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl TrackerResponse {
    pub fn new(status: impl Into<StatusCode>, body: Option<Value>) -> Self {
        Self {
            status: status.into(),
            body,
        }
    }
}

/// A request that never produced a usable response: connection failures,
/// unreadable or non-JSON bodies. Carries whatever arrived before things broke.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("transport failure: {reason}")]
pub struct TransportFailure {
    pub reason: String,
    pub status: Option<StatusCode>,
    pub body: Option<String>,
}

pub type RequestOutcome = Result<TrackerResponse, TransportFailure>;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("missing required env var `{0}`")]
    MissingEnvVar(String),
}

/// Everything the tracker exposes to command handlers. One method per logical
/// operation; every method returns the raw three-signal outcome for the
/// classifier to normalize.
pub trait TrackerApi {
    fn browse_url(&self, key: &str) -> String;
    fn projects(&self) -> RequestOutcome;
    fn users(&self, project: &str) -> RequestOutcome;
    fn issue(&self, key: &str) -> RequestOutcome;
    fn delete_issue(&self, key: &str) -> RequestOutcome;
    fn create_issue(&self, fields: &Value) -> RequestOutcome;
    fn update_issue(&self, key: &str, fields: &Value) -> RequestOutcome;
    fn assign_issue(&self, key: &str, assignee: &str) -> RequestOutcome;
    fn comment_issue(&self, key: &str, comment: &str) -> RequestOutcome;
    fn resolve_issue(&self, key: &str, comment: &str) -> RequestOutcome;
    fn priorities(&self) -> RequestOutcome;
    fn components(&self, project: &str) -> RequestOutcome;
    fn matching_components(&self, project: &str, name: &str) -> RequestOutcome;
    fn versions(&self, project: &str) -> RequestOutcome;
    fn search(&self, text: &str, projects: &[String]) -> RequestOutcome;
    fn jql(&self, query: &str) -> RequestOutcome;
    fn recent_issues(&self, projects: &[String]) -> RequestOutcome;
}
