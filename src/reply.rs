use serde_json::Value;

/// What a handler hands back to the chat layer for display.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Text(String),
    Lines(Vec<String>),
}

impl Rendered {
    pub fn to_display(&self) -> String {
        match self {
            Rendered::Text(text) => text.clone(),
            Rendered::Lines(lines) => lines.join("\n"),
        }
    }
}

/// The one envelope every handler returns: either a renderable value plus the
/// raw payload it was built from, or a human-readable error message. Never both.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Success { value: Rendered, data: Value },
    Failure { error: String },
}

impl Reply {
    pub fn text(value: impl Into<String>, data: Value) -> Self {
        Reply::Success {
            value: Rendered::Text(value.into()),
            data,
        }
    }

    pub fn lines(lines: Vec<String>, data: Value) -> Self {
        Reply::Success {
            value: Rendered::Lines(lines),
            data,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Reply::Failure {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Failure { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Reply::Failure { error } => Some(error),
            Reply::Success { .. } => None,
        }
    }

    pub fn value(&self) -> Option<&Rendered> {
        match self {
            Reply::Success { value, .. } => Some(value),
            Reply::Failure { .. } => None,
        }
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            Reply::Success { data, .. } => Some(data),
            Reply::Failure { .. } => None,
        }
    }
}
