//! Display-ready renderings of raw tracker payloads. Handlers hand these
//! strings to the chat layer; nothing here touches the network.

use serde_json::Value;

fn text_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for segment in path {
        current = current.get(segment)?;
    }
    current.as_str()
}

fn flag_at(value: &Value, field: &str) -> bool {
    value.get(field).and_then(Value::as_bool).unwrap_or(false)
}

/// `KEY: summary (status)`
pub fn issue_short(issue: &Value) -> String {
    let key = text_at(issue, &["key"]).unwrap_or("unknown");
    let summary = text_at(issue, &["fields", "summary"]).unwrap_or("(no summary)");
    match text_at(issue, &["fields", "status", "name"]) {
        Some(status) => format!("{key}: {summary} ({status})"),
        None => format!("{key}: {summary}"),
    }
}

/// The short line plus assignee, reporter, priority and the browse URL, each
/// on its own line and only when present.
pub fn issue_long(issue: &Value, browse_url: &str) -> Vec<String> {
    let mut lines = vec![issue_short(issue)];
    if let Some(assignee) = text_at(issue, &["fields", "assignee", "displayName"]) {
        lines.push(format!("assignee: {assignee}"));
    }
    if let Some(reporter) = text_at(issue, &["fields", "reporter", "displayName"]) {
        lines.push(format!("reporter: {reporter}"));
    }
    if let Some(priority) = text_at(issue, &["fields", "priority", "name"]) {
        lines.push(format!("priority: {priority}"));
    }
    lines.push(browse_url.to_string());
    lines
}

/// `KEY: name`
pub fn project_line(project: &Value) -> String {
    let key = text_at(project, &["key"]).unwrap_or("unknown");
    match text_at(project, &["name"]) {
        Some(name) => format!("{key}: {name}"),
        None => key.to_string(),
    }
}

/// `name [release date D] [archived] [released]`, qualifiers only when true.
pub fn version_line(version: &Value) -> String {
    let mut line = text_at(version, &["name"]).unwrap_or("unnamed").to_string();
    if let Some(date) = text_at(version, &["releaseDate"]) {
        line.push_str(&format!(" [release date {date}]"));
    }
    if flag_at(version, "archived") {
        line.push_str(" [archived]");
    }
    if flag_at(version, "released") {
        line.push_str(" [released]");
    }
    line
}

pub fn component_line(component: &Value) -> String {
    let name = text_at(component, &["name"]).unwrap_or("unnamed");
    match text_at(component, &["description"]) {
        Some(description) => format!("{name}: {description}"),
        None => name.to_string(),
    }
}

pub fn priority_line(priority: &Value) -> String {
    let name = text_at(priority, &["name"]).unwrap_or("unnamed");
    match text_at(priority, &["description"]) {
        Some(description) => format!("{name}: {description}"),
        None => name.to_string(),
    }
}

pub fn user_line(user: &Value) -> String {
    let display = text_at(user, &["displayName"]);
    let name = text_at(user, &["name"]);
    match (display, name) {
        (Some(display), Some(name)) => format!("{display} ({name})"),
        (Some(display), None) => display.to_string(),
        (None, Some(name)) => name.to_string(),
        (None, None) => "unknown user".to_string(),
    }
}

/// Short lines for the issues in a search payload, truncated to `limit`.
pub fn search_lines(payload: &Value, limit: usize) -> Vec<String> {
    payload
        .get("issues")
        .and_then(Value::as_array)
        .map(|issues| issues.iter().take(limit).map(issue_short).collect())
        .unwrap_or_default()
}
