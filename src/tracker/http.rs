//! Blocking HTTP client for a JIRA-compatible REST v2 API. Converts every
//! wire-level result into the three-signal `RequestOutcome` shape: completed
//! responses keep their status and parsed body (error statuses included),
//! while connection failures and unreadable bodies become transport failures.

use super::{
    RequestOutcome, StatusCode, TrackerApi, TrackerError, TrackerResponse, TransportFailure,
};
use crate::config::Settings;
use serde_json::{json, Value};
use tracing::{debug, warn};

const API_PREFIX: &str = "rest/api/2";
const RECENT_WINDOW_JQL: &str = "updated >= -7d";

// "Resolve Issue" in the classic default workflow.
const RESOLVE_TRANSITION_ID: &str = "5";

#[derive(Debug, Clone)]
pub struct HttpTrackerClient {
    base: String,
    token: String,
}

impl HttpTrackerClient {
    pub fn new(base: impl Into<String>, token: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Builds a client from settings, reading the API token from the env var
    /// the settings name.
    pub fn from_settings(settings: &Settings) -> Result<Self, TrackerError> {
        let token = std::env::var(&settings.auth.token_env)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| TrackerError::MissingEnvVar(settings.auth.token_env.clone()))?;
        Ok(Self::new(settings.tracker_base(), token))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{API_PREFIX}/{path}", self.base)
    }

    fn get(&self, path: &str, query: &[(&str, String)]) -> RequestOutcome {
        let mut url = self.endpoint(path);
        if !query.is_empty() {
            let encoded = query
                .iter()
                .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
                .collect::<Vec<_>>()
                .join("&");
            url = format!("{url}?{encoded}");
        }
        debug!("GET {url}");
        outcome(
            ureq::get(&url)
                .set("Authorization", &self.bearer())
                .set("Accept", "application/json")
                .call(),
        )
    }

    fn send_json(&self, method: &str, path: &str, body: Value) -> RequestOutcome {
        let url = self.endpoint(path);
        debug!("{method} {url}");
        outcome(
            ureq::request(method, &url)
                .set("Authorization", &self.bearer())
                .set("Accept", "application/json")
                .send_json(body),
        )
    }

    fn delete(&self, path: &str) -> RequestOutcome {
        let url = self.endpoint(path);
        debug!("DELETE {url}");
        outcome(
            ureq::delete(&url)
                .set("Authorization", &self.bearer())
                .set("Accept", "application/json")
                .call(),
        )
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

fn outcome(result: Result<ureq::Response, ureq::Error>) -> RequestOutcome {
    match result {
        Ok(response) => read_response(response),
        // 4xx/5xx still carry a usable status and body.
        Err(ureq::Error::Status(_, response)) => read_response(response),
        Err(ureq::Error::Transport(transport)) => {
            warn!("tracker request failed in transport: {transport}");
            Err(TransportFailure {
                reason: transport.to_string(),
                status: None,
                body: None,
            })
        }
    }
}

fn read_response(response: ureq::Response) -> RequestOutcome {
    let status = StatusCode::from(response.status());
    let raw = match response.into_string() {
        Ok(raw) => raw,
        Err(err) => {
            return Err(TransportFailure {
                reason: format!("failed to read response body: {err}"),
                status: Some(status),
                body: None,
            })
        }
    };
    if raw.trim().is_empty() {
        return Ok(TrackerResponse { status, body: None });
    }
    match serde_json::from_str::<Value>(&raw) {
        Ok(body) => Ok(TrackerResponse {
            status,
            body: Some(body),
        }),
        Err(_) => Err(TransportFailure {
            reason: "response body is not json".to_string(),
            status: Some(status),
            body: Some(raw),
        }),
    }
}

fn escape_jql_text(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn project_scope(projects: &[String]) -> Option<String> {
    if projects.is_empty() {
        return None;
    }
    Some(format!("project in ({})", projects.join(", ")))
}

fn search_jql(text: &str, projects: &[String]) -> String {
    let term = format!("text ~ \"{}\"", escape_jql_text(text));
    let clause = match project_scope(projects) {
        Some(scope) => format!("{scope} AND {term}"),
        None => term,
    };
    format!("{clause} ORDER BY updated DESC")
}

fn recent_jql(projects: &[String]) -> String {
    let clause = match project_scope(projects) {
        Some(scope) => format!("{scope} AND {RECENT_WINDOW_JQL}"),
        None => RECENT_WINDOW_JQL.to_string(),
    };
    format!("{clause} ORDER BY updated DESC")
}

impl TrackerApi for HttpTrackerClient {
    fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{key}", self.base)
    }

    fn projects(&self) -> RequestOutcome {
        self.get("project", &[])
    }

    fn users(&self, project: &str) -> RequestOutcome {
        self.get("user/assignable/search", &[("project", project.to_string())])
    }

    fn issue(&self, key: &str) -> RequestOutcome {
        self.get(&format!("issue/{}", urlencoding::encode(key)), &[])
    }

    fn delete_issue(&self, key: &str) -> RequestOutcome {
        self.delete(&format!("issue/{}", urlencoding::encode(key)))
    }

    fn create_issue(&self, fields: &Value) -> RequestOutcome {
        self.send_json("POST", "issue", json!({ "fields": fields }))
    }

    fn update_issue(&self, key: &str, fields: &Value) -> RequestOutcome {
        self.send_json(
            "PUT",
            &format!("issue/{}", urlencoding::encode(key)),
            json!({ "fields": fields }),
        )
    }

    fn assign_issue(&self, key: &str, assignee: &str) -> RequestOutcome {
        self.send_json(
            "PUT",
            &format!("issue/{}/assignee", urlencoding::encode(key)),
            json!({ "name": assignee }),
        )
    }

    fn comment_issue(&self, key: &str, comment: &str) -> RequestOutcome {
        self.send_json(
            "POST",
            &format!("issue/{}/comment", urlencoding::encode(key)),
            json!({ "body": comment }),
        )
    }

    fn resolve_issue(&self, key: &str, comment: &str) -> RequestOutcome {
        self.send_json(
            "POST",
            &format!("issue/{}/transitions", urlencoding::encode(key)),
            json!({
                "transition": { "id": RESOLVE_TRANSITION_ID },
                "fields": { "resolution": { "name": "Fixed" } },
                "update": { "comment": [ { "add": { "body": comment } } ] },
            }),
        )
    }

    fn priorities(&self) -> RequestOutcome {
        self.get("priority", &[])
    }

    fn components(&self, project: &str) -> RequestOutcome {
        self.get(
            &format!("project/{}/components", urlencoding::encode(project)),
            &[],
        )
    }

    fn matching_components(&self, project: &str, name: &str) -> RequestOutcome {
        let response = self.components(project)?;
        if !response.status.is_success() {
            return Ok(response);
        }
        let needle = name.to_ascii_lowercase();
        let matches = response
            .body
            .as_ref()
            .and_then(Value::as_array)
            .map(|components| {
                components
                    .iter()
                    .filter(|component| {
                        component
                            .get("name")
                            .and_then(Value::as_str)
                            .is_some_and(|name| name.to_ascii_lowercase().contains(&needle))
                    })
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Ok(TrackerResponse {
            status: response.status,
            body: Some(Value::Array(matches)),
        })
    }

    fn versions(&self, project: &str) -> RequestOutcome {
        self.get(
            &format!("project/{}/versions", urlencoding::encode(project)),
            &[],
        )
    }

    fn search(&self, text: &str, projects: &[String]) -> RequestOutcome {
        self.get("search", &[("jql", search_jql(text, projects))])
    }

    fn jql(&self, query: &str) -> RequestOutcome {
        self.get("search", &[("jql", query.to_string())])
    }

    fn recent_issues(&self, projects: &[String]) -> RequestOutcome {
        self.get("search", &[("jql", recent_jql(projects))])
    }
}
