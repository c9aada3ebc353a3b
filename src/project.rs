//! Per-invocation project scoping. The highest-precedence source that has any
//! keys wins outright: an explicit key overrides the channel's defaults, which
//! override the single global default. An empty selection is a valid state;
//! each handler decides whether missing project context is fatal.

use crate::config::Settings;
use crate::context::CommandContext;

/// An ordered, de-duplicated set of tracker project keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSelection {
    keys: Vec<String>,
}

impl ProjectSelection {
    fn from_keys<I: IntoIterator<Item = String>>(keys: I) -> Self {
        let mut seen = Vec::new();
        for key in keys {
            let key = key.trim().to_string();
            if !key.is_empty() && !seen.contains(&key) {
                seen.push(key);
            }
        }
        Self { keys: seen }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The first key in resolution order, for single-project operations.
    pub fn primary(&self) -> Option<&str> {
        self.keys.first().map(String::as_str)
    }
}

pub fn resolve_projects(
    explicit: Option<&str>,
    context: &CommandContext,
    settings: &Settings,
) -> ProjectSelection {
    if let Some(key) = explicit.map(str::trim).filter(|key| !key.is_empty()) {
        return ProjectSelection::from_keys([key.to_string()]);
    }
    if !context.channel_projects.is_empty() {
        return ProjectSelection::from_keys(context.channel_projects.iter().cloned());
    }
    if let Some(default) = settings.default_project.as_deref() {
        return ProjectSelection::from_keys([default.to_string()]);
    }
    ProjectSelection::default()
}
