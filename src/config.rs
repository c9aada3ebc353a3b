use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid yaml in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("settings validation failed: {0}")]
    Settings(String),
}

pub const DEFAULT_TOKEN_ENV: &str = "ISSUEBOT_TRACKER_TOKEN";

/// Settings for one bot instance: where the tracker lives, how to find its
/// credential, the global default project, and per-channel project defaults.
/// The credential itself is always read from the environment, never the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub tracker_url: String,
    #[serde(default)]
    pub default_project: Option<String>,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
        }
    }
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSettings {
    #[serde(default)]
    pub project_keys: Vec<String>,
}

impl Settings {
    pub fn new(tracker_url: impl Into<String>) -> Self {
        Self {
            tracker_url: tracker_url.into(),
            default_project: None,
            auth: AuthSettings::default(),
            channels: BTreeMap::new(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let settings: Settings =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.tracker_url.trim();
        if url.is_empty() {
            return Err(ConfigError::Settings(
                "tracker_url must be non-empty".to_string(),
            ));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Settings(format!(
                "tracker_url `{url}` must start with http:// or https://"
            )));
        }
        if self.auth.token_env.trim().is_empty() {
            return Err(ConfigError::Settings(
                "auth.token_env must be non-empty".to_string(),
            ));
        }
        if let Some(key) = self.default_project.as_deref() {
            validate_project_key("default_project", key).map_err(ConfigError::Settings)?;
        }
        for (channel, channel_settings) in &self.channels {
            if channel.trim().is_empty() {
                return Err(ConfigError::Settings(
                    "channel ids must be non-empty".to_string(),
                ));
            }
            for key in &channel_settings.project_keys {
                validate_project_key(&format!("channels.{channel}.project_keys"), key)
                    .map_err(ConfigError::Settings)?;
            }
        }
        Ok(())
    }

    pub fn channel(&self, channel: &str) -> Option<&ChannelSettings> {
        self.channels.get(channel)
    }

    /// Tracker base with any trailing slash removed, for URL assembly.
    pub fn tracker_base(&self) -> &str {
        self.tracker_url.trim_end_matches('/')
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self::new("https://tracker.example.com")
    }
}

fn validate_project_key(field: &str, key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err(format!("{field}: project key must be non-empty"));
    }
    let mut chars = key.chars();
    let leading_letter = chars.next().is_some_and(|ch| ch.is_ascii_uppercase());
    if leading_letter && chars.all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_')
    {
        return Ok(());
    }
    Err(format!(
        "{field}: project key `{key}` must be uppercase ASCII letters, digits or '_' and start with a letter"
    ))
}
