use crate::config::Settings;

/// Everything a handler may know about the invocation it serves: who asked and
/// which channel the command arrived on, with that channel's default project
/// keys already looked up. Built once per invocation and never mutated, so
/// concurrent invocations from different channels cannot observe each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    pub user: String,
    pub channel: String,
    pub channel_projects: Vec<String>,
}

impl CommandContext {
    pub fn new(user: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            channel: channel.into(),
            channel_projects: Vec::new(),
        }
    }

    /// Context for a channel, with the channel's default project keys resolved
    /// from settings. Unknown channels simply have no channel defaults.
    pub fn for_channel(
        user: impl Into<String>,
        channel: impl Into<String>,
        settings: &Settings,
    ) -> Self {
        let channel = channel.into();
        let channel_projects = settings
            .channel(&channel)
            .map(|channel_settings| channel_settings.project_keys.clone())
            .unwrap_or_default();
        Self {
            user: user.into(),
            channel,
            channel_projects,
        }
    }
}
