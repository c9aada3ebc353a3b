//! Free-text flag parsing for the trailing argument of `create`/`update`-style
//! commands, e.g. `infra fix -c billing -a alice -d "broken totals"`.
//!
//! The input is split at whitespace boundaries adjacent to a flag marker, so a
//! marker and its following value stay paired while surrounding free text is
//! kept together. A flag's value is the entire token that follows it, which may
//! span several words. Values containing a literal dash-letter word of their
//! own are not supported; such a word is read as another flag marker.

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum OptionError {
    #[error("unrecognized option `{0}`")]
    Unrecognized(String),
    #[error("missing argument for option `{0}`")]
    MissingArgument(String),
}

/// The closed set of flags commands accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flag {
    ProjectKey,
    Component,
    Summary,
    Assignee,
    FixVersion,
    Description,
    Time,
    Remaining,
    Parent,
}

impl Flag {
    fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "-j" | "--project-key" => Some(Self::ProjectKey),
            "-c" | "--component" => Some(Self::Component),
            "-s" | "--summary" => Some(Self::Summary),
            "-a" | "--assignee" => Some(Self::Assignee),
            "-f" | "--fix-version" => Some(Self::FixVersion),
            "-d" | "--desc" => Some(Self::Description),
            "-t" | "--time" => Some(Self::Time),
            "-r" | "--remaining" => Some(Self::Remaining),
            "-p" | "--parent" => Some(Self::Parent),
            _ => None,
        }
    }
}

/// Recognized flags bound to trimmed values, plus leftover positional words.
/// Unset flags stay `None`; an empty value only appears when the user wrote one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOptions {
    pub project_key: Option<String>,
    pub component: Option<String>,
    pub summary: Option<String>,
    pub assignee: Option<String>,
    pub fix_version: Option<String>,
    pub description: Option<String>,
    pub time: Option<String>,
    pub remaining: Option<String>,
    pub parent: Option<String>,
    pub arguments: Vec<String>,
}

impl ParsedOptions {
    /// The positional words rejoined as free text (an issue summary, usually).
    pub fn rest(&self) -> String {
        self.arguments.join(" ")
    }

    pub fn has_field_options(&self) -> bool {
        self.project_key.is_some()
            || self.component.is_some()
            || self.summary.is_some()
            || self.assignee.is_some()
            || self.fix_version.is_some()
            || self.description.is_some()
            || self.time.is_some()
            || self.remaining.is_some()
            || self.parent.is_some()
    }

    fn bind(&mut self, flag: Flag, value: String) {
        let slot = match flag {
            Flag::ProjectKey => &mut self.project_key,
            Flag::Component => &mut self.component,
            Flag::Summary => &mut self.summary,
            Flag::Assignee => &mut self.assignee,
            Flag::FixVersion => &mut self.fix_version,
            Flag::Description => &mut self.description,
            Flag::Time => &mut self.time,
            Flag::Remaining => &mut self.remaining,
            Flag::Parent => &mut self.parent,
        };
        *slot = Some(value);
    }
}

/// Parses one trailing free-text string into options and positional arguments.
/// Unknown flags fail the whole parse; nothing is silently dropped.
pub fn parse_options(input: &str) -> Result<ParsedOptions, OptionError> {
    let tokens = tokenize(input);
    let mut parsed = ParsedOptions::default();
    let mut iter = tokens.into_iter().peekable();
    while let Some(token) = iter.next() {
        if !is_flag_marker(&token) {
            parsed
                .arguments
                .extend(token.split_whitespace().map(str::to_string));
            continue;
        }
        let flag = Flag::from_marker(&token).ok_or(OptionError::Unrecognized(token.clone()))?;
        let has_value = iter.peek().is_some_and(|next| !is_flag_marker(next));
        if !has_value {
            return Err(OptionError::MissingArgument(token));
        }
        let value = iter.next().unwrap_or_default();
        parsed.bind(flag, trim_value(&value));
    }
    Ok(parsed)
}

/// Splits the input so every flag marker stands alone and adjacent free text
/// stays joined: `foo bar -c infra -a alice desc` becomes
/// `["foo bar", "-c", "infra", "-a", "alice desc"]`.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for word in input.split_whitespace() {
        if is_flag_marker(word) {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            tokens.push(word.to_string());
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn is_flag_marker(word: &str) -> bool {
    let mut chars = word.chars();
    if chars.next() != Some('-') {
        return false;
    }
    match chars.next() {
        Some('-') => chars.next().is_some(),
        Some(letter) => letter.is_ascii_alphabetic() && chars.next().is_none(),
        None => false,
    }
}

fn trim_value(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}
