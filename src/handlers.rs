//! The command handlers and the route table that binds them. Each handler is a
//! thin composition: resolve projects and options as needed, issue one logical
//! tracker operation, classify the outcome, and render the payload.

use crate::config::Settings;
use crate::context::CommandContext;
use crate::options::parse_options;
use crate::project::resolve_projects;
use crate::reply::Reply;
use crate::router::{Router, RouterError};
use crate::tracker::classify::classify;
use crate::tracker::{format, RequestOutcome, TrackerApi};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::debug;

const SEARCH_RESULT_LIMIT: usize = 15;
const NO_PROJECT_CONTEXT: &str =
    "no project context; pass a project key or set a channel or global default";

static BROWSE_ISSUE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/browse/([A-Z][A-Z0-9]*-[0-9]+)").expect("issue key pattern"));

pub struct HandlerDeps<'a> {
    pub api: &'a dyn TrackerApi,
    pub settings: &'a Settings,
}

pub type Handler = fn(&HandlerDeps<'_>, &CommandContext, &[String]) -> Reply;

/// The route table, most specific first. All verbs here are mutually
/// exclusive, so `overlaps()` stays empty; the build-time check guards
/// against future additions quietly shadowing one another.
pub fn command_router() -> Result<Router<Handler>, RouterError> {
    Router::builder()
        .route("projects", "projects", handle_projects as Handler)
        .route("parse", r"parse (.+)", handle_parse as Handler)
        .route("show", r"show (\S+)", handle_show as Handler)
        .route("delete", r"delete (\S+)", handle_delete as Handler)
        .route("components", "components", handle_components as Handler)
        .route("versions", r"versions(?: (\S+))?", handle_versions as Handler)
        .route("recent", "recent", handle_recent as Handler)
        .route("pri", "pri", handle_priorities as Handler)
        .route("users", r"users(?: (\S+))?", handle_users as Handler)
        .route("assign", r"assign (\S+) (\S+)", handle_assign as Handler)
        .route("comment", r"comment (\S+) (.+)", handle_comment as Handler)
        .route("search", r"search (.+)", handle_search as Handler)
        .route("jql", r"jql (.+)", handle_jql as Handler)
        .route("create", r"create (.+)", handle_create as Handler)
        .route("update", r"update (\S+)(?: (.+))?", handle_update as Handler)
        .route("resolve", r"resolve (\S+) (.+)", handle_resolve as Handler)
        .route("help", "help", handle_help as Handler)
        .build()
}

/// Routes one raw command string to its handler with an immutable context.
pub struct Dispatcher<'a> {
    router: Router<Handler>,
    deps: HandlerDeps<'a>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(api: &'a dyn TrackerApi, settings: &'a Settings) -> Result<Self, RouterError> {
        Ok(Self {
            router: command_router()?,
            deps: HandlerDeps { api, settings },
        })
    }

    pub fn dispatch(&self, context: &CommandContext, input: &str) -> Reply {
        let input = input.trim();
        match self.router.dispatch(input) {
            Some(matched) => {
                debug!(
                    user = %context.user,
                    channel = %context.channel,
                    route = matched.name,
                    "dispatching command"
                );
                (matched.handler)(&self.deps, context, &matched.captures)
            }
            None => Reply::error(format!("unrecognized command `{input}`")),
        }
    }
}

fn cap<'c>(captures: &'c [String], index: usize) -> &'c str {
    captures.get(index).map(String::as_str).unwrap_or("")
}

fn non_empty(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn browse_issue_key(text: &str) -> Option<String> {
    BROWSE_ISSUE_KEY
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|key| key.as_str().to_string())
}

/// Project prefix of an issue key: `OPS-12` belongs to `OPS`.
fn project_of_key(key: &str) -> &str {
    key.split_once('-').map(|(project, _)| project).unwrap_or(key)
}

fn handle_projects(deps: &HandlerDeps<'_>, _context: &CommandContext, _captures: &[String]) -> Reply {
    match classify(deps.api.projects()) {
        Ok(data) => {
            let lines = data
                .as_array()
                .map(|projects| projects.iter().map(format::project_line).collect())
                .unwrap_or_default();
            Reply::lines(lines, data)
        }
        Err(error) => Reply::error(error),
    }
}

fn handle_parse(deps: &HandlerDeps<'_>, _context: &CommandContext, captures: &[String]) -> Reply {
    let Some(key) = browse_issue_key(cap(captures, 0)) else {
        return Reply::error("no issue link found in text");
    };
    match classify(deps.api.issue(&key)) {
        Ok(data) => {
            let value = format::issue_short(&data);
            Reply::text(value, data)
        }
        Err(error) => Reply::error(error),
    }
}

fn handle_show(deps: &HandlerDeps<'_>, _context: &CommandContext, captures: &[String]) -> Reply {
    let key = cap(captures, 0);
    match classify(deps.api.issue(key)) {
        Ok(data) => {
            let lines = format::issue_long(&data, &deps.api.browse_url(key));
            Reply::lines(lines, data)
        }
        Err(error) => Reply::error(error),
    }
}

fn handle_delete(deps: &HandlerDeps<'_>, _context: &CommandContext, captures: &[String]) -> Reply {
    let key = cap(captures, 0);
    match classify(deps.api.delete_issue(key)) {
        Ok(data) => Reply::text(format!("deleted {key}"), data),
        Err(error) => Reply::error(error),
    }
}

fn handle_components(deps: &HandlerDeps<'_>, context: &CommandContext, _captures: &[String]) -> Reply {
    project_listing(
        deps,
        context,
        None,
        "components",
        |api, project| api.components(project),
        format::component_line,
    )
}

fn handle_versions(deps: &HandlerDeps<'_>, context: &CommandContext, captures: &[String]) -> Reply {
    project_listing(
        deps,
        context,
        non_empty(cap(captures, 0)),
        "versions",
        |api, project| api.versions(project),
        format::version_line,
    )
}

/// One request per resolved project key; output follows resolution order. A
/// single project's failure is reported inline, and the whole command fails
/// only when every project failed.
fn project_listing(
    deps: &HandlerDeps<'_>,
    context: &CommandContext,
    explicit: Option<&str>,
    noun: &str,
    fetch: impl Fn(&dyn TrackerApi, &str) -> RequestOutcome,
    render: impl Fn(&Value) -> String,
) -> Reply {
    let selection = resolve_projects(explicit, context, deps.settings);
    if selection.is_empty() {
        return Reply::error(NO_PROJECT_CONTEXT);
    }
    let multiple = selection.keys().len() > 1;
    let mut lines = Vec::new();
    let mut payloads = Vec::new();
    let mut errors = Vec::new();
    for project in selection.keys() {
        match classify(fetch(deps.api, project)) {
            Ok(data) => {
                if multiple {
                    lines.push(format!("{project}:"));
                }
                match data.as_array() {
                    Some(items) if !items.is_empty() => lines.extend(items.iter().map(&render)),
                    _ => lines.push(format!("no {noun}")),
                }
                payloads.push(data);
            }
            Err(error) => {
                lines.push(format!("{project}: {error}"));
                errors.push(error);
                payloads.push(Value::Null);
            }
        }
    }
    if errors.len() == selection.keys().len() {
        return Reply::error(errors.join(" "));
    }
    Reply::lines(lines, Value::Array(payloads))
}

fn handle_recent(deps: &HandlerDeps<'_>, context: &CommandContext, _captures: &[String]) -> Reply {
    let selection = resolve_projects(None, context, deps.settings);
    search_reply(classify(deps.api.recent_issues(selection.keys())))
}

fn handle_priorities(deps: &HandlerDeps<'_>, _context: &CommandContext, _captures: &[String]) -> Reply {
    match classify(deps.api.priorities()) {
        Ok(data) => {
            let lines = data
                .as_array()
                .map(|priorities| priorities.iter().map(format::priority_line).collect())
                .unwrap_or_default();
            Reply::lines(lines, data)
        }
        Err(error) => Reply::error(error),
    }
}

fn handle_users(deps: &HandlerDeps<'_>, context: &CommandContext, captures: &[String]) -> Reply {
    let selection = resolve_projects(non_empty(cap(captures, 0)), context, deps.settings);
    let Some(project) = selection.primary() else {
        return Reply::error(NO_PROJECT_CONTEXT);
    };
    match classify(deps.api.users(project)) {
        Ok(data) => {
            let lines = data
                .as_array()
                .map(|users| users.iter().map(format::user_line).collect())
                .unwrap_or_default();
            Reply::lines(lines, data)
        }
        Err(error) => Reply::error(error),
    }
}

fn handle_assign(deps: &HandlerDeps<'_>, _context: &CommandContext, captures: &[String]) -> Reply {
    let key = cap(captures, 0);
    let assignee = cap(captures, 1);
    match classify(deps.api.assign_issue(key, assignee)) {
        Ok(data) => Reply::text(format!("assigned {key} to {assignee}"), data),
        Err(error) => Reply::error(error),
    }
}

fn handle_comment(deps: &HandlerDeps<'_>, _context: &CommandContext, captures: &[String]) -> Reply {
    let key = cap(captures, 0);
    match classify(deps.api.comment_issue(key, cap(captures, 1))) {
        Ok(data) => Reply::text(format!("commented on {key}"), data),
        Err(error) => Reply::error(error),
    }
}

fn handle_search(deps: &HandlerDeps<'_>, context: &CommandContext, captures: &[String]) -> Reply {
    let selection = resolve_projects(None, context, deps.settings);
    search_reply(classify(deps.api.search(cap(captures, 0), selection.keys())))
}

fn handle_jql(deps: &HandlerDeps<'_>, _context: &CommandContext, captures: &[String]) -> Reply {
    search_reply(classify(deps.api.jql(cap(captures, 0))))
}

fn search_reply(classified: Result<Value, String>) -> Reply {
    match classified {
        Ok(data) => {
            let lines = format::search_lines(&data, SEARCH_RESULT_LIMIT);
            if lines.is_empty() {
                return Reply::text("no issues found", data);
            }
            Reply::lines(lines, data)
        }
        Err(error) => Reply::error(error),
    }
}

fn handle_create(deps: &HandlerDeps<'_>, context: &CommandContext, captures: &[String]) -> Reply {
    let options = match parse_options(cap(captures, 0)) {
        Ok(options) => options,
        Err(err) => return Reply::error(err.to_string()),
    };
    if options.summary.is_some() {
        return Reply::error("option `-s` is not supported by create; pass the summary as text");
    }
    if options.remaining.is_some() {
        return Reply::error("option `-r` is not supported by create");
    }
    let summary = options.rest();
    if summary.is_empty() {
        return Reply::error(
            "usage: create <summary> [-j key] [-c component] [-a assignee] [-f fixVersion] [-d desc] [-t time] [-p parentKey]",
        );
    }
    let selection = resolve_projects(options.project_key.as_deref(), context, deps.settings);
    let Some(project) = selection.primary() else {
        return Reply::error(NO_PROJECT_CONTEXT);
    };

    let mut fields = Map::new();
    fields.insert("project".to_string(), json!({ "key": project }));
    fields.insert("summary".to_string(), json!(summary));
    let issue_type = if options.parent.is_some() { "Sub-task" } else { "Task" };
    fields.insert("issuetype".to_string(), json!({ "name": issue_type }));
    if let Some(parent) = &options.parent {
        fields.insert("parent".to_string(), json!({ "key": parent }));
    }
    if let Some(description) = &options.description {
        fields.insert("description".to_string(), json!(description));
    }
    if let Some(assignee) = &options.assignee {
        fields.insert("assignee".to_string(), json!({ "name": assignee }));
    }
    if let Some(fix_version) = &options.fix_version {
        fields.insert("fixVersions".to_string(), json!([{ "name": fix_version }]));
    }
    if let Some(time) = &options.time {
        fields.insert("timetracking".to_string(), json!({ "originalEstimate": time }));
    }
    if let Some(component) = &options.component {
        match resolve_component(deps, project, component) {
            Ok(value) => {
                fields.insert("components".to_string(), Value::Array(vec![value]));
            }
            Err(reply) => return reply,
        }
    }

    match classify(deps.api.create_issue(&Value::Object(fields))) {
        Ok(data) => {
            let key = data.get("key").and_then(Value::as_str).unwrap_or("unknown");
            let value = format!("created {key}: {}", deps.api.browse_url(key));
            Reply::text(value, data)
        }
        Err(error) => Reply::error(error),
    }
}

fn handle_update(deps: &HandlerDeps<'_>, _context: &CommandContext, captures: &[String]) -> Reply {
    let key = cap(captures, 0);
    let options = match parse_options(cap(captures, 1)) {
        Ok(options) => options,
        Err(err) => return Reply::error(err.to_string()),
    };
    if options.project_key.is_some() {
        return Reply::error("option `-j` is not supported by update");
    }
    if options.parent.is_some() {
        return Reply::error("option `-p` is not supported by update");
    }
    if !options.has_field_options() {
        return Reply::error("nothing to update; pass at least one option");
    }

    let mut fields = Map::new();
    if let Some(summary) = &options.summary {
        fields.insert("summary".to_string(), json!(summary));
    }
    if let Some(description) = &options.description {
        fields.insert("description".to_string(), json!(description));
    }
    if let Some(assignee) = &options.assignee {
        fields.insert("assignee".to_string(), json!({ "name": assignee }));
    }
    if let Some(fix_version) = &options.fix_version {
        fields.insert("fixVersions".to_string(), json!([{ "name": fix_version }]));
    }
    if options.time.is_some() || options.remaining.is_some() {
        let mut tracking = Map::new();
        if let Some(time) = &options.time {
            tracking.insert("originalEstimate".to_string(), json!(time));
        }
        if let Some(remaining) = &options.remaining {
            tracking.insert("remainingEstimate".to_string(), json!(remaining));
        }
        fields.insert("timetracking".to_string(), Value::Object(tracking));
    }
    if let Some(component) = &options.component {
        match resolve_component(deps, project_of_key(key), component) {
            Ok(value) => {
                fields.insert("components".to_string(), Value::Array(vec![value]));
            }
            Err(reply) => return reply,
        }
    }

    match classify(deps.api.update_issue(key, &Value::Object(fields))) {
        Ok(data) => Reply::text(format!("updated {key}"), data),
        Err(error) => Reply::error(error),
    }
}

/// Matches a partial component name against the project's components and keeps
/// the tracker's exact name. No match is a local validation error.
fn resolve_component(deps: &HandlerDeps<'_>, project: &str, partial: &str) -> Result<Value, Reply> {
    let matches = match classify(deps.api.matching_components(project, partial)) {
        Ok(data) => data,
        Err(error) => return Err(Reply::error(error)),
    };
    match matches.as_array().and_then(|components| components.first()) {
        Some(component) => {
            let name = component
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(partial);
            Ok(json!({ "name": name }))
        }
        None => Err(Reply::error(format!(
            "no component matching `{partial}` in {project}"
        ))),
    }
}

/// Two steps: confirm the issue exists, then transition it. A failed lookup is
/// its own error and never mixes with the transition's classification.
fn handle_resolve(deps: &HandlerDeps<'_>, _context: &CommandContext, captures: &[String]) -> Reply {
    let key = cap(captures, 0);
    if classify(deps.api.issue(key)).is_err() {
        return Reply::error(format!("no issue `{key}` found"));
    }
    match classify(deps.api.resolve_issue(key, cap(captures, 1))) {
        Ok(data) => Reply::text(format!("resolved {key}"), data),
        Err(error) => Reply::error(error),
    }
}

fn handle_help(_deps: &HandlerDeps<'_>, _context: &CommandContext, _captures: &[String]) -> Reply {
    Reply::lines(help_lines(), Value::Null)
}

pub fn help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  projects                             List tracker projects".to_string(),
        "  parse <text-with-a-browse-url>       Show the issue a browse link points at".to_string(),
        "  show <issue-key>                     Show one issue in full".to_string(),
        "  delete <issue-key>                   Delete an issue".to_string(),
        "  components                           List components for the current projects".to_string(),
        "  versions [<project-key>]             List versions for the current projects".to_string(),
        "  recent                               Recently updated issues".to_string(),
        "  pri                                  List priorities".to_string(),
        "  users [<project-key>]                List assignable users".to_string(),
        "  assign <issue-key> <assignee>        Assign an issue".to_string(),
        "  comment <issue-key> <comment...>     Comment on an issue".to_string(),
        "  search <query...>                    Full-text issue search".to_string(),
        "  jql <jql...>                         Raw JQL search".to_string(),
        "  create <summary> [options]           Create an issue (-j -c -a -f -d -t -p)".to_string(),
        "  update <issue-key> [options]         Update an issue (-s -c -a -f -d -t -r)".to_string(),
        "  resolve <issue-key> <comment...>     Resolve an issue with a comment".to_string(),
    ]
}
