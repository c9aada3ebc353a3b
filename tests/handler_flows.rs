use issuebot::config::{ChannelSettings, Settings};
use issuebot::context::CommandContext;
use issuebot::handlers::Dispatcher;
use issuebot::reply::{Rendered, Reply};
use issuebot::tracker::{RequestOutcome, TrackerApi, TrackerResponse, TransportFailure};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashMap;

/// Canned tracker: each operation looks up a scripted outcome by call key and
/// records the call. Unscripted calls answer 404 with no body.
#[derive(Default)]
struct MockTracker {
    outcomes: HashMap<String, RequestOutcome>,
    calls: RefCell<Vec<String>>,
    sent_fields: RefCell<Option<Value>>,
}

impl MockTracker {
    fn script(mut self, call: &str, outcome: RequestOutcome) -> Self {
        self.outcomes.insert(call.to_string(), outcome);
        self
    }

    fn respond(self, call: &str, status: u16, body: Value) -> Self {
        self.script(call, Ok(TrackerResponse::new(status, Some(body))))
    }

    fn answer(&self, call: String) -> RequestOutcome {
        self.calls.borrow_mut().push(call.clone());
        self.outcomes
            .get(&call)
            .cloned()
            .unwrap_or(Ok(TrackerResponse::new(404u16, None)))
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl TrackerApi for MockTracker {
    fn browse_url(&self, key: &str) -> String {
        format!("https://tracker.example.com/browse/{key}")
    }

    fn projects(&self) -> RequestOutcome {
        self.answer("projects".to_string())
    }

    fn users(&self, project: &str) -> RequestOutcome {
        self.answer(format!("users {project}"))
    }

    fn issue(&self, key: &str) -> RequestOutcome {
        self.answer(format!("issue {key}"))
    }

    fn delete_issue(&self, key: &str) -> RequestOutcome {
        self.answer(format!("delete {key}"))
    }

    fn create_issue(&self, fields: &Value) -> RequestOutcome {
        *self.sent_fields.borrow_mut() = Some(fields.clone());
        self.answer("create".to_string())
    }

    fn update_issue(&self, key: &str, fields: &Value) -> RequestOutcome {
        *self.sent_fields.borrow_mut() = Some(fields.clone());
        self.answer(format!("update {key}"))
    }

    fn assign_issue(&self, key: &str, assignee: &str) -> RequestOutcome {
        self.answer(format!("assign {key} {assignee}"))
    }

    fn comment_issue(&self, key: &str, comment: &str) -> RequestOutcome {
        self.answer(format!("comment {key} {comment}"))
    }

    fn resolve_issue(&self, key: &str, comment: &str) -> RequestOutcome {
        self.answer(format!("resolve {key} {comment}"))
    }

    fn priorities(&self) -> RequestOutcome {
        self.answer("priorities".to_string())
    }

    fn components(&self, project: &str) -> RequestOutcome {
        self.answer(format!("components {project}"))
    }

    fn matching_components(&self, project: &str, name: &str) -> RequestOutcome {
        self.answer(format!("matching_components {project} {name}"))
    }

    fn versions(&self, project: &str) -> RequestOutcome {
        self.answer(format!("versions {project}"))
    }

    fn search(&self, text: &str, projects: &[String]) -> RequestOutcome {
        self.answer(format!("search {text} [{}]", projects.join(",")))
    }

    fn jql(&self, query: &str) -> RequestOutcome {
        self.answer(format!("jql {query}"))
    }

    fn recent_issues(&self, projects: &[String]) -> RequestOutcome {
        self.answer(format!("recent [{}]", projects.join(",")))
    }
}

fn settings_with_channel(channel: &str, keys: &[&str]) -> Settings {
    let mut settings = Settings::new("https://tracker.example.com");
    settings.channels.insert(
        channel.to_string(),
        ChannelSettings {
            project_keys: keys.iter().map(|key| key.to_string()).collect(),
        },
    );
    settings
}

fn dispatch(api: &MockTracker, settings: &Settings, channel: &str, command: &str) -> Reply {
    let dispatcher = Dispatcher::new(api, settings).expect("dispatcher");
    let context = CommandContext::for_channel("alice", channel, settings);
    dispatcher.dispatch(&context, command)
}

fn display(reply: &Reply) -> String {
    reply.value().map(Rendered::to_display).expect("success value")
}

fn issue(key: &str, summary: &str) -> Value {
    json!({"key": key, "fields": {"summary": summary, "status": {"name": "Open"}}})
}

#[test]
fn show_renders_the_long_form_with_browse_url() {
    let api = MockTracker::default().respond("issue OPS-1", 200, issue("OPS-1", "totals are wrong"));
    let settings = Settings::new("https://tracker.example.com");

    let reply = dispatch(&api, &settings, "anywhere", "show OPS-1");
    let text = display(&reply);
    assert!(text.starts_with("OPS-1: totals are wrong (Open)"), "{text}");
    assert!(text.ends_with("https://tracker.example.com/browse/OPS-1"), "{text}");
}

#[test]
fn forbidden_status_wins_over_the_error_body() {
    let api = MockTracker::default().respond(
        "issue OPS-1",
        403,
        json!({"errorMessages": ["you shall not pass"]}),
    );
    let settings = Settings::new("https://tracker.example.com");

    let reply = dispatch(&api, &settings, "anywhere", "show OPS-1");
    assert_eq!(
        reply.error_message(),
        Some("403 Forbidden. Verify your credentials?")
    );
}

#[test]
fn two_hundred_with_embedded_errors_is_an_error_reply() {
    let api = MockTracker::default().respond(
        "issue OPS-1",
        200,
        json!({"errors": {"summary": "required"}}),
    );
    let settings = Settings::new("https://tracker.example.com");

    let reply = dispatch(&api, &settings, "anywhere", "show OPS-1");
    assert_eq!(reply.error_message(), Some("summary: required"));
}

#[test]
fn bodyless_error_uses_the_status_fallback() {
    let api = MockTracker::default();
    let settings = Settings::new("https://tracker.example.com");

    let reply = dispatch(&api, &settings, "anywhere", "show OPS-9");
    assert_eq!(reply.error_message(), Some("404 API error"));
}

#[test]
fn unrecognized_commands_never_reach_a_handler() {
    let api = MockTracker::default();
    let settings = Settings::new("https://tracker.example.com");

    let reply = dispatch(&api, &settings, "anywhere", "deploy the thing");
    assert_eq!(
        reply.error_message(),
        Some("unrecognized command `deploy the thing`")
    );
    assert!(api.calls().is_empty());
}

#[test]
fn resolve_reports_a_missing_issue_as_its_own_error() {
    let api = MockTracker::default();
    let settings = Settings::new("https://tracker.example.com");

    let reply = dispatch(&api, &settings, "anywhere", "resolve OPS-1 fixed in build 7");
    assert_eq!(reply.error_message(), Some("no issue `OPS-1` found"));
    assert_eq!(api.calls(), vec!["issue OPS-1".to_string()]);
}

#[test]
fn resolve_transitions_after_a_successful_lookup() {
    let api = MockTracker::default()
        .respond("issue OPS-1", 200, issue("OPS-1", "totals"))
        .script(
            "resolve OPS-1 fixed in build 7",
            Ok(TrackerResponse::new(204u16, None)),
        );
    let settings = Settings::new("https://tracker.example.com");

    let reply = dispatch(&api, &settings, "anywhere", "resolve OPS-1 fixed in build 7");
    assert_eq!(display(&reply), "resolved OPS-1");
    assert_eq!(
        api.calls(),
        vec![
            "issue OPS-1".to_string(),
            "resolve OPS-1 fixed in build 7".to_string(),
        ]
    );
}

#[test]
fn versions_concatenate_in_project_resolution_order() {
    let api = MockTracker::default()
        .respond("versions NET", 200, json!([{"name": "2.0.0"}]))
        .respond(
            "versions OPS",
            200,
            json!([{"name": "1.0.0", "released": true}]),
        );
    let settings = settings_with_channel("infra-room", &["NET", "OPS"]);

    let reply = dispatch(&api, &settings, "infra-room", "versions");
    assert_eq!(
        display(&reply),
        "NET:\n2.0.0\nOPS:\n1.0.0 [released]"
    );
    assert_eq!(
        api.calls(),
        vec!["versions NET".to_string(), "versions OPS".to_string()]
    );
}

#[test]
fn one_failing_project_is_reported_inline_not_fatally() {
    let api = MockTracker::default()
        .script(
            "versions NET",
            Err(TransportFailure {
                reason: "connection refused".to_string(),
                status: None,
                body: None,
            }),
        )
        .respond("versions OPS", 200, json!([{"name": "1.0.0"}]));
    let settings = settings_with_channel("infra-room", &["NET", "OPS"]);

    let reply = dispatch(&api, &settings, "infra-room", "versions");
    assert_eq!(display(&reply), "NET: unknown API error\nOPS:\n1.0.0");
}

#[test]
fn explicit_project_key_overrides_channel_defaults() {
    let api = MockTracker::default().respond("versions LAB", 200, json!([{"name": "0.1.0"}]));
    let settings = settings_with_channel("infra-room", &["NET", "OPS"]);

    let reply = dispatch(&api, &settings, "infra-room", "versions LAB");
    assert_eq!(display(&reply), "0.1.0");
    assert_eq!(api.calls(), vec!["versions LAB".to_string()]);
}

#[test]
fn users_without_any_project_context_is_a_local_error() {
    let api = MockTracker::default();
    let settings = Settings::new("https://tracker.example.com");

    let reply = dispatch(&api, &settings, "anywhere", "users");
    assert_eq!(
        reply.error_message(),
        Some("no project context; pass a project key or set a channel or global default")
    );
    assert!(api.calls().is_empty());
}

#[test]
fn search_scopes_to_the_channel_projects() {
    let api = MockTracker::default().respond(
        "search broken totals [NET,OPS]",
        200,
        json!({"issues": [issue("NET-3", "broken totals in report")]}),
    );
    let settings = settings_with_channel("infra-room", &["NET", "OPS"]);

    let reply = dispatch(&api, &settings, "infra-room", "search broken totals");
    assert_eq!(display(&reply), "NET-3: broken totals in report (Open)");
}

#[test]
fn create_builds_fields_from_options_and_reports_the_new_key() {
    let api = MockTracker::default()
        .respond(
            "matching_components OPS bill",
            200,
            json!([{"id": "10", "name": "billing"}]),
        )
        .respond("create", 201, json!({"id": "99", "key": "OPS-9"}));
    let settings = settings_with_channel("infra-room", &["OPS"]);

    let reply = dispatch(
        &api,
        &settings,
        "infra-room",
        "create fix the totals -c bill -a alice -d \"numbers are wrong\"",
    );
    assert_eq!(
        display(&reply),
        "created OPS-9: https://tracker.example.com/browse/OPS-9"
    );

    let fields = api.sent_fields.borrow().clone().expect("fields sent");
    assert_eq!(fields["project"]["key"], "OPS");
    assert_eq!(fields["summary"], "fix the totals");
    assert_eq!(fields["issuetype"]["name"], "Task");
    assert_eq!(fields["assignee"]["name"], "alice");
    assert_eq!(fields["description"], "numbers are wrong");
    assert_eq!(fields["components"][0]["name"], "billing");
}

#[test]
fn create_with_a_parent_key_becomes_a_subtask() {
    let api = MockTracker::default().respond("create", 201, json!({"key": "OPS-10"}));
    let settings = settings_with_channel("infra-room", &["OPS"]);

    let reply = dispatch(&api, &settings, "infra-room", "create split the work -p OPS-9");
    assert!(!reply.is_error(), "{reply:?}");

    let fields = api.sent_fields.borrow().clone().expect("fields sent");
    assert_eq!(fields["issuetype"]["name"], "Sub-task");
    assert_eq!(fields["parent"]["key"], "OPS-9");
}

#[test]
fn create_with_an_unknown_component_fails_before_the_create_call() {
    let api = MockTracker::default().respond("matching_components OPS warp", 200, json!([]));
    let settings = settings_with_channel("infra-room", &["OPS"]);

    let reply = dispatch(&api, &settings, "infra-room", "create add warp drive -c warp");
    assert_eq!(
        reply.error_message(),
        Some("no component matching `warp` in OPS")
    );
    assert_eq!(api.calls(), vec!["matching_components OPS warp".to_string()]);
}

#[test]
fn create_with_an_unknown_option_fails_fast() {
    let api = MockTracker::default();
    let settings = settings_with_channel("infra-room", &["OPS"]);

    let reply = dispatch(&api, &settings, "infra-room", "create fix totals -x oops");
    assert_eq!(reply.error_message(), Some("unrecognized option `-x`"));
    assert!(api.calls().is_empty());
}

#[test]
fn update_sends_only_the_requested_fields() {
    let api = MockTracker::default().script(
        "update OPS-1",
        Ok(TrackerResponse::new(204u16, None)),
    );
    let settings = Settings::new("https://tracker.example.com");

    let reply = dispatch(
        &api,
        &settings,
        "anywhere",
        "update OPS-1 -s clearer summary -t 3d -r 1d",
    );
    assert_eq!(display(&reply), "updated OPS-1");

    let fields = api.sent_fields.borrow().clone().expect("fields sent");
    assert_eq!(fields["summary"], "clearer summary");
    assert_eq!(fields["timetracking"]["originalEstimate"], "3d");
    assert_eq!(fields["timetracking"]["remainingEstimate"], "1d");
    assert!(fields.get("assignee").is_none());
}

#[test]
fn update_without_options_is_a_local_error() {
    let api = MockTracker::default();
    let settings = Settings::new("https://tracker.example.com");

    let reply = dispatch(&api, &settings, "anywhere", "update OPS-1");
    assert_eq!(
        reply.error_message(),
        Some("nothing to update; pass at least one option")
    );
    assert!(api.calls().is_empty());
}

#[test]
fn assign_and_comment_confirm_the_mutation() {
    let api = MockTracker::default()
        .script("assign OPS-1 alice", Ok(TrackerResponse::new(204u16, None)))
        .script(
            "comment OPS-1 looks fixed to me",
            Ok(TrackerResponse::new(201u16, Some(json!({"id": "5"})))),
        );
    let settings = Settings::new("https://tracker.example.com");

    let reply = dispatch(&api, &settings, "anywhere", "assign OPS-1 alice");
    assert_eq!(display(&reply), "assigned OPS-1 to alice");

    let reply = dispatch(&api, &settings, "anywhere", "comment OPS-1 looks fixed to me");
    assert_eq!(display(&reply), "commented on OPS-1");
}

#[test]
fn parse_pulls_the_issue_behind_a_browse_link() {
    let api = MockTracker::default().respond("issue NET-7", 200, issue("NET-7", "switch is down"));
    let settings = Settings::new("https://tracker.example.com");

    let reply = dispatch(
        &api,
        &settings,
        "anywhere",
        "parse have a look at https://tracker.example.com/browse/NET-7 please",
    );
    assert_eq!(display(&reply), "NET-7: switch is down (Open)");
}

#[test]
fn repl_session_dispatches_lines_and_renders_replies() {
    use issuebot::repl::run_repl;
    use std::io::Cursor;

    let api = MockTracker::default().respond("issue OPS-1", 200, issue("OPS-1", "totals"));
    let settings = Settings::new("https://tracker.example.com");
    let dispatcher = Dispatcher::new(&api, &settings).expect("dispatcher");
    let context = CommandContext::for_channel("alice", "local", &settings);

    let mut input = Cursor::new("show OPS-1\nbogus\n/exit\n");
    let mut output = Vec::new();
    run_repl(&dispatcher, &context, &mut input, &mut output).expect("repl");

    let transcript = String::from_utf8(output).expect("utf8");
    assert!(transcript.contains("OPS-1: totals (Open)"), "{transcript}");
    assert!(transcript.contains("error: unrecognized command `bogus`"), "{transcript}");
}
