use issuebot::config::Settings;
use issuebot::context::CommandContext;
use issuebot::handlers::Dispatcher;
use issuebot::repl::run_repl_stdio;
use issuebot::tracker::http::HttpTrackerClient;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_SETTINGS_FILE: &str = "issuebot.yaml";

fn run() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let settings_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));
    let channel = args.next().unwrap_or_else(|| "local".to_string());
    let user = std::env::var("USER").unwrap_or_else(|_| "local".to_string());

    let settings = Settings::from_path(&settings_path).map_err(|e| e.to_string())?;
    let client = HttpTrackerClient::from_settings(&settings).map_err(|e| e.to_string())?;
    let dispatcher = Dispatcher::new(&client, &settings).map_err(|e| e.to_string())?;
    let context = CommandContext::for_channel(user, channel, &settings);
    run_repl_stdio(&dispatcher, &context)
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
