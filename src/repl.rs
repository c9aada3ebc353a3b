//! Local stdin/stdout command session: the bundled stand-in for a chat
//! platform adapter. Reads one command per line, dispatches it, prints the
//! rendered result. Generic over reader/writer so the loop is testable.

use crate::context::CommandContext;
use crate::handlers::Dispatcher;
use crate::reply::Reply;
use std::io::{self, BufRead, Write};
use tracing::debug;

const EXIT_COMMANDS: &[&str] = &["/exit", "exit", "quit"];

pub fn run_repl_stdio(dispatcher: &Dispatcher<'_>, context: &CommandContext) -> Result<(), String> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut output = stdout.lock();
    run_repl(dispatcher, context, &mut input, &mut output)
}

pub fn run_repl<R: BufRead, W: Write>(
    dispatcher: &Dispatcher<'_>,
    context: &CommandContext,
    input: &mut R,
    output: &mut W,
) -> Result<(), String> {
    writeln!(output, "issuebot session user={} channel={}", context.user, context.channel)
        .map_err(write_error)?;
    writeln!(output, "type `help` for commands, `/exit` to quit").map_err(write_error)?;

    loop {
        write!(output, "{}> ", context.user).map_err(write_error)?;
        output.flush().map_err(write_error)?;

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .map_err(|e| format!("failed to read input: {e}"))?;
        if read == 0 {
            break;
        }

        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if is_exit_command(command) {
            break;
        }

        debug!(command, "read command");
        render_reply(output, &dispatcher.dispatch(context, command))?;
    }

    Ok(())
}

fn render_reply<W: Write>(output: &mut W, reply: &Reply) -> Result<(), String> {
    match reply {
        Reply::Success { value, .. } => {
            writeln!(output, "{}", value.to_display()).map_err(write_error)
        }
        Reply::Failure { error } => writeln!(output, "error: {error}").map_err(write_error),
    }
}

fn is_exit_command(command: &str) -> bool {
    EXIT_COMMANDS
        .iter()
        .any(|exit| command.eq_ignore_ascii_case(exit))
}

fn write_error(err: io::Error) -> String {
    format!("failed to write output: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_commands_are_case_insensitive() {
        assert!(is_exit_command("/exit"));
        assert!(is_exit_command("EXIT"));
        assert!(is_exit_command("Quit"));
        assert!(!is_exit_command("show OPS-1"));
    }
}
