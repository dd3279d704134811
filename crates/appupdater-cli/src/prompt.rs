use std::io::{self, BufRead, IsTerminal, Write};

use appupdater_mirror::{CopyDecision, CopyFailure};
use tracing::warn;

/// Asks the operator on the terminal. Without an interactive stdin the copy is
/// aborted.
pub(crate) fn terminal_copy_decision(failure: &CopyFailure) -> CopyDecision {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        warn!(dest = %failure.dest_path.display(), "stdin is not a terminal, aborting copy");
        return CopyDecision::Abort;
    }
    let mut input = stdin.lock();
    let mut output = io::stderr();
    prompt_copy_decision(failure, &mut input, &mut output)
}

pub(crate) fn prompt_copy_decision<R, W>(
    failure: &CopyFailure,
    input: &mut R,
    output: &mut W,
) -> CopyDecision
where
    R: BufRead,
    W: Write,
{
    let _ = writeln!(output, "{}", describe_copy_failure(failure));
    loop {
        let _ = write!(output, "[r]etry / [a]bort: ");
        let _ = output.flush();

        let mut answer = String::new();
        match input.read_line(&mut answer) {
            Ok(0) | Err(_) => return CopyDecision::Abort,
            Ok(_) => {}
        }
        match parse_decision(&answer) {
            Some(decision) => return decision,
            None => {
                let _ = writeln!(output, "please answer 'r' to retry or 'a' to abort");
            }
        }
    }
}

pub(crate) fn describe_copy_failure(failure: &CopyFailure) -> String {
    format!(
        "failed to update {} after {} attempts: {}\nmake sure the application is closed, then retry",
        failure.dest_path.display(),
        failure.attempts,
        failure.error
    )
}

pub(crate) fn parse_decision(answer: &str) -> Option<CopyDecision> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "r" | "retry" => Some(CopyDecision::Retry),
        "a" | "abort" | "c" | "cancel" => Some(CopyDecision::Abort),
        _ => None,
    }
}
