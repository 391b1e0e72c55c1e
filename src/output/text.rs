//! Plain-text rendering for terminals and cron mail.

use std::io::{self, Write};

use opskit::log::{self, Level};
use opskit::Error;

use super::exit_code_for_error;

/// Human-readable result lines, printed after the command's INFO lines.
pub trait TextReport {
    fn text_lines(&self) -> Vec<String>;
}

fn print_lines(lines: &[String]) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for line in lines {
        if writeln!(handle, "{}", line).is_err() {
            return;
        }
    }
}

fn print_error(err: &Error) {
    log::emit(Level::Fatal, format_args!("{}", err.message));

    // Captured stderr of a failed external command.
    if let Some(stderr) = err.details.get("stderr").and_then(|v| v.as_str()) {
        if !stderr.is_empty() {
            eprintln!("{}", stderr);
        }
    }
    for hint in &err.hints {
        log::emit(Level::Fatal, format_args!("hint: {}", hint.message));
    }
}

pub fn print_text_result<T: TextReport>(result: opskit::Result<(T, i32)>) -> i32 {
    match result {
        Ok((data, exit_code)) => {
            print_lines(&data.text_lines());
            exit_code
        }
        Err(err) => {
            print_error(&err);
            exit_code_for_error(err.code)
        }
    }
}
