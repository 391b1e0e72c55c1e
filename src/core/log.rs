//! Prefixed progress lines (`INFO: ...`, `FATAL: ...`).
//!
//! Text-mode commands print these on stdout next to their results. When the
//! CLI renders the JSON envelope, stdout must stay machine-readable, so the
//! lines are routed to stderr instead.

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

static TO_STDERR: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Fatal,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Fatal => "FATAL",
        }
    }
}

pub fn route_to_stderr(enabled: bool) {
    TO_STDERR.store(enabled, Ordering::Relaxed);
}

pub fn format_line(level: Level, message: &str) -> String {
    format!("{}: {}", level.as_str(), message)
}

pub fn emit(level: Level, args: fmt::Arguments<'_>) {
    let line = format_line(level, &args.to_string());
    // Broken pipes are ignored; there is nobody left to tell.
    if TO_STDERR.load(Ordering::Relaxed) {
        let _ = writeln!(io::stderr().lock(), "{}", line);
    } else {
        let _ = writeln!(io::stdout().lock(), "{}", line);
    }
}
