/// Macro for prefixed status logging to stderr (only when stderr is a terminal).
///
/// Usage:
/// ```ignore
/// log_status!("watermark", "Scaling {} to {}x{}", path, w, h);
/// ```
#[macro_export]
macro_rules! log_status {
    ($prefix:expr, $($arg:tt)*) => {
        if ::std::io::IsTerminal::is_terminal(&::std::io::stderr()) {
            eprintln!(concat!("[", $prefix, "] {}"), format_args!($($arg)*));
        }
    };
}

/// Macro for `INFO`-prefixed progress lines.
///
/// Lines go to stdout in text mode and to stderr when the CLI renders JSON,
/// see [`log::route_to_stderr`].
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::log::emit($crate::log::Level::Info, format_args!($($arg)*))
    };
}

pub mod core;
pub mod utils;

// Re-export everything from core for ergonomic library use
// Users can write `opskit::provision` instead of `opskit::core::provision`
pub use core::*;
pub use utils::*;
