//! Terminal prompting for the interactive steps.

use std::io::{self, BufRead, Write};

/// Print `message` on stderr and read one line from stdin, trimmed.
/// Works with piped input too; end of input yields an empty string.
pub fn prompt(message: &str) -> opskit::Result<String> {
    eprint!("{}", message);
    io::stderr().flush().ok();

    let stdin = io::stdin();
    let mut line = String::new();
    stdin.lock().read_line(&mut line).map_err(|e| {
        opskit::Error::new(
            opskit::ErrorCode::InternalIoError,
            format!("Failed to read input: {}", e),
            serde_json::Value::Null,
        )
    })?;

    Ok(line.trim().to_string())
}
