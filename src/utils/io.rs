//! File I/O primitives with consistent error handling.

use crate::error::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Read file contents with standardized error handling.
///
/// Wraps `fs::read_to_string` with consistent `Error::internal_io` formatting.
pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::internal_io(
                format!("File not found: {}", path.display()),
                Some(operation.to_string()),
            )
        } else {
            Error::internal_io(e.to_string(), Some(operation.to_string()))
        }
    })
}

/// Open a file for streaming reads, with the same error shape as [`read_file`].
pub fn open_file(path: &Path, operation: &str) -> Result<fs::File> {
    fs::File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::internal_io(
                format!("File not found: {}", path.display()),
                Some(operation.to_string()),
            )
        } else {
            Error::internal_io(
                format!("{}: {}", path.display(), e),
                Some(operation.to_string()),
            )
        }
    })
}

/// Write content to file atomically.
///
/// Content goes to a uniquely named temp file in the target's directory, which
/// is then renamed over the target. Readers see either the old or the new
/// content, and concurrent writers never share a temp file.
pub fn write_file_atomic(path: &Path, content: &str, operation: &str) -> Result<()> {
    write_bytes_atomic(path, content.as_bytes(), operation)
}

pub fn write_bytes_atomic(path: &Path, content: &[u8], operation: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        Some(_) => Path::new("."),
        None => {
            return Err(Error::internal_io(
                format!("Invalid path: {}", path.display()),
                Some(operation.to_string()),
            ))
        }
    };

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("{} (create temp)", operation))))?;

    tmp.write_all(content)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("{} (write temp)", operation))))?;

    // Keep the original file's mode; a fresh temp file is 0600.
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions()).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("{} (chmod temp)", operation)))
        })?;
    }

    tmp.persist(path)
        .map_err(|e| Error::internal_io(e.error.to_string(), Some(format!("{} (rename)", operation))))?;

    Ok(())
}

/// Create a directory and its parents if missing.
pub fn ensure_dir(dir: &Path, operation: &str) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .map_err(|e| Error::internal_io(e.to_string(), Some(operation.to_string())))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn read_file_succeeds_for_existing_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "test content").unwrap();

        let content = read_file(temp.path(), "test read").unwrap();
        assert!(content.contains("test content"));
    }

    #[test]
    fn open_file_reports_missing_path() {
        let err = open_file(Path::new("/nonexistent/input.csv"), "open csv input").unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
        assert!(err.message.contains("File not found"));
    }

    #[test]
    fn read_file_returns_error_for_missing_file() {
        let result = read_file(Path::new("/nonexistent/path.txt"), "test read");
        let err = result.unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
        assert!(err.message.contains("File not found"));
    }

    #[test]
    fn write_file_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "old").unwrap();

        write_file_atomic(&path, "new", "test write").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn write_file_atomic_keeps_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o664)).unwrap();

        write_file_atomic(&path, "new", "test write").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o664);
    }

    #[test]
    fn write_file_atomic_fails_for_missing_dir() {
        let result = write_file_atomic(Path::new("/nonexistent/dir/file.txt"), "x", "test write");
        assert_eq!(result.unwrap_err().code.as_str(), "internal.io_error");
    }

    #[test]
    fn ensure_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        ensure_dir(&nested, "test mkdir").unwrap();
        assert!(nested.is_dir());
    }
}
