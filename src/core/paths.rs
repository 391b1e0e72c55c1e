use crate::error::{Error, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Base opskit config directory (~/.config/opskit/ on Unix, %APPDATA%\opskit on Windows)
pub fn opskit() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected(
                "APPDATA environment variable not set on Windows".to_string(),
            )
        })?;
        Ok(PathBuf::from(appdata).join("opskit"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected(
                "HOME environment variable not set on Unix-like system".to_string(),
            )
        })?;
        Ok(PathBuf::from(home).join(".config").join("opskit"))
    }
}

/// Global opskit.json config file path
pub fn opskit_json() -> Result<PathBuf> {
    Ok(opskit()?.join("opskit.json"))
}

/// Expand `~` and `$VARS` in a configured path.
pub fn expand(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw).map_err(|e| {
        Error::config_invalid_value("path", Some(raw.to_string()), e.to_string())
    })?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Directory a repository is cloned into.
pub fn repo_dir(apps_dir: &Path, name: &str) -> PathBuf {
    apps_dir.join(name)
}
