use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationMissingArgument,
    ValidationInvalidArgument,
    ValidationInvalidJson,

    ProvisionMarkerNotFound,
    ProvisionAlreadyRegistered,

    ChangelogNoTags,
    ChangelogDirtyWorktree,

    ExternalCommandFailed,
    GitCommandFailed,

    ImageProcessingFailed,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationMissingArgument => "validation.missing_argument",
            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",
            ErrorCode::ValidationInvalidJson => "validation.invalid_json",

            ErrorCode::ProvisionMarkerNotFound => "provision.marker_not_found",
            ErrorCode::ProvisionAlreadyRegistered => "provision.already_registered",

            ErrorCode::ChangelogNoTags => "changelog.no_tags",
            ErrorCode::ChangelogDirtyWorktree => "changelog.dirty_worktree",

            ErrorCode::ExternalCommandFailed => "external.command_failed",
            ErrorCode::GitCommandFailed => "git.command_failed",

            ErrorCode::ImageProcessingFailed => "image.processing_failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingArgumentDetails {
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Captured result of an external program that exited unsuccessfully.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandFailedDetails {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerNotFoundDetails {
    pub settings_path: String,
    pub marker: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlreadyRegisteredDetails {
    pub settings_path: String,
    pub path: String,
}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    pub fn validation_missing_argument(args: Vec<String>) -> Self {
        Self::new(
            ErrorCode::ValidationMissingArgument,
            "Missing required argument",
            to_details(MissingArgumentDetails { args }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let problem = problem.into();
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.clone(),
            id,
            tried,
        });

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            format!("Invalid argument: {}", problem),
            details,
        )
    }

    pub fn validation_invalid_json(
        err: serde_json::Error,
        context: Option<String>,
        tried: Option<String>,
    ) -> Self {
        let details = serde_json::json!({
            "error": err.to_string(),
            "context": context,
            "tried": tried,
        });

        Self::new(ErrorCode::ValidationInvalidJson, "Invalid JSON", details)
    }

    pub fn provision_marker_not_found(
        settings_path: impl Into<String>,
        marker: impl Into<String>,
    ) -> Self {
        let settings_path = settings_path.into();
        let marker = marker.into();
        Self::new(
            ErrorCode::ProvisionMarkerNotFound,
            format!(
                "Could not find '{}' in {}",
                marker.trim(),
                settings_path
            ),
            to_details(MarkerNotFoundDetails {
                settings_path,
                marker,
            }),
        )
        .with_hint("The settings file must contain a top-level \"repositories\": [ array")
    }

    pub fn provision_already_registered(
        settings_path: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        let settings_path = settings_path.into();
        let path = path.into();
        Self::new(
            ErrorCode::ProvisionAlreadyRegistered,
            format!("A repository with path {} is already registered", path),
            to_details(AlreadyRegisteredDetails {
                settings_path,
                path,
            }),
        )
    }

    pub fn changelog_no_tags(repo: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ChangelogNoTags,
            "No tags found in repository",
            serde_json::json!({ "repo": repo.into() }),
        )
        .with_hint("Create tags for your releases, e.g. 'git tag v1.0.0'")
    }

    pub fn changelog_dirty_worktree(repo: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ChangelogDirtyWorktree,
            "Working tree is not clean",
            serde_json::json!({ "repo": repo.into() }),
        )
        .with_hint("Commit or stash changes before using --commit")
    }

    pub fn external_command_failed(details: CommandFailedDetails) -> Self {
        let message = format!(
            "{} exited with status {}",
            details.command, details.exit_code
        );
        Self::new(ErrorCode::ExternalCommandFailed, message, to_details(details))
    }

    pub fn git_command_failed(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::GitCommandFailed,
            message,
            Value::Object(serde_json::Map::new()),
        )
    }

    pub fn image_processing_failed(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ImageProcessingFailed,
            "Image processing failed",
            serde_json::json!({ "path": path.into(), "error": error.into() }),
        )
    }

    pub fn config_missing_key(key: impl Into<String>, path: Option<String>) -> Self {
        Self::new(
            ErrorCode::ConfigMissingKey,
            "Missing required configuration key",
            to_details(ConfigMissingKeyDetails {
                key: key.into(),
                path,
            }),
        )
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            to_details(ConfigInvalidJsonDetails {
                path: path.into(),
                error: err.to_string(),
            }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            to_details(ConfigInvalidValueDetails {
                key: key.into(),
                value,
                problem: problem.into(),
            }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let error = error.into();
        let message = match &context {
            Some(ctx) => format!("IO error ({}): {}", ctx, error),
            None => format!("IO error: {}", error),
        };
        Self::new(
            ErrorCode::InternalIoError,
            message,
            to_details(InternalIoErrorDetails { error, context }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            to_details(InternalJsonErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::internal_unexpected(message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_message_carries_problem() {
        let err = Error::validation_invalid_argument("name", "must not contain '/'", None, None);
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
        assert!(err.message.contains("must not contain '/'"));
        assert_eq!(err.details["field"], "name");
    }

    #[test]
    fn command_failed_serializes_camel_case() {
        let err = Error::external_command_failed(CommandFailedDetails {
            command: "pm2 restart 0".to_string(),
            cwd: None,
            exit_code: 3,
            stdout: String::new(),
            stderr: "boom".to_string(),
        });
        assert_eq!(err.details["exitCode"], 3);
        assert!(err.details.get("cwd").is_none());
        assert_eq!(err.message, "pm2 restart 0 exited with status 3");
    }

    #[test]
    fn marker_not_found_has_hint() {
        let err = Error::provision_marker_not_found("/tmp/config.json", "\"repositories\": [");
        assert_eq!(err.hints.len(), 1);
        assert_eq!(err.details["settingsPath"], "/tmp/config.json");
    }
}
