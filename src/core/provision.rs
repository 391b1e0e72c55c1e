//! Registering a repository with Git-Auto-Deploy.
//!
//! The repository is cloned under the apps directory, made accessible to the
//! deploy service, and a new entry is spliced into the `repositories` array of
//! the service's settings file. The splice is textual so the rest of the file
//! keeps its exact formatting; the result is parsed before it replaces the
//! original.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json_path::JsonPath;
use std::path::{Path, PathBuf};

use crate::defaults::ProvisionConfig;
use crate::error::{Error, Result};
use crate::template::{self, TemplateVars};
use crate::{git, io, log_info, paths, permissions, validation};

pub const REPO_NAME_PATTERN: &str = r"^[a-zA-Z0-9_.-]+$";

/// One entry of the Git-Auto-Deploy `repositories` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployRecord {
    pub url: String,
    pub branch: String,
    pub remote: String,
    pub path: String,
    pub deploy: String,
    #[serde(rename = "secret-token")]
    pub secret_token: String,
}

/// Everything a provisioning run needs, resolved from the name and config.
#[derive(Debug, Clone)]
pub struct ProvisionPlan {
    pub name: String,
    pub url: String,
    pub branch: String,
    pub clone_branch: Option<String>,
    pub remote: String,
    pub repo_dir: PathBuf,
    pub settings_path: PathBuf,
    pub marker: String,
    pub group_mode: String,
    pub token_length: usize,
    pub webhook_url: String,
    pub service_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionOutput {
    pub name: String,
    pub url: String,
    pub branch: String,
    pub path: String,
    pub cloned: bool,
    pub safe_directory_added: bool,
    pub settings_file: String,
    pub webhook_url: String,
    pub secret_token: String,
    pub service_name: String,
}

/// Settings content split at the end of the repositories marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsSplit<'a> {
    /// Everything up to and including the marker
    pub head: &'a str,
    /// The array contents onward
    pub tail: &'a str,
}

/// Check the repository name against the allow-list. A missing name is an error.
pub fn validate_repo_name(name: Option<&str>) -> Result<&str> {
    let name = validation::require(name, "name")?;
    validation::require_match(name, "name", REPO_NAME_PATTERN)?;
    if name == "." || name == ".." {
        return Err(Error::validation_invalid_argument(
            "name",
            "Name cannot be '.' or '..'",
            Some(name.to_string()),
            None,
        ));
    }
    Ok(name)
}

/// Resolve clone URL, target directory and settings file for `name`.
pub fn plan(name: &str, config: &ProvisionConfig) -> Result<ProvisionPlan> {
    let name = validate_repo_name(Some(name))?;

    if !template::is_present(&config.repo_url_template, TemplateVars::NAME) {
        return Err(Error::config_invalid_value(
            "defaults.provision.repo_url_template",
            Some(config.repo_url_template.clone()),
            "Template must contain {{name}}",
        ));
    }
    if config.token_length == 0 {
        return Err(Error::config_invalid_value(
            "defaults.provision.token_length",
            Some("0".to_string()),
            "Token length must be positive",
        ));
    }

    let apps_dir = paths::expand(&config.apps_dir)?;

    Ok(ProvisionPlan {
        name: name.to_string(),
        url: template::render(&config.repo_url_template, &[(TemplateVars::NAME, name)]),
        branch: config.branch.clone(),
        clone_branch: config.clone_branch.clone(),
        remote: config.remote.clone(),
        repo_dir: paths::repo_dir(&apps_dir, name),
        settings_path: paths::expand(&config.settings_file)?,
        marker: config.repositories_marker.clone(),
        group_mode: config.group_mode.clone(),
        token_length: config.token_length,
        webhook_url: config.webhook_url.clone(),
        service_name: config.service_name.clone(),
    })
}

/// Pseudo-random alphanumeric token of `len` characters.
pub fn generate_secret_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Split `content` right after the first occurrence of `marker`.
pub fn split_settings<'a>(content: &'a str, marker: &str) -> Option<SettingsSplit<'a>> {
    if marker.is_empty() {
        return None;
    }
    let start = content.find(marker)?;
    let (head, tail) = content.split_at(start + marker.len());
    Some(SettingsSplit { head, tail })
}

fn parse_settings(content: &str, settings_path: &Path) -> Result<Value> {
    serde_json::from_str(content)
        .map_err(|e| Error::config_invalid_json(settings_path.display().to_string(), e))
}

fn query<'a>(expr: &str, doc: &'a Value) -> Result<Vec<&'a Value>> {
    let path = JsonPath::parse(expr)
        .map_err(|e| Error::internal_unexpected(format!("Invalid JSONPath {}: {}", expr, e)))?;
    Ok(path.query(doc).all())
}

/// `path` of every record in the repositories array.
pub fn registered_paths(doc: &Value) -> Result<Vec<String>> {
    Ok(query("$.repositories[*].path", doc)?
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect())
}

fn same_path(a: &str, b: &str) -> bool {
    let trim = |s: &str| s.trim_end_matches('/').to_string();
    trim(a) == trim(b)
}

/// Reject when a record for `path` is already present.
pub fn ensure_not_registered(doc: &Value, path: &str, settings_path: &Path) -> Result<()> {
    if registered_paths(doc)?.iter().any(|p| same_path(p, path)) {
        return Err(Error::provision_already_registered(
            settings_path.display().to_string(),
            path,
        ));
    }
    Ok(())
}

fn line_indent(head: &str) -> &str {
    let line_start = head.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line = &head[line_start..];
    let width = line.len() - line.trim_start().len();
    &line[..width]
}

/// Splice `record` in as the first element of the repositories array.
///
/// Fails when the marker is missing, the document is not valid JSON, the path
/// is already registered, or the reassembled text would not parse.
pub fn insert_record(
    content: &str,
    marker: &str,
    record: &DeployRecord,
    settings_path: &Path,
) -> Result<String> {
    let split = split_settings(content, marker).ok_or_else(|| {
        Error::provision_marker_not_found(settings_path.display().to_string(), marker)
    })?;

    let doc = parse_settings(content, settings_path)?;
    ensure_not_registered(&doc, &record.path, settings_path)?;
    let existing = query("$.repositories[*]", &doc)?.len();

    let indent = format!("{}  ", line_indent(split.head));
    let pretty = serde_json::to_string_pretty(record)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize deploy record".to_string())))?;
    let body = pretty
        .lines()
        .map(|line| format!("{}{}", indent, line))
        .collect::<Vec<_>>()
        .join("\n");
    let separator = if existing > 0 { "," } else { "" };

    let assembled = format!("{}\n{}{}{}", split.head, body, separator, split.tail);

    let check = parse_settings(&assembled, settings_path)?;
    if !registered_paths(&check)?.iter().any(|p| p == &record.path) {
        return Err(Error::provision_marker_not_found(
            settings_path.display().to_string(),
            marker,
        )
        .with_hint("The marker matched something other than the top-level repositories array"));
    }

    Ok(assembled)
}

/// Settings checks that must pass before anything touches the filesystem.
pub fn preflight(plan: &ProvisionPlan) -> Result<()> {
    let content = io::read_file(&plan.settings_path, "read deploy settings")?;
    if split_settings(&content, &plan.marker).is_none() {
        return Err(Error::provision_marker_not_found(
            plan.settings_path.display().to_string(),
            &plan.marker,
        ));
    }
    let doc = parse_settings(&content, &plan.settings_path)?;
    ensure_not_registered(&doc, &plan.repo_dir.display().to_string(), &plan.settings_path)
}

/// Clone into the target directory unless it already exists. Returns true when cloned.
pub fn ensure_clone(plan: &ProvisionPlan) -> Result<bool> {
    if plan.repo_dir.exists() {
        log_info!("{} already exists, skipping clone", plan.repo_dir.display());
        return Ok(false);
    }

    if let Some(parent) = plan.repo_dir.parent() {
        io::ensure_dir(parent, "create apps directory")?;
    }

    log_info!("Cloning {} into {}", plan.url, plan.repo_dir.display());
    git::clone_repo(&plan.url, &plan.repo_dir, plan.clone_branch.as_deref())?;
    Ok(true)
}

/// Insert the record for `plan` into the settings file and swap it in place.
pub fn register(plan: &ProvisionPlan, deploy_command: &str, secret_token: &str) -> Result<DeployRecord> {
    let record = DeployRecord {
        url: plan.url.clone(),
        branch: plan.branch.clone(),
        remote: plan.remote.clone(),
        path: plan.repo_dir.display().to_string(),
        deploy: deploy_command.to_string(),
        secret_token: secret_token.to_string(),
    };

    let content = io::read_file(&plan.settings_path, "read deploy settings")?;
    let updated = insert_record(&content, &plan.marker, &record, &plan.settings_path)?;
    io::write_file_atomic(&plan.settings_path, &updated, "write deploy settings")?;

    Ok(record)
}

/// Full provisioning run.
///
/// `deploy_command` is asked for only after the checkout is in place, so an
/// interactive caller is not prompted for a run that would be rejected.
pub fn provision<F>(plan: &ProvisionPlan, register_safe_directory: bool, deploy_command: F) -> Result<ProvisionOutput>
where
    F: FnOnce() -> Result<String>,
{
    preflight(plan)?;

    let cloned = ensure_clone(plan)?;

    let safe_directory_added = if register_safe_directory {
        let added = git::ensure_safe_directory(&plan.repo_dir)?;
        if added {
            log_info!("Registered {} as a git safe.directory", plan.repo_dir.display());
        }
        added
    } else {
        false
    };

    log_info!("Setting group permissions ({}) on {}", plan.group_mode, plan.repo_dir.display());
    permissions::relax_group_permissions(&plan.repo_dir, &plan.group_mode)?;

    let command = deploy_command()?;
    let command = validation::require_non_empty(&command, "deploy_command", "Deploy command cannot be empty")?;

    let secret_token = generate_secret_token(plan.token_length);

    log_info!("Adding {} to {}", plan.name, plan.settings_path.display());
    let record = register(plan, command, &secret_token)?;

    Ok(ProvisionOutput {
        name: plan.name.clone(),
        url: record.url,
        branch: record.branch,
        path: record.path,
        cloned,
        safe_directory_added,
        settings_file: plan.settings_path.display().to_string(),
        webhook_url: plan.webhook_url.clone(),
        secret_token: record.secret_token,
        service_name: plan.service_name.clone(),
    })
}
