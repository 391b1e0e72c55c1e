use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::paths;

/// Root configuration structure for opskit.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OpskitConfig {
    #[serde(default)]
    pub defaults: Defaults,
}

/// All configurable defaults that can be overridden via opskit.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Defaults {
    #[serde(default)]
    pub extract: ExtractConfig,

    #[serde(default)]
    pub csv: CsvConfig,

    #[serde(default)]
    pub provision: ProvisionConfig,

    #[serde(default)]
    pub restart: RestartConfig,

    #[serde(default)]
    pub changelog: ChangelogConfig,

    #[serde(default)]
    pub watermark: WatermarkConfig,
}

/// Asset-name extraction from path lists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default = "default_extract_input")]
    pub input: String,

    /// Regex with exactly one capture group for the model stem
    #[serde(default = "default_extract_pattern")]
    pub pattern: String,

    #[serde(default = "default_skip_stems")]
    pub skip_stems: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            input: default_extract_input(),
            pattern: default_extract_pattern(),
            skip_stems: default_skip_stems(),
        }
    }
}

/// Literal substitution applied to one CSV cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceRule {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvConfig {
    #[serde(default = "default_csv_input")]
    pub input: String,

    #[serde(default = "default_csv_output")]
    pub output: String,

    /// 1-based column the rules apply to
    #[serde(default = "default_csv_column")]
    pub column: usize,

    #[serde(default = "default_csv_rules")]
    pub rules: Vec<ReplaceRule>,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            input: default_csv_input(),
            output: default_csv_output(),
            column: default_csv_column(),
            rules: default_csv_rules(),
        }
    }
}

/// Git-Auto-Deploy provisioning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionConfig {
    #[serde(default = "default_apps_dir")]
    pub apps_dir: String,

    #[serde(default = "default_settings_file")]
    pub settings_file: String,

    /// Clone URL; `{{name}}` is replaced with the repository name
    #[serde(default = "default_repo_url_template")]
    pub repo_url_template: String,

    /// Branch written into the deploy record
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Branch to check out when cloning; the remote's default branch when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_branch: Option<String>,

    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default = "default_webhook_url")]
    pub webhook_url: String,

    #[serde(default = "default_repositories_marker")]
    pub repositories_marker: String,

    #[serde(default = "default_group_mode")]
    pub group_mode: String,

    #[serde(default = "default_token_length")]
    pub token_length: usize,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Add the checkout to the global git `safe.directory` list
    #[serde(default = "default_true")]
    pub register_safe_directory: bool,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            apps_dir: default_apps_dir(),
            settings_file: default_settings_file(),
            repo_url_template: default_repo_url_template(),
            branch: default_branch(),
            clone_branch: None,
            remote: default_remote(),
            webhook_url: default_webhook_url(),
            repositories_marker: default_repositories_marker(),
            group_mode: default_group_mode(),
            token_length: default_token_length(),
            service_name: default_service_name(),
            register_safe_directory: default_true(),
        }
    }
}

/// Process manager + compose stack restart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestartConfig {
    #[serde(default = "default_pm2_binary")]
    pub pm2_binary: String,

    #[serde(default = "default_process_id")]
    pub process_id: String,

    #[serde(default = "default_compose_dir")]
    pub compose_dir: String,

    /// Program followed by its leading arguments, e.g. ["docker", "compose"]
    #[serde(default = "default_compose_command")]
    pub compose_command: Vec<String>,

    #[serde(default = "default_compose_args")]
    pub compose_args: Vec<String>,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            pm2_binary: default_pm2_binary(),
            process_id: default_process_id(),
            compose_dir: default_compose_dir(),
            compose_command: default_compose_command(),
            compose_args: default_compose_args(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogConfig {
    #[serde(default = "default_changelog_output")]
    pub output: String,

    #[serde(default = "default_info_json")]
    pub info_json: String,

    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            output: default_changelog_output(),
            info_json: default_info_json(),
            wrap_width: default_wrap_width(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkConfig {
    #[serde(default = "default_watermark_input")]
    pub input: String,

    #[serde(default = "default_watermark_output")]
    pub output: String,

    #[serde(default = "default_watermark_image")]
    pub watermark: String,

    /// Fraction of the limiting image dimension the watermark covers
    #[serde(default = "default_watermark_scale")]
    pub scale: f32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            input: default_watermark_input(),
            output: default_watermark_output(),
            watermark: default_watermark_image(),
            scale: default_watermark_scale(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_extract_input() -> String {
    "parts.txt".to_string()
}

fn default_extract_pattern() -> String {
    r"(?:^|/)([^/]+)\.mu$".to_string()
}

fn default_skip_stems() -> Vec<String> {
    vec!["model".to_string()]
}

fn default_csv_input() -> String {
    "input.csv".to_string()
}

fn default_csv_output() -> String {
    "output.csv".to_string()
}

fn default_csv_column() -> usize {
    2
}

fn default_csv_rules() -> Vec<ReplaceRule> {
    vec![ReplaceRule {
        from: "64720".to_string(),
        to: "32938".to_string(),
    }]
}

fn default_apps_dir() -> String {
    "/data/apps".to_string()
}

fn default_settings_file() -> String {
    "/data/apps/Git-Auto-Deploy/config.json".to_string()
}

fn default_repo_url_template() -> String {
    "git@github.com:dampol/{{name}}.git".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_webhook_url() -> String {
    "http://localhost:8001/".to_string()
}

fn default_repositories_marker() -> String {
    "\"repositories\": [".to_string()
}

fn default_group_mode() -> String {
    "g+rwX".to_string()
}

fn default_token_length() -> usize {
    20
}

fn default_service_name() -> String {
    "git-auto-deploy".to_string()
}

fn default_pm2_binary() -> String {
    "pm2".to_string()
}

fn default_process_id() -> String {
    "0".to_string()
}

fn default_compose_dir() -> String {
    "/opt/harbor".to_string()
}

fn default_compose_command() -> Vec<String> {
    vec!["docker".to_string(), "compose".to_string()]
}

fn default_compose_args() -> Vec<String> {
    vec!["up".to_string(), "-d".to_string()]
}

fn default_changelog_output() -> String {
    "changelog.txt".to_string()
}

fn default_info_json() -> String {
    "info.json".to_string()
}

fn default_wrap_width() -> usize {
    80
}

fn default_watermark_input() -> String {
    ".".to_string()
}

fn default_watermark_output() -> String {
    "./output_images".to_string()
}

fn default_watermark_image() -> String {
    "./watermark.png".to_string()
}

fn default_watermark_scale() -> f32 {
    0.5
}

// =============================================================================
// Loading functions
// =============================================================================

/// Load defaults, merging file config with built-in defaults.
pub fn load_defaults() -> Result<Defaults> {
    Ok(load_config()?.defaults)
}

/// Load the full opskit.json config. A missing file yields the built-in
/// defaults; a file that cannot be read or parsed is an error.
pub fn load_config() -> Result<OpskitConfig> {
    load_config_at(&paths::opskit_json()?)
}

fn load_config_at(path: &Path) -> Result<OpskitConfig> {
    if !path.exists() {
        return Ok(OpskitConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;

    parse_config(&content, &path.display().to_string())
}

pub fn parse_config(content: &str, origin: &str) -> Result<OpskitConfig> {
    serde_json::from_str(content).map_err(|e| Error::config_invalid_json(origin, e))
}

/// Save config to opskit.json file (creates if missing).
pub fn save_config(config: &OpskitConfig) -> Result<()> {
    let path = paths::opskit_json()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("create {}", parent.display())))
        })?;
    }

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize opskit.json".to_string())))?;

    crate::io::write_file_atomic(&path, &content, "write opskit.json")
}

/// Check if opskit.json file exists
pub fn config_exists() -> bool {
    paths::opskit_json().map(|p| p.exists()).unwrap_or(false)
}

/// Delete opskit.json file (reset to defaults)
pub fn reset_config() -> Result<bool> {
    let path = paths::opskit_json()?;

    if path.exists() {
        fs::remove_file(&path).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("delete {}", path.display())))
        })?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Get the path to opskit.json (for display purposes)
pub fn config_path() -> Result<String> {
    Ok(paths::opskit_json()?.display().to_string())
}

/// Get built-in defaults (ignoring any file config)
pub fn builtin_defaults() -> Defaults {
    Defaults::default()
}

// =============================================================================
// JSON pointer editing
// =============================================================================

/// Set `new_value` at `pointer`, creating intermediate objects as needed.
pub fn set_json_pointer(root: &mut Value, pointer: &str, new_value: Value) -> Result<()> {
    let tokens = pointer_tokens(pointer)?;
    let Some((last, parents)) = tokens.split_last() else {
        *root = new_value;
        return Ok(());
    };

    let mut current = root;
    for token in parents {
        if current.is_null() {
            *current = Value::Object(serde_json::Map::new());
        }
        current = match current {
            Value::Object(map) => map
                .entry(token.clone())
                .or_insert_with(|| Value::Object(serde_json::Map::new())),
            Value::Array(arr) => {
                let index = parse_array_index(token, arr.len())?;
                &mut arr[index]
            }
            _ => {
                return Err(Error::config_invalid_value(
                    pointer,
                    None,
                    "Expected object/array at pointer",
                ))
            }
        };
    }

    match current {
        Value::Object(map) => {
            map.insert(last.clone(), new_value);
            Ok(())
        }
        Value::Array(arr) => {
            let index = parse_array_index(last, arr.len())?;
            arr[index] = new_value;
            Ok(())
        }
        _ => Err(Error::config_invalid_value(
            pointer,
            None,
            "Cannot set child on non-container",
        )),
    }
}

/// Remove the value at `pointer`. Missing keys are an error.
pub fn remove_json_pointer(root: &mut Value, pointer: &str) -> Result<()> {
    let tokens = pointer_tokens(pointer)?;
    let Some((last, parents)) = tokens.split_last() else {
        return Err(Error::validation_invalid_argument(
            "pointer",
            "Cannot remove the document root",
            None,
            None,
        ));
    };

    let parent_ptr: String = parents
        .iter()
        .map(|t| format!("/{}", t.replace('~', "~0").replace('/', "~1")))
        .collect();

    let removed = match root.pointer_mut(&parent_ptr) {
        Some(Value::Object(map)) => map.remove(last).is_some(),
        Some(Value::Array(arr)) => {
            let index = parse_array_index(last, arr.len())?;
            arr.remove(index);
            true
        }
        _ => false,
    };

    if removed {
        Ok(())
    } else {
        Err(Error::config_missing_key(pointer, None))
    }
}

fn pointer_tokens(pointer: &str) -> Result<Vec<String>> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }

    if pointer == "/" || !pointer.starts_with('/') {
        return Err(Error::validation_invalid_argument(
            "pointer",
            format!("JSON pointer must start with '/' and name a key: {}", pointer),
            None,
            None,
        ));
    }

    Ok(pointer
        .split('/')
        .skip(1)
        .map(|t| t.replace("~1", "/").replace("~0", "~"))
        .collect())
}

fn parse_array_index(token: &str, len: usize) -> Result<usize> {
    let index = token.parse::<usize>().map_err(|_| {
        Error::validation_invalid_argument(
            "arrayIndex",
            "Invalid array index token",
            Some(token.to_string()),
            None,
        )
    })?;

    if index >= len {
        return Err(Error::config_invalid_value(
            "arrayIndex",
            Some(index.to_string()),
            "Array index out of bounds",
        ));
    }

    Ok(index)
}
