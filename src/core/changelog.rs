//! Factorio-format `changelog.txt` generation from git tags and commits.
//!
//! Commit subjects and body lines written as `prefix(scope): text` are
//! grouped into Factorio's changelog categories. Each tag becomes one entry;
//! commits after the newest tag become an `Unreleased` entry.

use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::git::{self, Commit};
use crate::{io, json_format, log_info};

/// Commit prefix to Factorio category, in canonical output order.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("major", "Major Features"),
    ("feat", "Features"),
    ("minor", "Minor Features"),
    ("graphics", "Graphics"),
    ("sounds", "Sounds"),
    ("perf", "Optimizations"),
    ("balance", "Balancing"),
    ("combat", "Combat Balancing"),
    ("circuits", "Circuit Network"),
    ("change", "Changes"),
    ("fix", "Bugfixes"),
    ("modding", "Modding"),
    ("scripting", "Scripting"),
    ("gui", "Gui"),
    ("control", "Control"),
    ("translations", "Translation"),
    ("debug", "Debug"),
    ("info", "Info"),
    ("ease", "Ease of use"),
    ("locale", "Locale"),
];

const FALLBACK_CATEGORY: &str = "Changes";
const IGNORED_PREFIXES: &[&str] = &["release"];
const SEPARATOR_WIDTH: usize = 99;
pub const UNRELEASED: &str = "Unreleased";

fn commit_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([a-zA-Z]+)(?:\([^)]+\))?\s*:\s*(.+)$").expect("static commit pattern")
    })
}

/// Parse one commit line into `(category, description)`.
pub fn parse_commit_line(line: &str) -> Option<(&'static str, String)> {
    let line = line.trim();
    let line = line.strip_prefix('-').map(str::trim_start).unwrap_or(line);
    if line.is_empty() {
        return None;
    }

    let caps = commit_line_pattern().captures(line)?;
    let prefix = caps.get(1)?.as_str().to_lowercase();
    if IGNORED_PREFIXES.contains(&prefix.as_str()) {
        return None;
    }

    let category = CATEGORIES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, c)| *c)
        .unwrap_or(FALLBACK_CATEGORY);

    Some((category, caps.get(2)?.as_str().trim().to_string()))
}

/// Items grouped by category, categories in canonical order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Categorized {
    pub groups: Vec<(String, Vec<String>)>,
}

impl Categorized {
    fn push(&mut self, category: &str, item: String) {
        match self.groups.iter_mut().find(|(c, _)| c == category) {
            Some((_, items)) => items.push(item),
            None => self.groups.push((category.to_string(), vec![item])),
        }
    }

    fn sort(&mut self) {
        let rank = |c: &str| {
            CATEGORIES
                .iter()
                .position(|(_, name)| *name == c)
                .unwrap_or(usize::MAX)
        };
        // Stable: unknown categories keep first-seen order after the known ones.
        self.groups.sort_by_key(|(c, _)| rank(c));
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Group subjects and body lines of `commits` by category.
pub fn categorize(commits: &[Commit]) -> Categorized {
    let mut out = Categorized::default();
    for commit in commits {
        let lines = std::iter::once(commit.subject.as_str()).chain(commit.body.lines());
        for line in lines {
            if let Some((category, item)) = parse_commit_line(line) {
                out.push(category, item);
            }
        }
    }
    out.sort();
    out
}

/// `DD.MM.YYYY` from a date starting with `YYYY-MM-DD`.
pub fn format_date(raw: &str) -> Option<String> {
    let day = raw.split_whitespace().next()?;
    let day = day.get(..10).unwrap_or(day);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%d.%m.%Y").to_string())
}

/// Word-wrap `item` as `    - first line` plus 6-space continuation lines.
pub fn wrap_item(item: &str, width: usize) -> Vec<String> {
    const LEAD: &str = "    - ";
    const CONT: &str = "      ";

    let mut lines = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut length = 0;

    for word in item.split_whitespace() {
        let chars = word.chars().count();
        if current.is_empty() {
            current.push(word);
            length = LEAD.len() + chars;
        } else if length + chars + 1 <= width {
            current.push(word);
            length += chars + 1;
        } else {
            let prefix = if lines.is_empty() { LEAD } else { CONT };
            lines.push(format!("{}{}", prefix, current.join(" ")));
            current = vec![word];
            length = CONT.len() + chars;
        }
    }

    if !current.is_empty() {
        let prefix = if lines.is_empty() { LEAD } else { CONT };
        lines.push(format!("{}{}", prefix, current.join(" ")));
    }

    lines
}

/// Render one changelog entry.
pub fn format_entry(version: &str, date: Option<&str>, categories: &Categorized, width: usize) -> String {
    let mut lines = vec!["-".repeat(SEPARATOR_WIDTH), format!("Version: {}", version)];

    if let Some(date) = date.and_then(format_date) {
        lines.push(format!("Date: {}", date));
    }
    lines.push(String::new());

    for (category, items) in &categories.groups {
        lines.push(format!("  {}:", category));
        for item in items {
            lines.extend(wrap_item(item, width));
        }
    }

    lines.join("\n")
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySummary {
    pub version: String,
    pub items: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogOutput {
    pub output: String,
    pub entries: Vec<EntrySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bumped: Option<VersionBump>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_commit: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionBump {
    pub file: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone)]
pub struct ChangelogOptions {
    pub repo: PathBuf,
    pub output: PathBuf,
    pub info_json: PathBuf,
    pub width: usize,
    pub bump: bool,
    pub commit: bool,
}

fn version_of(tag: &str) -> &str {
    tag.trim_start_matches('v')
}

fn item_count(c: &Categorized) -> usize {
    c.groups.iter().map(|(_, items)| items.len()).sum()
}

/// Build every entry, newest first. Tags without matching commits produce no entry.
pub fn build_entries(repo: &Path, width: usize) -> Result<Vec<(EntrySummary, String)>> {
    let tags = git::tags_newest_first(repo)?;
    if tags.is_empty() {
        return Err(Error::changelog_no_tags(repo.display().to_string()));
    }

    let mut entries = Vec::new();

    let unreleased = git::commits(repo, &format!("{}..HEAD", tags[0].name))?;
    if !unreleased.is_empty() {
        log_info!("Found unreleased changes");
        let categories = categorize(&unreleased);
        let today = Local::now().format("%Y-%m-%d").to_string();
        entries.push((
            EntrySummary {
                version: UNRELEASED.to_string(),
                items: item_count(&categories),
            },
            format_entry(UNRELEASED, Some(today.as_str()), &categories, width),
        ));
    }

    for (i, tag) in tags.iter().enumerate() {
        log_info!("Processing {}", tag.name);
        let range = match tags.get(i + 1) {
            Some(previous) => format!("{}..{}", previous.name, tag.name),
            None => tag.name.clone(),
        };
        let commits = git::commits(repo, &range)?;
        if commits.is_empty() {
            continue;
        }

        let categories = categorize(&commits);
        let version = version_of(&tag.name);
        entries.push((
            EntrySummary {
                version: version.to_string(),
                items: item_count(&categories),
            },
            format_entry(version, Some(tag.date.as_str()), &categories, width),
        ));
    }

    Ok(entries)
}

/// Set `version` in info.json to the newest tag. Returns the previous value.
pub fn bump_info_json(path: &Path, version: &str) -> Result<VersionBump> {
    let content = io::read_file(path, "read info.json")?;
    let mut info: Value = serde_json::from_str(&content)
        .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))?;

    let obj = info.as_object_mut().ok_or_else(|| {
        Error::config_invalid_value("info.json", None, "Top-level value must be an object")
    })?;
    let from = obj
        .get("version")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    obj.insert("version".to_string(), Value::String(version.to_string()));

    let formatted = format!("{}\n", json_format::format_prettier(&info));
    io::write_file_atomic(path, &formatted, "write info.json")?;

    Ok(VersionBump {
        file: path.display().to_string(),
        from,
        to: version.to_string(),
    })
}

/// Generate the changelog, then optionally bump info.json and cut a release commit.
pub fn generate(options: &ChangelogOptions) -> Result<ChangelogOutput> {
    if options.commit && !options.bump {
        return Err(Error::validation_invalid_argument(
            "commit",
            "--commit can only be used with --bump",
            None,
            None,
        ));
    }
    if options.commit && !git::is_workdir_clean(&options.repo)? {
        return Err(Error::changelog_dirty_worktree(options.repo.display().to_string()));
    }

    log_info!("Generating changelog");
    let entries = build_entries(&options.repo, options.width)?;

    let mut text = entries
        .iter()
        .map(|(_, text)| text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    if !text.ends_with('\n') {
        text.push('\n');
    }

    let output_path = options.repo.join(&options.output);
    io::write_file_atomic(&output_path, &text, "write changelog")?;
    log_info!("Changelog written to {}", output_path.display());

    let mut result = ChangelogOutput {
        output: output_path.display().to_string(),
        entries: entries.into_iter().map(|(summary, _)| summary).collect(),
        bumped: None,
        release_commit: None,
    };

    if !options.bump {
        return Ok(result);
    }

    let tags = git::tags_newest_first(&options.repo)?;
    let latest = tags
        .first()
        .ok_or_else(|| Error::changelog_no_tags(options.repo.display().to_string()))?;
    let bump = bump_info_json(&options.repo.join(&options.info_json), version_of(&latest.name))?;
    log_info!("Updated {}: {} -> {}", bump.file, bump.from, bump.to);
    result.bumped = Some(bump);

    if options.commit {
        let message = format!("release: {}", latest.name);
        let output_rel = options.output.to_string_lossy().to_string();
        let info_rel = options.info_json.to_string_lossy().to_string();
        git::add(&options.repo, &[output_rel.as_str(), info_rel.as_str()])?;
        git::commit(&options.repo, &message)?;
        git::force_tag(&options.repo, &latest.name)?;
        log_info!("Created commit '{}' and moved tag {} to HEAD", message, latest.name);
        result.release_commit = Some(message);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(subject: &str, body: &str) -> Commit {
        Commit {
            hash: "h".to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            date: "2024-05-01 10:00:00 +0200".to_string(),
        }
    }

    #[test]
    fn parse_maps_known_prefixes() {
        assert_eq!(
            parse_commit_line("feat: add trains"),
            Some(("Features", "add trains".to_string()))
        );
        assert_eq!(
            parse_commit_line("Fix(gui): button offset"),
            Some(("Bugfixes", "button offset".to_string()))
        );
        assert_eq!(
            parse_commit_line("- perf: faster belts"),
            Some(("Optimizations", "faster belts".to_string()))
        );
    }

    #[test]
    fn parse_unknown_prefix_falls_back() {
        assert_eq!(
            parse_commit_line("refactor: tidy"),
            Some(("Changes", "tidy".to_string()))
        );
    }

    #[test]
    fn parse_skips_release_and_plain_lines() {
        assert_eq!(parse_commit_line("release: 1.2.0"), None);
        assert_eq!(parse_commit_line("Merge branch 'main'"), None);
        assert_eq!(parse_commit_line("   "), None);
    }

    #[test]
    fn categorize_uses_canonical_order() {
        let commits = vec![
            commit("fix: a", "- feat: b\nnot a change"),
            commit("locale: c", ""),
            commit("feat: d", ""),
        ];
        let c = categorize(&commits);
        let names: Vec<&str> = c.groups.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Features", "Bugfixes", "Locale"]);
        assert_eq!(c.groups[0].1, vec!["b".to_string(), "d".to_string()]);
    }

    #[test]
    fn format_date_handles_git_dates() {
        assert_eq!(format_date("2024-05-01 10:00:00 +0200").as_deref(), Some("01.05.2024"));
        assert_eq!(format_date("2024-05-01T10:00:00").as_deref(), Some("01.05.2024"));
        assert_eq!(format_date("yesterday"), None);
    }

    #[test]
    fn wrap_breaks_at_width() {
        let item = "word ".repeat(30);
        let lines = wrap_item(item.trim(), 80);
        assert!(lines[0].starts_with("    - word"));
        assert!(lines[1].starts_with("      word"));
        assert!(lines.iter().all(|l| l.len() <= 80));
    }

    #[test]
    fn wrap_counts_characters_not_bytes() {
        let lines = wrap_item("über über über über", 20);
        assert_eq!(lines, vec!["    - über über über".to_string(), "      über".to_string()]);
        assert!(lines.iter().all(|l| l.chars().count() <= 20));
    }

    #[test]
    fn wrap_keeps_short_items_on_one_line() {
        assert_eq!(wrap_item("short item", 80), vec!["    - short item".to_string()]);
    }

    #[test]
    fn format_entry_layout() {
        let c = categorize(&[commit("feat: trains", "")]);
        let entry = format_entry("1.2.0", Some("2024-05-01 10:00:00 +0200"), &c, 80);
        let expected = format!(
            "{}\nVersion: 1.2.0\nDate: 01.05.2024\n\n  Features:\n    - trains",
            "-".repeat(99)
        );
        assert_eq!(entry, expected);
    }

    #[test]
    fn format_entry_omits_unparseable_date() {
        let entry = format_entry("1.0.0", Some("???"), &Categorized::default(), 80);
        assert!(!entry.contains("Date:"));
    }

    #[test]
    fn commit_requires_bump() {
        let options = ChangelogOptions {
            repo: PathBuf::from("."),
            output: PathBuf::from("changelog.txt"),
            info_json: PathBuf::from("info.json"),
            width: 80,
            bump: false,
            commit: true,
        };
        let err = generate(&options).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }

    #[test]
    fn bump_rewrites_version_with_prettier_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("info.json");
        std::fs::write(&path, r#"{"name":"mod","version":"0.1.0","dependencies":["base >= 1.1"]}"#).unwrap();

        let bump = bump_info_json(&path, "0.2.0").unwrap();

        assert_eq!(bump.from, "0.1.0");
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "{\n  \"name\": \"mod\",\n  \"version\": \"0.2.0\",\n  \"dependencies\": [\"base >= 1.1\"]\n}\n"
        );
    }
}
