//! Model-name extraction from asset path lists.
//!
//! Every line naming a `.mu` file yields `<path> -> <stem>`; anything else is
//! skipped without complaint.

use regex::Regex;
use serde::Serialize;
use std::io::BufRead;

use crate::defaults::ExtractConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelMatch {
    pub path: String,
    pub model: String,
}

impl std::fmt::Display for ModelMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.path, self.model)
    }
}

/// Compiled form of [`ExtractConfig`].
pub struct Matcher {
    pattern: Regex,
    skip_stems: Vec<String>,
}

impl Matcher {
    pub fn from_config(config: &ExtractConfig) -> Result<Self> {
        let pattern = Regex::new(&config.pattern).map_err(|e| {
            Error::config_invalid_value(
                "defaults.extract.pattern",
                Some(config.pattern.clone()),
                e.to_string(),
            )
        })?;

        if pattern.captures_len() < 2 {
            return Err(Error::config_invalid_value(
                "defaults.extract.pattern",
                Some(config.pattern.clone()),
                "Pattern needs a capture group for the model name",
            ));
        }

        Ok(Self {
            pattern,
            skip_stems: config.skip_stems.clone(),
        })
    }

    pub fn match_line(&self, line: &str) -> Option<ModelMatch> {
        let path = line.trim();
        if path.is_empty() {
            return None;
        }

        let model = self.pattern.captures(path)?.get(1)?.as_str();
        if self.skip_stems.iter().any(|s| s == model) {
            return None;
        }

        Some(ModelMatch {
            path: path.to_string(),
            model: model.to_string(),
        })
    }
}

/// Scan `reader` line by line and collect every model match.
///
/// Lines that are not valid UTF-8 are treated like any other non-matching line.
pub fn extract_models<R: BufRead>(reader: R, config: &ExtractConfig) -> Result<Vec<ModelMatch>> {
    let matcher = Matcher::from_config(config)?;
    let mut matches = Vec::new();

    for line in reader.split(b'\n') {
        let line = line.map_err(|e| Error::internal_io(e.to_string(), Some("read path list".to_string())))?;
        let Ok(text) = std::str::from_utf8(&line) else {
            continue;
        };
        if let Some(found) = matcher.match_line(text) {
            matches.push(found);
        }
    }

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> Matcher {
        Matcher::from_config(&ExtractConfig::default()).unwrap()
    }

    #[test]
    fn nested_path_yields_stem() {
        let found = matcher().match_line("foo/bar/baz.mu").unwrap();
        assert_eq!(found.to_string(), "foo/bar/baz.mu -> baz");
    }

    #[test]
    fn bare_filename_matches() {
        assert_eq!(matcher().match_line("engine.mu").unwrap().model, "engine");
    }

    #[test]
    fn model_stem_is_skipped() {
        assert!(matcher().match_line("parts/tank/model.mu").is_none());
    }

    #[test]
    fn stem_containing_model_is_kept() {
        assert_eq!(matcher().match_line("parts/model2.mu").unwrap().model, "model2");
    }

    #[test]
    fn other_extensions_are_ignored() {
        let m = matcher();
        assert!(m.match_line("parts/tank/texture.png").is_none());
        assert!(m.match_line("parts/tank/baz.mu.bak").is_none());
        assert!(m.match_line("parts/tank/.mu").is_none());
    }

    #[test]
    fn crlf_input_is_trimmed() {
        let found = matcher().match_line("a/b.mu\r").unwrap();
        assert_eq!(found.path, "a/b.mu");
    }

    #[test]
    fn extract_models_skips_garbage() {
        let input = b"a/one.mu\n\nnot a path\n\xff\xfe\nb/model.mu\nc/two.mu\n" as &[u8];
        let found = extract_models(input, &ExtractConfig::default()).unwrap();
        let lines: Vec<String> = found.iter().map(|m| m.to_string()).collect();
        assert_eq!(lines, vec!["a/one.mu -> one", "c/two.mu -> two"]);
    }

    #[test]
    fn pattern_without_group_is_rejected() {
        let config = ExtractConfig {
            pattern: r"\.mu$".to_string(),
            ..ExtractConfig::default()
        };
        assert!(Matcher::from_config(&config).is_err());
    }
}
