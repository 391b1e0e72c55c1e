//! Literal substring rewriting confined to one CSV column.

use csv::{ByteRecord, ReaderBuilder};
use serde::Serialize;
use std::io::{Read, Write};
use std::ops::Range;
use std::path::Path;

use crate::defaults::ReplaceRule;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct RewriteSettings {
    /// 1-based column index
    pub column: usize,
    pub rules: Vec<ReplaceRule>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub rows: usize,
    pub changed_cells: usize,
}

/// Parse a `FROM=TO` rule as given on the command line.
pub fn parse_rule(raw: &str) -> Result<ReplaceRule> {
    let (from, to) = raw.split_once('=').ok_or_else(|| {
        Error::validation_invalid_argument(
            "replace",
            "Expected FROM=TO",
            Some(raw.to_string()),
            None,
        )
    })?;

    if from.is_empty() {
        return Err(Error::validation_invalid_argument(
            "replace",
            "FROM must not be empty",
            Some(raw.to_string()),
            None,
        ));
    }

    Ok(ReplaceRule {
        from: from.to_string(),
        to: to.to_string(),
    })
}

/// Apply each rule in order to `cell`, replacing every occurrence.
pub fn apply_rules(cell: &str, rules: &[ReplaceRule]) -> String {
    rules
        .iter()
        .fold(cell.to_string(), |acc, rule| acc.replace(&rule.from, &rule.to))
}

fn validate(settings: &RewriteSettings) -> Result<usize> {
    if settings.column == 0 {
        return Err(Error::validation_invalid_argument(
            "column",
            "Columns are numbered from 1",
            Some("0".to_string()),
            None,
        ));
    }
    if settings.rules.iter().any(|r| r.from.is_empty()) {
        return Err(Error::config_invalid_value(
            "defaults.csv.rules",
            None,
            "Replacement rules need a non-empty 'from'",
        ));
    }
    Ok(settings.column - 1)
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Byte range of field `index` within one raw record, or `None` when the
/// record is shorter than that.
fn field_span(raw: &[u8], index: usize) -> Option<Range<usize>> {
    let mut field = 0;
    let mut start = 0;
    let mut end = raw.len();
    let mut quoted = false;

    for (i, byte) in raw.iter().enumerate() {
        match byte {
            b'"' => quoted = !quoted,
            b',' if !quoted => {
                if field == index {
                    return Some(start..i);
                }
                field += 1;
                start = i + 1;
            }
            b'\r' | b'\n' if !quoted => {
                end = i;
                break;
            }
            _ => {}
        }
    }

    (field == index).then_some(start..end)
}

/// Encode a rewritten cell, keeping the quoting style of the original.
fn encode_field(value: &str, was_quoted: bool) -> Vec<u8> {
    let needs_quotes = was_quoted || value.contains([',', '"', '\r', '\n']);
    if !needs_quotes {
        return value.as_bytes().to_vec();
    }
    format!("\"{}\"", value.replace('"', "\"\"")).into_bytes()
}

/// Raw bytes of one record with the target cell rewritten, or `None` when
/// nothing in it changes.
fn rewrite_record(
    raw: &[u8],
    record: &ByteRecord,
    index: usize,
    rules: &[ReplaceRule],
) -> Option<Vec<u8>> {
    let body = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    let has_bom = body.len() < raw.len();

    let cell = std::str::from_utf8(record.get(index)?).ok()?;
    let cell = match (has_bom, index) {
        (true, 0) => cell.strip_prefix('\u{feff}').unwrap_or(cell),
        _ => cell,
    };
    let rewritten = apply_rules(cell, rules);
    if rewritten == cell {
        return None;
    }

    let lead = raw.len() - body.len()
        + body.iter().take_while(|b| matches!(b, b'\r' | b'\n')).count();
    let span = field_span(&raw[lead..], index)?;
    let span = (span.start + lead)..(span.end + lead);
    let was_quoted = raw[span.clone()].first() == Some(&b'"');

    let mut out = Vec::with_capacity(raw.len() + rewritten.len());
    out.extend_from_slice(&raw[..span.start]);
    out.extend_from_slice(&encode_field(&rewritten, was_quoted));
    out.extend_from_slice(&raw[span.end..]);
    Some(out)
}

fn write_bytes<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    writer
        .write_all(bytes)
        .map_err(|e| Error::internal_io(e.to_string(), Some("write csv".to_string())))
}

/// Copy every record from `reader` to `writer`, rewriting the target column.
///
/// Only the bytes of a changed cell are replaced. Quoting, line endings,
/// blank lines and untouched rows come through exactly as read. Rows are not
/// assumed to share a width; short rows pass through untouched.
pub fn rewrite_records<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    settings: &RewriteSettings,
) -> Result<RewriteSummary> {
    let index = validate(settings)?;

    let mut input = Vec::new();
    reader
        .read_to_end(&mut input)
        .map_err(|e| Error::internal_io(e.to_string(), Some("read csv".to_string())))?;

    let mut records = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input.as_slice());

    let mut parsed = Vec::new();
    for (row, result) in records.byte_records().enumerate() {
        let record = result.map_err(|e| {
            Error::internal_io(
                format!("Failed to parse CSV row {}: {}", row + 1, e),
                Some("read csv".to_string()),
            )
        })?;
        let start = record
            .position()
            .map(|pos| pos.byte() as usize)
            .ok_or_else(|| Error::other(format!("CSV row {} has no position", row + 1)))?;
        parsed.push((start, record));
    }

    let mut summary = RewriteSummary::default();
    let mut cursor = 0;

    for (i, (start, record)) in parsed.iter().enumerate() {
        let end = parsed.get(i + 1).map_or(input.len(), |(next, _)| *next);
        write_bytes(&mut writer, &input[cursor..*start])?;

        let raw = &input[*start..end];
        match rewrite_record(raw, record, index, &settings.rules) {
            Some(changed) => {
                summary.changed_cells += 1;
                write_bytes(&mut writer, &changed)?;
            }
            None => write_bytes(&mut writer, raw)?,
        }

        cursor = end;
        summary.rows += 1;
    }
    write_bytes(&mut writer, &input[cursor..])?;

    writer
        .flush()
        .map_err(|e| Error::internal_io(e.to_string(), Some("flush csv".to_string())))?;

    Ok(summary)
}

/// Rewrite `input` into `output`. The output file is replaced atomically.
pub fn rewrite_file(input: &Path, output: &Path, settings: &RewriteSettings) -> Result<RewriteSummary> {
    let source = crate::io::open_file(input, "open csv input")?;

    let mut buffer = Vec::new();
    let mut summary = rewrite_records(source, &mut buffer, settings)?;
    crate::io::write_bytes_atomic(output, &buffer, "write csv output")?;

    summary.input = Some(input.display().to_string());
    summary.output = Some(output.display().to_string());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> RewriteSettings {
        RewriteSettings {
            column: 2,
            rules: vec![
                ReplaceRule {
                    from: "64720".to_string(),
                    to: "32938".to_string(),
                },
                ReplaceRule {
                    from: "111".to_string(),
                    to: "222".to_string(),
                },
            ],
        }
    }

    fn rewrite(input: &str) -> (String, RewriteSummary) {
        let mut out = Vec::new();
        let summary = rewrite_records(input.as_bytes(), &mut out, &settings()).unwrap();
        (String::from_utf8(out).unwrap(), summary)
    }

    #[test]
    fn rewrites_second_column_only() {
        let (out, summary) = rewrite("1,64720x,3\n64720,64720,64720\n");
        assert_eq!(out, "1,32938x,3\n64720,32938,64720\n");
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.changed_cells, 2);
    }

    #[test]
    fn every_occurrence_is_replaced() {
        let (out, _) = rewrite("a,6472064720-111,b\n");
        assert_eq!(out, "a,3293832938-222,b\n");
    }

    #[test]
    fn short_rows_pass_through() {
        let (out, summary) = rewrite("64720\n1,2,3\n");
        assert_eq!(out, "64720\n1,2,3\n");
        assert_eq!(summary.changed_cells, 0);
    }

    #[test]
    fn quoted_fields_survive() {
        let (out, _) = rewrite("\"x,y\",\"a 64720\",z\n");
        assert_eq!(out, "\"x,y\",\"a 32938\",z\n");
    }

    #[test]
    fn untouched_bytes_are_kept_verbatim() {
        let (out, summary) = rewrite("\"abc\",64720,\"3\"\r\n\n1,2,3");
        assert_eq!(out, "\"abc\",32938,\"3\"\r\n\n1,2,3");
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.changed_cells, 1);
    }

    #[test]
    fn unchanged_rows_keep_their_quoting() {
        let input = "\"a\",\"b\"\r\n\"c\",\"d\"\r\n";
        let (out, summary) = rewrite(input);
        assert_eq!(out, input);
        assert_eq!(summary.changed_cells, 0);
    }

    #[test]
    fn quoted_newlines_stay_in_their_row() {
        let (out, summary) = rewrite("\"line\none\",64720\nx,111\n");
        assert_eq!(out, "\"line\none\",32938\nx,222\n");
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.changed_cells, 2);
    }

    #[test]
    fn rewritten_cell_is_quoted_when_needed() {
        let mut out = Vec::new();
        let settings = RewriteSettings {
            column: 1,
            rules: vec![ReplaceRule {
                from: "x".to_string(),
                to: "a,\"b".to_string(),
            }],
        };
        rewrite_records("x,y\n".as_bytes(), &mut out, &settings).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\"a,\"\"b\",y\n");
    }

    #[test]
    fn leading_bom_is_kept_when_first_column_changes() {
        let mut out = Vec::new();
        let settings = RewriteSettings {
            column: 1,
            rules: vec![ReplaceRule {
                from: "64720".to_string(),
                to: "32938".to_string(),
            }],
        };
        rewrite_records("\u{feff}64720,a\n".as_bytes(), &mut out, &settings).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\u{feff}32938,a\n");
    }

    #[test]
    fn column_zero_is_rejected() {
        let mut out = Vec::new();
        let bad = RewriteSettings {
            column: 0,
            rules: vec![],
        };
        assert!(rewrite_records("a,b\n".as_bytes(), &mut out, &bad).is_err());
    }

    #[test]
    fn parse_rule_splits_on_first_equals() {
        let rule = parse_rule("1=2=3").unwrap();
        assert_eq!(rule.from, "1");
        assert_eq!(rule.to, "2=3");
        assert!(parse_rule("nope").is_err());
        assert!(parse_rule("=x").is_err());
    }

    #[test]
    fn rewrite_file_reports_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = rewrite_file(
            &dir.path().join("input.csv"),
            &dir.path().join("output.csv"),
            &settings(),
        )
        .unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
        assert!(!dir.path().join("output.csv").exists());
    }
}
