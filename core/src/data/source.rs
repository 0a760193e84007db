//! Source normalizer — turn either surface syntax into one line stream.
//!
//! Shorthand input passes through with its true physical line numbers.
//! Structured (YAML) input is decoded and each record translated into the
//! equivalent shorthand block; every synthesized line carries the line
//! number of the originating record's declaration, so downstream
//! attribution is approximate rather than exact. From here on the rest of
//! the pipeline is syntax-agnostic.

use serde_yaml::Value;

use crate::error::Precision;

/// Which surface syntax a session file was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Shorthand,
    Yaml,
}

/// One line of normalized input, annotated with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub text: String,
    pub number: usize,
    pub precision: Precision,
}

impl SourceLine {
    fn exact(text: impl Into<String>, number: usize) -> SourceLine {
        SourceLine {
            text: text.into(),
            number,
            precision: Precision::Exact,
        }
    }

    fn approximate(text: impl Into<String>, number: usize) -> SourceLine {
        SourceLine {
            text: text.into(),
            number,
            precision: Precision::Approximate,
        }
    }
}

/// Strip a trailing comment and surrounding whitespace; what remains is the
/// text used for line classification (the untrimmed original is stored).
pub fn effective(line: &str) -> &str {
    let cut = match line.find('#') {
        Some(ix) => &line[..ix],
        None => line,
    };
    cut.trim()
}

/// Detect the surface syntax from the first non-comment, non-blank line.
pub fn detect_format(raw: &str) -> SourceFormat {
    for line in raw.lines() {
        let text = effective(line);
        if text.is_empty() {
            continue;
        }
        if text.starts_with('-') {
            return SourceFormat::Yaml;
        }
        break;
    }
    SourceFormat::Shorthand
}

/// Normalize raw file contents into an annotated line stream.
pub fn normalize(raw: &str) -> (SourceFormat, Vec<SourceLine>) {
    match detect_format(raw) {
        SourceFormat::Shorthand => (SourceFormat::Shorthand, normalize_shorthand(raw)),
        SourceFormat::Yaml => (SourceFormat::Yaml, normalize_yaml(raw)),
    }
}

fn normalize_shorthand(raw: &str) -> Vec<SourceLine> {
    raw.lines()
        .enumerate()
        .map(|(ix, line)| SourceLine::exact(line, ix + 1))
        .collect()
}

/// One decoded record of the structured surface.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Record {
    Session { name: String, line: usize },
    Window {
        name: String,
        windowgram: String,
        directions: String,
        line: usize,
    },
}

fn normalize_yaml(raw: &str) -> Vec<SourceLine> {
    let mut out = Vec::new();
    // Translated input needs no header content, only the leading separator.
    out.push(SourceLine::approximate("", 0));

    let records = decode_records(raw);

    // Session renames are only valid ahead of the first window record; the
    // effective ones are hoisted to the top of the translated stream.
    let first_window = records
        .iter()
        .position(|r| matches!(r, Record::Window { .. }))
        .unwrap_or(records.len());
    for record in &records[..first_window] {
        if let Record::Session { name, line } = record {
            out.push(SourceLine::approximate(format!("session {}", name), *line));
            out.push(SourceLine::approximate("", *line));
        }
    }
    for record in &records {
        if let Record::Window {
            name,
            windowgram,
            directions,
            line,
        } = record
        {
            out.push(SourceLine::approximate(format!("window {}", name), *line));
            out.push(SourceLine::approximate("", *line));
            for text in windowgram.lines() {
                out.push(SourceLine::approximate(text, *line));
            }
            out.push(SourceLine::approximate("", *line));
            for text in directions.lines() {
                out.push(SourceLine::approximate(text, *line));
            }
            for _ in 0..3 {
                out.push(SourceLine::approximate("", *line));
            }
        }
    }
    out
}

/// Decode the top-level sequence, pairing each entry with the line of its
/// sequence marker. Undecodable input yields no records at all.
fn decode_records(raw: &str) -> Vec<Record> {
    let parsed: Value = match serde_yaml::from_str(raw) {
        Ok(value) => value,
        Err(_) => return Vec::new(),
    };
    let seq = match parsed.as_sequence() {
        Some(seq) => seq,
        None => return Vec::new(),
    };
    let markers = marker_lines(raw);

    let mut records = Vec::new();
    for (ix, entry) in seq.iter().enumerate() {
        let line = markers.get(ix).copied().unwrap_or(0);
        if let Some(name) = entry.get("session").and_then(scalar_to_string) {
            records.push(Record::Session { name, line });
        } else if let Some(name) = entry.get("name").and_then(scalar_to_string) {
            let windowgram = entry
                .get("windowgram")
                .and_then(scalar_to_string)
                .unwrap_or_default();
            let directions = entry
                .get("directions")
                .and_then(scalar_to_string)
                .unwrap_or_default();
            records.push(Record::Window {
                name,
                windowgram,
                directions,
                line,
            });
        }
        // Entries with neither key are quietly dropped.
    }
    records
}

/// 1-based line numbers of top-level sequence markers (`- ` at column 0).
/// The `---` document marker never qualifies.
fn marker_lines(raw: &str) -> Vec<usize> {
    raw.lines()
        .enumerate()
        .filter_map(|(ix, line)| {
            let mut chars = line.chars();
            match (chars.next(), chars.next()) {
                (Some('-'), None) | (Some('-'), Some(' ')) | (Some('-'), Some('\t')) => {
                    Some(ix + 1)
                }
                _ => None,
            }
        })
        .collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
