// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Deserialization failures from figment become [`ConfigError`]s that miette
//! renders with a pointer into the offending `deskline.toml`. Unknown keys and
//! values get a Jaro-Winkler "did you mean" when a close match exists.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a suggestion (`throtle_ms` -> `throttle_ms`).
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem, rendered through miette.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key that no section of the configuration declares.
    #[error("unknown key `{key}` in {}", section_label(.section))]
    #[diagnostic(
        code(deskline::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), section, valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Dotted section path; empty at the top level.
        section: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a deskline setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A string that is not one of the choices of an enumerated setting.
    #[error("`{value}` is not a valid value for `{key}`")]
    #[diagnostic(
        code(deskline::config::unknown_value),
        help("{}", unknown_value_help(key, suggestion.as_deref(), valid_values))
    )]
    UnknownValue {
        key: String,
        value: String,
        suggestion: Option<String>,
        valid_values: String,
    },

    /// A value of the wrong TOML type.
    #[error("invalid type for `{key}`: {detail}")]
    #[diagnostic(code(deskline::config::invalid_type), help("{}", type_help(key, expected)))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// A value that parsed but breaks a semantic rule.
    #[error("validation error: {message}")]
    #[diagnostic(code(deskline::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(deskline::config::other))]
    Other(String),
}

fn section_label(section: &str) -> String {
    if section.is_empty() {
        "the top level".to_string()
    } else {
        format!("[{section}]")
    }
}

fn unknown_key_help(suggestion: Option<&str>, section: &str, valid_keys: &str) -> String {
    let accepted = if section.is_empty() {
        format!("deskline.toml has the sections {valid_keys}")
    } else {
        format!("[{section}] accepts {valid_keys}")
    };
    match suggestion {
        Some(s) => format!("did you mean `{s}`? {accepted}"),
        None => accepted,
    }
}

fn unknown_value_help(key: &str, suggestion: Option<&str>, valid_values: &str) -> String {
    let choices = value_hint(key)
        .map(str::to_string)
        .unwrap_or_else(|| format!("expected one of {valid_values}"));
    match suggestion {
        Some(s) => format!("did you mean `{s}`? {choices}"),
        None => choices,
    }
}

fn type_help(key: &str, expected: &str) -> String {
    value_hint(key)
        .map(str::to_string)
        .unwrap_or_else(|| format!("expected {expected}"))
}

/// What a deskline setting takes, keyed on the last segment of its path.
fn value_hint(key: &str) -> Option<&'static str> {
    let field = key.rsplit('.').next().unwrap_or(key);
    match field {
        "message_failure_policy" => Some(
            "`abort` fails the run on the first unreadable ticket thread; `skip` logs it and loads the rest",
        ),
        f if f.ends_with("_disposition") => Some(
            "`replace` truncates the table on every run and `append` adds to it (`WRITE_TRUNCATE` / `WRITE_APPEND` also work)",
        ),
        "timezone_offset" => Some("a UTC offset string such as \"+08:00\" or \"-05:30\""),
        "message_drop_columns" => Some("a list of message column names, e.g. [\"type\", \"agentid\"]"),
        "level" => Some("a tracing level: \"trace\", \"debug\", \"info\", \"warn\" or \"error\""),
        "default_table_expiration_days" => Some("a whole number of days, or leave it out"),
        "throttle_ms" => Some("milliseconds to wait before each upstream request, e.g. 400"),
        "max_in_flight" => Some("how many upstream requests may run at once, at least 1"),
        _ => None,
    }
}

/// Converts every error inside `err` into a [`ConfigError`].
///
/// `sources` holds `(name, text)` of the TOML texts that were merged; they
/// are searched for the offending key to attach a source span.
pub fn from_figment(err: figment::Error, sources: &[(String, String)]) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let path: Vec<String> = error.path.iter().map(ToString::to_string).collect();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let section = path.join(".");
                    let (span, src) = locate(&error, &section, field, sources);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        section,
                        span,
                        src,
                    }
                }
                Kind::UnknownVariant(value, expected) => ConfigError::UnknownValue {
                    key: path.join("."),
                    value: value.clone(),
                    suggestion: suggest_key(value, expected),
                    valid_values: expected.join(", "),
                },
                Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                    key: path.join("."),
                    detail: format!("found {actual}"),
                    expected: expected.clone(),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// Finds `key` inside `section` of the source the error came from, falling
/// back to the first source that has it.
fn locate(
    error: &figment::Error,
    section: &str,
    key: &str,
    sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let origin = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    let candidates = sources
        .iter()
        .filter(|(name, _)| origin.as_deref().is_none_or(|o| o == name.as_str()));
    for (name, text) in candidates {
        if let Some(offset) = key_offset(text, section, key) {
            return (
                Some(SourceSpan::new(offset.into(), key.len())),
                Some(NamedSource::new(name, text.clone())),
            );
        }
    }
    (None, None)
}

/// Byte offset of `key` written under the `[section]` table of `text`.
///
/// An empty `section` means the top level, where the key may also be a
/// table header (`[telegram]`).
pub fn key_offset(text: &str, section: &str, key: &str) -> Option<usize> {
    let mut current = "";
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();

        if let Some(header) = trimmed.strip_prefix('[') {
            let name = header.split(']').next().unwrap_or_default().trim();
            if section.is_empty() && name == key {
                return Some(offset + indent + 1 + header.find(key).unwrap_or(0));
            }
            current = name;
        } else if current == section
            && trimmed.split('=').next().map(str::trim) == Some(key)
            && trimmed.contains('=')
        {
            return Some(offset + indent);
        }
        offset += line.len();
    }
    None
}

/// Closest of `candidates` to `unknown` by Jaro-Winkler, if close enough.
pub fn suggest_key(unknown: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|c| (strsim::jaro_winkler(unknown, c), *c))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c.to_string())
}

/// Writes every error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut report = String::new();
        match handler.render_report(&mut report, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{report}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}
