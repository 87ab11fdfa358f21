// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment reports problems as a flat error chain. This module turns each
//! link into a [`ConfigError`] that miette can render against the TOML file
//! the value came from, with a "did you mean" hint for misspelled keys.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::path::Path;

use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a valid key must beat to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

const INLINE: &str = "<inline>";

/// A problem found while loading or validating `figura.toml`.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}` in [{section}]")]
    #[diagnostic(
        code(figura::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Dotted table the key appeared in; empty at the top level.
        section: String,
        suggestion: Option<String>,
        /// Comma-separated keys the table accepts.
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(figura::config::invalid_type), help("expected {expected}"))]
    InvalidValue {
        key: String,
        found: String,
        expected: String,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(figura::config::missing_key),
        help("add `{key} = <value>` to figura.toml")
    )]
    MissingKey { key: String },

    #[error("validation error: {message}")]
    #[diagnostic(code(figura::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(figura::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// A TOML document that may have contributed to the configuration.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path as figment records it, or a placeholder for inline text.
    pub name: String,
    pub content: String,
}

impl ConfigSource {
    pub fn inline(content: &str) -> Self {
        Self {
            name: INLINE.to_string(),
            content: content.to_string(),
        }
    }

    /// Reads `path`, or `None` if it does not exist or is unreadable.
    pub fn read(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        Some(Self {
            name: path.display().to_string(),
            content,
        })
    }

    fn named(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, self.content.clone())
    }
}

/// Converts every error in a figment chain into a [`ConfigError`].
///
/// `sources` are searched for the offending key so the diagnostic can
/// point at it. Values from the environment have no span.
pub fn figment_to_config_errors(err: figment::Error, sources: &[ConfigSource]) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let path: Vec<String> = error.path.clone();
            let source = origin(&error, sources);
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate_in(source, &path, field);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        section: path.join("."),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: dotted(&path, field),
                },
                Kind::InvalidType(found, expected) => {
                    let (table, field) = match path.split_last() {
                        Some((field, table)) => (table, field.as_str()),
                        None => (&path[..0], ""),
                    };
                    let (span, src) = locate_in(source, table, field);
                    ConfigError::InvalidValue {
                        key: path.join("."),
                        found: found.to_string(),
                        expected: expected.clone(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn dotted(table: &[String], key: &str) -> String {
    if table.is_empty() {
        key.to_string()
    } else {
        format!("{}.{key}", table.join("."))
    }
}

/// The source `error` came from, if we have its text.
fn origin<'a>(error: &figment::Error, sources: &'a [ConfigSource]) -> Option<&'a ConfigSource> {
    let file = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });
    match file {
        Some(name) => sources.iter().find(|s| s.name == name),
        // Inline strings carry no file path.
        None => match sources {
            [only] if only.name == INLINE => Some(only),
            _ => None,
        },
    }
}

fn locate_in(
    source: Option<&ConfigSource>,
    table: &[String],
    key: &str,
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    match source.and_then(|s| find_key_offset(&s.content, table, key).map(|o| (s, o))) {
        Some((source, offset)) => (
            Some(SourceSpan::new(offset.into(), key.len())),
            Some(source.named()),
        ),
        None => (None, None),
    }
}

/// Byte offset of `key` inside the TOML table named by `table`.
///
/// Walks the document line by line, tracking the current `[header]`, so a
/// key of the same name in another table is never matched. An empty
/// `table` means the top level, before any header.
pub fn find_key_offset(content: &str, table: &[String], key: &str) -> Option<usize> {
    let wanted = table.join(".");
    let mut current = String::new();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();

        if let Some(header) = trimmed
            .strip_prefix('[')
            .filter(|rest| !rest.starts_with('['))
            .and_then(|rest| rest.split(']').next())
        {
            current = header.split('.').map(str::trim).collect::<Vec<_>>().join(".");
        } else if current == wanted {
            let name = trimmed.split('=').next().unwrap_or_default().trim_end();
            if trimmed.contains('=') && name == key {
                return Some(offset + indent);
            }
        }
        offset += line.len();
    }
    None
}

/// Closest valid key to `unknown` by Jaro-Winkler similarity, if any is
/// close enough to be a plausible typo.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (*key, strsim::jaro_winkler(unknown, key)))
        .filter(|(_, score)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(key, _)| key.to_string())
}

/// Prints every error to stderr with miette's graphical renderer.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error) {
            Ok(()) => eprint!("{rendered}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
    eprintln!(
        "{} configuration problem{} found",
        errors.len(),
        if errors.len() == 1 { "" } else { "s" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESH_KEYS: &[&str] = &["base_url", "token", "poll_interval_secs", "max_poll_attempts"];

    fn table(path: &str) -> Vec<String> {
        path.split('.').filter(|s| !s.is_empty()).map(String::from).collect()
    }

    #[test]
    fn typos_get_a_suggestion() {
        assert_eq!(suggest_key("bse_url", MESH_KEYS).as_deref(), Some("base_url"));
        assert_eq!(
            suggest_key("max_pol_attempts", MESH_KEYS).as_deref(),
            Some("max_poll_attempts")
        );
        assert_eq!(suggest_key("zzzzzz", &["host", "port"]), None);
    }

    #[test]
    fn key_is_found_in_its_own_table_only() {
        let content = "[server]\nbase_url = 1\n\n[mesh]\nbase_url = \"x\"\n";
        let o = find_key_offset(content, &table("mesh"), "base_url").unwrap();
        assert!(content[..o].contains("[mesh]"));
        assert_eq!(&content[o..o + 8], "base_url");
    }

    #[test]
    fn nested_tables_and_indentation() {
        let content = "[mesh]\nbase_url = \"x\"\n\n[ mesh . artifact_rewrite ]\n  frm = \"/static/\"\n";
        let o = find_key_offset(content, &table("mesh.artifact_rewrite"), "frm").unwrap();
        assert_eq!(&content[o..o + 3], "frm");
        assert_eq!(find_key_offset(content, &table("mesh"), "frm"), None);
    }

    #[test]
    fn prefix_of_a_longer_key_does_not_match() {
        let content = "[mesh]\ntoken_extra = 1\ntoken = \"t\"\n";
        let o = find_key_offset(content, &table("mesh"), "token").unwrap();
        assert_eq!(&content[o..], "token = \"t\"\n");
    }

    #[test]
    fn inline_unknown_key_points_at_the_line() {
        let content = "[mesh]\nbse_url = \"http://x\"\n";
        let err = crate::loader::load_config_from_str(content).unwrap_err();
        let errors = figment_to_config_errors(err, &[ConfigSource::inline(content)]);
        let found = errors.iter().any(|e| {
            matches!(e, ConfigError::UnknownKey { key, section, suggestion, .. }
                if key == "bse_url" && section == "mesh" && suggestion.as_deref() == Some("base_url"))
        });
        assert!(found, "got {errors:?}");
    }
}
