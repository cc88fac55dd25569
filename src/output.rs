//! Output formatting for CLI display.
//!
//! Provides the [`PrettyPrint`] trait for human-readable output
//! as an alternative to JSON serialization.

use serde_json::Value;

use crate::{Attr, Resource, ResourceKind};

/// Trait for human-readable key-value output.
///
/// Implemented by handle types to provide formatted output
/// suitable for terminal display when `--json` is not specified.
pub trait PrettyPrint {
    /// Returns a formatted string for terminal display.
    fn pretty_print(&self) -> String;
}

impl PrettyPrint for Resource {
    fn pretty_print(&self) -> String {
        let header = match self.get("key").and_then(Attr::as_str) {
            Some(key) => format!("{}: {}", self.kind(), key),
            None => match self.get("id").and_then(Attr::as_str) {
                Some(id) => format!("{} #{}", self.kind(), id),
                None => self.kind().to_string(),
            },
        };
        let divider = "─".repeat(header.chars().count().max(30));
        let mut lines = vec![header, divider];

        if self.kind() == ResourceKind::Issue {
            for (label, path) in ISSUE_SUMMARY {
                if let Some(value) = self.path(path).map(display_attr) {
                    lines.push(format!("{:<16}{}", format!("{label}:"), value));
                }
            }
        } else if let Some(fields) = self.fields() {
            for (key, attr) in fields.iter() {
                if key == "self" {
                    continue;
                }
                lines.push(format!("{:<16}{}", format!("{key}:"), display_attr(attr)));
            }
        }

        if let Some(link) = self.self_link() {
            lines.push(format!("{:<16}{}", "Self:", link));
        }

        lines.join("\n")
    }
}

const ISSUE_SUMMARY: &[(&str, &[&str])] = &[
    ("Summary", &["fields", "summary"]),
    ("Type", &["fields", "issuetype", "name"]),
    ("Status", &["fields", "status", "name"]),
    ("Priority", &["fields", "priority", "name"]),
    ("Assignee", &["fields", "assignee", "displayName"]),
    ("Reporter", &["fields", "reporter", "displayName"]),
    ("Created", &["fields", "created"]),
    ("Updated", &["fields", "updated"]),
];

/// Single-line rendering of an attribute.
///
/// Nested handles show their `name` (or `key`) when they have one.
pub fn display_attr(attr: &Attr) -> String {
    match attr {
        Attr::Scalar(Value::String(s)) => s.clone(),
        Attr::Scalar(Value::Null) => String::new(),
        Attr::Scalar(other) => other.to_string(),
        Attr::Resource(resource) => ["name", "key", "displayName", "id"]
            .iter()
            .find_map(|key| resource.get(key).map(display_attr))
            .or_else(|| resource.self_link().map(str::to_string))
            .unwrap_or_default(),
        Attr::List(items) => items.iter().map(display_attr).collect::<Vec<_>>().join(", "),
        Attr::Tree(_) => attr.to_value().to_string(),
    }
}
