//! Resource templates and identifier normalization.
//!
//! A resource template is a path like `issue/{0}/comment/{1}` whose
//! positional placeholders are filled, in order, by identifiers.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt::Display;

use serde_json::Value;

use crate::error::{JiraError, Result};
use crate::resource::Resource;

/// A URL template together with the identifiers bound into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceIdentity {
    template: Cow<'static, str>,
    ids: Vec<String>,
}

impl ResourceIdentity {
    /// Bind identifiers to a template.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::Materialization`] if the template is malformed or
    /// the placeholders are not exactly `{0}..{n-1}` for `n` identifiers.
    pub fn new(template: impl Into<Cow<'static, str>>, ids: impl IntoIds) -> Result<Self> {
        let template = template.into();
        let ids = ids.into_ids();

        let indices: BTreeSet<usize> = parse(&template)?
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Placeholder(index) => Some(index),
                Segment::Literal(_) => None,
            })
            .collect();

        let expected: BTreeSet<usize> = (0..ids.len()).collect();
        if indices != expected {
            return Err(JiraError::Materialization(format!(
                "template '{template}' takes {} identifier(s), got {}",
                indices.len(),
                ids.len()
            )));
        }

        Ok(Self { template, ids })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// The template with every placeholder substituted.
    pub fn path(&self) -> String {
        // Validated in `new`, so parsing cannot fail and every index is in range.
        parse(&self.template)
            .unwrap_or_default()
            .into_iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text,
                Segment::Placeholder(index) => self.ids[index].as_str(),
            })
            .collect()
    }
}

enum Segment<'a> {
    Literal(&'a str),
    Placeholder(usize),
}

fn parse(template: &str) -> Result<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        if open > 0 {
            segments.push(Segment::Literal(&rest[..open]));
        }
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| {
            JiraError::Materialization(format!("unterminated placeholder in '{template}'"))
        })?;
        let index = after[..close].parse::<usize>().map_err(|_| {
            JiraError::Materialization(format!(
                "placeholder '{{{}}}' in '{template}' is not a position",
                &after[..close]
            ))
        })?;
        segments.push(Segment::Placeholder(index));
        rest = &after[close + 1..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }
    Ok(segments)
}

/// Values accepted as the identifiers of a resource lookup.
///
/// A single scalar is treated as a one-element sequence.
pub trait IntoIds {
    fn into_ids(self) -> Vec<String>;
}

impl IntoIds for () {
    fn into_ids(self) -> Vec<String> {
        Vec::new()
    }
}

impl IntoIds for &str {
    fn into_ids(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoIds for String {
    fn into_ids(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoIds for &String {
    fn into_ids(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl IntoIds for u64 {
    fn into_ids(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoIds for Vec<String> {
    fn into_ids(self) -> Vec<String> {
        self
    }
}

impl IntoIds for Vec<&str> {
    fn into_ids(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl IntoIds for &[String] {
    fn into_ids(self) -> Vec<String> {
        self.to_vec()
    }
}

impl IntoIds for &[&str] {
    fn into_ids(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> IntoIds for [&str; N] {
    fn into_ids(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<A: Display, B: Display> IntoIds for (A, B) {
    fn into_ids(self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string()]
    }
}

/// Reduce a value to the identifier string endpoint paths expect.
///
/// Strings pass through; a resource handle is reduced to its `key`, falling
/// back to its `id`.
pub trait AsIdentifier {
    /// # Errors
    ///
    /// Returns [`JiraError::InvalidResourceState`] for a handle that has
    /// neither a `key` nor an `id`.
    fn as_identifier(&self) -> Result<String>;
}

impl AsIdentifier for str {
    fn as_identifier(&self) -> Result<String> {
        Ok(self.to_string())
    }
}

impl AsIdentifier for String {
    fn as_identifier(&self) -> Result<String> {
        Ok(self.clone())
    }
}

impl AsIdentifier for Resource {
    fn as_identifier(&self) -> Result<String> {
        let raw = self.raw().ok_or_else(|| {
            JiraError::InvalidResourceState(format!("{} handle is not loaded", self.kind()))
        })?;

        ["key", "id"]
            .iter()
            .find_map(|field| match raw.get(*field) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| {
                JiraError::InvalidResourceState(format!("{} handle has no key or id", self.kind()))
            })
    }
}

impl<T: AsIdentifier + ?Sized> AsIdentifier for &T {
    fn as_identifier(&self) -> Result<String> {
        (**self).as_identifier()
    }
}

/// Free-function form of [`AsIdentifier::as_identifier`].
pub fn as_identifier<T: AsIdentifier + ?Sized>(value: &T) -> Result<String> {
    value.as_identifier()
}
