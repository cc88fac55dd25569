//! Turning parsed JSON into a tree of attributes and resource handles.
//!
//! Every object carrying a string `self` link becomes a [`Resource`] whose
//! kind is chosen by the context's [`TypeRegistry`](crate::TypeRegistry);
//! every other object becomes an [`AttributeTree`]. Arrays are rebuilt
//! element-wise and scalars pass through.

use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};

use crate::error::{JiraError, Result};
use crate::resource::{Context, Resource};

/// Timestamp layout used by the server, e.g. `2012-01-19T16:43:07.000+0000`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// One materialized value.
#[derive(Debug, Clone)]
pub enum Attr {
    /// String, number, boolean or null.
    Scalar(Value),
    /// A nested object without a self link.
    Tree(AttributeTree),
    /// A nested object with a self link.
    Resource(Box<Resource>),
    /// An array, element order preserved.
    List(Vec<Attr>),
}

impl Attr {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Attr::Scalar(value) => value.as_str(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Attr::Scalar(value) => value.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Attr::Scalar(value) => value.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Attr::Scalar(value) => value.as_bool(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Attr::Scalar(Value::Null))
    }

    pub fn as_tree(&self) -> Option<&AttributeTree> {
        match self {
            Attr::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Attr::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Attr]> {
        match self {
            Attr::List(items) => Some(items),
            _ => None,
        }
    }

    /// Parse a string scalar as a server timestamp.
    pub fn as_datetime(&self) -> Option<DateTime<FixedOffset>> {
        let text = self.as_str()?;
        DateTime::parse_from_str(text, TIMESTAMP_FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(text))
            .ok()
    }

    /// Named child of a tree or loaded resource.
    pub fn get(&self, key: &str) -> Option<&Attr> {
        match self {
            Attr::Tree(tree) => tree.get(key),
            Attr::Resource(resource) => resource.get(key),
            _ => None,
        }
    }

    /// Back to plain JSON. Resources contribute their raw document.
    pub fn to_value(&self) -> Value {
        match self {
            Attr::Scalar(value) => value.clone(),
            Attr::Tree(tree) => tree.to_value(),
            Attr::Resource(resource) => resource
                .raw()
                .map(|raw| Value::Object(raw.clone()))
                .unwrap_or(Value::Null),
            Attr::List(items) => Value::Array(items.iter().map(Attr::to_value).collect()),
        }
    }
}

/// Named attributes of one JSON object, in document order.
#[derive(Debug, Clone, Default)]
pub struct AttributeTree {
    entries: Vec<(String, Attr)>,
}

impl AttributeTree {
    pub fn get(&self, key: &str) -> Option<&Attr> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, attr)| attr)
    }

    /// Walk nested trees and resources by key.
    ///
    /// ```
    /// # use jirapi::{materialize, ClientOptions, Context, HttpTransport};
    /// # use std::sync::Arc;
    /// # let options = ClientOptions::default();
    /// # let transport = Arc::new(HttpTransport::new(&options).unwrap());
    /// # let ctx = Context::new(options, transport);
    /// let doc = serde_json::json!({ "fields": { "status": { "name": "Open" } } });
    /// let attr = materialize(doc, &ctx).unwrap();
    /// let tree = attr.as_tree().unwrap();
    /// assert_eq!(tree.path(&["fields", "status", "name"]).and_then(|a| a.as_str()), Some("Open"));
    /// ```
    pub fn path(&self, keys: &[&str]) -> Option<&Attr> {
        let (first, rest) = keys.split_first()?;
        rest.iter()
            .try_fold(self.get(first)?, |attr, key| attr.get(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attr)> {
        self.entries.iter().map(|(name, attr)| (name.as_str(), attr))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(name, attr)| (name.clone(), attr.to_value()))
                .collect(),
        )
    }
}

/// Materialize a parsed JSON value.
///
/// # Errors
///
/// Returns [`JiraError::Materialization`] if an object carries a `self` key
/// whose value is not a string.
pub fn materialize(value: Value, ctx: &Context) -> Result<Attr> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| materialize(item, ctx))
            .collect::<Result<Vec<_>>>()
            .map(Attr::List),
        Value::Object(map) => materialize_object(map, ctx),
        scalar => Ok(Attr::Scalar(scalar)),
    }
}

fn materialize_object(map: Map<String, Value>, ctx: &Context) -> Result<Attr> {
    let kind = match map.get("self") {
        None => return build_tree(map, ctx).map(Attr::Tree),
        Some(Value::String(link)) => ctx.registry().resolve(link),
        Some(other) => {
            return Err(JiraError::Materialization(format!(
                "self link must be a string, got {other}"
            )))
        }
    };
    let resource = Resource::from_raw(kind, map, ctx.clone())?;
    Ok(Attr::Resource(Box::new(resource)))
}

/// Materialize each value of an object under its own key.
pub(crate) fn build_tree(map: Map<String, Value>, ctx: &Context) -> Result<AttributeTree> {
    let entries = map
        .into_iter()
        .map(|(key, value)| Ok((key, materialize(value, ctx)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(AttributeTree { entries })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::config::ClientOptions;
    use crate::resource::{ResourceKind, TypeRegistry};
    use crate::transport::{RawResponse, Transport};

    /// Transport that must never be reached: materialization does no I/O.
    struct Offline;

    #[async_trait]
    impl Transport for Offline {
        async fn get(&self, url: &str, _: &[(String, String)], _: &[(String, String)]) -> Result<RawResponse> {
            panic!("unexpected GET {url}")
        }
        async fn put(&self, url: &str, _: &str, _: &[(String, String)]) -> Result<RawResponse> {
            panic!("unexpected PUT {url}")
        }
        async fn post(
            &self,
            url: &str,
            _: &str,
            _: &[(String, String)],
            _: &[(String, String)],
        ) -> Result<RawResponse> {
            panic!("unexpected POST {url}")
        }
        async fn delete(&self, url: &str, _: &[(String, String)], _: &[(String, String)]) -> Result<RawResponse> {
            panic!("unexpected DELETE {url}")
        }
    }

    fn ctx() -> Context {
        Context::new(ClientOptions::default(), Arc::new(Offline))
    }

    fn count_resources(attr: &Attr) -> usize {
        match attr {
            Attr::Scalar(_) => 0,
            Attr::Tree(tree) => tree.iter().map(|(_, a)| count_resources(a)).sum(),
            Attr::List(items) => items.iter().map(count_resources).sum(),
            Attr::Resource(resource) => {
                1 + resource
                    .fields()
                    .map(|f| f.iter().map(|(_, a)| count_resources(a)).sum::<usize>())
                    .unwrap_or(0)
            }
        }
    }

    #[test]
    fn test_scalars_pass_through() {
        for value in [json!(null), json!(true), json!(42), json!(1.5), json!("text")] {
            let attr = materialize(value.clone(), &ctx()).unwrap();
            assert!(matches!(&attr, Attr::Scalar(v) if *v == value));
        }
    }

    #[test]
    fn test_document_without_self_links_has_no_resources() {
        let doc = json!({
            "startAt": 0,
            "names": ["a", "b"],
            "nested": { "deeper": [{ "x": 1 }, { "y": [true, null] }] }
        });
        let attr = materialize(doc, &ctx()).unwrap();
        assert!(attr.as_tree().is_some());
        assert_eq!(count_resources(&attr), 0);
    }

    #[test]
    fn test_round_trip_preserves_values_and_order() {
        let doc = json!({
            "zeta": "last-alphabetically",
            "alpha": 1,
            "list": [1, "two", 3.5, false, null],
            "nested": { "inner": ["x", "y"] }
        });
        let attr = materialize(doc.clone(), &ctx()).unwrap();
        let tree = attr.as_tree().unwrap();

        assert_eq!(tree.keys().collect::<Vec<_>>(), ["zeta", "alpha", "list", "nested"]);
        for (key, value) in doc.as_object().unwrap() {
            assert_eq!(&tree.get(key).unwrap().to_value(), value, "key {key}");
        }
    }

    #[test]
    fn test_nested_self_links_become_typed_resources() {
        let doc = json!({
            "self": "http://host/rest/api/2/issue/10001",
            "key": "BULK-1",
            "fields": {
                "summary": "Broken",
                "status": { "self": "http://host/rest/api/2/status/1", "name": "Open" },
                "comment": {
                    "comments": [
                        { "self": "http://host/rest/api/2/issue/10001/comment/10100", "body": "hi" }
                    ]
                },
                "votes": { "self": "http://host/rest/api/2/issue/10001/votes", "votes": 3 }
            }
        });

        let attr = materialize(doc, &ctx()).unwrap();
        let issue = attr.as_resource().unwrap();
        assert_eq!(issue.kind(), ResourceKind::Issue);
        assert_eq!(issue.self_link(), Some("http://host/rest/api/2/issue/10001"));
        assert_eq!(issue.get("self").and_then(Attr::as_str), Some("http://host/rest/api/2/issue/10001"));

        let status = issue.path(&["fields", "status"]).and_then(Attr::as_resource).unwrap();
        assert_eq!(status.kind(), ResourceKind::Status);
        assert_eq!(status.get("name").and_then(Attr::as_str), Some("Open"));

        let comments = issue.path(&["fields", "comment", "comments"]).and_then(Attr::as_list).unwrap();
        assert_eq!(comments[0].as_resource().map(Resource::kind), Some(ResourceKind::Comment));

        let votes = issue.path(&["fields", "votes"]).and_then(Attr::as_resource).unwrap();
        assert_eq!(votes.kind(), ResourceKind::Votes);
        assert_eq!(votes.get("votes").and_then(Attr::as_i64), Some(3));
    }

    #[test]
    fn test_resource_raw_is_verbatim() {
        let doc = json!({
            "self": "http://host/rest/api/2/project/BULK",
            "key": "BULK",
            "lead": { "self": "http://host/rest/api/2/user?username=admin", "name": "admin" }
        });
        let attr = materialize(doc.clone(), &ctx()).unwrap();
        let project = attr.as_resource().unwrap();

        assert_eq!(project.kind(), ResourceKind::Project);
        assert_eq!(Value::Object(project.raw().unwrap().clone()), doc);
        assert_eq!(
            project.get("lead").and_then(Attr::as_resource).map(Resource::kind),
            Some(ResourceKind::User)
        );
    }

    #[test]
    fn test_unmatched_self_link_is_generic() {
        let doc = json!({ "self": "http://host/rest/plugin/1.0/thing/5", "value": 1 });
        let attr = materialize(doc, &ctx()).unwrap();
        let resource = attr.as_resource().unwrap();
        assert_eq!(resource.kind(), ResourceKind::Generic);
        assert_eq!(resource.template(), None);
    }

    #[test]
    fn test_custom_registry_first_match_wins() {
        let registry = TypeRegistry::empty()
            .register(r"issue/", ResourceKind::Issue)
            .unwrap()
            .register(r"issue/[^/]+/votes$", ResourceKind::Votes)
            .unwrap();
        let ctx = ctx().with_registry(registry);

        let doc = json!({ "self": "http://host/rest/api/2/issue/10001/votes", "votes": 0 });
        let attr = materialize(doc, &ctx).unwrap();
        assert_eq!(attr.as_resource().map(Resource::kind), Some(ResourceKind::Issue));
    }

    #[test]
    fn test_non_string_self_link_is_contract_violation() {
        let doc = json!({ "outer": [{ "self": 17 }] });
        let err = materialize(doc, &ctx()).unwrap_err();
        assert!(matches!(err, JiraError::Materialization(_)));
    }

    #[test]
    fn test_timestamp_accessor() {
        let attr = Attr::Scalar(json!("2012-01-19T16:43:07.000+0000"));
        let parsed = attr.as_datetime().unwrap();
        assert_eq!(parsed.timestamp(), 1_326_991_387);

        assert!(Attr::Scalar(json!("not a date")).as_datetime().is_none());
        assert!(Attr::Scalar(json!(5)).as_datetime().is_none());
    }
}
