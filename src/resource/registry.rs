//! URL-shape dispatch from a self link to a resource kind.

use std::sync::LazyLock;

use regex::Regex;

use super::kind::ResourceKind;
use crate::error::Result;

/// Default dispatch table. Order matters: lookup is first match, not best match.
const STANDARD_PATTERNS: &[(&str, ResourceKind)] = &[
    (r"attachment/[^/]+$", ResourceKind::Attachment),
    (r"component/[^/]+$", ResourceKind::Component),
    (r"customFieldOption/[^/]+$", ResourceKind::CustomFieldOption),
    (r"dashboard/[^/]+$", ResourceKind::Dashboard),
    (r"filter/[^/]$", ResourceKind::Filter),
    (r"issue/[^/]+$", ResourceKind::Issue),
    (r"issue/[^/]+/comment/[^/]+$", ResourceKind::Comment),
    (r"issue/[^/]+/votes$", ResourceKind::Votes),
    (r"issue/[^/]+/watchers$", ResourceKind::Watchers),
    (r"issue/[^/]+/worklog/[^/]+$", ResourceKind::Worklog),
    (r"issueLink/[^/]+$", ResourceKind::IssueLink),
    (r"issueLinkType/[^/]+$", ResourceKind::IssueLinkType),
    (r"issuetype/[^/]+$", ResourceKind::IssueType),
    (r"priority/[^/]+$", ResourceKind::Priority),
    (r"project/[^/]+$", ResourceKind::Project),
    (r"project/[^/]+/role/[^/]+$", ResourceKind::Role),
    (r"resolution/[^/]+$", ResourceKind::Resolution),
    (r"securitylevel/[^/]+$", ResourceKind::SecurityLevel),
    (r"status/[^/]+$", ResourceKind::Status),
    (r"user\?username.+$", ResourceKind::User),
    (r"version/[^/]+$", ResourceKind::Version),
];

static STANDARD: LazyLock<TypeRegistry> = LazyLock::new(|| {
    STANDARD_PATTERNS
        .iter()
        .fold(TypeRegistry::empty(), |registry, (pattern, kind)| {
            registry
                .register(pattern, *kind)
                .expect("standard resource patterns are valid")
        })
});

/// Ordered `(pattern, kind)` table consulted when materializing a self link.
///
/// Patterns are searched for anywhere in the URL, so each must be anchored
/// precisely enough not to claim a neighbouring endpoint.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    entries: Vec<(Regex, ResourceKind)>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        STANDARD.clone()
    }
}

impl TypeRegistry {
    /// A registry that resolves everything to [`ResourceKind::Generic`].
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The standard table for the JIRA REST API.
    pub fn standard() -> Self {
        Self::default()
    }

    /// Append a pattern. It is consulted after every pattern already present.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn register(mut self, pattern: &str, kind: ResourceKind) -> Result<Self> {
        self.entries.push((Regex::new(pattern)?, kind));
        Ok(self)
    }

    /// Kind of the first pattern found in `url`, else [`ResourceKind::Generic`].
    pub fn resolve(&self, url: &str) -> ResourceKind {
        match self.entries.iter().find(|(pattern, _)| pattern.is_match(url)) {
            Some((_, kind)) => *kind,
            None => {
                tracing::debug!(url, "no resource pattern matched, using generic resource");
                ResourceKind::Generic
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Patterns in lookup order.
    pub fn patterns(&self) -> impl Iterator<Item = (&str, ResourceKind)> {
        self.entries.iter().map(|(re, kind)| (re.as_str(), *kind))
    }
}
