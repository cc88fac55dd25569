//! Concrete resource types and their request shaping.

use std::fmt;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{JiraError, Result};
use crate::transport::Params;

/// The concrete type of an addressable resource.
///
/// Every kind shares the generic find/update/delete lifecycle; a few
/// override how the update body or delete parameters are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Attachment,
    Component,
    CustomFieldOption,
    Dashboard,
    Filter,
    Issue,
    Comment,
    RemoteLink,
    Votes,
    Watchers,
    Worklog,
    IssueLink,
    IssueLinkType,
    IssueType,
    Priority,
    Project,
    Role,
    Resolution,
    SecurityLevel,
    Status,
    User,
    Version,
    /// Any resource without specialized behavior.
    Generic,
}

impl ResourceKind {
    /// URL template below the REST root, or `None` for [`ResourceKind::Generic`].
    pub fn template(self) -> Option<&'static str> {
        let template = match self {
            ResourceKind::Attachment => "attachment/{0}",
            ResourceKind::Component => "component/{0}",
            ResourceKind::CustomFieldOption => "customFieldOption/{0}",
            ResourceKind::Dashboard => "dashboard/{0}",
            ResourceKind::Filter => "filter/{0}",
            ResourceKind::Issue => "issue/{0}",
            ResourceKind::Comment => "issue/{0}/comment/{1}",
            ResourceKind::RemoteLink => "issue/{0}/remotelink/{1}",
            ResourceKind::Votes => "issue/{0}/votes",
            ResourceKind::Watchers => "issue/{0}/watchers",
            ResourceKind::Worklog => "issue/{0}/worklog/{1}",
            ResourceKind::IssueLink => "issueLink/{0}",
            ResourceKind::IssueLinkType => "issueLinkType/{0}",
            ResourceKind::IssueType => "issuetype/{0}",
            ResourceKind::Priority => "priority/{0}",
            ResourceKind::Project => "project/{0}",
            ResourceKind::Role => "project/{0}/role/{1}",
            ResourceKind::Resolution => "resolution/{0}",
            ResourceKind::SecurityLevel => "securitylevel/{0}",
            ResourceKind::Status => "status/{0}",
            ResourceKind::User => "user?username={0}",
            ResourceKind::Version => "version/{0}",
            ResourceKind::Generic => return None,
        };
        Some(template)
    }

    /// Build the PUT body for an update from the caller's field map.
    ///
    /// `raw` is the currently loaded document, needed by kinds that echo
    /// their own id back to the server.
    pub(crate) fn update_body(self, fields: Map<String, Value>, raw: Option<&Map<String, Value>>) -> Result<Value> {
        match self {
            ResourceKind::Issue => Ok(json!({ "fields": fields })),
            ResourceKind::Role => {
                let id = raw.and_then(|r| r.get("id")).cloned().ok_or_else(|| {
                    JiraError::InvalidResourceState("role has no id to update".to_string())
                })?;
                Ok(json!({
                    "id": id,
                    "categorisedActors": {
                        "atlassian-user-role-actor": one_or_many(fields.get("users")),
                        "atlassian-group-role-actor": one_or_many(fields.get("groups")),
                    }
                }))
            }
            _ => Ok(Value::Object(fields)),
        }
    }

    /// Complete the caller's delete parameters with kind defaults.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::InvalidResourceState`] when a watcher delete
    /// does not name the user to remove.
    pub(crate) fn delete_params(self, mut params: Params) -> Result<Params> {
        let has = |params: &Params, name: &str| params.iter().any(|(k, _)| k == name);
        match self {
            ResourceKind::Issue if !has(&params, "deleteSubtasks") => {
                params.push(("deleteSubtasks".to_string(), "false".to_string()));
            }
            ResourceKind::Watchers if !has(&params, "username") => {
                return Err(JiraError::InvalidResourceState(
                    "removing a watcher requires a username".to_string(),
                ));
            }
            _ => {}
        }
        Ok(params)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

fn one_or_many(value: Option<&Value>) -> Value {
    match value {
        Some(Value::String(s)) => json!([s]),
        Some(other) => other.clone(),
        None => Value::Null,
    }
}

/// Delete parameters for an issue.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDeleteParams {
    /// Must be true to delete an issue that has subtasks.
    pub delete_subtasks: bool,
}

/// Delete parameters for a component.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDeleteParams {
    /// Component to move issues to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_issues_to: Option<String>,
}

/// Delete parameters for a project version.
///
/// With neither field set the version is removed from every issue.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDeleteParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_fix_issues_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_affected_issues_to: Option<String>,
}

/// Delete parameters for a worklog entry.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogDeleteParams {
    /// One of `new`, `leave`, `manual` or `auto` (server default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjust_estimate: Option<String>,
    /// With `adjust_estimate = "new"`, the new estimate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_estimate: Option<String>,
    /// With `adjust_estimate = "manual"`, how much to increase the estimate by.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub increase_by: Option<String>,
}

/// Removes one user from an issue's watchers.
#[derive(Debug, Clone, Serialize)]
pub struct WatcherDeleteParams {
    pub username: String,
}

/// Update body for a remote link.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteLinkUpdate {
    /// Link details; at least `url` and `title`.
    pub object: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
}

/// Users and groups to add to a project role.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoleUpdate {
    pub users: Option<Vec<String>>,
    pub groups: Option<Vec<String>>,
}
