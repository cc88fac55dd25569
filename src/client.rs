//! JIRA API client.
//!
//! Thin endpoint methods over the resource layer: each maps its arguments to
//! a path, query string or body, then hands the response to
//! [`Resource`] construction or returns the parsed JSON.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::config::ClientOptions;
use crate::error::{JiraError, Result};
use crate::identity::{AsIdentifier, IntoIds};
use crate::pagination::{Page, PaginationParams};
use crate::resource::{Context, Resource, ResourceKind, TypeRegistry};
use crate::transport::{to_params, HttpTransport, RawResponse, Transport};

/// Default page size for issue searches.
pub const DEFAULT_MAX_RESULTS: u64 = 50;

/// Maximum pages to fetch (safety limit).
const MAX_PAGES: u32 = 1000;

/// User interface to JIRA.
///
/// Addressable entities come back as [`Resource`] handles of the matching
/// [`ResourceKind`]; endpoints without a self link return parsed JSON.
///
/// This struct is cheaply cloneable; clones share the same transport.
///
/// # Example
///
/// ```no_run
/// use jirapi::{ClientOptions, JiraClient};
///
/// # async fn example() -> jirapi::Result<()> {
/// let options = ClientOptions::new("https://jira.example.com")?
///     .with_basic_auth("admin", "admin");
/// let client = JiraClient::new(options)?;
///
/// let issue = client.issue("BULK-1", None, None).await?;
/// let summary = issue.path(&["fields", "summary"]).and_then(|s| s.as_str());
/// println!("{summary:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct JiraClient {
    ctx: Context,
}

impl std::fmt::Debug for JiraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraClient")
            .field("server", &self.ctx.options().server())
            .finish_non_exhaustive()
    }
}

/// Issue search parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub jql: String,
    pub start_at: u64,
    pub max_results: u64,
    /// Fields to include; empty means the server default.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expand: Option<String>,
}

impl SearchQuery {
    pub fn new(jql: impl Into<String>) -> Self {
        Self {
            jql: jql.into(),
            start_at: 0,
            max_results: DEFAULT_MAX_RESULTS,
            fields: Vec::new(),
            expand: None,
        }
    }
}

/// Time-tracking adjustments applied when logging work.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogEstimate {
    /// One of `new`, `leave`, `manual` or `auto` (server default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjust_estimate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_estimate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduce_by: Option<String>,
}

/// A new project component.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComponent {
    pub name: String,
    pub project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_type: Option<String>,
    pub is_assignee_type_valid: bool,
}

/// A new project version.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVersion {
    pub name: String,
    pub project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExpandQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expand: Option<&'a str>,
}

impl JiraClient {
    /// Create a client from environment variables (see [`ClientOptions::from_env`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the environment holds an invalid configuration.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientOptions::from_env()?)
    }

    /// Create a client speaking HTTP to the configured server.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let transport = HttpTransport::new(&options)?;
        Ok(Self::with_transport(options, Arc::new(transport)))
    }

    /// Create a client over any transport.
    pub fn with_transport(options: ClientOptions, transport: Arc<dyn Transport>) -> Self {
        Self {
            ctx: Context::new(options, transport),
        }
    }

    /// Replace the type registry used to materialize responses.
    #[must_use]
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.ctx = self.ctx.with_registry(registry);
        self
    }

    /// The context handed to every resource this client produces.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The server this client talks to.
    pub fn client_info(&self) -> &str {
        self.ctx.options().server()
    }

    // ---------------------------------------------------------------------
    // Universal resource loading
    // ---------------------------------------------------------------------

    /// Fetch any addressable resource by template.
    ///
    /// The result is a generic handle: it has no specialized update or
    /// delete behavior even if the template names a known endpoint.
    pub async fn find(&self, template: &str, ids: impl IntoIds) -> Result<Resource> {
        let mut resource = Resource::generic(template.to_string(), self.ctx.clone());
        resource.find(ids, &[]).await?;
        Ok(resource)
    }

    /// GET a path below the REST root and return its JSON.
    #[tracing::instrument(skip(self, params))]
    pub async fn get_json(&self, path: &str, params: &[(String, String)]) -> Result<Value> {
        let url = self.ctx.options().rest_url(path);
        let response = self
            .ctx
            .transport()
            .get(&url, &[], params)
            .await?
            .error_for_status()?;
        body_json(&response)
    }

    // ---------------------------------------------------------------------
    // Non-resource endpoints
    // ---------------------------------------------------------------------

    /// Server information.
    pub async fn server_info(&self) -> Result<Value> {
        self.get_json("serverInfo", &[]).await
    }

    /// All issue fields.
    pub async fn fields(&self) -> Result<Value> {
        self.get_json("field", &[]).await
    }

    /// Mutable application properties, or the single property `key`.
    pub async fn application_properties(&self, key: Option<&str>) -> Result<Value> {
        let params = optional_param("key", key);
        self.get_json("application-properties", &params).await
    }

    /// Set an application property.
    pub async fn set_application_property(&self, key: &str, value: &str) -> Result<()> {
        let url = self
            .ctx
            .options()
            .rest_url(&format!("application-properties/{key}"));
        let body = json!({ "id": key, "value": value });
        self.put(&url, &body).await
    }

    /// Transitions available on an issue to the current user.
    pub async fn transitions(
        &self,
        issue: impl AsIdentifier,
        id: Option<&str>,
        expand: Option<&str>,
    ) -> Result<Vec<Value>> {
        let issue = issue.as_identifier()?;
        let mut params = optional_param("transitionId", id);
        params.extend(optional_param("expand", expand));

        let response = self
            .get_json(&format!("issue/{issue}/transitions"), &params)
            .await?;
        Ok(take_list(response, Some("transitions")))
    }

    /// Edit metadata for an issue.
    pub async fn editmeta(&self, issue: impl AsIdentifier) -> Result<Value> {
        let issue = issue.as_identifier()?;
        self.get_json(&format!("issue/{issue}/editmeta"), &[]).await
    }

    /// Metadata required to create issues, filtered by the given parameters
    /// (e.g. `projectKeys`, `issuetypeNames`, `expand`).
    pub async fn createmeta(&self, params: &[(String, String)]) -> Result<Value> {
        self.get_json("issue/createmeta", params).await
    }

    /// Role names of a project mapped to their resource URLs.
    pub async fn project_roles(&self, project: impl AsIdentifier) -> Result<Value> {
        let project = project.as_identifier()?;
        self.get_json(&format!("project/{project}/role"), &[]).await
    }

    /// Permissions of the current user, optionally scoped by
    /// `projectKey`, `projectId`, `issueKey` or `issueId`.
    pub async fn my_permissions(&self, params: &[(String, String)]) -> Result<Value> {
        self.get_json("mypermissions", params).await
    }

    // ---------------------------------------------------------------------
    // Issues
    // ---------------------------------------------------------------------

    /// Get an issue.
    ///
    /// `fields` is a comma-separated list of fields to include.
    pub async fn issue(
        &self,
        id: impl AsIdentifier,
        fields: Option<&str>,
        expand: Option<&str>,
    ) -> Result<Resource> {
        let params = to_params(&ExpandQuery { fields, expand })?;
        self.find_for(ResourceKind::Issue, id.as_identifier()?, &params)
            .await
    }

    /// Create an issue.
    ///
    /// With `prefetch` the new issue is loaded in full; otherwise the handle
    /// holds only the server's creation response (`id`, `key`, `self`).
    #[tracing::instrument(skip(self, fields))]
    pub async fn create_issue(&self, fields: Map<String, Value>, prefetch: bool) -> Result<Resource> {
        let created = self.post_json("issue", &json!({ "fields": fields }), &[]).await?;

        if prefetch {
            let key = created.get("key").and_then(Value::as_str).ok_or_else(|| {
                JiraError::Materialization("created issue has no key".to_string())
            })?;
            return self.issue(key, None, None).await;
        }
        Resource::from_value(ResourceKind::Issue, created, self.ctx.clone())
    }

    /// One page of issues matching a JQL query.
    #[tracing::instrument(skip(self))]
    pub async fn search_issues(&self, query: &SearchQuery) -> Result<Page<Resource>> {
        let response = self.get_json("search", &to_params(query)?).await?;

        let total = response.get("total").and_then(Value::as_u64);
        let start_at = response
            .get("startAt")
            .and_then(Value::as_u64)
            .unwrap_or(query.start_at);
        let issues = self.resources(ResourceKind::Issue, take_list(response, Some("issues")))?;

        Ok(Page::new(issues, start_at, query.max_results, total))
    }

    /// Every issue matching a JQL query, fetching page after page.
    pub async fn search_all_issues(&self, jql: &str) -> Result<Vec<Resource>> {
        let mut query = SearchQuery::new(jql);
        let mut all_issues = Vec::new();
        let mut pages = 0;

        loop {
            let page = self.search_issues(&query).await?;
            let has_more = page.has_more && !page.is_empty();
            query.start_at = page.next_start();
            all_issues.extend(page.items);

            if !has_more {
                break;
            }

            pages += 1;
            // Safety limit to prevent infinite loops
            if pages >= MAX_PAGES {
                tracing::warn!("Reached pagination limit of {} pages, stopping", MAX_PAGES);
                break;
            }
        }

        Ok(all_issues)
    }

    /// Assign an issue to a user.
    pub async fn assign_issue(&self, issue: impl AsIdentifier, assignee: &str) -> Result<()> {
        let issue = issue.as_identifier()?;
        let url = self.ctx.options().rest_url(&format!("issue/{issue}/assignee"));
        self.put(&url, &json!({ "name": assignee })).await
    }

    /// Perform a workflow transition, setting `fields` along the way.
    pub async fn transition_issue(
        &self,
        issue: impl AsIdentifier,
        transition_id: &str,
        fields: Map<String, Value>,
    ) -> Result<()> {
        let issue = issue.as_identifier()?;
        let body = json!({
            "transition": { "id": transition_id },
            "fields": fields,
        });
        self.post_json(&format!("issue/{issue}/transitions"), &body, &[])
            .await?;
        Ok(())
    }

    /// Comments on an issue.
    pub async fn comments(&self, issue: impl AsIdentifier) -> Result<Vec<Resource>> {
        let issue = issue.as_identifier()?;
        let response = self.get_json(&format!("issue/{issue}/comment"), &[]).await?;
        self.resources(ResourceKind::Comment, take_list(response, Some("comments")))
    }

    /// One comment on an issue.
    pub async fn comment(&self, issue: impl AsIdentifier, comment: &str) -> Result<Resource> {
        let ids = (issue.as_identifier()?, comment);
        self.find_for(ResourceKind::Comment, ids, &[]).await
    }

    /// Add a comment; `visibility` is `{"type": "role"|"group", "value": name}`.
    pub async fn add_comment(
        &self,
        issue: impl AsIdentifier,
        body: &str,
        visibility: Option<Value>,
    ) -> Result<Resource> {
        let issue = issue.as_identifier()?;
        let mut data = json!({ "body": body });
        if let Some(visibility) = visibility {
            data["visibility"] = visibility;
        }
        let created = self
            .post_json(&format!("issue/{issue}/comment"), &data, &[])
            .await?;
        Resource::from_value(ResourceKind::Comment, created, self.ctx.clone())
    }

    /// Remote links of an issue.
    pub async fn remote_links(&self, issue: impl AsIdentifier) -> Result<Vec<Resource>> {
        let issue = issue.as_identifier()?;
        let response = self
            .get_json(&format!("issue/{issue}/remotelink"), &[])
            .await?;
        self.resources(ResourceKind::RemoteLink, take_list(response, None))
    }

    /// One remote link of an issue.
    pub async fn remote_link(&self, issue: impl AsIdentifier, id: &str) -> Result<Resource> {
        let ids = (issue.as_identifier()?, id);
        self.find_for(ResourceKind::RemoteLink, ids, &[]).await
    }

    /// Link an issue to an external application.
    pub async fn add_remote_link(
        &self,
        issue: impl AsIdentifier,
        link: &crate::resource::RemoteLinkUpdate,
    ) -> Result<Resource> {
        let issue = issue.as_identifier()?;
        let body = serde_json::to_value(link)?;
        let created = self
            .post_json(&format!("issue/{issue}/remotelink"), &body, &[])
            .await?;
        Resource::from_value(ResourceKind::RemoteLink, created, self.ctx.clone())
    }

    /// Votes on an issue.
    pub async fn votes(&self, issue: impl AsIdentifier) -> Result<Resource> {
        self.find_for(ResourceKind::Votes, issue.as_identifier()?, &[])
            .await
    }

    /// Vote for an issue as the current user.
    pub async fn add_vote(&self, issue: impl AsIdentifier) -> Result<()> {
        let issue = issue.as_identifier()?;
        self.post_json(&format!("issue/{issue}/votes"), &Value::Null, &[])
            .await?;
        Ok(())
    }

    /// Withdraw the current user's vote.
    pub async fn remove_vote(&self, issue: impl AsIdentifier) -> Result<()> {
        let issue = issue.as_identifier()?;
        self.delete_path(&format!("issue/{issue}/votes"), &[]).await
    }

    /// Watchers of an issue.
    pub async fn watchers(&self, issue: impl AsIdentifier) -> Result<Resource> {
        self.find_for(ResourceKind::Watchers, issue.as_identifier()?, &[])
            .await
    }

    /// Add a user to an issue's watchers.
    pub async fn add_watcher(&self, issue: impl AsIdentifier, watcher: &str) -> Result<()> {
        let issue = issue.as_identifier()?;
        self.post_json(&format!("issue/{issue}/watchers"), &json!(watcher), &[])
            .await?;
        Ok(())
    }

    /// Remove a user from an issue's watchers.
    pub async fn remove_watcher(&self, issue: impl AsIdentifier, watcher: &str) -> Result<()> {
        let issue = issue.as_identifier()?;
        let params = vec![("username".to_string(), watcher.to_string())];
        self.delete_path(&format!("issue/{issue}/watchers"), &params)
            .await
    }

    /// Worklogs of an issue.
    pub async fn worklogs(&self, issue: impl AsIdentifier) -> Result<Vec<Resource>> {
        let issue = issue.as_identifier()?;
        let response = self.get_json(&format!("issue/{issue}/worklog"), &[]).await?;
        self.resources(ResourceKind::Worklog, take_list(response, Some("worklogs")))
    }

    /// One worklog of an issue.
    pub async fn worklog(&self, issue: impl AsIdentifier, id: &str) -> Result<Resource> {
        let ids = (issue.as_identifier()?, id);
        self.find_for(ResourceKind::Worklog, ids, &[]).await
    }

    /// Log work on an issue, e.g. `time_spent = "2d"`.
    pub async fn add_worklog(
        &self,
        issue: impl AsIdentifier,
        time_spent: Option<&str>,
        estimate: &WorklogEstimate,
    ) -> Result<Resource> {
        let issue = issue.as_identifier()?;
        let mut body = Map::new();
        if let Some(time_spent) = time_spent {
            body.insert("timeSpent".to_string(), json!(time_spent));
        }
        let created = self
            .post_json(
                &format!("issue/{issue}/worklog"),
                &Value::Object(body),
                &to_params(estimate)?,
            )
            .await?;
        Resource::from_value(ResourceKind::Worklog, created, self.ctx.clone())
    }

    // ---------------------------------------------------------------------
    // Issue links and types
    // ---------------------------------------------------------------------

    /// Link two issues.
    pub async fn create_issue_link(
        &self,
        link_type: &str,
        inward_issue: impl AsIdentifier,
        outward_issue: impl AsIdentifier,
        comment: Option<Value>,
    ) -> Result<()> {
        let body = json!({
            "type": { "name": link_type },
            "inwardIssue": { "key": inward_issue.as_identifier()? },
            "outwardIssue": { "key": outward_issue.as_identifier()? },
            "comment": comment,
        });
        self.post_json("issueLink", &body, &[]).await?;
        Ok(())
    }

    pub async fn issue_link(&self, id: &str) -> Result<Resource> {
        self.find_for(ResourceKind::IssueLink, id, &[]).await
    }

    pub async fn issue_link_types(&self) -> Result<Vec<Resource>> {
        let response = self.get_json("issueLinkType", &[]).await?;
        self.resources(
            ResourceKind::IssueLinkType,
            take_list(response, Some("issueLinkTypes")),
        )
    }

    pub async fn issue_link_type(&self, id: &str) -> Result<Resource> {
        self.find_for(ResourceKind::IssueLinkType, id, &[]).await
    }

    pub async fn issue_types(&self) -> Result<Vec<Resource>> {
        self.list_of(ResourceKind::IssueType, "issuetype").await
    }

    pub async fn issue_type(&self, id: &str) -> Result<Resource> {
        self.find_for(ResourceKind::IssueType, id, &[]).await
    }

    pub async fn priorities(&self) -> Result<Vec<Resource>> {
        self.list_of(ResourceKind::Priority, "priority").await
    }

    pub async fn priority(&self, id: &str) -> Result<Resource> {
        self.find_for(ResourceKind::Priority, id, &[]).await
    }

    pub async fn resolutions(&self) -> Result<Vec<Resource>> {
        self.list_of(ResourceKind::Resolution, "resolution").await
    }

    pub async fn resolution(&self, id: &str) -> Result<Resource> {
        self.find_for(ResourceKind::Resolution, id, &[]).await
    }

    pub async fn statuses(&self) -> Result<Vec<Resource>> {
        self.list_of(ResourceKind::Status, "status").await
    }

    pub async fn status(&self, id: &str) -> Result<Resource> {
        self.find_for(ResourceKind::Status, id, &[]).await
    }

    pub async fn security_level(&self, id: &str) -> Result<Resource> {
        self.find_for(ResourceKind::SecurityLevel, id, &[]).await
    }

    pub async fn custom_field_option(&self, id: &str) -> Result<Resource> {
        self.find_for(ResourceKind::CustomFieldOption, id, &[]).await
    }

    pub async fn attachment(&self, id: &str) -> Result<Resource> {
        self.find_for(ResourceKind::Attachment, id, &[]).await
    }

    /// Attachment settings such as whether uploads are enabled and the size limit.
    pub async fn attachment_meta(&self) -> Result<Value> {
        self.get_json("attachment/meta", &[]).await
    }

    // ---------------------------------------------------------------------
    // Projects, components and versions
    // ---------------------------------------------------------------------

    /// Projects visible to the current user.
    pub async fn projects(&self) -> Result<Vec<Resource>> {
        self.list_of(ResourceKind::Project, "project").await
    }

    pub async fn project(&self, id: impl AsIdentifier) -> Result<Resource> {
        self.find_for(ResourceKind::Project, id.as_identifier()?, &[])
            .await
    }

    pub async fn project_components(&self, project: impl AsIdentifier) -> Result<Vec<Resource>> {
        let project = project.as_identifier()?;
        self.list_of(ResourceKind::Component, &format!("project/{project}/components"))
            .await
    }

    pub async fn project_versions(&self, project: impl AsIdentifier) -> Result<Vec<Resource>> {
        let project = project.as_identifier()?;
        self.list_of(ResourceKind::Version, &format!("project/{project}/versions"))
            .await
    }

    pub async fn project_role(&self, project: impl AsIdentifier, id: &str) -> Result<Resource> {
        let ids = (project.as_identifier()?, id);
        self.find_for(ResourceKind::Role, ids, &[]).await
    }

    pub async fn component(&self, id: &str) -> Result<Resource> {
        self.find_for(ResourceKind::Component, id, &[]).await
    }

    /// Number of issues related to a component.
    pub async fn component_count_related_issues(&self, id: &str) -> Result<u64> {
        let response = self
            .get_json(&format!("component/{id}/relatedIssueCounts"), &[])
            .await?;
        count_field(&response, "issueCount")
    }

    pub async fn create_component(&self, component: &NewComponent) -> Result<Resource> {
        let created = self
            .post_json("component", &serde_json::to_value(component)?, &[])
            .await?;
        Resource::from_value(ResourceKind::Component, created, self.ctx.clone())
    }

    pub async fn version(&self, id: &str, expand: Option<&str>) -> Result<Resource> {
        let params = optional_param("expand", expand);
        self.find_for(ResourceKind::Version, id, &params).await
    }

    pub async fn create_version(&self, version: &NewVersion) -> Result<Resource> {
        let created = self
            .post_json("version", &serde_json::to_value(version)?, &[])
            .await?;
        Resource::from_value(ResourceKind::Version, created, self.ctx.clone())
    }

    /// Move a version within its project's ordered list.
    ///
    /// `after` is the self link of the version to follow; `position` is one
    /// of `First`, `Last`, `Earlier` or `Later`.
    pub async fn move_version(
        &self,
        id: &str,
        after: Option<&str>,
        position: Option<&str>,
    ) -> Result<Resource> {
        let mut body = Map::new();
        if let Some(after) = after {
            body.insert("after".to_string(), json!(after));
        }
        if let Some(position) = position {
            body.insert("position".to_string(), json!(position));
        }
        let moved = self
            .post_json(&format!("version/{id}/move"), &Value::Object(body), &[])
            .await?;
        Resource::from_value(ResourceKind::Version, moved, self.ctx.clone())
    }

    /// Counts of issues fixed in and affected by a version.
    pub async fn version_count_related_issues(&self, id: &str) -> Result<Value> {
        self.get_json(&format!("version/{id}/relatedIssueCounts"), &[])
            .await
    }

    /// Number of unresolved issues for a version.
    pub async fn version_count_unresolved_issues(&self, id: &str) -> Result<u64> {
        let response = self
            .get_json(&format!("version/{id}/unresolvedIssueCount"), &[])
            .await?;
        count_field(&response, "issuesUnresolvedCount")
    }

    // ---------------------------------------------------------------------
    // Dashboards and filters
    // ---------------------------------------------------------------------

    /// Dashboards; `filter` is `favourite` or `my`.
    pub async fn dashboards(
        &self,
        filter: Option<&str>,
        window: &PaginationParams,
    ) -> Result<Vec<Resource>> {
        let mut params = optional_param("filter", filter);
        params.extend(to_params(window)?);
        let response = self.get_json("dashboard", &params).await?;
        self.resources(ResourceKind::Dashboard, take_list(response, Some("dashboards")))
    }

    pub async fn dashboard(&self, id: &str) -> Result<Resource> {
        self.find_for(ResourceKind::Dashboard, id, &[]).await
    }

    pub async fn filter(&self, id: &str) -> Result<Resource> {
        self.find_for(ResourceKind::Filter, id, &[]).await
    }

    /// Filters marked as favourite by the current user.
    pub async fn favourite_filters(&self) -> Result<Vec<Resource>> {
        self.list_of(ResourceKind::Filter, "filter/favourite").await
    }

    // ---------------------------------------------------------------------
    // Users and sessions
    // ---------------------------------------------------------------------

    pub async fn user(&self, username: &str, expand: Option<&str>) -> Result<Resource> {
        let params = optional_param("expand", expand);
        self.find_for(ResourceKind::User, username, &params).await
    }

    /// Groups matching `query`, leaving out those named in `exclude`.
    pub async fn groups(&self, query: Option<&str>, exclude: Option<&str>) -> Result<Value> {
        let mut params = optional_param("query", query);
        params.extend(optional_param("exclude", exclude));
        self.get_json("groups/picker", &params).await
    }

    /// Users whose name matches `username`.
    pub async fn search_users(
        &self,
        username: &str,
        window: &PaginationParams,
    ) -> Result<Vec<Resource>> {
        let mut params = vec![("username".to_string(), username.to_string())];
        params.extend(to_params(window)?);
        let response = self.get_json("user/search", &params).await?;
        self.resources(ResourceKind::User, take_list(response, None))
    }

    /// Users assignable to issues in every one of `project_keys` (comma-separated).
    pub async fn search_assignable_users_for_projects(
        &self,
        username: &str,
        project_keys: &str,
        window: &PaginationParams,
    ) -> Result<Vec<Resource>> {
        let mut params = vec![
            ("username".to_string(), username.to_string()),
            ("projectKeys".to_string(), project_keys.to_string()),
        ];
        params.extend(to_params(window)?);
        self.users_from("user/assignable/multiProjectSearch", &params)
            .await
    }

    /// Users assignable to an existing issue (`issue_key`) or to new issues
    /// in `project`.
    pub async fn search_assignable_users_for_issues(
        &self,
        username: &str,
        project: Option<&str>,
        issue_key: Option<&str>,
        expand: Option<&str>,
        window: &PaginationParams,
    ) -> Result<Vec<Resource>> {
        let mut params = vec![("username".to_string(), username.to_string())];
        params.extend(to_params(window)?);
        params.extend(optional_param("project", project));
        params.extend(optional_param("issueKey", issue_key));
        params.extend(optional_param("expand", expand));
        self.users_from("user/assignable/search", &params).await
    }

    /// Users allowed to view an issue or the issues of a project.
    pub async fn search_allowed_users_for_issue(
        &self,
        user: &str,
        issue_key: Option<&str>,
        project_key: Option<&str>,
        window: &PaginationParams,
    ) -> Result<Vec<Resource>> {
        let mut params = vec![("username".to_string(), user.to_string())];
        params.extend(to_params(window)?);
        params.extend(optional_param("issueKey", issue_key));
        params.extend(optional_param("projectKey", project_key));
        self.users_from("user/viewissue/search", &params).await
    }

    /// The current user's session.
    pub async fn session(&self) -> Result<Resource> {
        let url = self.ctx.options().auth_url("session");
        let response = self
            .ctx
            .transport()
            .get(&url, &[], &[])
            .await?
            .error_for_status()?;
        Resource::from_value(ResourceKind::User, body_json(&response)?, self.ctx.clone())
    }

    /// Destroy the current user's session.
    pub async fn kill_session(&self) -> Result<()> {
        let url = self.ctx.options().auth_url("session");
        self.ctx
            .transport()
            .delete(&url, &[], &[])
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Drop the current user's elevated (websudo) privileges.
    pub async fn kill_websudo(&self) -> Result<()> {
        let url = self.ctx.options().auth_url("websudo");
        self.ctx
            .transport()
            .delete(&url, &[], &[])
            .await?
            .error_for_status()?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    async fn find_for(
        &self,
        kind: ResourceKind,
        ids: impl IntoIds,
        params: &[(String, String)],
    ) -> Result<Resource> {
        let mut resource = Resource::new(kind, self.ctx.clone());
        resource.find(ids, params).await?;
        Ok(resource)
    }

    async fn list_of(&self, kind: ResourceKind, path: &str) -> Result<Vec<Resource>> {
        let response = self.get_json(path, &[]).await?;
        self.resources(kind, take_list(response, None))
    }

    async fn users_from(&self, path: &str, params: &[(String, String)]) -> Result<Vec<Resource>> {
        let response = self.get_json(path, params).await?;
        self.resources(ResourceKind::User, take_list(response, None))
    }

    fn resources(&self, kind: ResourceKind, values: Vec<Value>) -> Result<Vec<Resource>> {
        values
            .into_iter()
            .map(|value| Resource::from_value(kind, value, self.ctx.clone()))
            .collect()
    }

    #[tracing::instrument(skip(self, body, params))]
    async fn post_json(&self, path: &str, body: &Value, params: &[(String, String)]) -> Result<Value> {
        let url = self.ctx.options().rest_url(path);
        let body = if body.is_null() { String::new() } else { body.to_string() };
        let response = self
            .ctx
            .transport()
            .post(&url, &body, &[], params)
            .await?
            .error_for_status()?;
        body_json(&response)
    }

    async fn put(&self, url: &str, body: &Value) -> Result<()> {
        self.ctx
            .transport()
            .put(url, &body.to_string(), &[])
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn delete_path(&self, path: &str, params: &[(String, String)]) -> Result<()> {
        let url = self.ctx.options().rest_url(path);
        self.ctx
            .transport()
            .delete(&url, &[], params)
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Parse a response body, treating an empty body (204) as `null`.
fn body_json(response: &RawResponse) -> Result<Value> {
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    response.json()
}

/// The array at `key` of an object response, or the response itself.
fn take_list(mut response: Value, key: Option<&str>) -> Vec<Value> {
    let list = match key {
        Some(key) => response.get_mut(key).map(Value::take).unwrap_or(Value::Null),
        None => response,
    };
    match list {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}

/// A numeric count field of a response object.
fn count_field(response: &Value, key: &str) -> Result<u64> {
    response.get(key).and_then(Value::as_u64).ok_or_else(|| {
        JiraError::Materialization(format!("response has no numeric '{key}' field"))
    })
}

fn optional_param(name: &str, value: Option<&str>) -> Vec<(String, String)> {
    value
        .map(|v| vec![(name.to_string(), v.to_string())])
        .unwrap_or_default()
}
