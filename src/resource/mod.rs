//! Addressable resources.
//!
//! A [`Resource`] is a client-side handle on one REST entity. It is either
//! built empty and bound with [`Resource::find`], or built pre-loaded from a
//! document already returned by a list or search response. Every handle
//! carries the [`Context`] of the client that produced it, so later updates
//! and deletes reuse the same session.

mod kind;
mod registry;

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

pub use kind::{
    ComponentDeleteParams, IssueDeleteParams, RemoteLinkUpdate, ResourceKind, RoleUpdate,
    VersionDeleteParams, WatcherDeleteParams, WorklogDeleteParams,
};
pub use registry::TypeRegistry;

use crate::config::ClientOptions;
use crate::error::{JiraError, Result};
use crate::identity::{IntoIds, ResourceIdentity};
use crate::materialize::{self, Attr, AttributeTree};
use crate::transport::{to_params, Headers, Params, Transport};

const SELF_LINK: &str = "self";

/// Options, transport and type registry shared by a client and its handles.
#[derive(Clone)]
pub struct Context {
    options: Arc<ClientOptions>,
    transport: Arc<dyn Transport>,
    registry: Arc<TypeRegistry>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("server", &self.options.server())
            .field("registry_len", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl Context {
    /// A context using the standard type registry.
    pub fn new(options: ClientOptions, transport: Arc<dyn Transport>) -> Self {
        Self {
            options: Arc::new(options),
            transport,
            registry: Arc::new(TypeRegistry::standard()),
        }
    }

    /// Replace the type registry.
    #[must_use]
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }
}

/// The last document fetched for a handle and everything derived from it.
///
/// Replaced as a whole so a failed reload never leaves a half-updated handle.
#[derive(Clone)]
struct Loaded {
    raw: Map<String, Value>,
    self_link: Option<String>,
    fields: AttributeTree,
}

impl Loaded {
    fn build(raw: Map<String, Value>, ctx: &Context) -> Result<Self> {
        let self_link = match raw.get(SELF_LINK) {
            None => None,
            Some(Value::String(link)) => Some(link.clone()),
            Some(other) => {
                return Err(JiraError::Materialization(format!(
                    "self link must be a string, got {other}"
                )))
            }
        };
        let fields = materialize::build_tree(raw.clone(), ctx)?;
        Ok(Self {
            raw,
            self_link,
            fields,
        })
    }
}

/// A handle on one REST-addressable entity.
///
/// # Example
///
/// ```no_run
/// use jirapi::{JiraClient, Resource, ResourceKind};
///
/// # async fn example() -> jirapi::Result<()> {
/// let client = JiraClient::from_env()?;
///
/// let mut issue = Resource::new(ResourceKind::Issue, client.context().clone());
/// issue.find("BULK-1", &[]).await?;
/// println!("{:?}", issue.get("key").and_then(|k| k.as_str()));
///
/// let mut fields = serde_json::Map::new();
/// fields.insert("summary".to_string(), "Renamed".into());
/// issue.update(fields).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Resource {
    kind: ResourceKind,
    template: Option<Cow<'static, str>>,
    identity: Option<ResourceIdentity>,
    ctx: Context,
    loaded: Option<Loaded>,
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("kind", &self.kind)
            .field("template", &self.template)
            .field("identity", &self.identity)
            .field("self_link", &self.self_link())
            .finish_non_exhaustive()
    }
}

impl Resource {
    /// An unloaded handle of the given kind.
    pub fn new(kind: ResourceKind, ctx: Context) -> Self {
        Self {
            kind,
            template: kind.template().map(Cow::Borrowed),
            identity: None,
            ctx,
            loaded: None,
        }
    }

    /// An unloaded generic handle for a template not covered by [`ResourceKind`].
    pub fn generic(template: impl Into<Cow<'static, str>>, ctx: Context) -> Self {
        Self {
            kind: ResourceKind::Generic,
            template: Some(template.into()),
            identity: None,
            ctx,
            loaded: None,
        }
    }

    /// A handle pre-loaded from a document, without any network call.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::Materialization`] if the document carries a
    /// non-string self link at any level.
    pub fn from_raw(kind: ResourceKind, raw: Map<String, Value>, ctx: Context) -> Result<Self> {
        let mut resource = Self::new(kind, ctx);
        resource.loaded = Some(Loaded::build(raw, &resource.ctx)?);
        Ok(resource)
    }

    /// Like [`Resource::from_raw`] for a value that must be a JSON object.
    pub(crate) fn from_value(kind: ResourceKind, value: Value, ctx: Context) -> Result<Self> {
        match value {
            Value::Object(raw) => Self::from_raw(kind, raw, ctx),
            other => Err(JiraError::Materialization(format!(
                "{kind} document must be a JSON object, got {other}"
            ))),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Template and identifiers of the last successful [`Resource::find`].
    pub fn identity(&self) -> Option<&ResourceIdentity> {
        self.identity.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// The last fetched document, `None` until loaded.
    pub fn raw(&self) -> Option<&Map<String, Value>> {
        self.loaded.as_ref().map(|l| &l.raw)
    }

    /// Canonical URL reported by the server, `None` until loaded.
    pub fn self_link(&self) -> Option<&str> {
        self.loaded.as_ref().and_then(|l| l.self_link.as_deref())
    }

    /// Materialized view of [`Resource::raw`].
    pub fn fields(&self) -> Option<&AttributeTree> {
        self.loaded.as_ref().map(|l| &l.fields)
    }

    /// Top-level attribute by name.
    pub fn get(&self, key: &str) -> Option<&Attr> {
        self.fields().and_then(|fields| fields.get(key))
    }

    /// Attribute reached by walking nested trees and resources.
    pub fn path(&self, keys: &[&str]) -> Option<&Attr> {
        self.fields().and_then(|fields| fields.path(keys))
    }

    /// Absolute URL of this resource for the given identifiers.
    ///
    /// # Errors
    ///
    /// Fails if the handle has no template or the identifiers do not fit it.
    pub fn url(&self, ids: impl IntoIds) -> Result<String> {
        let identity = self.bind_identity(ids)?;
        Ok(self.ctx.options().rest_url(&identity.path()))
    }

    /// Fetch the resource identified by `ids` into this handle.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::RemoteApi`] on a non-2xx response; the handle is
    /// left as it was.
    pub async fn find(&mut self, ids: impl IntoIds, params: &[(String, String)]) -> Result<()> {
        self.find_with_headers(ids, &[], params).await
    }

    /// [`Resource::find`] with extra request headers.
    ///
    /// `accept: application/json` is always sent and cannot be overridden.
    #[tracing::instrument(skip(self, ids, headers, params), fields(kind = %self.kind))]
    pub async fn find_with_headers(
        &mut self,
        ids: impl IntoIds,
        headers: &[(String, String)],
        params: &[(String, String)],
    ) -> Result<()> {
        let identity = self.bind_identity(ids)?;
        let url = self.ctx.options().rest_url(&identity.path());
        self.load(&url, &default_headers(headers), params).await?;
        self.identity = Some(identity);
        Ok(())
    }

    /// PUT the field `values` to the self link, then reload from the server.
    ///
    /// After success the handle reflects what the server returned, which may
    /// differ from what was sent.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::InvalidResourceState`] on an unbound handle and
    /// [`JiraError::RemoteApi`] on a non-2xx response to either request.
    #[tracing::instrument(skip(self, values), fields(kind = %self.kind))]
    pub async fn update(&mut self, values: Map<String, Value>) -> Result<()> {
        let self_link = self.require_self_link("update")?.to_string();
        let body = self.kind.update_body(values, self.raw())?;

        self.ctx
            .transport()
            .put(&self_link, &body.to_string(), &[])
            .await?
            .error_for_status()?;

        self.load(&self_link, &default_headers(&[]), &[]).await
    }

    /// [`Resource::update`] from any struct serializing to an object.
    pub async fn update_with<T: Serialize + ?Sized>(&mut self, body: &T) -> Result<()> {
        match serde_json::to_value(body)? {
            Value::Object(values) => self.update(values).await,
            other => Err(JiraError::Materialization(format!(
                "update body must serialize to an object, got {other}"
            ))),
        }
    }

    /// DELETE the self link with the given query parameters.
    ///
    /// Local state is kept; discard the handle afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::InvalidResourceState`] on an unbound handle or
    /// missing required parameters, and [`JiraError::RemoteApi`] on a
    /// non-2xx response.
    #[tracing::instrument(skip(self, params), fields(kind = %self.kind))]
    pub async fn delete(&self, params: Params) -> Result<()> {
        let self_link = self.require_self_link("delete")?;
        let params = self.kind.delete_params(params)?;

        self.ctx
            .transport()
            .delete(self_link, &[], &params)
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// [`Resource::delete`] with parameters from a serializable struct.
    pub async fn delete_with<T: Serialize + ?Sized>(&self, params: &T) -> Result<()> {
        self.delete(to_params(params)?).await
    }

    async fn load(
        &mut self,
        url: &str,
        headers: &[(String, String)],
        params: &[(String, String)],
    ) -> Result<()> {
        let response = self
            .ctx
            .transport()
            .get(url, headers, params)
            .await?
            .error_for_status()?;

        let raw = match response.json::<Value>()? {
            Value::Object(raw) => raw,
            other => {
                return Err(JiraError::Materialization(format!(
                    "{url} returned a non-object document: {other}"
                )))
            }
        };

        self.loaded = Some(Loaded::build(raw, &self.ctx)?);
        Ok(())
    }

    fn bind_identity(&self, ids: impl IntoIds) -> Result<ResourceIdentity> {
        let template = self.template.clone().ok_or_else(|| {
            JiraError::InvalidResourceState(format!("{} handle has no URL template", self.kind))
        })?;
        ResourceIdentity::new(template, ids)
    }

    fn require_self_link(&self, operation: &str) -> Result<&str> {
        self.self_link().ok_or_else(|| {
            JiraError::InvalidResourceState(format!(
                "cannot {operation} a {} handle that has not been loaded",
                self.kind
            ))
        })
    }
}

/// Caller headers plus `accept: application/json`, which always wins.
fn default_headers(user: &[(String, String)]) -> Headers {
    let mut headers: Headers = user
        .iter()
        .filter(|(name, _)| !name.eq_ignore_ascii_case("accept"))
        .cloned()
        .collect();
    headers.push(("accept".to_string(), "application/json".to_string()));
    headers
}
