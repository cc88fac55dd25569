//! JIRA REST API client library.
//!
//! Every REST entity with a self link is exposed as a [`Resource`] handle
//! that can be found by URL template, updated and deleted. Responses are
//! materialized recursively: any nested object carrying a `self` link
//! becomes a handle of the kind its URL shape maps to in the
//! [`TypeRegistry`], everything else stays an [`AttributeTree`].
//!
//! # Quick Start
//!
//! ```no_run
//! use jirapi::{JiraClient, SearchQuery};
//!
//! #[tokio::main]
//! async fn main() -> jirapi::Result<()> {
//!     // Create client from environment variables
//!     let client = JiraClient::from_env()?;
//!
//!     // Get an issue and walk into its nested resources
//!     let issue = client.issue("BULK-1", None, None).await?;
//!     let status = issue.path(&["fields", "status", "name"]).and_then(|s| s.as_str());
//!     println!("Status: {status:?}");
//!
//!     // Search with JQL
//!     let page = client.search_issues(&SearchQuery::new("project = BULK")).await?;
//!     println!("Found {} of {:?} issues", page.len(), page.total);
//!
//!     // Load any endpoint by template
//!     let info = client.find("serverInfo", ()).await?;
//!     println!("{:?}", info.get("version"));
//!
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! [`JiraClient::from_env`] reads:
//!
//! - `JIRA_SERVER` (optional) - Base URL (defaults to `http://localhost:2990/jira`)
//! - `JIRA_REST_PATH` / `JIRA_REST_API_VERSION` (optional) - defaults `api` and `2`
//! - `JIRA_USERNAME` / `JIRA_PASSWORD` (optional, together) - basic auth

pub mod cli;
mod client;
mod config;
mod error;
mod identity;
pub mod materialize;
pub mod output;
mod pagination;
mod resource;
mod transport;

// Re-export core types
pub use client::{JiraClient, NewComponent, NewVersion, SearchQuery, WorklogEstimate};
pub use config::{ClientOptions, Credentials};
pub use error::{ErrorPayload, JiraError, Result};
pub use pagination::{Page, PaginationParams};

// Resource layer
pub use identity::{as_identifier, AsIdentifier, IntoIds, ResourceIdentity};
pub use materialize::{materialize, Attr, AttributeTree};
pub use resource::{
    ComponentDeleteParams, Context, IssueDeleteParams, RemoteLinkUpdate, Resource, ResourceKind,
    RoleUpdate, TypeRegistry, VersionDeleteParams, WatcherDeleteParams, WorklogDeleteParams,
};

// Transport seam
pub use transport::{to_params, Headers, HttpTransport, Params, RawResponse, Transport};
