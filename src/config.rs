//! Client configuration.
//!
//! A [`ClientOptions`] value is built once per client and shared, unchanged,
//! with every resource handle the client produces.

use std::env;
use std::fmt;

use url::Url;

use crate::error::{JiraError, Result};

const DEFAULT_SERVER: &str = "http://localhost:2990/jira";
const DEFAULT_REST_PATH: &str = "api";
const DEFAULT_REST_API_VERSION: &str = "2";

/// HTTP basic credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Server location and REST root used to build every resource URL.
///
/// # Example
///
/// ```
/// use jirapi::ClientOptions;
///
/// # fn example() -> jirapi::Result<()> {
/// let options = ClientOptions::new("https://jira.example.com/")?
///     .with_rest_api_version("2");
/// assert_eq!(
///     options.rest_url("issue/ABC-1"),
///     "https://jira.example.com/rest/api/2/issue/ABC-1"
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    server: String,
    rest_path: String,
    rest_api_version: String,
    credentials: Option<Credentials>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            rest_path: DEFAULT_REST_PATH.to_string(),
            rest_api_version: DEFAULT_REST_API_VERSION.to_string(),
            credentials: None,
        }
    }
}

impl ClientOptions {
    /// Options for the given server with the default REST root (`api/2`).
    ///
    /// A single trailing slash is stripped since every URL is built by
    /// appending `/rest/...` to the server.
    ///
    /// # Errors
    ///
    /// Returns an error if `server` is not a valid absolute URL.
    pub fn new(server: &str) -> Result<Self> {
        Url::parse(server)?;
        let server = server.strip_suffix('/').unwrap_or(server);

        Ok(Self {
            server: server.to_string(),
            ..Default::default()
        })
    }

    /// Read options from environment variables.
    ///
    /// - `JIRA_SERVER` (optional) - defaults to `http://localhost:2990/jira`
    /// - `JIRA_REST_PATH` (optional) - defaults to `api`
    /// - `JIRA_REST_API_VERSION` (optional) - defaults to `2`
    /// - `JIRA_USERNAME` / `JIRA_PASSWORD` (optional, together)
    ///
    /// # Errors
    ///
    /// Returns an error if the server URL is invalid or only one of the
    /// credential variables is set.
    pub fn from_env() -> Result<Self> {
        let server = env::var("JIRA_SERVER").unwrap_or_else(|_| DEFAULT_SERVER.to_string());
        let mut options = Self::new(&server)?;

        if let Ok(rest_path) = env::var("JIRA_REST_PATH") {
            options = options.with_rest_path(&rest_path);
        }
        if let Ok(version) = env::var("JIRA_REST_API_VERSION") {
            options = options.with_rest_api_version(&version);
        }

        match (env::var("JIRA_USERNAME"), env::var("JIRA_PASSWORD")) {
            (Ok(username), Ok(password)) => Ok(options.with_basic_auth(&username, &password)),
            (Err(_), Err(_)) => Ok(options),
            _ => Err(JiraError::ConfigMissing(
                "JIRA_USERNAME and JIRA_PASSWORD must be set together".to_string(),
            )),
        }
    }

    /// Use a different REST root segment (e.g. a plugin's `greenhopper`).
    #[must_use]
    pub fn with_rest_path(mut self, rest_path: &str) -> Self {
        self.rest_path = rest_path.trim_matches('/').to_string();
        self
    }

    /// Use a different REST API version segment.
    #[must_use]
    pub fn with_rest_api_version(mut self, version: &str) -> Self {
        self.rest_api_version = version.trim_matches('/').to_string();
        self
    }

    /// Send HTTP basic credentials with every request.
    #[must_use]
    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        });
        self
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn rest_path(&self) -> &str {
        &self.rest_path
    }

    pub fn rest_api_version(&self) -> &str {
        &self.rest_api_version
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// `{server}/rest/{rest_path}/{rest_api_version}/`
    pub fn rest_base(&self) -> String {
        format!(
            "{}/rest/{}/{}/",
            self.server, self.rest_path, self.rest_api_version
        )
    }

    /// Absolute URL for a path below the REST root.
    pub fn rest_url(&self, path: &str) -> String {
        let mut url = self.rest_base();
        url.push_str(path);
        url
    }

    /// Absolute URL for a path below the authentication REST root.
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/rest/auth/1/{path}", self.server)
    }
}
