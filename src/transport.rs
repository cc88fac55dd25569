//! HTTP transport.
//!
//! The resource layer talks to the server only through the [`Transport`]
//! trait, so the session (credentials, connection pool) is chosen once by
//! the client and reused by every handle it produces.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientOptions;
use crate::error::{ErrorPayload, JiraError, Result};

const USER_AGENT: &str = concat!("jirapi/", env!("CARGO_PKG_VERSION"));
const JSON: &str = "application/json";

/// Ordered query parameters.
pub type Params = Vec<(String, String)>;

/// Ordered request headers.
pub type Headers = Vec<(String, String)>;

/// Status, body and final URL of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
    pub url: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            url: url.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Convert a non-2xx response into [`JiraError::RemoteApi`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        Err(JiraError::RemoteApi {
            status_code: self.status,
            payload: ErrorPayload::from_body(&self.body),
            url: self.url,
        })
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Blocking-per-call access to the remote service.
///
/// A non-2xx status is not an error at this layer; callers decide with
/// [`RawResponse::error_for_status`]. Only failures to complete the
/// exchange at all are returned as `Err`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, headers: &[(String, String)], params: &[(String, String)])
        -> Result<RawResponse>;

    async fn put(&self, url: &str, body: &str, headers: &[(String, String)]) -> Result<RawResponse>;

    async fn post(
        &self,
        url: &str,
        body: &str,
        headers: &[(String, String)],
        params: &[(String, String)],
    ) -> Result<RawResponse>;

    async fn delete(
        &self,
        url: &str,
        headers: &[(String, String)],
        params: &[(String, String)],
    ) -> Result<RawResponse>;
}

/// reqwest-backed transport.
///
/// Cheaply cloneable; clones share the same connection pool.
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    credentials: Option<(String, String)>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("authenticated", &self.credentials.is_some())
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Build a transport for the given options.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(JiraError::Http)?;

        Ok(Self {
            http,
            credentials: options
                .credentials()
                .map(|c| (c.username.clone(), c.password.clone())),
        })
    }

    fn prepare(&self, mut request: RequestBuilder, headers: &[(String, String)]) -> RequestBuilder {
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request
    }

    fn with_body(request: RequestBuilder, body: &str, headers: &[(String, String)]) -> RequestBuilder {
        let has_content_type = headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));
        let request = if has_content_type {
            request
        } else {
            request.header(CONTENT_TYPE, JSON)
        };
        request.body(body.to_string())
    }

    async fn send(request: RequestBuilder) -> Result<RawResponse> {
        let response = request.send().await.map_err(JiraError::Http)?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response.text().await.map_err(JiraError::Http)?;
        tracing::debug!(status, url = %url, "response received");
        Ok(RawResponse { status, body, url })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[tracing::instrument(skip(self, headers, params))]
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        params: &[(String, String)],
    ) -> Result<RawResponse> {
        let request = self.prepare(self.http.get(url), headers).query(params);
        Self::send(request).await
    }

    #[tracing::instrument(skip(self, body, headers))]
    async fn put(&self, url: &str, body: &str, headers: &[(String, String)]) -> Result<RawResponse> {
        let request = self.prepare(self.http.put(url), headers);
        Self::send(Self::with_body(request, body, headers)).await
    }

    #[tracing::instrument(skip(self, body, headers, params))]
    async fn post(
        &self,
        url: &str,
        body: &str,
        headers: &[(String, String)],
        params: &[(String, String)],
    ) -> Result<RawResponse> {
        let request = self.prepare(self.http.post(url), headers).query(params);
        Self::send(Self::with_body(request, body, headers)).await
    }

    #[tracing::instrument(skip(self, headers, params))]
    async fn delete(
        &self,
        url: &str,
        headers: &[(String, String)],
        params: &[(String, String)],
    ) -> Result<RawResponse> {
        let request = self.prepare(self.http.delete(url), headers).query(params);
        Self::send(request).await
    }
}

/// Flatten a serializable struct into query parameters.
///
/// `None` fields are skipped, scalars are stringified and lists are
/// comma-joined, which is how the server expects multi-valued parameters.
///
/// # Errors
///
/// Returns an error if `value` does not serialize to a JSON object.
pub fn to_params<T: Serialize + ?Sized>(value: &T) -> Result<Params> {
    let Value::Object(map) = serde_json::to_value(value)? else {
        return Err(JiraError::Materialization(
            "query parameters must serialize to an object".to_string(),
        ));
    };

    Ok(map
        .into_iter()
        .filter_map(|(key, value)| param_text(&value).map(|text| (key, text)))
        .collect())
}

fn param_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) | Value::Object(_) => Some(value.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(param_text)
                .collect::<Vec<_>>()
                .join(","),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Query {
        jql: String,
        start_at: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        expand: Option<String>,
        fields: Vec<&'static str>,
        validate: Option<bool>,
    }

    #[test]
    fn test_to_params_flattens_struct() {
        let params = to_params(&Query {
            jql: "project = BULK".to_string(),
            start_at: 50,
            expand: None,
            fields: vec!["summary", "status"],
            validate: None,
        })
        .unwrap();

        assert_eq!(
            params,
            vec![
                ("jql".to_string(), "project = BULK".to_string()),
                ("startAt".to_string(), "50".to_string()),
                ("fields".to_string(), "summary,status".to_string()),
            ]
        );
    }

    #[test]
    fn test_to_params_rejects_non_object() {
        assert!(to_params(&vec![1, 2]).is_err());
    }

    #[test]
    fn test_error_for_status() {
        let ok = RawResponse::new(204, "", "http://host/x");
        assert!(ok.error_for_status().is_ok());

        let err = RawResponse::new(401, "", "http://host/x")
            .error_for_status()
            .unwrap_err();
        assert_eq!(err.status_code(), Some(401));
    }

    #[test]
    fn test_transport_debug_hides_credentials() {
        let options = ClientOptions::default().with_basic_auth("fred", "fred-password");
        let transport = HttpTransport::new(&options).unwrap();
        let debug = format!("{transport:?}");
        assert!(debug.contains("authenticated: true"));
        assert!(!debug.contains("fred-password"));
    }
}
