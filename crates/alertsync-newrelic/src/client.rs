use alertsync_core::{SyncError, SyncResult};
use reqwest::Method;
use serde_json::Value;
use url::Url;

/// Public REST API v2 base.
pub const DEFAULT_API_URL: &str = "https://api.newrelic.com/v2/";
/// Infrastructure alerts API base.
pub const DEFAULT_INFRA_API_URL: &str = "https://infra-api.newrelic.com/v2/";

const API_KEY_HEADER: &str = "X-Api-Key";

/// Base URLs of the two APIs alert conditions are spread across.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api: Url,
    pub infra: Url,
}

impl Endpoints {
    pub fn new(api: &str, infra: &str) -> SyncResult<Self> {
        Ok(Self {
            api: parse_base(api)?,
            infra: parse_base(infra)?,
        })
    }
}

/// Parses a base URL, making sure relative joins append to its path.
fn parse_base(raw: &str) -> SyncResult<Url> {
    let mut url = Url::parse(raw).map_err(|e| SyncError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Authenticated access to the New Relic APIs.
///
/// The HTTP client is injected so that callers control timeouts, proxies
/// and TLS settings. Cloning is cheap and shares the connection pool.
#[derive(Clone)]
pub struct NewRelicClient {
    http: reqwest::Client,
    endpoints: Endpoints,
    api_key: String,
}

impl NewRelicClient {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>, endpoints: Endpoints) -> Self {
        Self {
            http,
            endpoints,
            api_key: api_key.into(),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Resolves `path` against the REST API base.
    pub(crate) fn api_url(&self, path: &str) -> SyncResult<Url> {
        join(&self.endpoints.api, path)
    }

    /// Resolves `path` against the Infrastructure API base.
    pub(crate) fn infra_url(&self, path: &str) -> SyncResult<Url> {
        join(&self.endpoints.infra, path)
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header(API_KEY_HEADER, &self.api_key)
            .header("Accept", "application/json")
    }

    /// Sends one request and returns the decoded JSON body.
    ///
    /// Any non-2xx status becomes `SyncError::Transport` carrying the
    /// response body. An empty body decodes to `Value::Null`.
    pub(crate) async fn send(
        &self,
        operation: &str,
        method: Method,
        url: Url,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> SyncResult<Value> {
        tracing::debug!(%method, %url, ?query, operation, "sending request");

        let mut req = self.request(method.clone(), url.clone());
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| SyncError::Connection {
            operation: operation.to_string(),
            url: url.to_string(),
            message: e.to_string(),
        })?;
        handle_response(operation, &method, resp).await
    }
}

fn join(base: &Url, path: &str) -> SyncResult<Url> {
    base.join(path).map_err(|e| SyncError::InvalidUrl {
        url: format!("{base}{path}"),
        message: e.to_string(),
    })
}

async fn handle_response(
    operation: &str,
    method: &Method,
    resp: reqwest::Response,
) -> SyncResult<Value> {
    let status = resp.status();
    let url = resp.url().to_string();
    let body = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        tracing::debug!(%status, %url, operation, "request failed");
        return Err(SyncError::Transport {
            operation: operation.to_string(),
            method: method.to_string(),
            url,
            status: status.as_u16(),
            body: error_message(&body),
        });
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&body)
        .map_err(|e| SyncError::decode(operation, format!("invalid JSON from {url}: {e}")))
}

/// Pulls the human-readable message out of an API error body, falling back
/// to the raw text.
fn error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body)
        && let Some(title) = json
            .get("error")
            .and_then(|e| e.get("title"))
            .and_then(Value::as_str)
    {
        return title.to_string();
    }
    body.to_string()
}
