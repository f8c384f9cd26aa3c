//! HTTP transport for gateway requests.
//!
//! This module turns a verb, a path relative to the gateway base URL and a payload
//! into an authenticated HTTPS request, sends it, and hands back the raw status,
//! headers and body. Interpreting the body is left to [`crate::envelope`].

use crate::config::{GatewayContext, VERSION};
use crate::errors::{GatewayError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT_CHARSET, AUTHORIZATION, CONTENT_TYPE, USER_AGENT,
};
use reqwest::{Client, Method};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument, warn};
use url::Url;

/// Charset announced on every request.
pub const CHARSET: &str = "UTF-8";

/// Content type of request bodies.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Header carrying the client's platform details as a JSON object.
pub const CLIENT_USER_AGENT_HEADER: &str = "x-client-user-agent";

/// HTTP verbs understood by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    /// Read a resource; parameters travel in the query string
    Get,
    /// Create a resource from a JSON body
    Post,
    /// Remove or void a resource, with a JSON body
    Delete,
}

impl RequestType {
    fn method(self) -> Method {
        match self {
            RequestType::Get => Method::GET,
            RequestType::Post => Method::POST,
            RequestType::Delete => Method::DELETE,
        }
    }
}

/// What to send along with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Nothing
    Empty,
    /// A query string, appended to the URL after `?`
    Query(String),
    /// An encoded JSON body
    Json(Vec<u8>),
}

/// The gateway's answer, before the envelope is interpreted.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,

    /// Response headers, keyed by lower-case name
    pub headers: HashMap<String, Vec<String>>,

    /// Response body
    pub body: String,
}

impl RawResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Builds the full request URL for `path` under the context's base URL.
///
/// # Examples
///
/// ```
/// use fatzebra_rs::config::GatewayContext;
/// use fatzebra_rs::transport::build_url;
///
/// let ctx = GatewayContext::new("TEST", "TEST", true);
/// let url = build_url(&ctx, "purchases", Some("limit=1")).unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://gateway.sandbox.fatzebra.com.au/v1.0/purchases?limit=1"
/// );
/// ```
pub fn build_url(ctx: &GatewayContext, path: &str, query: Option<&str>) -> Result<Url> {
    let mut target = format!("{}{}", ctx.base_url(), path);
    if let Some(query) = query {
        target.push('?');
        target.push_str(query);
    }
    Ok(Url::parse(&target)?)
}

/// Percent-encodes a value for use as a single path segment.
pub fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Encodes the context's credentials for the `Authorization` header.
pub fn basic_credentials(ctx: &GatewayContext) -> String {
    BASE64.encode(format!("{}:{}", ctx.username, ctx.token).as_bytes())
}

/// The `User-Agent` sent with every request.
pub fn user_agent() -> String {
    format!("Fat Zebra v1 - Rust {}", VERSION)
}

/// Platform details for the `X-Client-User-Agent` header.
///
/// Returns `None` if the details cannot be serialized; the header is optional.
pub fn client_user_agent() -> Option<String> {
    let mut properties = BTreeMap::new();
    properties.insert("os.name", std::env::consts::OS);
    properties.insert("os.family", std::env::consts::FAMILY);
    properties.insert("os.arch", std::env::consts::ARCH);
    properties.insert("bindings.version", VERSION);
    properties.insert("lang", "Rust");
    properties.insert("publisher", "Fat Zebra");

    serde_json::to_string(&properties).ok()
}

/// Builds the headers shared by every request.
pub fn default_headers(ctx: &GatewayContext) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_CHARSET, HeaderValue::from_static(CHARSET));

    let agent = HeaderValue::from_str(&user_agent())
        .map_err(|e| GatewayError::application_with_source("Invalid user agent", e))?;
    headers.insert(USER_AGENT, agent);

    let auth = HeaderValue::from_str(&format!("Basic {}", basic_credentials(ctx)))
        .map_err(|e| GatewayError::application_with_source("Invalid credentials", e))?;
    headers.insert(AUTHORIZATION, auth);

    match client_user_agent().map(|json| HeaderValue::from_str(&json)) {
        Some(Ok(value)) => {
            headers.insert(HeaderName::from_static(CLIENT_USER_AGENT_HEADER), value);
        }
        _ => debug!("skipping client user agent header"),
    }

    Ok(headers)
}

fn client_for(ctx: &GatewayContext) -> Result<Client> {
    if let Some(client) = &ctx.http_client {
        return Ok(client.clone());
    }

    // A fresh client has no pooled connections, so the host is resolved again.
    Ok(Client::builder()
        .connect_timeout(ctx.timeout)
        .timeout(ctx.timeout)
        .build()?)
}

/// Sends one request to the gateway.
///
/// Non-2xx responses are returned like any other; the gateway reports declines
/// and validation failures in the body.
///
/// # Arguments
///
/// * `ctx` - Credentials and environment
/// * `request_type` - HTTP verb
/// * `path` - Path relative to the base URL (e.g. `purchases`)
/// * `payload` - Query string or JSON body
///
/// # Errors
///
/// Returns [`GatewayError::Transport`] when no response was received; DNS,
/// connect and timeout failures have `timeout` set.
#[instrument(skip(ctx, payload), fields(sandbox = ctx.sandbox))]
pub async fn execute(
    ctx: &GatewayContext,
    request_type: RequestType,
    path: &str,
    payload: Payload,
) -> Result<RawResponse> {
    let query = match &payload {
        Payload::Query(query) => Some(query.as_str()),
        _ => None,
    };
    let url = build_url(ctx, path, query)?;
    let client = client_for(ctx)?;

    // Covers connect and read, including on caller-supplied clients.
    let mut request = client
        .request(request_type.method(), url)
        .timeout(ctx.timeout)
        .headers(default_headers(ctx)?);

    if let Payload::Json(body) = payload {
        request = request.header(CONTENT_TYPE, CONTENT_TYPE_JSON).body(body);
    }

    let response = request.send().await.map_err(|e| {
        let err = GatewayError::from(e);
        warn!(error = %err, timeout = err.is_timeout(), "gateway request failed");
        err
    })?;

    let status = response.status().as_u16();
    let mut headers: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in response.headers() {
        headers
            .entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }

    let body = response.text().await?;
    debug!(status, bytes = body.len(), "gateway responded");

    Ok(RawResponse {
        status,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_build_url() {
        let ctx = GatewayContext::new("TEST", "TEST", false);
        let url = build_url(&ctx, "purchases/123-P-ABC/capture", None).unwrap();
        assert_eq!(
            url.as_str(),
            "https://gateway.fatzebra.com.au/v1.0/purchases/123-P-ABC/capture"
        );
    }

    #[test]
    fn test_build_url_rejects_garbage_base() {
        let ctx = GatewayContext::new("TEST", "TEST", true).with_sandbox_url("not a url/");
        let err = build_url(&ctx, "purchases", None).unwrap_err();
        assert!(err.is_transport());
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("123-P-ABC"), "123-P-ABC");
        assert_eq!(encode_segment("ORDER#11"), "ORDER%2311");
        assert_eq!(encode_segment("a b+c/d"), "a%20b%2Bc%2Fd");
    }

    #[test]
    fn test_basic_credentials() {
        let ctx = GatewayContext::new("TEST", "TEST", true);
        assert_eq!(basic_credentials(&ctx), "VEVTVDpURVNU");
    }

    #[test]
    fn test_default_headers() {
        let ctx = GatewayContext::new("TEST", "TEST", true);
        let headers = default_headers(&ctx).unwrap();

        assert_eq!(headers[ACCEPT_CHARSET], "UTF-8");
        assert_eq!(headers[AUTHORIZATION], "Basic VEVTVDpURVNU");
        assert!(headers[USER_AGENT]
            .to_str()
            .unwrap()
            .starts_with("Fat Zebra v1 - Rust "));
        assert!(headers.get(CLIENT_USER_AGENT_HEADER).is_some());
    }

    #[test]
    fn test_client_user_agent_is_json() {
        let json = client_user_agent().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["lang"], "Rust");
        assert_eq!(value["publisher"], "Fat Zebra");
        assert_eq!(value["bindings.version"], VERSION);
        assert!(value["os.name"].is_string());
    }

    #[test]
    fn test_raw_response_success_range() {
        let mut raw = RawResponse {
            status: 201,
            ..RawResponse::default()
        };
        assert!(raw.is_success());
        raw.status = 422;
        assert!(!raw.is_success());
    }

    #[test]
    fn test_unresolved_host_is_timeout() {
        let ctx = GatewayContext::new("TEST", "TEST", true)
            .with_sandbox_url("https://gateway.does-not-exist.invalid/v1.0/")
            .with_timeout(Duration::from_secs(10));

        let err =
            tokio_test::block_on(execute(&ctx, RequestType::Get, "purchases/1", Payload::Empty))
                .unwrap_err();

        assert!(err.is_transport());
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_refused_connection_is_timeout() {
        let ctx = GatewayContext::new("TEST", "TEST", true)
            .with_sandbox_url("http://127.0.0.1:1/")
            .with_timeout(Duration::from_secs(5));

        let err = execute(&ctx, RequestType::Post, "purchases", Payload::Json(b"{}".to_vec()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GatewayError::Transport {
                timeout: true,
                source: Some(_),
                ..
            }
        ));
    }
}
