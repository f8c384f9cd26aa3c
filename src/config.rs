//! Gateway connection configuration.
//!
//! A [`GatewayContext`] carries everything a single gateway call needs to know
//! about where to send the request and how to authenticate it. Contexts are
//! plain values: build one per merchant account, or install a process-wide
//! default once at startup with [`GatewayContext::install_global`].

use crate::errors::{GatewayError, Result};
use reqwest::Client;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

/// Version of this library, reported to the gateway in the client headers.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Base URL of the live (production) gateway.
pub const LIVE_URL: &str = "https://gateway.fatzebra.com.au/v1.0/";

/// Base URL of the sandbox (test) gateway.
pub const SANDBOX_URL: &str = "https://gateway.sandbox.fatzebra.com.au/v1.0/";

/// Default connect and read timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

static GLOBAL_CONTEXT: OnceLock<GatewayContext> = OnceLock::new();

/// Credentials and environment for gateway requests.
#[derive(Clone)]
pub struct GatewayContext {
    /// Gateway username
    pub username: String,

    /// Gateway API token
    pub token: String,

    /// Send requests to the sandbox instead of the live gateway
    pub sandbox: bool,

    /// Base URL used when `sandbox` is false
    pub live_url: String,

    /// Base URL used when `sandbox` is true
    pub sandbox_url: String,

    /// Connect and read timeout
    pub timeout: Duration,

    /// HTTP client to use for requests.
    ///
    /// When unset, every call builds its own client so the gateway hostname is
    /// resolved afresh for each request.
    pub http_client: Option<Client>,
}

impl GatewayContext {
    /// Creates a new context for the given credentials.
    ///
    /// # Arguments
    ///
    /// * `username` - The gateway username
    /// * `token` - The gateway API token
    /// * `sandbox` - Whether to use the sandbox environment
    ///
    /// # Examples
    ///
    /// ```
    /// use fatzebra_rs::config::GatewayContext;
    ///
    /// let ctx = GatewayContext::new("TEST", "TEST", true);
    /// assert_eq!(ctx.base_url(), "https://gateway.sandbox.fatzebra.com.au/v1.0/");
    /// ```
    pub fn new(username: impl Into<String>, token: impl Into<String>, sandbox: bool) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
            sandbox,
            ..Self::default()
        }
    }

    /// Builds a context from `FATZEBRA_USERNAME`, `FATZEBRA_TOKEN`,
    /// `FATZEBRA_SANDBOX` and `FATZEBRA_TIMEOUT`.
    ///
    /// Unset variables keep their default values.
    ///
    /// # Errors
    ///
    /// Returns an application error naming the variable when `FATZEBRA_SANDBOX`
    /// is not a boolean or `FATZEBRA_TIMEOUT` is not a whole number of seconds.
    pub fn from_env() -> Result<Self> {
        let mut ctx = Self::default();

        if let Ok(username) = std::env::var("FATZEBRA_USERNAME") {
            ctx.username = username;
        }
        if let Ok(token) = std::env::var("FATZEBRA_TOKEN") {
            ctx.token = token;
        }
        if let Ok(sandbox) = std::env::var("FATZEBRA_SANDBOX") {
            ctx.sandbox = parse_flag(&sandbox).ok_or_else(|| {
                GatewayError::application([format!(
                    "FATZEBRA_SANDBOX must be true or false, got '{}'",
                    sandbox
                )])
            })?;
        }
        if let Ok(timeout) = std::env::var("FATZEBRA_TIMEOUT") {
            let secs = timeout.trim().parse::<u64>().map_err(|_| {
                GatewayError::application([format!(
                    "FATZEBRA_TIMEOUT must be a number of seconds, got '{}'",
                    timeout
                )])
            })?;
            ctx.timeout = Duration::from_secs(secs);
        }

        Ok(ctx)
    }

    /// Sets the live gateway base URL.
    pub fn with_live_url(mut self, url: impl Into<String>) -> Self {
        self.live_url = url.into();
        self
    }

    /// Sets the sandbox gateway base URL.
    pub fn with_sandbox_url(mut self, url: impl Into<String>) -> Self {
        self.sandbox_url = url.into();
        self
    }

    /// Sets the connect and read timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets a custom HTTP client.
    ///
    /// The context's timeout is still applied to every request. The client's
    /// connection pool is used as-is; pooled connections keep routing to the
    /// address resolved when they were opened.
    pub fn with_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// The base URL for the selected environment.
    pub fn base_url(&self) -> &str {
        if self.sandbox {
            &self.sandbox_url
        } else {
            &self.live_url
        }
    }

    /// Installs the process-wide default context.
    ///
    /// Only the first call succeeds; later calls hand their context back.
    pub fn install_global(ctx: GatewayContext) -> std::result::Result<(), GatewayContext> {
        GLOBAL_CONTEXT.set(ctx)
    }

    /// The process-wide default context.
    ///
    /// Falls back to the sandbox test credentials when nothing was installed.
    pub fn global() -> &'static GatewayContext {
        GLOBAL_CONTEXT.get_or_init(GatewayContext::default)
    }
}

impl Default for GatewayContext {
    fn default() -> Self {
        Self {
            username: "TEST".to_string(),
            token: "TEST".to_string(),
            sandbox: true,
            live_url: LIVE_URL.to_string(),
            sandbox_url: SANDBOX_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            http_client: None,
        }
    }
}

impl fmt::Debug for GatewayContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayContext")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .field("sandbox", &self.sandbox)
            .field("live_url", &self.live_url)
            .field("sandbox_url", &self.sandbox_url)
            .field("timeout", &self.timeout)
            .field("http_client", &self.http_client.is_some())
            .finish()
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context() {
        let ctx = GatewayContext::default();
        assert_eq!(ctx.username, "TEST");
        assert_eq!(ctx.token, "TEST");
        assert!(ctx.sandbox);
        assert_eq!(ctx.timeout, Duration::from_secs(60));
        assert!(ctx.http_client.is_none());
    }

    #[test]
    fn test_base_url_selection() {
        for (username, token) in [("TEST", "TEST"), ("merchant", "s3cr3t"), ("", "")] {
            let sandbox = GatewayContext::new(username, token, true);
            assert_eq!(sandbox.base_url(), SANDBOX_URL);

            let live = GatewayContext::new(username, token, false);
            assert_eq!(live.base_url(), LIVE_URL);
        }
    }

    #[test]
    fn test_config_builders() {
        let ctx = GatewayContext::new("user", "token", false)
            .with_live_url("https://live.example.com/v1.0/")
            .with_sandbox_url("https://sandbox.example.com/v1.0/")
            .with_timeout(Duration::from_secs(5))
            .with_client(Client::new());

        assert_eq!(ctx.base_url(), "https://live.example.com/v1.0/");
        assert_eq!(ctx.sandbox_url, "https://sandbox.example.com/v1.0/");
        assert_eq!(ctx.timeout, Duration::from_secs(5));
        assert!(ctx.http_client.is_some());
    }

    #[test]
    fn test_debug_hides_token() {
        let ctx = GatewayContext::new("user", "very-secret-token", true);
        let debug = format!("{:?}", ctx);
        assert!(debug.contains("user"));
        assert!(!debug.contains("very-secret-token"));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag(" FALSE "), Some(false));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_global_context() {
        let ctx = GatewayContext::global();
        assert!(!ctx.username.is_empty());

        let rejected = GatewayContext::install_global(GatewayContext::new("late", "late", false));
        assert!(rejected.is_err());
        assert!(std::ptr::eq(ctx, GatewayContext::global()));
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("FATZEBRA_USERNAME", "env-user");
        std::env::set_var("FATZEBRA_TOKEN", "env-token");
        std::env::set_var("FATZEBRA_SANDBOX", "false");
        std::env::set_var("FATZEBRA_TIMEOUT", "15");

        let ctx = GatewayContext::from_env().unwrap();
        assert_eq!(ctx.username, "env-user");
        assert_eq!(ctx.token, "env-token");
        assert!(!ctx.sandbox);
        assert_eq!(ctx.timeout, Duration::from_secs(15));

        std::env::set_var("FATZEBRA_TIMEOUT", "soon");
        let err = GatewayContext::from_env().unwrap_err();
        assert!(err.message().contains("FATZEBRA_TIMEOUT"));

        std::env::set_var("FATZEBRA_TIMEOUT", "15");
        std::env::set_var("FATZEBRA_SANDBOX", "maybe");
        let err = GatewayContext::from_env().unwrap_err();
        assert!(!err.is_transport());
        assert!(err.message().contains("FATZEBRA_SANDBOX"));
        assert!(err.message().contains("maybe"));

        for name in [
            "FATZEBRA_USERNAME",
            "FATZEBRA_TOKEN",
            "FATZEBRA_SANDBOX",
            "FATZEBRA_TIMEOUT",
        ] {
            std::env::remove_var(name);
        }
    }
}
