//! Error types for the fatzebra-rs library.
//!
//! Every gateway call fails with exactly one of two kinds of error: the request
//! never produced a gateway response ([`GatewayError::Transport`]), or the gateway
//! (or the client, before sending) rejected it ([`GatewayError::Application`]).

use std::error::Error as StdError;
use thiserror::Error;

/// Boxed underlying cause carried by a [`GatewayError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Message used when a gateway response cannot be decoded.
pub const PARSE_FAILURE_MESSAGE: &str = "Could not parse response from the gateway";

/// Main error type for gateway operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The gateway was never reached, or the connection failed mid-request.
    #[error("{message}")]
    Transport {
        /// Technical description of the failure
        message: String,

        /// Set for DNS, connect and timeout failures, where a caller may retry
        timeout: bool,

        /// Underlying HTTP client or URL error
        #[source]
        source: Option<BoxError>,
    },

    /// The gateway declined or rejected the request, its response could not be
    /// decoded, or the request was refused locally before sending.
    #[error("{}", .messages.join(", "))]
    Application {
        /// Human readable messages, suitable for display
        messages: Vec<String>,

        /// Underlying decode or header error, if any
        #[source]
        source: Option<BoxError>,
    },
}

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    /// Creates an application error from one or more messages.
    pub fn application<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GatewayError::Application {
            messages: messages.into_iter().map(Into::into).collect(),
            source: None,
        }
    }

    /// Creates an application error with a single message and its cause.
    pub fn application_with_source(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        GatewayError::Application {
            messages: vec![message.into()],
            source: Some(source.into()),
        }
    }

    /// Creates a transport error without an underlying cause.
    pub fn transport(message: impl Into<String>, timeout: bool) -> Self {
        GatewayError::Transport {
            message: message.into(),
            timeout,
            source: None,
        }
    }

    /// Returns true for transport failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, GatewayError::Transport { .. })
    }

    /// Returns true when the failure was a DNS, connect or timeout failure.
    ///
    /// Always false for application errors.
    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Transport { timeout: true, .. })
    }

    /// The individual messages carried by the error.
    ///
    /// A transport error yields its single technical message.
    pub fn messages(&self) -> Vec<String> {
        match self {
            GatewayError::Transport { message, .. } => vec![message.clone()],
            GatewayError::Application { messages, .. } => messages.clone(),
        }
    }

    /// The messages joined with `", "`.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        let host = err
            .url()
            .and_then(|url| url.host_str())
            .unwrap_or("gateway")
            .to_string();

        let (message, timeout) = if err.is_connect() && is_dns_failure(&err) {
            (format!("Unable to resolve address for {}", host), true)
        } else if err.is_connect() {
            (format!("Unable to connect to Gateway: {}", root_cause(&err)), true)
        } else if err.is_timeout() {
            (format!("Request to {} timed out", host), true)
        } else {
            (format!("HTTP error: {}", err), false)
        };

        GatewayError::Transport {
            message,
            timeout,
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Application {
            messages: vec![PARSE_FAILURE_MESSAGE.to_string()],
            source: Some(Box::new(err)),
        }
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(err: url::ParseError) -> Self {
        GatewayError::Transport {
            message: format!("URL parse error: {}", err),
            timeout: false,
            source: Some(Box::new(err)),
        }
    }
}

/// Walks the source chain looking for the resolver's failure.
fn is_dns_failure(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        let text = e.to_string().to_ascii_lowercase();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return true;
        }
        current = e.source();
    }
    false
}

fn root_cause(err: &(dyn StdError + 'static)) -> String {
    let mut current = err;
    while let Some(next) = current.source() {
        current = next;
    }
    current.to_string()
}
