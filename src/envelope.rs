//! JSON encoding of requests and decoding of the gateway's response envelope.
//!
//! Every gateway response has the same outer shape:
//!
//! ```json
//! {"successful": true, "errors": [], "test": false, "response": { ... }}
//! ```
//!
//! The envelope flags say whether the call worked; the `response` member holds
//! the resource (purchase, refund, capture) the call produced.

use crate::errors::{GatewayError, Result, PARSE_FAILURE_MESSAGE};
use crate::transport::RawResponse;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Keys accepted in a purchase's `extra` parameters.
pub const PERMITTED_EXTRA_KEYS: [&str; 6] = ["xid", "cavv", "sli", "ecm", "ver", "par"];

/// A decoded gateway response.
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    /// HTTP status code
    pub status: u16,

    /// Raw response body
    pub body: String,

    /// Response headers, keyed by lower-case name
    pub headers: HashMap<String, Vec<String>>,

    /// Gateway-level success flag
    pub successful: bool,

    /// Gateway-level error messages
    pub errors: Vec<String>,

    /// Whether the gateway treated this as a test transaction
    pub test: bool,

    /// The resource returned by the gateway
    pub response: T,
}

#[derive(Deserialize)]
struct EnvelopeFlags {
    #[serde(default)]
    successful: Option<bool>,
    #[serde(default)]
    errors: Option<Vec<String>>,
    #[serde(default)]
    test: Option<bool>,
    #[serde(default)]
    response: Option<Value>,
}

/// Encodes a request payload as JSON.
///
/// Only the fields in the payload's serde schema are written; fields marked
/// `#[serde(skip)]` never reach the wire.
pub fn encode<P: Serialize>(payload: &P) -> Result<Vec<u8>> {
    serde_json::to_vec(payload)
        .map_err(|e| GatewayError::application([format!("Could not encode request: {}", e)]))
}

/// Decodes a gateway response into its envelope and inner resource.
///
/// # Errors
///
/// * the gateway's messages, when the envelope is not `successful`
/// * a parse failure, when the body is not JSON, has no `response` member, or
///   the member does not match `T`
///
/// # Examples
///
/// ```
/// use fatzebra_rs::envelope::decode;
/// use fatzebra_rs::transport::RawResponse;
/// use fatzebra_rs::Purchase;
///
/// let raw = RawResponse {
///     status: 200,
///     body: r#"{"successful":true,"errors":[],"test":true,
///              "response":{"id":"123-P-ABC","amount":100,"successful":true}}"#.to_string(),
///     ..RawResponse::default()
/// };
///
/// let envelope = decode::<Purchase>(raw).unwrap();
/// assert_eq!(envelope.response.id, "123-P-ABC");
/// assert!(envelope.test);
/// ```
pub fn decode<T: DeserializeOwned>(raw: RawResponse) -> Result<Envelope<T>> {
    let flags: EnvelopeFlags = serde_json::from_str(&raw.body).map_err(|e| {
        debug!(status = raw.status, error = %e, "response body is not an envelope");
        GatewayError::from(e)
    })?;

    let errors = flags.errors.unwrap_or_default();
    if !flags.successful.unwrap_or(false) {
        if errors.is_empty() {
            return Err(GatewayError::application([format!(
                "Gateway returned HTTP {} without error details",
                raw.status
            )]));
        }
        return Err(GatewayError::application(errors));
    }

    let inner = match flags.response {
        Some(value) if !value.is_null() => value,
        _ => {
            debug!(status = raw.status, "envelope has no response member");
            return Err(GatewayError::application([PARSE_FAILURE_MESSAGE]));
        }
    };
    let response = serde_json::from_value::<T>(inner)?;

    Ok(Envelope {
        status: raw.status,
        body: raw.body,
        headers: raw.headers,
        successful: true,
        errors,
        test: flags.test.unwrap_or(false),
        response,
    })
}

/// Checks extra-parameter keys against [`PERMITTED_EXTRA_KEYS`].
///
/// # Errors
///
/// Returns an application error naming the first key that is not permitted.
pub fn validate_extra_keys<'a, I>(keys: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    for key in keys {
        if !PERMITTED_EXTRA_KEYS.contains(&key) {
            return Err(GatewayError::application([format!(
                "Extra parameter key {} is not supported",
                key
            )]));
        }
    }
    Ok(())
}

/// Serde adapter for `yyyy-MM-dd` dates.
///
/// Full timestamps are accepted and truncated to their date; `null` and empty
/// strings become `None`.
pub mod date_format {
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    /// Wire format of gateway dates.
    pub const FORMAT: &str = "%Y-%m-%d";

    /// Serializes an optional date as `yyyy-MM-dd` or `null`.
    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional gateway date.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<String> = Option::deserialize(deserializer)?;
        match value.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => {
                let date = text.get(..10).unwrap_or(text);
                NaiveDate::parse_from_str(date, FORMAT)
                    .map(Some)
                    .map_err(|e| D::Error::custom(format!("invalid date '{}': {}", text, e)))
            }
        }
    }
}

/// Deserializes a value the gateway sends either as a string or as a number.
pub fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Text(String),
        Number(serde_json::Number),
        Flag(bool),
    }

    Ok(Option::<Loose>::deserialize(deserializer)?.map(|value| match value {
        Loose::Text(text) => text,
        Loose::Number(number) => number.to_string(),
        Loose::Flag(flag) => flag.to_string(),
    }))
}
