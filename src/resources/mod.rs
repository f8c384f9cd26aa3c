//! Gateway resources: purchases, refunds and captures.
//!
//! Each resource is a plain data type decoded from the `response` member of the
//! gateway envelope. The functions that create or look them up all follow the
//! same path: encode the request, send it, decode the envelope, and either
//! return the resource or fail with a single [`GatewayError`](crate::GatewayError).

pub mod capture;
pub mod purchase;
pub mod refund;
mod sealed;

use crate::config::GatewayContext;
use crate::envelope::{self, Envelope};
use crate::errors::Result;
use crate::response_codes::{message_for, UNKNOWN_RESPONSE};
use crate::transport::{self, Payload, RequestType};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

pub use capture::{CaptureRequest, CaptureResult};
pub use purchase::{Card, Purchase, PurchaseRequest};
pub use refund::{Refund, RefundRequest};

/// Common view over every resource the gateway returns.
///
/// This trait is sealed; the set of resources is fixed by this crate.
pub trait Resource: DeserializeOwned + sealed::private::Sealed {
    /// Name used in logs.
    const KIND: &'static str;

    /// The gateway-assigned identifier, if the gateway sent one.
    fn id(&self) -> Option<&str>;

    /// The acquirer response code, if the gateway sent one.
    fn response_code(&self) -> Option<&str>;

    /// Human readable meaning of [`Resource::response_code`].
    fn response_message(&self) -> &'static str {
        self.response_code()
            .map(message_for)
            .unwrap_or(UNKNOWN_RESPONSE)
    }
}

/// Sends a request and decodes the envelope as `T`.
pub(crate) async fn request<T: Resource>(
    ctx: &GatewayContext,
    request_type: RequestType,
    path: &str,
    payload: Payload,
) -> Result<Envelope<T>> {
    let raw = transport::execute(ctx, request_type, path, payload).await?;
    let envelope = envelope::decode::<T>(raw)?;

    debug!(
        kind = T::KIND,
        id = envelope.response.id().unwrap_or(""),
        response_code = envelope.response.response_code().unwrap_or(""),
        test = envelope.test,
        "gateway call succeeded"
    );

    Ok(envelope)
}

/// Encodes `payload` and POSTs it to `path`.
pub(crate) async fn post<T: Resource, P: Serialize>(
    ctx: &GatewayContext,
    path: &str,
    payload: &P,
) -> Result<Envelope<T>> {
    let body = envelope::encode(payload)?;
    request(ctx, RequestType::Post, path, Payload::Json(body)).await
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
