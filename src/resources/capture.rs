//! Captures of previously authorised purchases.

use super::{non_empty, post, sealed, Resource};
use crate::config::GatewayContext;
use crate::envelope::{date_format, string_or_number};
use crate::errors::Result;
use crate::transport::encode_segment;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The capture request sent to the gateway.
///
/// Only `amount` is sent in the body; the authorisation's ID is part of the
/// request path.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    /// ID of the authorisation being captured
    #[serde(skip)]
    pub transaction_id: String,

    /// Amount to capture, in minor currency units
    pub amount: i64,
}

impl CaptureRequest {
    /// Creates a capture request.
    pub fn new(transaction_id: impl Into<String>, amount: i64) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            amount,
        }
    }

    fn path(&self) -> String {
        format!("purchases/{}/capture", encode_segment(&self.transaction_id))
    }
}

/// The gateway's record of a capture.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct CaptureResult {
    /// Gateway ID of the captured transaction
    pub id: String,

    /// Captured amount
    pub amount: i64,

    /// Whether the capture was approved
    pub successful: bool,

    /// Gateway message for the transaction
    pub message: Option<String>,

    /// Acquirer response code
    pub response_code: Option<String>,

    /// Authorisation ID
    #[serde(deserialize_with = "string_or_number")]
    pub authorization: Option<String>,

    /// Merchant reference
    pub reference: Option<String>,

    /// Currency code
    pub currency: Option<String>,

    /// Transaction date
    #[serde(with = "date_format")]
    pub transaction_date: Option<NaiveDate>,

    /// Settlement date
    #[serde(with = "date_format")]
    pub settlement_date: Option<NaiveDate>,
}

impl sealed::private::Sealed for CaptureResult {}

impl Resource for CaptureResult {
    const KIND: &'static str = "capture";

    fn id(&self) -> Option<&str> {
        non_empty(&self.id)
    }

    fn response_code(&self) -> Option<&str> {
        self.response_code.as_deref().and_then(non_empty)
    }
}

impl CaptureResult {
    /// Captures an authorisation.
    pub async fn create(ctx: &GatewayContext, request: &CaptureRequest) -> Result<CaptureResult> {
        let envelope = post::<CaptureResult, _>(ctx, &request.path(), request).await?;
        Ok(envelope.response)
    }
}
