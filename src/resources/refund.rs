//! Refunds against earlier purchases.

use super::purchase::Purchase;
use super::{non_empty, post, sealed, Resource};
use crate::config::GatewayContext;
use crate::envelope::{date_format, string_or_number};
use crate::errors::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The refund request sent to the gateway.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RefundRequest {
    /// ID of the purchase being refunded
    pub transaction_id: String,

    /// Merchant reference for the refund; omitted from the request when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Amount to refund, in minor currency units
    pub amount: i64,
}

impl RefundRequest {
    /// Creates a refund request.
    pub fn new(
        transaction_id: impl Into<String>,
        reference: impl Into<String>,
        amount: i64,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            reference: Some(reference.into()),
            amount,
        }
    }

    /// Creates a refund request that carries no merchant reference.
    pub fn without_reference(transaction_id: impl Into<String>, amount: i64) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            reference: None,
            amount,
        }
    }
}

/// A refund as recorded by the gateway.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Refund {
    /// Gateway ID
    pub id: String,

    /// Merchant reference
    pub reference: Option<String>,

    /// Refunded amount
    pub amount: i64,

    /// Authorisation ID
    #[serde(deserialize_with = "string_or_number")]
    pub authorization: Option<String>,

    /// Gateway message for the transaction
    pub message: Option<String>,

    /// Card holder's name
    pub card_holder: Option<String>,

    /// Masked card number
    pub card_number: Option<String>,

    /// Card expiry
    #[serde(with = "date_format")]
    pub card_expiry: Option<NaiveDate>,

    /// Card scheme (e.g. VISA)
    pub card_type: Option<String>,

    /// Transaction date
    #[serde(with = "date_format")]
    pub transaction_date: Option<NaiveDate>,

    /// Whether the refund was approved
    pub successful: bool,

    /// Acquirer response code
    pub response_code: Option<String>,
}

impl sealed::private::Sealed for Refund {}

impl Resource for Refund {
    const KIND: &'static str = "refund";

    fn id(&self) -> Option<&str> {
        non_empty(&self.id)
    }

    fn response_code(&self) -> Option<&str> {
        self.response_code.as_deref().and_then(non_empty)
    }
}

impl Refund {
    /// Refunds a transaction.
    pub async fn create(ctx: &GatewayContext, request: &RefundRequest) -> Result<Refund> {
        let envelope = post::<Refund, _>(ctx, "refunds", request).await?;
        Ok(envelope.response)
    }

    /// Refunds a transaction, reusing the original purchase's reference.
    ///
    /// Makes two gateway calls: a lookup of the purchase, then the refund.
    pub async fn create_for_transaction(
        ctx: &GatewayContext,
        amount: i64,
        transaction_id: &str,
    ) -> Result<Refund> {
        let purchase = Purchase::find(ctx, transaction_id).await?;
        let request = match purchase.reference.filter(|r| !r.is_empty()) {
            Some(reference) => RefundRequest::new(transaction_id, reference, amount),
            None => RefundRequest::without_reference(transaction_id, amount),
        };
        Refund::create(ctx, &request).await
    }
}
