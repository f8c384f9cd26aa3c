//! Purchases: card payments, optionally authorised now and captured later.

use super::capture::{CaptureRequest, CaptureResult};
use super::refund::{Refund, RefundRequest};
use super::{non_empty, post, request, sealed, Resource};
use crate::config::GatewayContext;
use crate::envelope::{date_format, string_or_number, validate_extra_keys};
use crate::errors::Result;
use crate::transport::{encode_segment, Payload, RequestType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

/// Default transaction currency.
pub const DEFAULT_CURRENCY: &str = "AUD";

/// Card details for a purchase.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Card {
    /// Card holder's name
    #[serde(rename = "card_holder")]
    pub holder: String,

    /// Card number
    #[serde(rename = "card_number")]
    pub number: String,

    /// Expiry date in `MM/YYYY` format
    #[serde(rename = "card_expiry")]
    pub expiry: String,

    /// Card security code
    pub cvv: String,
}

impl Card {
    /// Creates card details.
    ///
    /// # Examples
    ///
    /// ```
    /// use fatzebra_rs::Card;
    ///
    /// let card = Card::new("James Smith", "5123456789012346", "09/2027", "123");
    /// assert_eq!(card.expiry, "09/2027");
    /// ```
    pub fn new(
        holder: impl Into<String>,
        number: impl Into<String>,
        expiry: impl Into<String>,
        cvv: impl Into<String>,
    ) -> Self {
        Self {
            holder: holder.into(),
            number: number.into(),
            expiry: expiry.into(),
            cvv: cvv.into(),
        }
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tail = self
            .number
            .get(self.number.len().saturating_sub(4)..)
            .unwrap_or("");
        f.debug_struct("Card")
            .field("holder", &self.holder)
            .field("number", &format!("XXXX{}", tail))
            .field("expiry", &self.expiry)
            .field("cvv", &"<redacted>")
            .finish()
    }
}

/// The purchase request sent to the gateway.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PurchaseRequest {
    /// Amount in minor currency units (e.g. cents)
    pub amount: i64,

    /// Merchant reference, usually an order or invoice number
    pub reference: String,

    /// Card details
    #[serde(flatten)]
    pub card: Card,

    /// Capture immediately; `false` makes this an authorisation only
    pub capture: bool,

    /// ISO currency code
    pub currency: String,

    /// Customer's IP address
    pub customer_ip: String,

    /// Extra parameters (3-D Secure values, e-commerce indicator)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub extra: Option<BTreeMap<String, String>>,
}

impl PurchaseRequest {
    /// Creates a purchase request with immediate capture in AUD.
    pub fn new(
        amount: i64,
        reference: impl Into<String>,
        card: Card,
        customer_ip: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            reference: reference.into(),
            card,
            capture: true,
            currency: DEFAULT_CURRENCY.to_string(),
            customer_ip: customer_ip.into(),
            extra: None,
        }
    }

    /// Sets the transaction currency.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Sets whether to capture immediately.
    pub fn with_capture(mut self, capture: bool) -> Self {
        self.capture = capture;
        self
    }

    /// Sets the extra parameters.
    ///
    /// The gateway only honours these when the merchant account is configured
    /// for them.
    ///
    /// # Errors
    ///
    /// Returns an application error naming the first key outside
    /// `xid, cavv, sli, ecm, ver, par`.
    pub fn with_extra<I, K, V>(mut self, extra: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let extra: BTreeMap<String, String> = extra
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        validate_extra_keys(extra.keys().map(String::as_str))?;
        self.extra = Some(extra);
        Ok(self)
    }
}

/// A purchase as recorded by the gateway.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Purchase {
    /// Gateway ID
    pub id: String,

    /// Amount in minor currency units
    pub amount: i64,

    /// Amount in major currency units
    pub decimal_amount: f64,

    /// Total captured so far
    pub captured_total: i64,

    /// Captured amount as reported by the gateway
    pub captured_amount: Option<i64>,

    /// Whether the purchase has been captured
    pub captured: bool,

    /// Authorisation ID
    #[serde(deserialize_with = "string_or_number")]
    pub authorization: Option<String>,

    /// Masked card number
    pub card_number: Option<String>,

    /// Card holder's name
    pub card_holder: Option<String>,

    /// Card expiry
    #[serde(with = "date_format")]
    pub card_expiry: Option<NaiveDate>,

    /// Card token
    pub card_token: Option<String>,

    /// Whether the transaction was approved
    pub successful: bool,

    /// Gateway message for the transaction
    pub message: Option<String>,

    /// Merchant reference
    pub reference: Option<String>,

    /// Currency code
    pub currency: Option<String>,

    /// Settlement date
    #[serde(with = "date_format")]
    pub settlement_date: Option<NaiveDate>,

    /// Transaction date
    #[serde(with = "date_format")]
    pub transaction_date: Option<NaiveDate>,

    /// Acquirer response code
    pub response_code: Option<String>,

    /// Retrieval reference number
    pub rrn: Option<String>,

    /// CVV match result
    pub cvv_match: Option<String>,
}

impl sealed::private::Sealed for Purchase {}

impl Resource for Purchase {
    const KIND: &'static str = "purchase";

    fn id(&self) -> Option<&str> {
        non_empty(&self.id)
    }

    fn response_code(&self) -> Option<&str> {
        self.response_code.as_deref().and_then(non_empty)
    }
}

impl Purchase {
    /// Creates a purchase.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use fatzebra_rs::{Card, GatewayContext, Purchase, PurchaseRequest};
    ///
    /// # async fn example() -> fatzebra_rs::Result<()> {
    /// let ctx = GatewayContext::new("TEST", "TEST", true);
    /// let card = Card::new("James Smith", "5123456789012346", "09/2027", "123");
    /// let request = PurchaseRequest::new(15075, "INV-1001", card, "203.0.113.7")
    ///     .with_extra([("ecm", "22")])?;
    ///
    /// let purchase = Purchase::create(&ctx, &request).await?;
    /// println!("{} {}", purchase.id, purchase.message.unwrap_or_default());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create(ctx: &GatewayContext, request: &PurchaseRequest) -> Result<Purchase> {
        let envelope = post::<Purchase, _>(ctx, "purchases", request).await?;
        Ok(envelope.response)
    }

    /// Finds a purchase by gateway ID or merchant reference.
    pub async fn find(ctx: &GatewayContext, id_or_reference: &str) -> Result<Purchase> {
        let path = format!("purchases/{}", encode_segment(id_or_reference));
        let envelope = request::<Purchase>(ctx, RequestType::Get, &path, Payload::Empty).await?;
        Ok(envelope.response)
    }

    /// Refunds part or all of this purchase.
    pub async fn refund(
        &self,
        ctx: &GatewayContext,
        amount: i64,
        reference: impl Into<String>,
    ) -> Result<Refund> {
        Refund::create(ctx, &RefundRequest::new(self.id.clone(), reference, amount)).await
    }

    /// Captures a previously authorised purchase.
    ///
    /// On an approved capture, `captured` becomes true and `captured_total`
    /// is set to `amount`. These fields are a local view only; use
    /// [`Purchase::find`] for the gateway's record.
    pub async fn capture(&mut self, ctx: &GatewayContext, amount: i64) -> Result<CaptureResult> {
        let request = CaptureRequest::new(self.id.clone(), amount);
        let result = CaptureResult::create(ctx, &request).await?;

        if result.successful {
            self.captured = true;
            self.captured_total = amount;
            info!(id = %self.id, amount, "purchase captured");
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{decode, encode};
    use crate::transport::RawResponse;
    use serde_json::{json, Value};

    fn card() -> Card {
        Card::new("James Smith", "5123456789012346", "09/2027", "591")
    }

    #[test]
    fn test_purchase_request_defaults() {
        let request = PurchaseRequest::new(100, "ORDER-1", card(), "1.2.3.4");
        assert!(request.capture);
        assert_eq!(request.currency, "AUD");
        assert!(request.extra.is_none());
    }

    #[test]
    fn test_purchase_request_wire_format() {
        let request = PurchaseRequest::new(151, "ORDER-2", card(), "1.2.3.4")
            .with_currency("USD")
            .with_capture(false);

        let value: Value = serde_json::from_slice(&encode(&request).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "amount": 151,
                "reference": "ORDER-2",
                "card_holder": "James Smith",
                "card_number": "5123456789012346",
                "card_expiry": "09/2027",
                "cvv": "591",
                "capture": false,
                "currency": "USD",
                "customer_ip": "1.2.3.4"
            })
        );

        let back: PurchaseRequest = serde_json::from_value(value).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn test_extra_parameters() {
        let request = PurchaseRequest::new(100, "ORDER-3", card(), "1.2.3.4")
            .with_extra([("ecm", "22"), ("xid", "abc")])
            .unwrap();

        let value: Value = serde_json::from_slice(&encode(&request).unwrap()).unwrap();
        assert_eq!(value["extra"], json!({"ecm": "22", "xid": "abc"}));
    }

    #[test]
    fn test_extra_parameters_rejects_unknown_key() {
        let err = PurchaseRequest::new(100, "ORDER-4", card(), "1.2.3.4")
            .with_extra([("foo", "bar")])
            .unwrap_err();

        assert!(!err.is_transport());
        assert_eq!(err.messages(), vec!["Extra parameter key foo is not supported"]);
    }

    #[test]
    fn test_card_debug_is_masked() {
        let debug = format!("{:?}", card());
        assert!(debug.contains("XXXX2346"));
        assert!(!debug.contains("5123456789012346"));
        assert!(!debug.contains("591"));
    }

    #[test]
    fn test_decode_purchase() {
        let raw = RawResponse {
            status: 200,
            body: json!({
                "successful": true,
                "errors": [],
                "test": false,
                "response": {
                    "id": "123-P-ABC",
                    "amount": 100,
                    "successful": true,
                    "message": "Approved",
                    "response_code": "00"
                }
            })
            .to_string(),
            ..RawResponse::default()
        };

        let purchase = decode::<Purchase>(raw).unwrap().response;
        assert_eq!(purchase.id, "123-P-ABC");
        assert_eq!(purchase.amount, 100);
        assert!(purchase.successful);
        assert_eq!(purchase.response_message(), "Approved");
        assert_eq!(Resource::id(&purchase), Some("123-P-ABC"));
    }

    #[test]
    fn test_decode_full_gateway_purchase() {
        let body = r#"{"successful": true, "response": {"authorization": 0,
            "id": "369-P-89IY10K7", "card_number": "5523509999995094", "card_holder": "NA",
            "card_expiry": "2017-01-31", "card_token": "lqvubzsr", "amount": 1,
            "decimal_amount": 0.01, "successful": false, "message": "Timeout",
            "reference": "1234-140902092649405", "currency": "AUD",
            "transaction_id": "369-P-89IY10K7", "settlement_date": null,
            "transaction_date": "2014-09-02T11:25:53+10:00", "response_code": "01",
            "captured": true, "captured_amount": 1, "rrn": null, "cvv_match": "U"},
            "errors": [], "test": false}"#;

        let purchase = decode::<Purchase>(RawResponse {
            status: 200,
            body: body.to_string(),
            ..RawResponse::default()
        })
        .unwrap()
        .response;

        assert_eq!(purchase.id, "369-P-89IY10K7");
        assert_eq!(purchase.authorization.as_deref(), Some("0"));
        assert_eq!(purchase.card_expiry, NaiveDate::from_ymd_opt(2017, 1, 31));
        assert_eq!(purchase.transaction_date, NaiveDate::from_ymd_opt(2014, 9, 2));
        assert_eq!(purchase.settlement_date, None);
        assert!(!purchase.successful);
        assert!(purchase.captured);
        assert_eq!(purchase.captured_amount, Some(1));
        assert_eq!(purchase.captured_total, 0);
        assert_eq!(purchase.response_message(), "Refer to Card Issuer");
    }

    #[test]
    fn test_decode_purchase_with_both_capture_totals() {
        let raw = RawResponse {
            status: 200,
            body: json!({
                "successful": true,
                "errors": [],
                "test": true,
                "response": {
                    "id": "123-P-ABC",
                    "amount": 100,
                    "successful": true,
                    "captured": true,
                    "captured_total": 100,
                    "captured_amount": 100
                }
            })
            .to_string(),
            ..RawResponse::default()
        };

        let purchase = decode::<Purchase>(raw).unwrap().response;
        assert!(purchase.captured);
        assert_eq!(purchase.captured_total, 100);
        assert_eq!(purchase.captured_amount, Some(100));
    }

    #[test]
    fn test_missing_response_code() {
        let purchase = Purchase::default();
        assert_eq!(Resource::id(&purchase), None);
        assert_eq!(Resource::response_code(&purchase), None);
        assert_eq!(purchase.response_message(), "Unknown");
    }
}
