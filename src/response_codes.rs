//! Acquirer response code lookup.
//!
//! The acquiring bank reports each transaction outcome as a two-digit code.
//! This table turns that code into a short human-readable message. It is for
//! display and diagnostics only: whether a transaction succeeded is decided by
//! the gateway's `successful` flags, never by this table.

/// Message returned for codes that are not in the table.
pub const UNKNOWN_RESPONSE: &str = "Unknown";

/// Outcome messages indexed by the numeric value of the response code.
pub const RESPONSE_MESSAGES: [&str; 99] = [
    "Approved",
    "Refer to Card Issuer",
    "Refer to Card Issuer",
    "No Merchant",
    "Refer to Card Issuer",
    "Refer to Card Issuer",
    "Merchant/Acquirer Error",
    "Refer to Card Issuer",
    "Approved",
    "Acquirer Busy",
    "Approved",
    "Approved",
    "Invalid Transaction",
    "Invalid Amount",
    "Invalid Card Number",
    "No Issuer",
    "Approved",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Bank Not Supported",
    "Declined",
    "Expired Card",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Insufficient Funds",
    "Declined",
    "Declined",
    "Expired Card",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined - Please Retry",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
    "Declined",
];

/// Maps an acquirer response code to its message.
///
/// Non-numeric and out-of-range codes yield [`UNKNOWN_RESPONSE`]; the gateway's
/// code space is wider than this table and unknown codes are not an error.
///
/// # Examples
///
/// ```
/// use fatzebra_rs::response_codes::message_for;
///
/// assert_eq!(message_for("00"), "Approved");
/// assert_eq!(message_for("51"), "Insufficient Funds");
/// assert_eq!(message_for("not-a-code"), "Unknown");
/// ```
pub fn message_for(code: &str) -> &'static str {
    code.parse::<usize>()
        .ok()
        .and_then(|index| RESPONSE_MESSAGES.get(index))
        .copied()
        .unwrap_or(UNKNOWN_RESPONSE)
}
