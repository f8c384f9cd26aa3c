//! # fatzebra-rs
//!
//! A Rust client for the Fat Zebra payment gateway.
//!
//! The library sends authenticated HTTPS requests for card purchases, captures and
//! refunds, and decodes the gateway's JSON envelope into typed results. Every call
//! either returns the resource the gateway produced or fails with exactly one
//! [`GatewayError`]: a transport failure (the gateway was never reached) or an
//! application failure (the gateway, or the client before sending, rejected it).
//!
//! ## Features
//!
//! - **Purchases**: real-time capture or authorise-only, with 3-D Secure extras
//! - **Captures and refunds**: against an earlier purchase's ID
//! - **Lookups**: find a purchase by gateway ID or merchant reference
//! - **Sandbox support**: switch environments with one flag
//! - **Response codes**: human-readable acquirer outcomes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fatzebra_rs::{Card, GatewayContext, GatewayError, Purchase, PurchaseRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = GatewayContext::new("TEST", "TEST", true);
//!
//! let card = Card::new("James Smith", "5123456789012346", "09/2027", "123");
//! let request = PurchaseRequest::new(1000, "INV-1001", card, "203.0.113.7");
//!
//! match Purchase::create(&ctx, &request).await {
//!     Ok(purchase) => println!("{}: {:?}", purchase.id, purchase.message),
//!     Err(GatewayError::Transport { timeout, .. }) => {
//!         println!("gateway unreachable (retry: {})", timeout)
//!     }
//!     Err(err) => println!("declined: {}", err),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Request Flow
//!
//! 1. **Build the payload**: request types serialize only their wire fields
//! 2. **Send**: Basic auth, client identification headers, JSON body
//! 3. **Decode**: the `{successful, errors, test, response}` envelope
//! 4. **Classify**: `successful: false` becomes an application error carrying the
//!    gateway's messages
//!
//! ## Configuration
//!
//! Pass a [`GatewayContext`] to every call, or install one process-wide default at
//! startup with [`GatewayContext::install_global`] and use [`GatewayContext::global`].
//! [`GatewayContext::from_env`] reads `FATZEBRA_USERNAME`, `FATZEBRA_TOKEN`,
//! `FATZEBRA_SANDBOX` and `FATZEBRA_TIMEOUT`.
//!
//! ## Logging
//!
//! The library emits [`tracing`] events; credentials and card data are never logged.
//! Install a subscriber in your application to see them.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod envelope;
pub mod errors;
pub mod resources;
pub mod response_codes;
pub mod transport;

// Re-export commonly used items
pub use config::GatewayContext;
pub use envelope::Envelope;
pub use errors::{GatewayError, Result};
pub use resources::{
    CaptureRequest, CaptureResult, Card, Purchase, PurchaseRequest, Refund, RefundRequest,
    Resource,
};
pub use response_codes::message_for;
