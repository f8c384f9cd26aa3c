//! Sealed trait marker for gateway resources.
//!
//! Only the resource types defined in this crate can be decoded from a gateway
//! envelope through [`super::Resource`].

pub(crate) mod private {
    /// Sealed trait marker.
    pub trait Sealed {}
}
