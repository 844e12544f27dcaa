//! Canonical data shapes shared by every connector and the sink.
//!
//! Exchange-specific payloads are converted into a [`Quote`] before they
//! leave a connector; the sink turns quotes into partial updates of
//! [`ExchangeMetadataDocument`]s.

pub mod coins;
pub mod metadata;
pub mod quote;
pub mod symbol;

pub use coins::*;
pub use metadata::*;
pub use quote::*;
pub use symbol::*;
