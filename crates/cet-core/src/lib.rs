//! # cet-core
//!
//! Core crate for the crypto exchange tracker, providing:
//!
//! - **Types** (`types`) — quotes, coin tables, exchange metadata documents
//! - **Configuration** (`config`) — JSON config deserialization
//! - **Error types** (`error`) — domain-specific `CetError` via thiserror
//! - **Store** (`store`) — metadata document store with dotted-path partial updates
//! - **Sink** (`sink`) — quote channel, ingestion writer and the setup pass
//! - **Polling** (`poll`) — sequential request/response scheduler
//! - **WebSocket** (`ws`) — reconnecting stream client driven by a lifecycle state machine
//! - **Shutdown** (`shutdown`) — process-wide stop signal
//! - **Time utilities** (`time_util`) — timestamps and rounding
//! - **Logging** (`logging`) — tracing-based structured logging

pub mod config;
pub mod error;
pub mod logging;
pub mod poll;
pub mod shutdown;
pub mod sink;
pub mod store;
pub mod time_util;
pub mod types;
pub mod ws;

// Re-export types at crate root for convenience.
pub use types::*;
