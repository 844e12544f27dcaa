//! Typed error definitions for the coin exchange tracker.
//!
//! Provides [`CetError`] for domain-specific errors that are more informative
//! than plain `anyhow::Error` strings. All variants implement `std::error::Error`
//! via `thiserror`, so they integrate seamlessly with `anyhow::Result`.

use thiserror::Error;

/// Domain-specific errors for the tracker.
#[derive(Debug, Error)]
pub enum CetError {
    /// Configuration parsing or validation error.
    #[error("config error: {0}")]
    Config(String),

    /// Metadata store read or write error.
    #[error("store error: {0}")]
    Store(String),

    /// WebSocket connection, handshake, or communication error.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// REST request error (transport failure or non-success status).
    #[error("http error: {0}")]
    Http(String),

    /// Frame decoding error (bad JSON, base64, or compression).
    #[error("decode error: {0}")]
    Decode(String),

    /// One-time exchange document setup failed.
    #[error("setup error for {exchange}: {reason}")]
    Setup { exchange: String, reason: String },
}
