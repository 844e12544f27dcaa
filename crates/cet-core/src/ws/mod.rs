//! Reconnecting WebSocket client.

pub mod client;
pub mod link;

pub use client::{
    Dispatch, Frame, KeepAlive, KeepAliveBuilder, OnFrameCallback, ResolveUrl, WsConnConfig,
    WsConnection, WsEndpoint,
};
pub use link::{Link, LinkAction, LinkEvent, LinkState};
