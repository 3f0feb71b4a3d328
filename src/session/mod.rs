//! Session Module
//!
//! Connection lifecycle, send/receive paths, and pipeline accounting.
//!
//! ## Architecture
//! - One blocking TCP stream per session
//! - Sends append to a write buffer; every receive flushes first
//! - Pipeline depth counts sent-but-unread replies

mod connection;

pub use connection::Connection;
