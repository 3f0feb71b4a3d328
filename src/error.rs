//! Error types for kvpipe
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using KvPipeError
pub type Result<T> = std::result::Result<T, KvPipeError>;

/// Unified error type for kvpipe operations
#[derive(Debug, Error)]
pub enum KvPipeError {
    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    /// Any failure to establish, maintain, or tear down the transport.
    /// Fatal to the current connection: the caller must reconnect.
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// An operation that needs a live connection was called while
    /// disconnected.
    #[error("Not connected")]
    NotConnected,

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// Malformed or unexpected reply. The stream framing can no longer be
    /// trusted; the caller must reconnect.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// An error the server legitimately returned for one specific command.
    /// Not a transport problem; the connection stays usable.
    #[error("Server error: {0}")]
    Reply(String),
}

impl KvPipeError {
    /// True when the error only concerns a single command's reply and the
    /// connection remains usable for further operations.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, KvPipeError::Reply(_))
    }
}
