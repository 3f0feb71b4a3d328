//! # kvpipe
//!
//! The transport-and-protocol session layer of a key-value-store client:
//! - One duplex TCP connection per session, blocking I/O
//! - Self-delimiting binary request/reply framing
//! - Pipelining: queue many requests, then drain replies in send order
//! - Partial-failure handling: one failed command in a batch does not
//!   abort the remaining replies
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Typed Command Layer                         │
//! │               (get/set/... — not here)                       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ send / receive* / drain*
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Session                                 │
//! │   lifecycle · timeout mode · buffers · pipeline counter      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ encode_command / read_reply
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Codec                                   │
//! │          stateless wire framing (requests/replies)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                  TCP byte stream
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use kvpipe::Connection;
//!
//! # fn main() -> kvpipe::Result<()> {
//! let mut conn = Connection::new("127.0.0.1", 6379);
//! conn.send("SET", &[b"k", b"v"])?.send("GET", &[b"k"])?;
//! let status = conn.receive_status()?;
//! let value = conn.receive_bulk()?;
//! # let _ = (status, value);
//! conn.disconnect()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod session;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvPipeError, Result};
pub use config::Config;
pub use protocol::Reply;
pub use session::Connection;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvpipe
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
