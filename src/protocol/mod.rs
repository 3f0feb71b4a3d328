//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (text-framed binary)
//!
//! ### Request Format
//! ```text
//! *<1 + argc>\r\n
//! $<len>\r\n<command name>\r\n
//! $<len>\r\n<argument>\r\n        (per argument)
//! ```
//!
//! ### Reply Markers
//! - `+` status line
//! - `-` application-level error line
//! - `:` integer
//! - `$` bulk byte string (`$-1` = nil)
//! - `*` array of nested replies (`*-1` = nil)
//!
//! The codec is stateless: [`encode_command`] is a pure function and
//! [`read_reply`] consumes exactly one self-delimited frame per call.

mod reply;
mod codec;

pub use reply::Reply;
pub use codec::{encode_command, read_reply, MAX_BULK_SIZE};

/// Default server port
pub const DEFAULT_PORT: u16 = 6379;

/// Default connect/read timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;
