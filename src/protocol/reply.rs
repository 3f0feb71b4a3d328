//! Reply definitions
//!
//! Represents decoded server replies.

/// One decoded server reply.
///
/// Arrays hold nested replies, so an element may itself be an array, an
/// integer, or an error. A server-reported error is carried in-band as
/// [`Reply::Error`] rather than as a decode failure: it concerns a single
/// command and must not disturb the framing of the replies behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Single-line status text (e.g. `OK`, `PONG`)
    Status(String),

    /// Binary-safe byte string; `None` is the protocol's nil sentinel
    Bulk(Option<Vec<u8>>),

    /// Signed 64-bit integer
    Integer(i64),

    /// Ordered sequence of nested replies
    Array(Vec<Reply>),

    /// Application-level error reported by the server for one command
    Error(String),
}

impl Reply {
    /// Short name of the reply shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Status(_) => "status",
            Reply::Bulk(_) => "bulk",
            Reply::Integer(_) => "integer",
            Reply::Array(_) => "array",
            Reply::Error(_) => "error",
        }
    }

    /// True when this reply is a server-reported error.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}
