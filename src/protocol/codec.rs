//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request Format
//! ```text
//! *<1 + argc>\r\n
//! $<len>\r\n<command name>\r\n
//! $<len>\r\n<argument>\r\n        (repeated per argument)
//! ```
//!
//! ### Reply Format (by leading marker byte)
//! - `+` status line, e.g. `+OK\r\n`
//! - `-` error line, e.g. `-ERR unknown command\r\n`
//! - `:` integer, e.g. `:1000\r\n`
//! - `$` bulk bytes: `$<len>\r\n<bytes>\r\n`, or `$-1\r\n` for nil
//! - `*` array of `<n>` nested replies: `*<n>\r\n...`, or `*-1\r\n` for nil
//!
//! Every frame is self-delimiting: the decoder never needs an external
//! length hint to find the next reply boundary.

use std::io::BufRead;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{KvPipeError, Result};
use super::Reply;

/// Array reply marker
pub const MARKER_ARRAY: u8 = b'*';

/// Bulk reply marker
pub const MARKER_BULK: u8 = b'$';

/// Status reply marker
pub const MARKER_STATUS: u8 = b'+';

/// Error reply marker
pub const MARKER_ERROR: u8 = b'-';

/// Integer reply marker
pub const MARKER_INTEGER: u8 = b':';

/// Maximum accepted bulk/array length (512 MB, the protocol's limit)
pub const MAX_BULK_SIZE: i64 = 512 * 1024 * 1024;

/// Maximum accepted length of a status/error/length line
const MAX_LINE_SIZE: usize = 64 * 1024;

// =============================================================================
// Request Encoding
// =============================================================================

/// Encode one request frame from a command name and its arguments.
///
/// Pure function, no I/O. The frame is binary-safe: arguments may contain
/// `\r\n` or any other byte.
pub fn encode_command(name: &str, args: &[&[u8]]) -> Bytes {
    let mut frame = BytesMut::with_capacity(
        16 + name.len() + args.iter().map(|a| a.len() + 16).sum::<usize>(),
    );

    frame.put_u8(MARKER_ARRAY);
    put_decimal(&mut frame, (1 + args.len()) as i64);
    put_bulk(&mut frame, name.as_bytes());
    for arg in args {
        put_bulk(&mut frame, arg);
    }

    frame.freeze()
}

fn put_bulk(frame: &mut BytesMut, bytes: &[u8]) {
    frame.put_u8(MARKER_BULK);
    put_decimal(frame, bytes.len() as i64);
    frame.put_slice(bytes);
    frame.put_slice(b"\r\n");
}

fn put_decimal(frame: &mut BytesMut, value: i64) {
    frame.put_slice(value.to_string().as_bytes());
    frame.put_slice(b"\r\n");
}

// =============================================================================
// Reply Decoding
// =============================================================================

/// Decode exactly one reply from the stream.
///
/// Consumes precisely one frame's worth of bytes, leaving the reader
/// positioned at the next frame boundary. A server-reported error decodes
/// to `Ok(Reply::Error(..))`; only transport failures and malformed frames
/// return `Err`, and those are fatal to the stream.
pub fn read_reply<R: BufRead>(reader: &mut R) -> Result<Reply> {
    let marker = read_byte(reader)?;

    match marker {
        MARKER_STATUS => Ok(Reply::Status(read_text_line(reader)?)),
        MARKER_ERROR => Ok(Reply::Error(read_text_line(reader)?)),
        MARKER_INTEGER => Ok(Reply::Integer(read_decimal_line(reader)?)),
        MARKER_BULK => read_bulk(reader),
        MARKER_ARRAY => read_array(reader),
        other => Err(KvPipeError::Protocol(format!(
            "Unknown reply marker: 0x{:02x}",
            other
        ))),
    }
}

/// Decode a bulk reply body (marker already consumed)
fn read_bulk<R: BufRead>(reader: &mut R) -> Result<Reply> {
    let len = read_decimal_line(reader)?;

    if len == -1 {
        return Ok(Reply::Bulk(None));
    }
    if len < 0 || len > MAX_BULK_SIZE {
        return Err(KvPipeError::Protocol(format!(
            "Invalid bulk length: {}",
            len
        )));
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload)?;
    read_crlf(reader)?;

    Ok(Reply::Bulk(Some(payload)))
}

/// Decode an array reply body (marker already consumed), recursing per element
fn read_array<R: BufRead>(reader: &mut R) -> Result<Reply> {
    let count = read_decimal_line(reader)?;

    // Nil array: the protocol's "no value" sentinel, same as a nil bulk
    if count == -1 {
        return Ok(Reply::Bulk(None));
    }
    if count < 0 || count > MAX_BULK_SIZE {
        return Err(KvPipeError::Protocol(format!(
            "Invalid array length: {}",
            count
        )));
    }

    let mut elements = Vec::with_capacity(count as usize);
    for _ in 0..count {
        elements.push(read_reply(reader)?);
    }

    Ok(Reply::Array(elements))
}

// =============================================================================
// Line-level helpers
// =============================================================================

fn read_byte<R: BufRead>(reader: &mut R) -> Result<u8> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Ok(byte[0])
}

/// Read up to and including the next CRLF, returning the bytes before it.
///
/// A bare `\n` or an EOF mid-line means the stream is desynchronized.
fn read_line<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut line = Vec::new();

    loop {
        let byte = read_byte(reader)?;
        if byte == b'\r' {
            let next = read_byte(reader)?;
            if next != b'\n' {
                return Err(KvPipeError::Protocol(
                    "Expected LF after CR in reply line".to_string(),
                ));
            }
            return Ok(line);
        }
        if byte == b'\n' {
            return Err(KvPipeError::Protocol(
                "Bare LF in reply line".to_string(),
            ));
        }
        line.push(byte);
        if line.len() > MAX_LINE_SIZE {
            return Err(KvPipeError::Protocol(format!(
                "Reply line exceeds {} bytes",
                MAX_LINE_SIZE
            )));
        }
    }
}

fn read_text_line<R: BufRead>(reader: &mut R) -> Result<String> {
    let line = read_line(reader)?;
    String::from_utf8(line)
        .map_err(|_| KvPipeError::Protocol("Reply line is not valid UTF-8".to_string()))
}

fn read_decimal_line<R: BufRead>(reader: &mut R) -> Result<i64> {
    let line = read_text_line(reader)?;
    line.parse::<i64>()
        .map_err(|_| KvPipeError::Protocol(format!("Invalid integer in reply: {:?}", line)))
}

fn read_crlf<R: BufRead>(reader: &mut R) -> Result<()> {
    let mut crlf = [0u8; 2];
    reader.read_exact(&mut crlf)?;
    if &crlf != b"\r\n" {
        return Err(KvPipeError::Protocol(
            "Missing CRLF after bulk payload".to_string(),
        ));
    }
    Ok(())
}
