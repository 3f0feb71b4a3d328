//! Connection
//!
//! Owns one duplex TCP connection to the server, frames outgoing requests,
//! decodes incoming replies, and tracks how many pipelined requests are
//! still awaiting a reply.

use std::io::{BufReader, BufWriter, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::Config;
use crate::error::{KvPipeError, Result};
use crate::protocol::{encode_command, read_reply, Reply};

/// One client session over a TCP connection
///
/// The session is single-threaded by design: the pipeline counter and the
/// two buffers are mutated without locks, so concurrent use from multiple
/// threads corrupts both the accounting and the byte stream. Callers that
/// need sharing must serialize access externally (e.g. an exclusive-lease
/// pool). Closing the stream from another thread while a read is blocked
/// on it is likewise unsynchronized and unsafe.
pub struct Connection {
    /// Server hostname or IP; mutations take effect at the next connect
    host: String,

    /// Server TCP port; mutations take effect at the next connect
    port: u16,

    /// Deadline for connect and for blocking reads
    timeout: Duration,

    /// The TCP stream; `None` while disconnected
    stream: Option<TcpStream>,

    /// Buffered reader over the stream; exists iff `stream` does
    reader: Option<BufReader<TcpStream>>,

    /// Buffered writer over the stream; exists iff `stream` does
    writer: Option<BufWriter<TcpStream>>,

    /// Requests sent whose reply has not yet been read
    pipelined: usize,
}

impl Connection {
    /// Create a disconnected session targeting `host:port`
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_config(Config {
            host: host.into(),
            port,
            ..Config::default()
        })
    }

    /// Create a disconnected session from a full config
    pub fn with_config(config: Config) -> Self {
        Self {
            host: config.host,
            port: config.port,
            timeout: config.timeout,
            stream: None,
            reader: None,
            writer: None,
            pipelined: 0,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Server hostname or IP address
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Change the target host; effective at the next connect
    pub fn set_host(&mut self, host: impl Into<String>) {
        self.host = host.into();
    }

    /// Server TCP port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Change the target port; effective at the next connect
    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    /// Configured connect/read deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Change the deadline; effective at the next connect or the next
    /// [`rollback_timeout`](Self::rollback_timeout)
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Number of requests sent whose reply has not yet been read
    pub fn pipelined(&self) -> usize {
        self.pipelined
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Establish the connection; no-op when already connected.
    ///
    /// Connects under the configured timeout, disables write coalescing for
    /// low latency, arms the read deadline, and wraps the stream in buffered
    /// reader/writer halves. Any failure leaves the session disconnected
    /// with no partially-initialized handle.
    pub fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let addr = (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    format!("no address resolved for {}:{}", self.host, self.port),
                )
            })?;

        let stream = TcpStream::connect_timeout(&addr, self.timeout)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(self.timeout))?;

        // No field is assigned until every fallible step has passed
        let reader = BufReader::new(stream.try_clone()?);
        let writer = BufWriter::new(stream.try_clone()?);

        self.reader = Some(reader);
        self.writer = Some(writer);
        self.stream = Some(stream);
        self.pipelined = 0;

        tracing::debug!("Connected to {}:{}", self.host, self.port);
        Ok(())
    }

    /// True iff the underlying stream is still usable in both directions.
    ///
    /// Re-derived from the live socket on every call, never cached: the
    /// remote peer may close asynchronously.
    pub fn is_connected(&self) -> bool {
        match &self.stream {
            Some(stream) => {
                stream.take_error().map_or(false, |e| e.is_none()) && stream.peer_addr().is_ok()
            }
            None => false,
        }
    }

    /// Tear the connection down; no-op when already disconnected.
    ///
    /// Releases the reader, flushes and releases the writer, then shuts the
    /// stream down, in that order. Every step runs even if an earlier one
    /// fails; the first failure is reported after the session has fully
    /// reached the disconnected state. The pipeline counter is reset so a
    /// stale depth can never survive a reconnect.
    pub fn disconnect(&mut self) -> Result<()> {
        if self.stream.is_none() {
            return Ok(());
        }

        self.pipelined = 0;
        drop(self.reader.take());

        let mut first_error: Option<std::io::Error> = None;

        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                tracing::warn!("Flush during disconnect failed: {}", e);
                first_error = Some(e);
            }
        }

        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                tracing::warn!("Shutdown during disconnect failed: {}", e);
                first_error.get_or_insert(e);
            }
        }

        tracing::debug!("Disconnected from {}:{}", self.host, self.port);

        match first_error {
            Some(e) => Err(KvPipeError::Connection(e)),
            None => Ok(()),
        }
    }

    // -------------------------------------------------------------------------
    // Timeout Mode
    // -------------------------------------------------------------------------

    /// Remove the read deadline so a receive may block indefinitely.
    ///
    /// Used to await a long-lived event (e.g. a blocking pop). Callers pair
    /// this with [`rollback_timeout`](Self::rollback_timeout); the session
    /// does not enforce the pairing.
    pub fn set_timeout_infinite(&mut self) -> Result<()> {
        let stream = self.stream.as_ref().ok_or(KvPipeError::NotConnected)?;
        stream.set_read_timeout(None)?;
        Ok(())
    }

    /// Restore the configured read deadline.
    pub fn rollback_timeout(&mut self) -> Result<()> {
        let stream = self.stream.as_ref().ok_or(KvPipeError::NotConnected)?;
        stream.set_read_timeout(Some(self.timeout))?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Send Path
    // -------------------------------------------------------------------------

    /// Queue one request without flushing it to the wire.
    ///
    /// Connects lazily if the session is disconnected. The frame only sits
    /// in the write buffer; batching sends before any receive is what makes
    /// pipelining amortize round trips. Returns `&mut Self` so sends chain
    /// through `?`.
    pub fn send(&mut self, name: &str, args: &[&[u8]]) -> Result<&mut Self> {
        self.connect()?;

        let frame = encode_command(name, args);
        self.writer
            .as_mut()
            .ok_or(KvPipeError::NotConnected)?
            .write_all(&frame)?;
        self.pipelined += 1;

        tracing::trace!("Queued {} ({} pending)", name, self.pipelined);
        Ok(self)
    }

    /// Force the write buffer onto the wire.
    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .as_mut()
            .ok_or(KvPipeError::NotConnected)?
            .flush()?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Receive Path
    // -------------------------------------------------------------------------

    /// Flush pending writes, consume one reply, decrement the pipeline.
    ///
    /// The decrement happens before the decode result is known: a reply is
    /// accounted as consumed whether it decodes to a value or to a server
    /// error, which is what keeps the counter equal to the number of
    /// replies still on the wire. Receiving with zero pipelined requests is
    /// caller misuse and simply blocks until the deadline fires.
    fn next_reply(&mut self) -> Result<Reply> {
        self.flush()?;
        self.pipelined = self.pipelined.saturating_sub(1);

        let reader = self.reader.as_mut().ok_or(KvPipeError::NotConnected)?;
        read_reply(reader)
    }

    /// Receive a status reply; `None` is the protocol's nil sentinel.
    pub fn receive_status(&mut self) -> Result<Option<String>> {
        match self.next_reply()? {
            Reply::Status(text) => Ok(Some(text)),
            Reply::Bulk(None) => Ok(None),
            Reply::Error(message) => Err(KvPipeError::Reply(message)),
            other => Err(unexpected("status", &other)),
        }
    }

    /// Receive a bulk reply; `None` is the protocol's nil sentinel.
    pub fn receive_bulk(&mut self) -> Result<Option<Vec<u8>>> {
        match self.next_reply()? {
            Reply::Bulk(payload) => Ok(payload),
            Reply::Error(message) => Err(KvPipeError::Reply(message)),
            other => Err(unexpected("bulk", &other)),
        }
    }

    /// Receive an integer reply.
    pub fn receive_integer(&mut self) -> Result<i64> {
        match self.next_reply()? {
            Reply::Integer(value) => Ok(value),
            Reply::Error(message) => Err(KvPipeError::Reply(message)),
            other => Err(unexpected("integer", &other)),
        }
    }

    /// Receive an array reply whose elements are all bulk strings.
    ///
    /// A nil array narrows to an empty sequence.
    pub fn receive_array(&mut self) -> Result<Vec<Option<Vec<u8>>>> {
        match self.next_reply()? {
            Reply::Array(elements) => elements
                .into_iter()
                .map(|element| match element {
                    Reply::Bulk(payload) => Ok(payload),
                    other => Err(unexpected("bulk array element", &other)),
                })
                .collect(),
            Reply::Bulk(None) => Ok(Vec::new()),
            Reply::Error(message) => Err(KvPipeError::Reply(message)),
            other => Err(unexpected("array", &other)),
        }
    }

    /// Receive an array reply whose elements may be any shape, including
    /// nested arrays, integers, and errors.
    pub fn receive_mixed_array(&mut self) -> Result<Vec<Reply>> {
        match self.next_reply()? {
            Reply::Array(elements) => Ok(elements),
            Reply::Bulk(None) => Ok(Vec::new()),
            Reply::Error(message) => Err(KvPipeError::Reply(message)),
            other => Err(unexpected("array", &other)),
        }
    }

    // -------------------------------------------------------------------------
    // Bulk Drain
    // -------------------------------------------------------------------------

    /// Consume one reply without asserting its shape.
    ///
    /// A server-reported error comes back as `Reply::Error`, not as `Err`.
    pub fn drain_one(&mut self) -> Result<Reply> {
        self.next_reply()
    }

    /// Consume every outstanding reply, leaving `except` of them unread.
    ///
    /// Replies come back in send order. A server-reported error occupies
    /// its position in the output as `Reply::Error` and does not stop the
    /// drain: those bytes are already in flight and must be consumed to
    /// keep the stream framing aligned. Only transport and framing
    /// failures abort, and after one of those the connection is dead
    /// anyway. `drain_all(0)` empties the whole pipeline.
    pub fn drain_all(&mut self, except: usize) -> Result<Vec<Reply>> {
        self.flush()?;

        let mut replies = Vec::with_capacity(self.pipelined.saturating_sub(except));
        while self.pipelined > except {
            let reader = self.reader.as_mut().ok_or(KvPipeError::NotConnected)?;
            replies.push(read_reply(reader)?);
            self.pipelined -= 1;
        }
        Ok(replies)
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

fn unexpected(expected: &str, got: &Reply) -> KvPipeError {
    KvPipeError::Protocol(format!("Expected {} reply, got {}", expected, got.kind()))
}
