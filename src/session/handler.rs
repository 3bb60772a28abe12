//! Session Handler
//!
//! Drives one client connection from the welcome banner to the final close.
//!
//! ## Line Framing
//!
//! Incoming bytes are appended to a `BytesMut` buffer and a line is only
//! taken out once a `\n` has arrived. One read may carry several lines, and
//! one line may need several reads; both cases go through the same path.

use crate::commands::{CommandRegistry, Context, INVALID_COMMAND};
use crate::privilege::{self, AccessLevel, ACCESS_DENIED};
use crate::storage::Store;
use bytes::BytesMut;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, error, info, trace};

/// Banner written as soon as a client connects.
pub const WELCOME: &str = "Welcome to mapDB!\n";

/// Longest line (in bytes, newline excluded) a client may send.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Per-connection state that commands can see and change.
#[derive(Debug, Clone)]
pub struct SessionState {
    addr: String,
    privilege: AccessLevel,
    terminated: bool,
}

impl SessionState {
    pub fn new(addr: impl Into<String>, privilege: AccessLevel) -> Self {
        Self {
            addr: addr.into(),
            privilege,
            terminated: false,
        }
    }

    /// Remote address of the peer.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn privilege(&self) -> AccessLevel {
        self.privilege
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Marks the session for shutdown once the current reply is written.
    /// There is no way back.
    pub fn terminate(&mut self) {
        self.terminated = true;
    }
}

/// Errors that end a session abnormally.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line grew past `MAX_LINE_LENGTH`
    #[error("line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
}

/// Handles a single client connection.
///
/// Generic over the transport so it can run on a `TcpStream` or an in-memory
/// mock.
pub struct Session<S> {
    /// The transport for this connection
    stream: BufWriter<S>,

    /// Bytes received but not yet framed into a line
    buffer: BytesMut,

    /// Prefix of `buffer` already known to hold no newline
    scanned: usize,

    state: SessionState,

    store: Arc<Store>,

    registry: Arc<CommandRegistry>,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        state: SessionState,
        store: Arc<Store>,
        registry: Arc<CommandRegistry>,
    ) -> Self {
        Self {
            stream: BufWriter::new(stream),
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            scanned: 0,
            state,
            store,
            registry,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Runs the session until the peer leaves, an error occurs or a command
    /// terminates it. The transport is shut down on every path.
    pub async fn run(mut self) -> Result<(), SessionError> {
        info!(client = %self.state.addr, privilege = %self.state.privilege, "Client connected");

        let result = self.main_loop().await;

        if let Err(e) = &result {
            error!(client = %self.state.addr, error = %e, "Connection error");
        }

        if let Err(e) = self.stream.shutdown().await {
            debug!(client = %self.state.addr, error = %e, "Shutdown failed");
        }

        info!(client = %self.state.addr, "Connection closed");
        result
    }

    /// The read-dispatch-respond loop.
    async fn main_loop(&mut self) -> Result<(), SessionError> {
        self.write(WELCOME).await?;

        loop {
            while let Some(line) = self.next_line()? {
                self.dispatch(&line).await?;

                if self.state.is_terminated() {
                    return Ok(());
                }
            }

            if !self.read_more_data().await? {
                return Ok(());
            }
        }
    }

    /// Takes the next complete line out of the buffer, minus its line ending.
    ///
    /// Only bytes that arrived since the last call are searched. Fails once a
    /// line grows past [`MAX_LINE_LENGTH`], whether or not its newline has
    /// arrived yet.
    fn next_line(&mut self) -> Result<Option<String>, SessionError> {
        let Some(offset) = self.buffer[self.scanned..].iter().position(|&b| b == b'\n') else {
            self.scanned = self.buffer.len();
            if self.buffer.len() > MAX_LINE_LENGTH {
                return Err(SessionError::LineTooLong {
                    limit: MAX_LINE_LENGTH,
                });
            }
            return Ok(None);
        };

        let end = self.scanned + offset;
        self.scanned = 0;
        if end > MAX_LINE_LENGTH {
            return Err(SessionError::LineTooLong {
                limit: MAX_LINE_LENGTH,
            });
        }

        let raw = self.buffer.split_to(end + 1);
        let line = String::from_utf8_lossy(&raw)
            .trim_matches(|c| c == '\n' || c == '\r')
            .to_string();
        Ok(Some(line))
    }

    /// Reads more bytes from the transport.
    ///
    /// Returns `false` once the peer has closed its side.
    async fn read_more_data(&mut self) -> Result<bool, SessionError> {
        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(INITIAL_BUFFER_SIZE);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;

        if n == 0 {
            if !self.buffer.is_empty() {
                debug!(
                    client = %self.state.addr,
                    bytes = self.buffer.len(),
                    "Discarding unterminated line"
                );
            }
            return Ok(false);
        }

        trace!(client = %self.state.addr, bytes = n, "Read data");
        Ok(true)
    }

    /// Splits a line into command name and arguments and runs it.
    async fn dispatch(&mut self, line: &str) -> Result<(), SessionError> {
        debug!(client = %self.state.addr, line = line, "Received");

        let mut tokens = line.split(' ');
        let name = tokens.next().unwrap_or_default();
        let args: Vec<&str> = tokens.collect();

        let registry = Arc::clone(&self.registry);
        let Some(command) = registry.get(name) else {
            return self.write(INVALID_COMMAND).await;
        };

        if self.check_and_feedback(command.privilege()).await? {
            return Ok(());
        }

        let reply = {
            let mut ctx = Context {
                session: &mut self.state,
                store: &self.store,
                registry: &registry,
            };
            command.execute(&mut ctx, &args)
        };

        self.write(&reply).await
    }

    /// Compares the session's level with `required`.
    ///
    /// On denial the refusal is written to the client here and `true` is
    /// returned; the caller must not write anything else for this command.
    pub async fn check_and_feedback(&mut self, required: AccessLevel) -> Result<bool, SessionError> {
        if !privilege::requires_at_least(required, &self.state) {
            return Ok(false);
        }

        debug!(
            client = %self.state.addr,
            required = %required,
            granted = %self.state.privilege,
            "Access denied"
        );
        self.write(ACCESS_DENIED).await?;
        Ok(true)
    }

    async fn write(&mut self, text: &str) -> Result<(), SessionError> {
        self.stream.write_all(text.as_bytes()).await?;
        self.stream.flush().await?;
        trace!(client = %self.state.addr, bytes = text.len(), "Sent response");
        Ok(())
    }
}
