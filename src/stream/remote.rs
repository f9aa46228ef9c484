//! Remote multiplexed streams
//!
//! [`RemoteStreams`] forwards every producer write to a client as a
//! [`Chunk`](super::message::Chunk) while mirroring the same bytes, line by
//! line, into the process log. The client is allowed to go away at any time:
//! the first failed send disables forwarding for the rest of the step, but
//! writers keep succeeding and the log keeps receiving every line.
//!
//! Both writers share one mutex. It covers the liveness check, the log lines
//! and the send, so the sender is only ever driven by one thread and the log
//! reflects the order in which complete writes happened.

use super::message::{ChunkKind, Message};
use super::scanner::{decode_line, LineScanner};
use super::sender::MessageSender;
use super::{OutputStreams, StreamWriter};
use crate::config::StreamConfig;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// Log target for mirrored step output
pub const LOG_TARGET: &str = "upgrade_hub::stream";

/// Liveness of the client sender. `Dead` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    Live,
    Dead,
}

struct Multiplexer {
    sender: Mutex<Option<Box<dyn MessageSender>>>,
    scanner: LineScanner,
}

impl Multiplexer {
    fn lock(&self) -> MutexGuard<'_, Option<Box<dyn MessageSender>>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn forward(&self, kind: ChunkKind, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut sender = self.lock();

        for line in self.scanner.lines(buf) {
            let line = line.map_err(|e| io::Error::other(format!("scanning: {e}")))?;
            info!(target: LOG_TARGET, "{}", decode_line(line).trim());
        }

        if let Some(live) = sender.as_mut() {
            if let Err(e) = live.send(Message::chunk(kind, buf)) {
                warn!(target: LOG_TARGET, "halting client sender: {e:#}");
                *sender = None;
            }
        }

        Ok(buf.len())
    }
}

/// Output streams that multiplex stdout and stderr to a remote client.
///
/// Clones share the same sender and state.
#[derive(Clone)]
pub struct RemoteStreams {
    inner: Arc<Multiplexer>,
}

impl RemoteStreams {
    pub fn new<S: MessageSender + 'static>(sender: S) -> Self {
        Self::with_config(sender, &StreamConfig::default())
    }

    pub fn with_config<S: MessageSender + 'static>(sender: S, config: &StreamConfig) -> Self {
        Self {
            inner: Arc::new(Multiplexer {
                sender: Mutex::new(Some(Box::new(sender))),
                scanner: LineScanner::new(config.max_line_bytes),
            }),
        }
    }

    pub fn state(&self) -> SenderState {
        if self.inner.lock().is_some() {
            SenderState::Live
        } else {
            SenderState::Dead
        }
    }

    pub fn is_live(&self) -> bool {
        self.state() == SenderState::Live
    }

    /// A writer tagging its bytes with `kind`
    pub fn writer(&self, kind: ChunkKind) -> RemoteWriter {
        RemoteWriter {
            inner: Arc::clone(&self.inner),
            kind,
        }
    }
}

impl OutputStreams for RemoteStreams {
    fn stdout(&self) -> StreamWriter {
        Box::new(self.writer(ChunkKind::Stdout))
    }

    fn stderr(&self) -> StreamWriter {
        Box::new(self.writer(ChunkKind::Stderr))
    }
}

/// One side (stdout or stderr) of a [`RemoteStreams`]
#[derive(Clone)]
pub struct RemoteWriter {
    inner: Arc<Multiplexer>,
    kind: ChunkKind,
}

impl RemoteWriter {
    pub fn kind(&self) -> ChunkKind {
        self.kind
    }
}

impl Write for RemoteWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.forward(self.kind, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
