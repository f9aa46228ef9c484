//! Outbound message channels toward a client
//!
//! The multiplexer only needs something it can hand a [`Message`] to. This
//! module provides the production senders plus a recording sender used for
//! tests and fault injection.

use super::message::{Chunk, Message};
use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

/// A caller-provided outbound channel.
///
/// Implementations are not required to be safe under concurrent sends; the
/// multiplexer serializes every call.
pub trait MessageSender: Send {
    fn send(&mut self, message: Message) -> Result<()>;
}

impl<S: MessageSender + ?Sized> MessageSender for Box<S> {
    fn send(&mut self, message: Message) -> Result<()> {
        (**self).send(message)
    }
}

/// Sender backed by an unbounded tokio channel.
///
/// Dropping the receiving half is how a client hangs up; the next send then
/// fails.
pub struct ChannelSender {
    tx: mpsc::UnboundedSender<Message>,
}

impl ChannelSender {
    pub fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self { tx }
    }

    /// Create a sender together with the receiver a client reads from
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl MessageSender for ChannelSender {
    fn send(&mut self, message: Message) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|_| anyhow!("client disconnected: message channel closed"))
    }
}

/// Sender that writes each message as one line of JSON
pub struct FrameSender<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> FrameSender<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> MessageSender for FrameSender<W> {
    fn send(&mut self, message: Message) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &message).context("encoding message frame")?;
        self.writer
            .write_all(b"\n")
            .context("writing message frame")?;
        self.writer.flush().context("flushing message frame")?;
        Ok(())
    }
}

/// Records every message it is given, optionally failing once a number of
/// sends has succeeded.
///
/// Clones share the same record.
#[derive(Clone, Default)]
pub struct RecordingSender {
    messages: Arc<Mutex<Vec<Message>>>,
    attempts: Arc<AtomicUsize>,
    fail_after: Option<(usize, String)>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose first `successes` sends succeed and every later one
    /// fails with `error`
    pub fn failing_after(successes: usize, error: impl Into<String>) -> Self {
        Self {
            fail_after: Some((successes, error.into())),
            ..Self::default()
        }
    }

    /// A sender that rejects every send
    pub fn failing(error: impl Into<String>) -> Self {
        Self::failing_after(0, error)
    }

    /// Number of times `send` was called, successful or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn chunks(&self) -> Vec<Chunk> {
        self.messages()
            .into_iter()
            .filter_map(Message::into_chunk)
            .collect()
    }
}

impl MessageSender for RecordingSender {
    fn send(&mut self, message: Message) -> Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some((successes, error)) = &self.fail_after {
            if attempt >= *successes {
                return Err(anyhow!("{}", error));
            }
        }

        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::message::ChunkKind;

    #[test]
    fn test_channel_sender_delivers_in_order() {
        let (mut sender, mut rx) = ChannelSender::pair();

        sender.send(Message::chunk(ChunkKind::Stdout, "a")).unwrap();
        sender.send(Message::chunk(ChunkKind::Stderr, "b")).unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            Message::chunk(ChunkKind::Stdout, "a")
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            Message::chunk(ChunkKind::Stderr, "b")
        );
    }

    #[test]
    fn test_channel_sender_fails_after_hangup() {
        let (mut sender, rx) = ChannelSender::pair();
        drop(rx);

        let err = sender
            .send(Message::chunk(ChunkKind::Stdout, "lost"))
            .unwrap_err();
        assert!(err.to_string().contains("client disconnected"));
    }

    #[test]
    fn test_frame_sender_writes_json_lines() {
        let mut sender = FrameSender::new(Vec::new());
        sender.send(Message::chunk(ChunkKind::Stdout, "hi")).unwrap();
        sender.send(Message::chunk(ChunkKind::Stderr, "")).unwrap();

        let written = String::from_utf8(sender.into_inner()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            r#"{"chunk":{"kind":"STDOUT","buffer":[104,105]}}"#
        );
        assert_eq!(lines[1], r#"{"chunk":{"kind":"STDERR","buffer":[]}}"#);
    }

    #[test]
    fn test_recording_sender_failing_after() {
        let mut sender = RecordingSender::failing_after(1, "gone");

        assert!(sender.send(Message::chunk(ChunkKind::Stdout, "1")).is_ok());
        let err = sender
            .send(Message::chunk(ChunkKind::Stdout, "2"))
            .unwrap_err();

        assert_eq!(err.to_string(), "gone");
        assert_eq!(sender.attempts(), 2);
        assert_eq!(sender.chunks(), vec![Chunk::new(ChunkKind::Stdout, "1")]);
    }
}
