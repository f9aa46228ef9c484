//! Client side of the step stream
//!
//! Takes messages arriving from the hub and replays each chunk onto local
//! output streams, so a remote step's stdout lands on the client's stdout
//! and its stderr on the client's stderr.

use super::message::{ChunkKind, Message};
use super::{OutputStreams, StreamWriter};
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use tokio::sync::mpsc;

/// Byte and message counts for a rendered stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub messages: usize,
    pub stdout_bytes: usize,
    pub stderr_bytes: usize,
}

/// Writes chunks onto a pair of local writers
pub struct Renderer {
    stdout: StreamWriter,
    stderr: StreamWriter,
    summary: RenderSummary,
}

impl Renderer {
    pub fn new(streams: &dyn OutputStreams) -> Self {
        Self {
            stdout: streams.stdout(),
            stderr: streams.stderr(),
            summary: RenderSummary::default(),
        }
    }

    pub fn render(&mut self, message: Message) -> io::Result<()> {
        self.summary.messages += 1;
        match message {
            Message::Chunk(chunk) => {
                let (writer, counter) = match chunk.kind {
                    ChunkKind::Stdout => (&mut self.stdout, &mut self.summary.stdout_bytes),
                    ChunkKind::Stderr => (&mut self.stderr, &mut self.summary.stderr_bytes),
                };
                writer.write_all(&chunk.buffer)?;
                writer.flush()?;
                *counter += chunk.buffer.len();
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> RenderSummary {
        self.summary
    }
}

/// Render messages until every sender has been dropped
pub async fn render(
    mut receiver: mpsc::UnboundedReceiver<Message>,
    streams: &dyn OutputStreams,
) -> io::Result<RenderSummary> {
    let mut renderer = Renderer::new(streams);
    while let Some(message) = receiver.recv().await {
        renderer.render(message)?;
    }
    Ok(renderer.summary())
}

/// Decode the newline-delimited JSON written by
/// [`FrameSender`](super::sender::FrameSender)
pub fn decode_frames<R: BufRead>(reader: R) -> Result<Vec<Message>> {
    let mut messages = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading frame {}", index + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let message = serde_json::from_str(&line)
            .with_context(|| format!("decoding frame {}", index + 1))?;
        messages.push(message);
    }
    Ok(messages)
}
