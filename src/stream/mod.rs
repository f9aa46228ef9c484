//! Output streams for step execution
//!
//! Code that launches subprocesses is handed an [`OutputStreams`] and asks it
//! for one writer per standard stream. Where the bytes go is up to the
//! implementation:
//!
//! - [`DiscardStreams`] drops them
//! - [`BufferedStreams`] keeps them in memory
//! - [`StandardStreams`] passes them to this process's stdout/stderr
//! - [`RemoteStreams`] forwards them to a client and mirrors them to the log
//! - [`FailingStreams`] rejects every write, for fault injection
//!
//! Each writer is independent. A single `write` call on one writer is never
//! interleaved with another write on the same writer; ordering between the
//! stdout and stderr writers is only guaranteed by [`RemoteStreams`].

pub mod buffered;
pub mod client;
pub mod discard;
pub mod failing;
pub mod message;
pub mod remote;
pub mod scanner;
pub mod sender;
pub mod standard;


pub use buffered::{BufferedStreams, SharedBuffer};
pub use client::{decode_frames, render, RenderSummary, Renderer};
pub use discard::DiscardStreams;
pub use failing::FailingStreams;
pub use message::{Chunk, ChunkKind, Message};
pub use remote::{RemoteStreams, RemoteWriter, SenderState};
pub use scanner::{decode_line, LineScanner, ScanError};
pub use sender::{ChannelSender, FrameSender, MessageSender, RecordingSender};
pub use standard::StandardStreams;

use std::io::Write;
use std::sync::Arc;

/// An owned, append-only byte sink
pub type StreamWriter = Box<dyn Write + Send>;

/// Source of the stdout/stderr writers a step writes its output to.
///
/// Every call returns a fresh handle onto the same underlying sink.
pub trait OutputStreams: Send + Sync {
    fn stdout(&self) -> StreamWriter;
    fn stderr(&self) -> StreamWriter;
}

impl<T: OutputStreams + ?Sized> OutputStreams for Arc<T> {
    fn stdout(&self) -> StreamWriter {
        (**self).stdout()
    }

    fn stderr(&self) -> StreamWriter {
        (**self).stderr()
    }
}
