//! Messages carried from the hub to a connected client

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which producer stream a chunk came from.
///
/// The numeric tags are part of the wire contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum ChunkKind {
    Stdout = 0,
    Stderr = 1,
}

impl ChunkKind {
    /// Stable numeric tag of this kind
    pub fn tag(self) -> i32 {
        self as i32
    }

    /// Resolve a numeric tag back into a kind
    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(Self::Stdout),
            1 => Some(Self::Stderr),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "STDOUT",
            Self::Stderr => "STDERR",
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The exact bytes of one producer write on one stream.
///
/// Chunks are not line framed: `buffer` holds whatever a single `write`
/// call received, untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub kind: ChunkKind,
    pub buffer: Vec<u8>,
}

impl Chunk {
    pub fn new(kind: ChunkKind, buffer: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            buffer: buffer.into(),
        }
    }
}

/// Envelope for everything sent over the client channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Message {
    Chunk(Chunk),
}

impl Message {
    pub fn chunk(kind: ChunkKind, buffer: impl Into<Vec<u8>>) -> Self {
        Self::Chunk(Chunk::new(kind, buffer))
    }

    pub fn as_chunk(&self) -> Option<&Chunk> {
        match self {
            Self::Chunk(chunk) => Some(chunk),
        }
    }

    pub fn into_chunk(self) -> Option<Chunk> {
        match self {
            Self::Chunk(chunk) => Some(chunk),
        }
    }
}
