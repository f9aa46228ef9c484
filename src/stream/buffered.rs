use super::{OutputStreams, StreamWriter};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// An in-memory byte sink. Clones append to the same buffer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far
    pub fn contents(&self) -> Vec<u8> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    pub fn len(&self) -> usize {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Streams that keep stdout and stderr in memory for later inspection
#[derive(Debug, Clone, Default)]
pub struct BufferedStreams {
    stdout: SharedBuffer,
    stderr: SharedBuffer,
}

impl BufferedStreams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdout_bytes(&self) -> Vec<u8> {
        self.stdout.contents()
    }

    pub fn stderr_bytes(&self) -> Vec<u8> {
        self.stderr.contents()
    }

    pub fn stdout_string(&self) -> String {
        self.stdout.to_string_lossy()
    }

    pub fn stderr_string(&self) -> String {
        self.stderr.to_string_lossy()
    }
}

impl OutputStreams for BufferedStreams {
    fn stdout(&self) -> StreamWriter {
        Box::new(self.stdout.clone())
    }

    fn stderr(&self) -> StreamWriter {
        Box::new(self.stderr.clone())
    }
}
