//! Fault injection sinks

use super::{OutputStreams, StreamWriter};
use std::io::{self, Write};

pub const DEFAULT_FAILURE: &str = "write failed";

/// Streams whose writers reject every write with the same error
#[derive(Debug, Clone)]
pub struct FailingStreams {
    message: String,
}

impl FailingStreams {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for FailingStreams {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE)
    }
}

impl OutputStreams for FailingStreams {
    fn stdout(&self) -> StreamWriter {
        Box::new(FailingWriter {
            message: self.message.clone(),
        })
    }

    fn stderr(&self) -> StreamWriter {
        Box::new(FailingWriter {
            message: self.message.clone(),
        })
    }
}

struct FailingWriter {
    message: String,
}

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::other(self.message.clone()))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_write_fails_with_fixed_error() {
        let streams = FailingStreams::new("disk on fire");

        let out = streams.stdout().write(b"x").unwrap_err();
        let err = streams.stderr().write(b"y").unwrap_err();

        assert_eq!(out.to_string(), "disk on fire");
        assert_eq!(err.to_string(), "disk on fire");
    }

    #[test]
    fn test_default_message() {
        let err = FailingStreams::default()
            .stdout()
            .write_all(b"z")
            .unwrap_err();
        assert_eq!(err.to_string(), DEFAULT_FAILURE);
    }
}
