use super::{OutputStreams, StreamWriter};
use std::io;

/// Streams that drop everything written to them
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardStreams;

impl OutputStreams for DiscardStreams {
    fn stdout(&self) -> StreamWriter {
        Box::new(io::sink())
    }

    fn stderr(&self) -> StreamWriter {
        Box::new(io::sink())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_discard_accepts_everything() {
        let streams = DiscardStreams;

        assert_eq!(streams.stdout().write(b"anything\n").unwrap(), 9);
        assert_eq!(streams.stderr().write(&[0xff; 128]).unwrap(), 128);
        assert_eq!(streams.stdout().write(b"").unwrap(), 0);
    }
}
