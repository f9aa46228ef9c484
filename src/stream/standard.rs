use super::{OutputStreams, StreamWriter};
use std::io;

/// Streams that pass straight through to this process's stdout and stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardStreams;

impl OutputStreams for StandardStreams {
    fn stdout(&self) -> StreamWriter {
        Box::new(io::stdout())
    }

    fn stderr(&self) -> StreamWriter {
        Box::new(io::stderr())
    }
}
