//! Subprocess execution with streamed output
//!
//! Steps run external programs whose output must reach whatever
//! [`OutputStreams`](crate::stream::OutputStreams) the caller chose, as it is
//! produced rather than after the process exits.

pub mod builder;
pub mod error;
pub mod runner;


pub use builder::ProcessCommandBuilder;
pub use error::ProcessError;
pub use runner::{run_with_streams, ExitStatus, ProcessCommand, StepOutcome};
