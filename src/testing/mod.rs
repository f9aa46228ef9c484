//! Testing utilities
//!
//! Helpers shared by unit and integration tests. The stream test doubles
//! themselves ([`RecordingSender`](crate::stream::RecordingSender),
//! [`FailingStreams`](crate::stream::FailingStreams)) live with the code they
//! stand in for.

pub mod log_capture;

pub use log_capture::{CapturedEvent, LogCapture};
