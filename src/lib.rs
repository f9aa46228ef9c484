//! # Upgrade Hub
//!
//! Building blocks for the coordinator of an in-place cluster database
//! upgrade: checking that two installations form a supported upgrade, and
//! running step work while its output is streamed to a client and recorded
//! in the hub log.
//!
//! ## Modules
//!
//! - `config` - Hub configuration (TOML file plus environment overrides)
//! - `logging` - tracing setup for stderr and the durable hub log
//! - `stream` - Output stream abstraction and the remote multiplexed stream
//! - `subprocess` - Running programs with output relayed into streams
//! - `version` - Upgrade path table and version gate
//! - `testing` - Test utilities such as in-memory log capture
pub mod config;
pub mod error;
pub mod logging;
pub mod stream;
pub mod subprocess;
pub mod version;

pub mod testing;

pub use error::{Error, Result};
