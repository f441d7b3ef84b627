//! Core utilities and common types for the ledger.

pub mod error;
pub mod logging;
pub mod resolved;
pub mod sync;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use logging::{init_tracing, LogConfig, LogFormat, LogLevel};
pub use resolved::Resolved;
pub use types::*;
