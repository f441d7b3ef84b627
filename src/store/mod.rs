//! Durable Store
//!
//! Write-through persistence collaborators:
//! - `DurableStore` trait for history and snapshots
//! - In-memory and JSON file implementations
//! - `LedgerSnapshot` capture with root verification on restore

pub mod backend;
pub mod file;
pub mod memory;
pub mod snapshot;

pub use backend::DurableStore;
pub use file::JsonFileStore;
pub use memory::InMemoryStore;
pub use snapshot::LedgerSnapshot;
