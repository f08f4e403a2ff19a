//! Persistence for domain configurations and check history.
//!
//! Backends implement the [`CheckStore`] trait; the rest of the system only
//! sees the trait. All operations are fallible and never retried — a caller
//! logs the failure and abandons that cycle's operation.

pub mod backend;
pub mod csv;
pub mod error;
pub mod memory;

pub use backend::CheckStore;
pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use self::csv::CsvStore;
