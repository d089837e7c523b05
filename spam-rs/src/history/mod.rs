//! Classification history
//!
//! Append-only event log with filter/search/order queries and bulk clear.

pub mod memory;
pub mod store;
pub mod types;

pub use memory::MemoryHistoryStore;
pub use store::{FileHistoryStore, HistoryStore};
pub use types::*;
