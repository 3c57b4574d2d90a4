//! Record store abstraction layer
//!
//! This module provides the trait every store backend implements, search
//! filters shared by all of them, and the in-memory backend.

pub mod factory;
pub mod memory;
pub mod query;
pub mod traits;

pub use factory::create_record_store;
pub use memory::InMemoryStore;
pub use query::{Comparison, Condition, SearchQuery, SEARCH_PAGE_SIZE};
pub use traits::{DuplicatePolicy, RecordStore, UpsertOutcome};
