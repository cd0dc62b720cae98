//! [`DocumentStore`](super::DocumentStore) implementations.
//!
//! Currently includes [`MemoryDocumentStore`] for development and tests.

mod memory;

pub use memory::MemoryDocumentStore;
