//! Document store abstraction consumed by the triggers and the deletion engine.
//!
//! - [`DocumentStore`]: ordered, paginated collection queries plus atomic
//!   multi-document batch writes
//! - [`WriteBatch`]: the staged writes of one atomic commit
//! - [`engines`]: concrete stores ([`engines::MemoryDocumentStore`])

pub mod batch;
pub mod engines;
pub mod store;

pub use batch::*;
pub use store::*;
