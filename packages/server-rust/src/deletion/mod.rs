//! Batched subtree deletion.
//!
//! The store has no "delete everything under this path" primitive, so a
//! collection is emptied one page at a time:
//!
//! 1. **Engine** (`engine`): pages through one collection in key order and
//!    deletes each page as one atomic batch, yielding to the scheduler
//!    between pages
//! 2. **Orchestrator** (`orchestrator`): runs the engine over every
//!    collection path of a subtree concurrently and collects per-path
//!    outcomes

pub mod engine;
pub mod error;
pub mod orchestrator;

pub use engine::{
    delete_collection, CollectionDeleter, DeletionOptions, DeletionStats, DEFAULT_PAGE_SIZE,
    DEFAULT_STALE_PAGE_LIMIT, DEFAULT_STALE_RETRY_DELAY,
};
pub use error::DeletionError;
pub use orchestrator::{DeletionReport, PathOutcome, SubtreeDeletionError};
