//! REAL Functions: document triggers over a hierarchical store, built around
//! a paged, batched subtree deletion engine.

pub mod deletion;
pub mod logging;
pub mod service;
pub mod storage;
pub mod telemetry;
pub mod triggers;

#[cfg(test)]
mod test_support;

pub use deletion::{
    delete_collection, CollectionDeleter, DeletionError, DeletionOptions, DeletionReport,
    DeletionStats, SubtreeDeletionError,
};
pub use logging::{init_tracing, LogFormat};
pub use service::{FunctionsApp, FunctionsConfig};
pub use storage::{DocumentStore, WriteBatch};
pub use telemetry::{ErrorReporter, TracingReporter};
pub use triggers::{DocumentKind, TriggerError, TriggerEvent, Triggers};
