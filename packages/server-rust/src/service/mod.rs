//! Hosting of the trigger handlers.
//!
//! - `config`: flags and environment variables
//! - `worker`: the background task that drains queued events
//! - `app`: wires a store and reporter to the handlers and the worker

pub mod app;
pub mod config;
pub mod worker;

pub use app::{default_reporter, serve, FunctionsApp};
pub use config::{ConfigError, Environment, FunctionsConfig, PRODUCTION_PROJECT_ID};
pub use worker::{BackgroundRunnable, BackgroundWorker, WorkerError};
