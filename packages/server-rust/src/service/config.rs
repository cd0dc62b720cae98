use std::time::Duration;

use crate::deletion::{DeletionOptions, DEFAULT_PAGE_SIZE, DEFAULT_STALE_PAGE_LIMIT};
use crate::logging::LogFormat;

/// Project id of the production deployment.
pub const PRODUCTION_PROJECT_ID: &str = "real-45953";

/// Deployment environment derived from the project id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Staging,
}

impl Environment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Production => "prod",
            Self::Staging => "staging",
        }
    }
}

/// Errors from [`FunctionsConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("delete page size {page_size} must be between 1 and {max}")]
    PageSize { page_size: usize, max: usize },
    #[error("worker queue capacity must be positive")]
    QueueCapacity,
    #[error("worker tick interval must be positive")]
    TickInterval,
}

/// Runtime configuration of the trigger host.
///
/// Deletion tuning, worker sizing and log output in one place. Every field can be set by flag or environment variable so the host
/// binary can `#[command(flatten)]` it.
#[derive(Debug, Clone, clap::Args)]
pub struct FunctionsConfig {
    /// Project the functions are deployed to; selects the environment.
    #[arg(long, env = "REAL_PROJECT_ID", default_value = "")]
    pub project_id: String,
    /// Documents deleted per atomic batch.
    #[arg(long, env = "REAL_DELETE_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub delete_page_size: usize,
    /// Per-collection deletion budget in milliseconds. 0 disables it.
    #[arg(long, env = "REAL_DELETE_DEADLINE_MS", default_value_t = 540_000)]
    pub delete_deadline_ms: u64,
    /// Repeated pages tolerated from a lagging store.
    #[arg(long, env = "REAL_STALE_PAGE_LIMIT", default_value_t = DEFAULT_STALE_PAGE_LIMIT)]
    pub stale_page_limit: u32,
    /// Pause in milliseconds before re-reading a repeated page.
    #[arg(long, env = "REAL_STALE_RETRY_MS", default_value_t = 50)]
    pub stale_retry_ms: u64,
    /// Pending trigger events buffered by the worker.
    #[arg(long, env = "REAL_WORKER_QUEUE", default_value_t = 256)]
    pub worker_queue_capacity: usize,
    /// Interval between worker heartbeats in milliseconds.
    #[arg(long, env = "REAL_WORKER_TICK_MS", default_value_t = 60_000)]
    pub worker_tick_ms: u64,
    /// Log output: human-readable `text` for local runs, `json` lines for
    /// the hosted log collector.
    #[arg(long, env = "REAL_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Default for FunctionsConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            delete_page_size: DEFAULT_PAGE_SIZE,
            delete_deadline_ms: 540_000,
            stale_page_limit: DEFAULT_STALE_PAGE_LIMIT,
            stale_retry_ms: 50,
            worker_queue_capacity: 256,
            worker_tick_ms: 60_000,
            log_format: LogFormat::Text,
        }
    }
}

impl FunctionsConfig {
    #[must_use]
    pub fn environment(&self) -> Environment {
        if self.project_id == PRODUCTION_PROJECT_ID {
            Environment::Production
        } else {
            Environment::Staging
        }
    }

    /// Deletion engine options derived from this config.
    #[must_use]
    pub fn deletion_options(&self) -> DeletionOptions {
        DeletionOptions {
            page_size: self.delete_page_size,
            deadline: (self.delete_deadline_ms > 0)
                .then(|| Duration::from_millis(self.delete_deadline_ms)),
            stale_page_limit: self.stale_page_limit,
            stale_retry_delay: Duration::from_millis(self.stale_retry_ms),
        }
    }

    /// Checks the values against the store's batch cap.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self, max_batch_writes: usize) -> Result<(), ConfigError> {
        if self.delete_page_size == 0 || self.delete_page_size > max_batch_writes {
            return Err(ConfigError::PageSize {
                page_size: self.delete_page_size,
                max: max_batch_writes,
            });
        }
        if self.worker_queue_capacity == 0 {
            return Err(ConfigError::QueueCapacity);
        }
        if self.worker_tick_ms == 0 {
            return Err(ConfigError::TickInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::deletion::DEFAULT_STALE_RETRY_DELAY;

    #[derive(Parser)]
    struct Host {
        #[command(flatten)]
        config: FunctionsConfig,
    }

    #[test]
    fn defaults_match_flag_defaults() {
        let parsed = Host::try_parse_from(["host"]).unwrap().config;
        let default = FunctionsConfig::default();
        assert_eq!(parsed.delete_page_size, default.delete_page_size);
        assert_eq!(parsed.delete_deadline_ms, default.delete_deadline_ms);
        assert_eq!(parsed.stale_page_limit, default.stale_page_limit);
        assert_eq!(parsed.stale_retry_ms, default.stale_retry_ms);
        assert_eq!(
            default.deletion_options().stale_retry_delay,
            DEFAULT_STALE_RETRY_DELAY
        );
        assert_eq!(parsed.worker_queue_capacity, default.worker_queue_capacity);
        assert_eq!(parsed.worker_tick_ms, default.worker_tick_ms);
    }

    #[test]
    fn flags_override_defaults() {
        let config = Host::try_parse_from([
            "host",
            "--project-id",
            PRODUCTION_PROJECT_ID,
            "--delete-page-size",
            "25",
            "--delete-deadline-ms",
            "0",
            "--log-format",
            "json",
            "--stale-retry-ms",
            "5",
        ])
        .unwrap()
        .config;

        assert_eq!(config.environment(), Environment::Production);
        assert_eq!(config.log_format, LogFormat::Json);
        let options = config.deletion_options();
        assert_eq!(options.page_size, 25);
        assert_eq!(options.deadline, None);
        assert_eq!(options.stale_retry_delay, Duration::from_millis(5));
    }

    #[test]
    fn unknown_project_is_staging() {
        let config = FunctionsConfig {
            project_id: "real-dev".to_string(),
            ..FunctionsConfig::default()
        };
        assert_eq!(config.environment(), Environment::Staging);
        assert_eq!(config.environment().as_str(), "staging");
        assert_eq!(
            config.deletion_options().deadline,
            Some(Duration::from_millis(540_000))
        );
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let config = FunctionsConfig::default();
        assert_eq!(config.validate(500), Ok(()));

        let too_big = FunctionsConfig {
            delete_page_size: 501,
            ..FunctionsConfig::default()
        };
        assert_eq!(
            too_big.validate(500),
            Err(ConfigError::PageSize { page_size: 501, max: 500 })
        );

        let no_queue = FunctionsConfig {
            worker_queue_capacity: 0,
            ..FunctionsConfig::default()
        };
        assert_eq!(no_queue.validate(500), Err(ConfigError::QueueCapacity));
    }
}
