//! Error-tracking sink and its implementations.
//!
//! Defines [`ErrorReporter`], the capability handlers use to report failures
//! and leave breadcrumbs, and [`CompositeReporter`] which fans out to several
//! reporters. Reporters are passed in explicitly; there is no global client.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Severity of a breadcrumb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
}

/// Trail entry recorded ahead of any later error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    /// Functional area, e.g. `builder` or `message`.
    pub category: &'static str,
    pub message: String,
    pub level: Level,
}

impl Breadcrumb {
    #[must_use]
    pub fn info(category: &'static str, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            level: Level::Info,
        }
    }

    #[must_use]
    pub fn warning(category: &'static str, message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            ..Self::info(category, message)
        }
    }
}

/// A captured failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// Handler or component that failed, e.g. `removeLesson`.
    pub function: &'static str,
    /// Collection or document path involved, if any.
    pub path: Option<String>,
    /// Zero-based page index for deletion failures.
    pub page: Option<u64>,
    /// The error and its source chain, outermost first.
    pub message: String,
}

impl ErrorReport {
    /// Report for `error`, walking its full source chain.
    #[must_use]
    pub fn new(function: &'static str, error: &(dyn std::error::Error + 'static)) -> Self {
        Self {
            function,
            path: None,
            page: None,
            message: error_chain(error),
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl fmt::Display) -> Self {
        self.path = Some(path.to_string());
        self
    }

    #[must_use]
    pub fn with_page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }
}

/// Joins an error and all of its sources with `": "`.
#[must_use]
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// External error-tracking sink.
///
/// Both methods are fire-and-forget: they must return promptly and never
/// fail, so reporting cannot alter the error a caller propagates.
///
/// Used as `Arc<dyn ErrorReporter>`.
pub trait ErrorReporter: Send + Sync {
    /// Record a failure.
    fn capture_error(&self, report: ErrorReport);

    /// Record a breadcrumb.
    fn add_breadcrumb(&self, crumb: Breadcrumb);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl ErrorReporter for NullReporter {
    fn capture_error(&self, _report: ErrorReport) {}

    fn add_breadcrumb(&self, _crumb: Breadcrumb) {}
}

/// Emits reports and breadcrumbs as `tracing` events.
#[derive(Debug, Clone)]
pub struct TracingReporter {
    environment: &'static str,
}

impl TracingReporter {
    #[must_use]
    pub fn new(environment: &'static str) -> Self {
        Self { environment }
    }
}

impl ErrorReporter for TracingReporter {
    fn capture_error(&self, report: ErrorReport) {
        tracing::error!(
            environment = self.environment,
            function = report.function,
            path = report.path.as_deref().unwrap_or(""),
            page = report.page,
            "{}",
            report.message
        );
    }

    fn add_breadcrumb(&self, crumb: Breadcrumb) {
        match crumb.level {
            Level::Info => tracing::info!(category = crumb.category, "{}", crumb.message),
            Level::Warning => tracing::warn!(category = crumb.category, "{}", crumb.message),
        }
    }
}

/// Keeps everything in memory for inspection.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    errors: Mutex<Vec<ErrorReport>>,
    breadcrumbs: Mutex<Vec<Breadcrumb>>,
}

impl MemoryReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn errors(&self) -> Vec<ErrorReport> {
        self.errors.lock().clone()
    }

    #[must_use]
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.breadcrumbs.lock().clone()
    }
}

impl ErrorReporter for MemoryReporter {
    fn capture_error(&self, report: ErrorReport) {
        self.errors.lock().push(report);
    }

    fn add_breadcrumb(&self, crumb: Breadcrumb) {
        self.breadcrumbs.lock().push(crumb);
    }
}

/// Composite reporter that fans out to multiple reporters.
#[derive(Default)]
pub struct CompositeReporter {
    reporters: Vec<Arc<dyn ErrorReporter>>,
}

impl CompositeReporter {
    #[must_use]
    pub fn new(reporters: Vec<Arc<dyn ErrorReporter>>) -> Self {
        Self { reporters }
    }

    /// Adds a reporter after construction.
    pub fn add(&mut self, reporter: Arc<dyn ErrorReporter>) {
        self.reporters.push(reporter);
    }
}

impl ErrorReporter for CompositeReporter {
    fn capture_error(&self, report: ErrorReport) {
        for reporter in &self.reporters {
            reporter.capture_error(report.clone());
        }
    }

    fn add_breadcrumb(&self, crumb: Breadcrumb) {
        for reporter in &self.reporters {
            reporter.add_breadcrumb(crumb.clone());
        }
    }
}
