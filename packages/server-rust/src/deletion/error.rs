use real_core::CollectionPath;

/// Errors returned by [`CollectionDeleter`](super::CollectionDeleter).
///
/// Documents removed by pages committed before the failure stay removed.
#[derive(Debug, thiserror::Error)]
pub enum DeletionError {
    #[error("page size {page_size} is outside 1..={max}")]
    InvalidPageSize { page_size: usize, max: usize },
    #[error("query for page {page} of `{path}` failed")]
    Query {
        path: CollectionPath,
        page: u64,
        #[source]
        source: anyhow::Error,
    },
    #[error("batch commit for page {page} of `{path}` failed")]
    Commit {
        path: CollectionPath,
        page: u64,
        #[source]
        source: anyhow::Error,
    },
    #[error("deleting `{path}` exceeded its {deadline_ms}ms deadline after {pages} pages")]
    DeadlineExceeded {
        path: CollectionPath,
        deadline_ms: u64,
        pages: u64,
    },
    #[error("`{path}` still returned deleted documents at page {page}")]
    StaleReads { path: CollectionPath, page: u64 },
}

impl DeletionError {
    /// Collection being emptied when the error occurred.
    #[must_use]
    pub fn path(&self) -> Option<&CollectionPath> {
        match self {
            Self::InvalidPageSize { .. } => None,
            Self::Query { path, .. }
            | Self::Commit { path, .. }
            | Self::DeadlineExceeded { path, .. }
            | Self::StaleReads { path, .. } => Some(path),
        }
    }

    /// Zero-based page being processed when the error occurred.
    #[must_use]
    pub fn page(&self) -> Option<u64> {
        match self {
            Self::InvalidPageSize { .. } => None,
            Self::Query { page, .. } | Self::Commit { page, .. } | Self::StaleReads { page, .. } => {
                Some(*page)
            }
            Self::DeadlineExceeded { pages, .. } => Some(*pages),
        }
    }

    /// Short label used as a metrics dimension.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidPageSize { .. } => "invalid_page_size",
            Self::Query { .. } => "query",
            Self::Commit { .. } => "commit",
            Self::DeadlineExceeded { .. } => "deadline",
            Self::StaleReads { .. } => "stale_reads",
        }
    }
}
