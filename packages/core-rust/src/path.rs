//! Hierarchical document store paths.
//!
//! A path is a slash-delimited sequence of alternating collection names and
//! document keys. A [`CollectionPath`] has an odd number of segments
//! (`lessons`, `curriculumEdit/s1/lessons`), a [`DocumentPath`] an even one
//! (`curriculumEdit/s1`, `curriculumEdit/s1/lessons/l1`).

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum length of a single segment in bytes.
pub const MAX_SEGMENT_BYTES: usize = 1500;

/// Ids of the form `__name__` are reserved by the store.
static RESERVED_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^__.*__$").unwrap_or_else(|_| unreachable!("static pattern is valid"))
});

/// Errors produced while parsing or building a path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,
    #[error("path `{path}` contains an empty segment")]
    EmptySegment { path: String },
    #[error("`{path}` does not name a collection (odd segment count required)")]
    NotACollection { path: String },
    #[error("`{path}` does not name a document (even segment count required)")]
    NotADocument { path: String },
    #[error("segment `{segment}` is not a valid id")]
    InvalidSegment { segment: String },
    #[error("segment starting with `{prefix}` exceeds {MAX_SEGMENT_BYTES} bytes")]
    SegmentTooLong { prefix: String },
}

fn validate_segment(segment: &str, path: &str) -> Result<(), PathError> {
    if segment.is_empty() {
        return Err(PathError::EmptySegment {
            path: path.to_string(),
        });
    }
    if segment.contains('/') || segment == "." || segment == ".." || RESERVED_ID.is_match(segment)
    {
        return Err(PathError::InvalidSegment {
            segment: segment.to_string(),
        });
    }
    if segment.len() > MAX_SEGMENT_BYTES {
        let prefix: String = segment.chars().take(16).collect();
        return Err(PathError::SegmentTooLong { prefix });
    }
    Ok(())
}

fn split_segments(path: &str) -> Result<Vec<String>, PathError> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(PathError::Empty);
    }
    trimmed
        .split('/')
        .map(|segment| validate_segment(segment, path).map(|()| segment.to_string()))
        .collect()
}

/// Path to a collection. Ordered segment-wise.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionPath {
    segments: Vec<String>,
}

/// Path to a single document. Ordered segment-wise.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// Parses a slash-delimited collection path. Leading and trailing
    /// slashes are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] for empty or invalid segments, or when the
    /// segment count is even.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let segments = split_segments(path)?;
        if segments.len() % 2 == 0 {
            return Err(PathError::NotACollection {
                path: path.to_string(),
            });
        }
        Ok(Self { segments })
    }

    /// A top-level collection.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if `name` is not a valid segment.
    pub fn root(name: &str) -> Result<Self, PathError> {
        validate_segment(name, name)?;
        Ok(Self {
            segments: vec![name.to_string()],
        })
    }

    /// Path of the document `key` inside this collection.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if `key` is not a valid segment.
    pub fn doc(&self, key: &str) -> Result<DocumentPath, PathError> {
        validate_segment(key, key)?;
        let mut segments = self.segments.clone();
        segments.push(key.to_string());
        Ok(DocumentPath { segments })
    }

    /// Document owning this collection, `None` for top-level collections.
    #[must_use]
    pub fn parent(&self) -> Option<DocumentPath> {
        if self.segments.len() < 3 {
            return None;
        }
        Some(DocumentPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Name of the collection (last segment).
    #[must_use]
    pub fn id(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Whether this collection lives anywhere beneath `doc`.
    #[must_use]
    pub fn is_under(&self, doc: &DocumentPath) -> bool {
        self.segments.len() > doc.segments.len() && self.segments.starts_with(&doc.segments)
    }
}

impl DocumentPath {
    /// Parses a slash-delimited document path.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] for empty or invalid segments, or when the
    /// segment count is odd.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let segments = split_segments(path)?;
        if segments.len() % 2 == 1 {
            return Err(PathError::NotADocument {
                path: path.to_string(),
            });
        }
        Ok(Self { segments })
    }

    /// Path of the sub-collection `name` under this document.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if `name` is not a valid segment.
    pub fn collection(&self, name: &str) -> Result<CollectionPath, PathError> {
        validate_segment(name, name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(CollectionPath { segments })
    }

    /// Collection containing this document.
    #[must_use]
    pub fn parent(&self) -> CollectionPath {
        CollectionPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
    }

    /// Key of the document (last segment).
    #[must_use]
    pub fn id(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// All segments, alternating collection name and document key.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl TryFrom<String> for CollectionPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<String> for DocumentPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CollectionPath> for String {
    fn from(path: CollectionPath) -> Self {
        path.to_string()
    }
}

impl From<DocumentPath> for String {
    fn from(path: DocumentPath) -> Self {
        path.to_string()
    }
}
