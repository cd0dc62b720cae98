//! Staged writes applied atomically by [`DocumentStore::commit`](super::DocumentStore::commit).

use real_core::{DocumentPath, Fields};

/// A single staged write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create or overwrite the document.
    Set { path: DocumentPath, fields: Fields },
    /// Create the document or merge `fields` into the existing payload.
    Merge { path: DocumentPath, fields: Fields },
    /// Remove the document. Removing an absent document is a no-op.
    Delete { path: DocumentPath },
}

impl WriteOp {
    #[must_use]
    pub fn path(&self) -> &DocumentPath {
        match self {
            Self::Set { path, .. } | Self::Merge { path, .. } | Self::Delete { path } => path,
        }
    }
}

/// Ordered set of writes committed all-or-nothing.
///
/// Stores cap how many writes one batch may hold; see
/// [`DocumentStore::max_batch_writes`](super::DocumentStore::max_batch_writes).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: DocumentPath, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::Set { path, fields });
        self
    }

    pub fn merge(&mut self, path: DocumentPath, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::Merge { path, fields });
        self
    }

    pub fn delete(&mut self, path: DocumentPath) -> &mut Self {
        self.ops.push(WriteOp::Delete { path });
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    #[must_use]
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// What a successful commit actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Set and merge operations applied.
    pub written: usize,
    /// Delete operations that removed an existing document.
    pub deleted: usize,
}

#[cfg(test)]
mod tests {
    use real_core::fields;

    use super::*;

    #[test]
    fn batch_preserves_staging_order() {
        let a = DocumentPath::parse("c/a").unwrap();
        let b = DocumentPath::parse("c/b").unwrap();

        let mut batch = WriteBatch::new();
        assert!(batch.is_empty());
        batch
            .set(a.clone(), fields([("n", 1_i64)]))
            .delete(b.clone())
            .merge(a.clone(), fields([("m", 2_i64)]));

        assert_eq!(batch.len(), 3);
        let paths: Vec<&DocumentPath> = batch.ops().iter().map(WriteOp::path).collect();
        assert_eq!(paths, vec![&a, &b, &a]);
        assert!(matches!(batch.into_ops()[1], WriteOp::Delete { .. }));
    }
}
