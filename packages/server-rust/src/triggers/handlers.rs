//! Document event handlers.
//!
//! Each handler is one isolated unit of work. Failures are captured by the
//! reporter with the handler's name and the document path, then returned.

use std::sync::Arc;

use futures_util::future::try_join_all;
use real_core::templates::{
    default_devo, default_guide, default_review, lesson_structure, message_structure, DEVO_IDS,
    GUIDE_TYPES, REVIEW_ID,
};
use real_core::{
    ClockSource, CollectionPath, ContentKind, DocumentPath, DocumentSnapshot, Fields, MediaKind,
    PathError, StructurePart, Value,
};
use uuid::Uuid;

use super::history::{editor, HistoryAction, HistoryContext, HistoryRecord, HISTORY_COLLECTION};
use super::layout::DocumentKind;
use super::TriggerEvent;
use crate::deletion::{
    CollectionDeleter, DeletionError, DeletionOptions, DeletionStats, SubtreeDeletionError,
};
use crate::storage::{DocumentStore, WriteBatch};
use crate::telemetry::{Breadcrumb, ErrorReport, ErrorReporter};

// ---------------------------------------------------------------------------
// Handler names
// ---------------------------------------------------------------------------

const ADD_LESSON: &str = "addLesson";
const CREATE_CONTENT: &str = "createContent";
const CREATE_MEDIA: &str = "createMedia";

// ---------------------------------------------------------------------------
// TriggerError
// ---------------------------------------------------------------------------

/// Failure of a single handler invocation. Already reported when returned.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Deletion(#[from] DeletionError),
    #[error(transparent)]
    Subtree(#[from] SubtreeDeletionError),
    #[error("{function} failed to write under {path}")]
    Write {
        function: &'static str,
        path: DocumentPath,
        #[source]
        source: anyhow::Error,
    },
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Document created at a location some handler initialises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Created {
    Lesson,
    Content(ContentKind),
    Media(MediaKind),
}

impl Created {
    fn from_path(doc: &DocumentPath) -> Option<Self> {
        if let Some(kind) = DocumentKind::from_path(doc) {
            return Some(kind.content_kind().map_or(Self::Lesson, Self::Content));
        }
        let [root, _] = doc.segments() else {
            return None;
        };
        MediaKind::ALL
            .into_iter()
            .find(|kind| kind.collection() == root)
            .map(Self::Media)
    }
}

/// The document event handlers, sharing one store and reporter.
///
/// Handlers may run concurrently. A failed deletion can be re-invoked and
/// resumes from whatever is left.
pub struct Triggers {
    store: Arc<dyn DocumentStore>,
    reporter: Arc<dyn ErrorReporter>,
    clock: Arc<dyn ClockSource>,
    deletion: DeletionOptions,
}

impl Triggers {
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        reporter: Arc<dyn ErrorReporter>,
        clock: Arc<dyn ClockSource>,
        deletion: DeletionOptions,
    ) -> Self {
        Self {
            store,
            reporter,
            clock,
            deletion,
        }
    }

    /// Routes an event to its handler. Returns `false` when no handler
    /// watches the event's path.
    ///
    /// # Errors
    ///
    /// Returns the handler's error.
    pub async fn dispatch(&self, event: TriggerEvent) -> Result<bool, TriggerError> {
        match event {
            TriggerEvent::Created(snap) => match Created::from_path(&snap.path) {
                Some(Created::Lesson) => self.on_lesson_created(&snap.path).await.map(|_| true),
                Some(Created::Content(kind)) => {
                    self.on_content_created(&snap, kind).await.map(|()| true)
                }
                Some(Created::Media(kind)) => {
                    self.on_media_created(&snap, kind).await.map(|()| true)
                }
                None => Ok(false),
            },
            TriggerEvent::Deleted(path) => match DocumentKind::from_path(&path) {
                Some(kind) => self.on_deleted(kind, &path).await.map(|_| true),
                None => Ok(false),
            },
            TriggerEvent::Written {
                path,
                before,
                after,
            } => self
                .on_message_part_written(&path, before.as_ref(), after.as_ref())
                .await
                .map(|written| written.is_some()),
        }
    }
}

// ---------------------------------------------------------------------------
// Deletion triggers
// ---------------------------------------------------------------------------

impl Triggers {
    /// Empties every collection `kind` owns under the removed `doc`.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::Subtree`] if any collection could not be
    /// emptied. The collections that could are still emptied.
    pub async fn on_deleted(
        &self,
        kind: DocumentKind,
        doc: &DocumentPath,
    ) -> Result<DeletionStats, TriggerError> {
        let function = kind.delete_function();
        let paths = kind
            .layout()
            .expand(doc)
            .map_err(|err| self.fail(function, doc, err.into()))?;
        let deleter = CollectionDeleter::new(
            self.store.clone(),
            self.reporter.clone(),
            self.deletion.clone(),
        )
        .map_err(|err| self.fail(function, doc, err.into()))?
        .for_function(function);

        // Each failed path has already been reported by the deleter.
        let stats = deleter.delete_paths(&paths).await.into_result()?;

        tracing::info!(
            function,
            path = %doc,
            collections = paths.len(),
            documents = stats.documents,
            "subtree removed"
        );
        self.reporter.add_breadcrumb(Breadcrumb::info(
            kind.category(),
            format!("{function}: {} removed successfully: {}", kind.as_str(), doc.id()),
        ));
        self.flag_unlisted(kind, doc).await;
        Ok(stats)
    }

    /// Leaves a warning breadcrumb for collections under `doc` that the
    /// layout does not know about. They are not deleted.
    async fn flag_unlisted(&self, kind: DocumentKind, doc: &DocumentPath) {
        let remaining = match self.store.list_collections(doc).await {
            Ok(remaining) => remaining,
            Err(err) => {
                tracing::debug!(path = %doc, error = %err, "could not list leftover collections");
                return;
            }
        };
        if remaining.is_empty() {
            return;
        }
        let names: Vec<&str> = remaining.iter().map(CollectionPath::id).collect();
        tracing::warn!(path = %doc, collections = ?names, "collections outside the layout remain");
        self.reporter.add_breadcrumb(Breadcrumb::warning(
            kind.category(),
            format!(
                "{}: unlisted collections remain under {doc}: {}",
                kind.delete_function(),
                names.join(", ")
            ),
        ));
    }
}

// ---------------------------------------------------------------------------
// Creation triggers
// ---------------------------------------------------------------------------

impl Triggers {
    /// Seeds a new lesson with its devos, guides, review and their structure
    /// documents. Returns the number of documents written.
    ///
    /// # Errors
    ///
    /// Returns the first failed path or commit.
    pub async fn on_lesson_created(&self, lesson: &DocumentPath) -> Result<usize, TriggerError> {
        match self.seed_lesson(lesson).await {
            Ok(written) => {
                tracing::info!(path = %lesson, written, "lesson seeded");
                self.reporter.add_breadcrumb(Breadcrumb::info(
                    DocumentKind::Lesson.category(),
                    format!("{ADD_LESSON}: lesson added successfully: {}", lesson.id()),
                ));
                Ok(written)
            }
            Err(err) => Err(self.fail(ADD_LESSON, lesson, err)),
        }
    }

    async fn seed_lesson(&self, lesson: &DocumentPath) -> Result<usize, TriggerError> {
        let mut devos = WriteBatch::new();
        let mut guides = WriteBatch::new();
        let mut review = WriteBatch::new();
        let mut devo_parts = WriteBatch::new();
        let mut guide_parts = WriteBatch::new();

        let with_structure = |batch: &mut WriteBatch, part: &DocumentPath| {
            let structure = part.collection("structure")?;
            for piece in StructurePart::ALL {
                batch.set(structure.doc(piece.id())?, lesson_structure(piece));
            }
            Ok::<_, PathError>(())
        };

        let devo_root = lesson.collection("devos")?;
        for id in DEVO_IDS {
            let devo = devo_root.doc(id)?;
            with_structure(&mut devo_parts, &devo)?;
            devos.set(devo, default_devo());
        }
        let guide_root = lesson.collection("guides")?;
        for guide_type in GUIDE_TYPES {
            let guide = guide_root.doc(guide_type)?;
            with_structure(&mut guide_parts, &guide)?;
            guides.set(guide, default_guide());
        }
        review.set(
            lesson.collection("review")?.doc(REVIEW_ID)?,
            default_review(),
        );

        let outcomes = try_join_all(
            [devos, guides, review, devo_parts, guide_parts]
                .into_iter()
                .map(|batch| self.store.commit(batch)),
        )
        .await
        .map_err(|source| TriggerError::Write {
            function: ADD_LESSON,
            path: lesson.clone(),
            source,
        })?;
        Ok(outcomes.iter().map(|outcome| outcome.written).sum())
    }

    /// Completes a new series, message or scratch document from its kind's
    /// defaults. Messages also get their structure documents.
    ///
    /// # Errors
    ///
    /// Returns the failed path or commit.
    pub async fn on_content_created(
        &self,
        snap: &DocumentSnapshot,
        kind: ContentKind,
    ) -> Result<(), TriggerError> {
        match self.complete_content(snap, kind).await {
            Ok(()) => {
                tracing::debug!(path = %snap.path, kind = %kind, "content initialised");
                self.reporter.add_breadcrumb(Breadcrumb::info(
                    "message",
                    format!("{CREATE_CONTENT}: {kind} content added successfully"),
                ));
                Ok(())
            }
            Err(err) => Err(self.fail(CREATE_CONTENT, &snap.path, err)),
        }
    }

    async fn complete_content(
        &self,
        snap: &DocumentSnapshot,
        kind: ContentKind,
    ) -> Result<(), TriggerError> {
        let mut doc = kind.defaults(self.clock.now());
        for key in ["title", "createdBy"] {
            if let Some(value) = snap.get(key) {
                doc.insert(key.to_string(), value.clone());
            }
        }
        doc.insert(
            "users".to_string(),
            Value::Array(vec![Value::from(snap.str_field("createdBy"))]),
        );

        let mut batch = WriteBatch::new();
        if kind == ContentKind::Message {
            if let Some(prefs) = snap.get("prefs") {
                doc.insert("prefs".to_string(), prefs.clone());
            }
            doc.insert("seriesid".to_string(), Value::from(snap.str_field("seriesid")));
            let structure = snap.path.collection("structure")?;
            for part in StructurePart::ALL {
                batch.set(structure.doc(part.id())?, message_structure(part));
            }
        }
        batch.set(snap.path.clone(), doc);

        self.store
            .commit(batch)
            .await
            .map_err(|source| TriggerError::Write {
                function: CREATE_CONTENT,
                path: snap.path.clone(),
                source,
            })?;
        Ok(())
    }

    /// Fills in the fields a new media document did not set.
    ///
    /// # Errors
    ///
    /// Returns the failed commit.
    pub async fn on_media_created(
        &self,
        snap: &DocumentSnapshot,
        kind: MediaKind,
    ) -> Result<(), TriggerError> {
        let mut doc = kind.defaults(self.clock.now());
        doc.extend(snap.fields.clone());
        let mut batch = WriteBatch::new();
        batch.set(snap.path.clone(), doc);

        if let Err(source) = self.store.commit(batch).await {
            let err = TriggerError::Write {
                function: CREATE_MEDIA,
                path: snap.path.clone(),
                source,
            };
            return Err(self.fail(CREATE_MEDIA, &snap.path, err));
        }
        tracing::debug!(path = %snap.path, kind = %kind, "media initialised");
        self.reporter.add_breadcrumb(Breadcrumb::info(
            "message",
            format!("{CREATE_MEDIA}: {kind} media added successfully"),
        ));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// History trigger
// ---------------------------------------------------------------------------

impl Triggers {
    /// Appends a history record for a write to a message's modules,
    /// sections or structure. Returns the record's path, or `None` if `part`
    /// is not a message part.
    ///
    /// # Errors
    ///
    /// Returns the failed commit.
    pub async fn on_message_part_written(
        &self,
        part: &DocumentPath,
        before: Option<&Fields>,
        after: Option<&Fields>,
    ) -> Result<Option<DocumentPath>, TriggerError> {
        let Some((context, message_id)) = HistoryContext::from_path(part) else {
            return Ok(None);
        };
        let Some(action) = HistoryAction::classify(before, after) else {
            return Ok(None);
        };
        let function = context.function();
        let Some(message) = part.parent().parent() else {
            return Ok(None);
        };

        let record = HistoryRecord {
            context,
            message_id: message_id.to_string(),
            part: part.clone(),
            action,
            uid: editor(before, after),
            timestamp_ms: self.clock.now(),
            new_val: after.cloned(),
            prev_val: before.cloned(),
        };
        let target = message
            .collection(HISTORY_COLLECTION)
            .and_then(|history| history.doc(&Uuid::new_v4().to_string()))
            .map_err(|err| self.fail(function, part, err.into()))?;

        let mut batch = WriteBatch::new();
        batch.set(target.clone(), record.to_fields());
        if let Err(source) = self.store.commit(batch).await {
            let err = TriggerError::Write {
                function,
                path: part.clone(),
                source,
            };
            return Err(self.fail(function, part, err));
        }

        self.reporter.add_breadcrumb(Breadcrumb::info(
            "message",
            format!(
                "{function}: message history point added successfully: {message_id} - {}",
                action.as_str()
            ),
        ));
        Ok(Some(target))
    }

    /// Logs and reports `err` under the handler's name, then hands it back.
    fn fail(&self, function: &'static str, path: &DocumentPath, err: TriggerError) -> TriggerError {
        tracing::warn!(function, path = %path, error = %err, "trigger failed");
        self.reporter
            .capture_error(ErrorReport::new(function, &err).with_path(path));
        err
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
