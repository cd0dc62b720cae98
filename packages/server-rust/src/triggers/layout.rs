//! Which collections each kind of parent document owns.
//!
//! The store has no "delete with children" operation, so removing a parent
//! means emptying every collection nested under it. Those names are fixed per
//! document kind and listed here as data.

use std::collections::HashSet;

use real_core::templates::{DEVO_IDS, GUIDE_TYPES, REVIEW_ID};
use real_core::{CollectionPath, ContentKind, DocumentPath, PathError};

/// Parent documents whose removal triggers a subtree deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// `curriculumEdit/{series}/lessons/{lesson}`
    Lesson,
    /// `messageSeries/{id}`
    Series,
    /// `messageMessage/{id}`
    Message,
    /// `messageScratch/{id}`
    Scratch,
}

impl DocumentKind {
    /// Recognises the kind from the document's location.
    #[must_use]
    pub fn from_path(doc: &DocumentPath) -> Option<Self> {
        match doc.segments() {
            [root, _, lessons, _] if root == "curriculumEdit" && lessons == "lessons" => {
                Some(Self::Lesson)
            }
            [root, _] => ContentKind::ALL
                .into_iter()
                .find(|kind| kind.collection() == root)
                .map(Self::from),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lesson => "lesson",
            Self::Series => "series",
            Self::Message => "message",
            Self::Scratch => "scratch",
        }
    }

    /// Name of the handler that deletes documents of this kind, used to tag
    /// error reports.
    #[must_use]
    pub fn delete_function(self) -> &'static str {
        match self {
            Self::Lesson => "removeLesson",
            Self::Series => "removeSeries",
            Self::Message => "removeMessage",
            Self::Scratch => "removeScratch",
        }
    }

    /// Breadcrumb category.
    #[must_use]
    pub fn category(self) -> &'static str {
        match self {
            Self::Lesson => "builder",
            Self::Series | Self::Message | Self::Scratch => "message",
        }
    }

    #[must_use]
    pub fn content_kind(self) -> Option<ContentKind> {
        match self {
            Self::Lesson => None,
            Self::Series => Some(ContentKind::Series),
            Self::Message => Some(ContentKind::Message),
            Self::Scratch => Some(ContentKind::Scratch),
        }
    }

    #[must_use]
    pub fn layout(self) -> &'static SubtreeLayout {
        match self {
            Self::Lesson => &LESSON,
            Self::Series | Self::Scratch => &CONTENT,
            Self::Message => &MESSAGE,
        }
    }
}

impl From<ContentKind> for DocumentKind {
    fn from(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Series => Self::Series,
            ContentKind::Message => Self::Message,
            ContentKind::Scratch => Self::Scratch,
        }
    }
}

/// A collection directly under the parent document.
///
/// `documents` are the known keys inside it that own collections of their
/// own, named by `nested`.
#[derive(Debug)]
pub struct OwnedCollection {
    pub name: &'static str,
    pub documents: &'static [&'static str],
    pub nested: &'static [&'static str],
}

impl OwnedCollection {
    const fn leaf(name: &'static str) -> Self {
        Self {
            name,
            documents: &[],
            nested: &[],
        }
    }
}

/// The collections owned by one kind of parent document.
#[derive(Debug)]
pub struct SubtreeLayout {
    pub owned: &'static [OwnedCollection],
}

const PART_COLLECTIONS: &[&str] = &["structure", "sections", "modules"];

static LESSON: SubtreeLayout = SubtreeLayout {
    owned: &[
        OwnedCollection {
            name: "devos",
            documents: &DEVO_IDS,
            nested: PART_COLLECTIONS,
        },
        OwnedCollection {
            name: "guides",
            documents: &GUIDE_TYPES,
            nested: PART_COLLECTIONS,
        },
        OwnedCollection {
            name: "review",
            documents: &[REVIEW_ID],
            nested: PART_COLLECTIONS,
        },
    ],
};

static CONTENT: SubtreeLayout = SubtreeLayout {
    owned: &[
        OwnedCollection::leaf("structure"),
        OwnedCollection::leaf("modules"),
        OwnedCollection::leaf("sections"),
    ],
};

static MESSAGE: SubtreeLayout = SubtreeLayout {
    owned: &[
        OwnedCollection::leaf("structure"),
        OwnedCollection::leaf("modules"),
        OwnedCollection::leaf("sections"),
        OwnedCollection::leaf("history"),
    ],
};

impl SubtreeLayout {
    /// Every collection path under `root`, parents before their nested
    /// collections, without duplicates.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if a layout name does not form a valid path
    /// under `root`.
    pub fn expand(&self, root: &DocumentPath) -> Result<Vec<CollectionPath>, PathError> {
        let mut seen = HashSet::new();
        let mut paths = Vec::new();
        for owned in self.owned {
            let collection = root.collection(owned.name)?;
            let mut nested = Vec::with_capacity(owned.documents.len() * owned.nested.len());
            for key in owned.documents {
                let doc = collection.doc(key)?;
                for name in owned.nested {
                    nested.push(doc.collection(name)?);
                }
            }
            for path in std::iter::once(collection).chain(nested) {
                if seen.insert(path.clone()) {
                    paths.push(path);
                }
            }
        }
        Ok(paths)
    }
}
