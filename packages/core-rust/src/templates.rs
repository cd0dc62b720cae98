//! Default document shapes written by the creation triggers.
//!
//! Lessons are seeded with devos, guides and a review, each owning a
//! `structure` collection of hook/application/prayer documents. Message
//! content and media documents are completed from their kind's defaults.

use std::fmt;

use crate::types::{fields, Fields, Value};

/// Keys of the seven devos every lesson owns.
pub const DEVO_IDS: [&str; 7] = ["1", "2", "3", "4", "5", "6", "7"];

/// Keys of the guides every lesson owns, one per guide type.
pub const GUIDE_TYPES: [&str; 5] = ["lecture", "discussion", "question", "answer", "expositional"];

/// Key of the single review document every lesson owns.
pub const REVIEW_ID: &str = "review";

/// Status given to freshly built lesson parts.
const BUILD_STATUS: &str = "build";

/// The three documents of a `structure` collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructurePart {
    Hook,
    Application,
    Prayer,
}

impl StructurePart {
    pub const ALL: [Self; 3] = [Self::Hook, Self::Application, Self::Prayer];

    /// Document key inside the `structure` collection.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Hook => "hook",
            Self::Application => "application",
            Self::Prayer => "prayer",
        }
    }
}

fn structure_base(part: StructurePart) -> Fields {
    let mut doc = fields([
        ("pos", Value::from(if part == StructurePart::Hook { "before" } else { "after" })),
        ("wordcount", Value::Int(0)),
        ("time", Value::Int(0)),
        ("editing", Value::Bool(false)),
    ]);
    match part {
        StructurePart::Hook => {
            doc.insert("title".into(), Value::from(""));
            doc.insert("moduleOrder".into(), Value::empty_array());
        }
        StructurePart::Application => {
            for key in ["title", "today", "thisweek", "thought"] {
                doc.insert(key.into(), Value::from(""));
            }
        }
        StructurePart::Prayer => {
            doc.insert("text".into(), Value::from(""));
        }
    }
    doc
}

/// Structure document for a lesson devo or guide. Lesson parts can be hidden.
#[must_use]
pub fn lesson_structure(part: StructurePart) -> Fields {
    let mut doc = structure_base(part);
    doc.insert("show".into(), Value::Bool(true));
    doc
}

/// Structure document for a message.
#[must_use]
pub fn message_structure(part: StructurePart) -> Fields {
    structure_base(part)
}

#[must_use]
pub fn default_devo() -> Fields {
    fields([
        ("editing", Value::Bool(false)),
        ("title", Value::from("")),
        ("mainIdea", Value::from("")),
        ("bibleRefs", Value::empty_array()),
        ("notes", Value::from("")),
        ("sectionOrder", Value::empty_array()),
        ("status", Value::from(BUILD_STATUS)),
        ("usedResources", Value::empty_array()),
    ])
}

#[must_use]
pub fn default_guide() -> Fields {
    fields([
        ("sectionOrder", Value::empty_array()),
        ("status", Value::from(BUILD_STATUS)),
    ])
}

#[must_use]
pub fn default_review() -> Fields {
    default_guide()
}

/// Top-level message-app content documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Series,
    Message,
    Scratch,
}

impl ContentKind {
    pub const ALL: [Self; 3] = [Self::Series, Self::Message, Self::Scratch];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Series => "series",
            Self::Message => "message",
            Self::Scratch => "scratch",
        }
    }

    /// Top-level collection holding documents of this kind.
    #[must_use]
    pub fn collection(self) -> &'static str {
        match self {
            Self::Series => "messageSeries",
            Self::Message => "messageMessage",
            Self::Scratch => "messageScratch",
        }
    }

    /// Default field set, timestamps taken from `now_ms`.
    #[must_use]
    pub fn defaults(self, now_ms: u64) -> Fields {
        let mut doc = fields([
            ("bibleRefs", Value::empty_array()),
            ("createdBy", Value::from("")),
            ("createdDate", Value::Timestamp(now_ms)),
            ("modifiedBy", Value::from("")),
            ("modifiedDate", Value::Timestamp(now_ms)),
            ("tags", Value::empty_array()),
            ("title", Value::from("")),
            ("users", Value::empty_array()),
        ]);
        match self {
            Self::Series => {
                doc.insert("archived".into(), Value::Bool(false));
                doc.insert("mainIdea".into(), Value::from(""));
                doc.insert("messageOrder".into(), Value::empty_array());
                doc.insert("type".into(), Value::from(""));
            }
            Self::Message => {
                doc.insert("archived".into(), Value::Bool(false));
                doc.insert("mainIdea".into(), Value::from(""));
                doc.insert(
                    "prefs".into(),
                    Value::Map(fields([
                        ("hook", true),
                        ("application", true),
                        ("prayer", true),
                    ])),
                );
                doc.insert("sectionOrder".into(), Value::empty_array());
                doc.insert("seriesid".into(), Value::from(""));
                doc.insert("template".into(), Value::from(""));
                doc.insert("type".into(), Value::from(""));
            }
            Self::Scratch => {
                doc.insert("text".into(), Value::from(""));
            }
        }
        doc
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media snippets attached to message content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Quote,
    Image,
    Video,
    Illustration,
    Lyric,
}

impl MediaKind {
    pub const ALL: [Self; 5] = [
        Self::Quote,
        Self::Image,
        Self::Video,
        Self::Illustration,
        Self::Lyric,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Image => "image",
            Self::Video => "video",
            Self::Illustration => "illustration",
            Self::Lyric => "lyric",
        }
    }

    /// Top-level collection holding media of this kind.
    #[must_use]
    pub fn collection(self) -> &'static str {
        match self {
            Self::Quote => "messageQuote",
            Self::Image => "messageImage",
            Self::Video => "messageVideo",
            Self::Illustration => "messageIllustration",
            Self::Lyric => "messageLyric",
        }
    }

    /// Default field set, timestamps taken from `now_ms`.
    #[must_use]
    pub fn defaults(self, now_ms: u64) -> Fields {
        let mut doc = fields([
            ("bibleRefs", Value::empty_array()),
            ("dateAdded", Value::Timestamp(now_ms)),
            ("dateModified", Value::Timestamp(now_ms)),
            ("tags", Value::empty_array()),
            ("title", Value::from("")),
        ]);
        let extra: &[&str] = match self {
            Self::Quote => &["author", "mediaType", "text", "user"],
            Self::Image => &["imageURL", "service", "storageID", "thumbURL", "user"],
            Self::Video => &["embedURL", "pageURL", "service", "thumbURL", "user", "videoID"],
            Self::Illustration => &["author", "text"],
            Self::Lyric => &["author", "medium", "text", "user"],
        };
        for key in extra {
            doc.insert((*key).to_string(), Value::from(""));
        }
        // Illustrations are shared between users rather than owned by one.
        if self == Self::Illustration {
            doc.insert("users".into(), Value::empty_array());
        }
        doc
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesson_structure_is_visible_and_message_structure_is_not() {
        for part in StructurePart::ALL {
            assert_eq!(lesson_structure(part).get("show"), Some(&Value::Bool(true)));
            assert!(message_structure(part).get("show").is_none());
        }
        assert_eq!(
            message_structure(StructurePart::Hook).get("pos"),
            Some(&Value::from("before"))
        );
        assert_eq!(
            message_structure(StructurePart::Prayer).get("pos"),
            Some(&Value::from("after"))
        );
    }

    #[test]
    fn content_defaults_carry_kind_specific_fields() {
        let message = ContentKind::Message.defaults(7);
        assert_eq!(message.get("createdDate"), Some(&Value::Timestamp(7)));
        assert!(message.contains_key("prefs"));
        assert!(message.contains_key("seriesid"));

        let series = ContentKind::Series.defaults(7);
        assert!(series.contains_key("messageOrder"));
        assert!(!series.contains_key("prefs"));

        let scratch = ContentKind::Scratch.defaults(7);
        assert!(scratch.contains_key("text"));
        assert!(!scratch.contains_key("archived"));
    }

    #[test]
    fn media_defaults_per_kind() {
        assert!(MediaKind::Video.defaults(0).contains_key("videoID"));
        assert!(MediaKind::Image.defaults(0).contains_key("storageID"));
        assert!(MediaKind::Illustration.defaults(0).contains_key("users"));
        assert!(!MediaKind::Illustration.defaults(0).contains_key("user"));
    }
}
