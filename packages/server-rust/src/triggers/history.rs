//! Change records appended to `messageMessage/{id}/history`.

use real_core::{fields, DocumentPath, Fields, Value};

/// Collection under a message that stores its history records.
pub const HISTORY_COLLECTION: &str = "history";

/// Which part of a message changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryContext {
    Module,
    Section,
    Structure,
}

impl HistoryContext {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Section => "section",
            Self::Structure => "structure",
        }
    }

    /// Handler name used to tag reports.
    #[must_use]
    pub fn function(self) -> &'static str {
        match self {
            Self::Module => "historyModules",
            Self::Section => "historySections",
            Self::Structure => "historyStructure",
        }
    }

    /// Matches `messageMessage/{id}/{modules|sections|structure}/{part}` and
    /// returns the context plus the message id.
    #[must_use]
    pub fn from_path(doc: &DocumentPath) -> Option<(Self, &str)> {
        let [root, message, collection, _] = doc.segments() else {
            return None;
        };
        if root != "messageMessage" {
            return None;
        }
        let context = match collection.as_str() {
            "modules" => Self::Module,
            "sections" => Self::Section,
            "structure" => Self::Structure,
            _ => return None,
        };
        Some((context, message.as_str()))
    }
}

/// What the write did to the part document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Add,
    Remove,
    Edit,
}

impl HistoryAction {
    /// `None` when neither side exists.
    #[must_use]
    pub fn classify(before: Option<&Fields>, after: Option<&Fields>) -> Option<Self> {
        match (before, after) {
            (None, None) => None,
            (None, Some(_)) => Some(Self::Add),
            (Some(_), None) => Some(Self::Remove),
            (Some(_), Some(_)) => Some(Self::Edit),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Edit => "edit",
        }
    }
}

/// The user holding the edit lock, read from `editing` on the new version,
/// falling back to the old one. Unlocked documents carry `editing: false`.
#[must_use]
pub fn editor(before: Option<&Fields>, after: Option<&Fields>) -> String {
    [after, before]
        .into_iter()
        .flatten()
        .find_map(|doc| doc.get("editing").and_then(Value::as_str).filter(|uid| !uid.is_empty()))
        .unwrap_or_default()
        .to_string()
}

/// One history record.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub context: HistoryContext,
    pub message_id: String,
    pub part: DocumentPath,
    pub action: HistoryAction,
    pub uid: String,
    pub timestamp_ms: u64,
    pub new_val: Option<Fields>,
    pub prev_val: Option<Fields>,
}

impl HistoryRecord {
    #[must_use]
    pub fn to_fields(&self) -> Fields {
        let snapshot = |doc: &Option<Fields>| doc.clone().map_or(Value::Null, Value::Map);
        fields([
            ("context", Value::from(self.context.as_str())),
            ("id", Value::from(self.message_id.as_str())),
            ("ref", Value::from(self.part.to_string())),
            ("action", Value::from(self.action.as_str())),
            ("uid", Value::from(self.uid.as_str())),
            ("timestamp", Value::Timestamp(self.timestamp_ms)),
            ("newVal", snapshot(&self.new_val)),
            ("prevVal", snapshot(&self.prev_val)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::doc;

    #[test]
    fn only_message_parts_have_history() {
        let part = doc("messageMessage/m1/sections/s1");
        assert_eq!(
            HistoryContext::from_path(&part),
            Some((HistoryContext::Section, "m1"))
        );
        assert_eq!(
            HistoryContext::from_path(&doc("messageMessage/m1/history/h1")),
            None
        );
        assert_eq!(
            HistoryContext::from_path(&doc("messageSeries/s/modules/x")),
            None
        );
        assert_eq!(HistoryContext::from_path(&doc("messageMessage/m1")), None);
    }

    #[test]
    fn editor_prefers_the_new_version() {
        let locked = |uid: &str| fields([("editing", uid)]);
        let unlocked = fields([("editing", false)]);

        assert_eq!(editor(Some(&locked("old")), Some(&locked("new"))), "new");
        assert_eq!(editor(Some(&locked("old")), Some(&unlocked)), "old");
        assert_eq!(editor(None, Some(&unlocked)), "");
        assert_eq!(editor(None, None), "");
    }

    #[test]
    fn record_fields() {
        let record = HistoryRecord {
            context: HistoryContext::Module,
            message_id: "m1".into(),
            part: doc("messageMessage/m1/modules/a"),
            action: HistoryAction::classify(None, Some(&Fields::new())).unwrap(),
            uid: "u1".into(),
            timestamp_ms: 42,
            new_val: Some(Fields::new()),
            prev_val: None,
        };
        let out = record.to_fields();
        assert_eq!(out["action"], Value::from("add"));
        assert_eq!(out["ref"], Value::from("messageMessage/m1/modules/a"));
        assert_eq!(out["prevVal"], Value::Null);
        assert_eq!(out["newVal"], Value::Map(Fields::new()));
        assert_eq!(out["timestamp"], Value::Timestamp(42));
    }
}
