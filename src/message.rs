//! Canonical message records and ingestion input
//!
//! Messages move through two representations: a [`MessageRecord`] as
//! produced by the raw-message parser (most fields optional), and a
//! [`StoredMessage`] as persisted to storage, where uid, folder,
//! internaldate, and the owning user are always present.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Folder a message lands in when none is set on the record.
///
/// This is the special-use tag of the inbox, which is how the backing
/// store keys folders.
pub const DEFAULT_FOLDER: &str = "\\Inbox";

/// A parsed message before defaults are applied.
///
/// Produced by the raw-message parser and then adjusted by explicit
/// overrides. Everything the parser could not find stays `None`/empty
/// until the ingestion pipeline fills in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageRecord {
    pub text: Option<String>,
    /// Header name/value pairs in original message order. Duplicate
    /// headers such as `Received` appear once per occurrence.
    pub headers: Vec<(String, String)>,
    pub subject: Option<String>,
    pub message_id: Option<String>,
    pub priority: Option<String>,
    pub from: Option<String>,
    pub to: Vec<String>,
    pub date: Option<DateTime<Utc>>,
    pub attached_files: Vec<String>,
    pub flags: BTreeSet<String>,
    pub internaldate: Option<DateTime<Utc>>,
    pub uid: Option<u32>,
    pub folder: Option<String>,
}

/// A message as persisted to the backing store.
///
/// Unlike [`MessageRecord`], the fields the store relies on are never
/// absent here: `uid`, `folder`, `internaldate`, and the owning
/// `user` id are filled in by the ingestion pipeline before a record
/// reaches storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub text: Option<String>,
    pub headers: Vec<(String, String)>,
    pub subject: Option<String>,
    pub message_id: Option<String>,
    pub priority: Option<String>,
    pub from: Option<String>,
    pub to: Vec<String>,
    pub date: Option<DateTime<Utc>>,
    pub attached_files: Vec<String>,
    pub flags: BTreeSet<String>,
    pub internaldate: DateTime<Utc>,
    pub uid: u32,
    pub folder: String,
    /// Id of the test user owning this message.
    pub user: String,
}

/// Explicit field values layered over a parsed record.
///
/// Overrides follow an override-only-when-truthy policy: a value that
/// is present but empty (string, list, flag set) or zero (uid) is
/// ignored and the parsed value is kept. Tests observe this behavior,
/// so it is a deliberate contract rather than an accident of
/// validation.
#[derive(Debug, Clone, Default)]
pub struct MessageOverrides {
    pub text: Option<String>,
    pub headers: Option<Vec<(String, String)>>,
    pub subject: Option<String>,
    pub message_id: Option<String>,
    pub priority: Option<String>,
    pub from: Option<String>,
    pub to: Option<Vec<String>>,
    pub date: Option<DateTime<Utc>>,
    pub attached_files: Option<Vec<String>>,
    pub flags: Option<BTreeSet<String>>,
    pub internaldate: Option<DateTime<Utc>>,
    pub uid: Option<u32>,
}

impl MessageOverrides {
    /// Apply every truthy override to `record`, leaving parsed values
    /// in place for absent or falsy entries.
    pub fn apply_to(&self, record: &mut MessageRecord) {
        if let Some(text) = &self.text
            && !text.is_empty()
        {
            record.text = Some(text.clone());
        }
        if let Some(headers) = &self.headers
            && !headers.is_empty()
        {
            record.headers = headers.clone();
        }
        if let Some(subject) = &self.subject
            && !subject.is_empty()
        {
            record.subject = Some(subject.clone());
        }
        if let Some(message_id) = &self.message_id
            && !message_id.is_empty()
        {
            record.message_id = Some(message_id.clone());
        }
        if let Some(priority) = &self.priority
            && !priority.is_empty()
        {
            record.priority = Some(priority.clone());
        }
        if let Some(from) = &self.from
            && !from.is_empty()
        {
            record.from = Some(from.clone());
        }
        if let Some(to) = &self.to
            && !to.is_empty()
        {
            record.to = to.clone();
        }
        if let Some(date) = self.date {
            record.date = Some(date);
        }
        if let Some(attached_files) = &self.attached_files
            && !attached_files.is_empty()
        {
            record.attached_files = attached_files.clone();
        }
        if let Some(flags) = &self.flags
            && !flags.is_empty()
        {
            record.flags = flags.clone();
        }
        if let Some(internaldate) = self.internaldate {
            record.internaldate = Some(internaldate);
        }
        if let Some(uid) = self.uid
            && uid != 0
        {
            record.uid = Some(uid);
        }
    }
}

/// Input accepted by the ingestion pipeline.
#[derive(Debug, Clone)]
pub enum MessageInput {
    /// A complete raw message.
    Raw(Vec<u8>),
    /// A raw message plus explicit field values to layer over the
    /// parsed record.
    Structured {
        raw: Vec<u8>,
        overrides: MessageOverrides,
    },
}

impl MessageInput {
    /// Wrap a raw payload.
    pub fn raw(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Raw(bytes.into())
    }

    /// Wrap a raw payload with explicit overrides.
    pub fn structured(bytes: impl Into<Vec<u8>>, overrides: MessageOverrides) -> Self {
        Self::Structured {
            raw: bytes.into(),
            overrides,
        }
    }

    pub(crate) fn into_parts(self) -> (Vec<u8>, Option<MessageOverrides>) {
        match self {
            Self::Raw(raw) => (raw, None),
            Self::Structured { raw, overrides } => (raw, Some(overrides)),
        }
    }
}

impl From<Vec<u8>> for MessageInput {
    fn from(raw: Vec<u8>) -> Self {
        Self::Raw(raw)
    }
}

impl From<&[u8]> for MessageInput {
    fn from(raw: &[u8]) -> Self {
        Self::Raw(raw.to_vec())
    }
}

impl From<&str> for MessageInput {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_record() -> MessageRecord {
        MessageRecord {
            text: Some("parsed body".to_string()),
            subject: Some("parsed subject".to_string()),
            to: vec!["parsed@example.com".to_string()],
            ..MessageRecord::default()
        }
    }

    #[test]
    fn truthy_values_override() {
        let mut record = base_record();
        let overrides = MessageOverrides {
            subject: Some("explicit".to_string()),
            uid: Some(42),
            ..MessageOverrides::default()
        };
        overrides.apply_to(&mut record);
        assert_eq!(record.subject.as_deref(), Some("explicit"));
        assert_eq!(record.uid, Some(42));
    }

    #[test]
    fn empty_string_is_ignored() {
        let mut record = base_record();
        let overrides = MessageOverrides {
            subject: Some(String::new()),
            text: Some(String::new()),
            ..MessageOverrides::default()
        };
        overrides.apply_to(&mut record);
        assert_eq!(record.subject.as_deref(), Some("parsed subject"));
        assert_eq!(record.text.as_deref(), Some("parsed body"));
    }

    #[test]
    fn zero_uid_is_ignored() {
        let mut record = base_record();
        let overrides = MessageOverrides {
            uid: Some(0),
            ..MessageOverrides::default()
        };
        overrides.apply_to(&mut record);
        assert_eq!(record.uid, None);
    }

    #[test]
    fn empty_collections_are_ignored() {
        let mut record = base_record();
        let overrides = MessageOverrides {
            to: Some(Vec::new()),
            flags: Some(BTreeSet::new()),
            ..MessageOverrides::default()
        };
        overrides.apply_to(&mut record);
        assert_eq!(record.to, vec!["parsed@example.com".to_string()]);
        assert!(record.flags.is_empty());
    }

    #[test]
    fn absent_fields_leave_record_untouched() {
        let mut record = base_record();
        MessageOverrides::default().apply_to(&mut record);
        assert_eq!(record.subject.as_deref(), Some("parsed subject"));
        assert_eq!(record.uid, None);
    }
}
