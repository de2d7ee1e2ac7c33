//! Message ingestion pipeline
//!
//! Normalizes heterogeneous input into storage-ready records: parse
//! the raw payload, layer on any explicit overrides, fill lifecycle
//! defaults, persist. Batches fan out with unordered completion, so
//! auto-assigned uids follow scheduling order rather than input
//! order (see [`UidAllocator`]).

use crate::backend::{RawMessageParser, StorageHandle, User};
use crate::error::Result;
use crate::message::{DEFAULT_FOLDER, MessageInput, MessageRecord, StoredMessage};
use crate::uid::UidAllocator;
use chrono::Utc;
use futures::future::join_all;
use tracing::debug;

/// One ingestion pass over the running environment's state.
///
/// Borrowed from the controller per call; holds everything a batch
/// needs so individual elements can run concurrently.
pub(crate) struct Pipeline<'a> {
    pub storage: &'a dyn StorageHandle,
    pub parser: &'a dyn RawMessageParser,
    pub uids: &'a UidAllocator,
    pub user: &'a User,
}

impl Pipeline<'_> {
    /// Ingest a batch, persisting one record per input element.
    ///
    /// Every element is attempted before the call completes. On
    /// success, returns the assigned uids in input order. On failure,
    /// returns the first failed element's error (in input order);
    /// sibling elements that succeeded stay persisted.
    pub async fn ingest(&self, inputs: Vec<MessageInput>) -> Result<Vec<u32>> {
        let results = join_all(inputs.into_iter().map(|input| self.ingest_one(input))).await;
        results.into_iter().collect()
    }

    async fn ingest_one(&self, input: MessageInput) -> Result<u32> {
        let (raw, overrides) = input.into_parts();
        let mut record = self.parser.parse(&raw).await?;
        if let Some(overrides) = overrides {
            overrides.apply_to(&mut record);
        }
        let message = self.finalize(record);
        let uid = message.uid;
        self.storage.insert_message(message).await?;
        debug!(uid, "message persisted");
        Ok(uid)
    }

    /// Fill lifecycle defaults: owning user, folder, uid, and
    /// internaldate. Flags already default to the empty set on the
    /// record itself.
    fn finalize(&self, record: MessageRecord) -> StoredMessage {
        StoredMessage {
            text: record.text,
            headers: record.headers,
            subject: record.subject,
            message_id: record.message_id,
            priority: record.priority,
            from: record.from,
            to: record.to,
            date: record.date,
            attached_files: record.attached_files,
            flags: record.flags,
            internaldate: record.internaldate.unwrap_or_else(Utc::now),
            uid: record.uid.unwrap_or_else(|| self.uids.allocate()),
            folder: record.folder.unwrap_or_else(|| DEFAULT_FOLDER.to_string()),
            user: self.user.id.clone(),
        }
    }
}
