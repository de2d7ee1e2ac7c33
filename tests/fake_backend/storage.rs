//! In-memory message storage
//!
//! `MemoryStorage` plays the storage engine; `init` hands out a
//! shared `MemoryStorageHandle` so tests can inspect what the
//! environment persisted. The handle can be told to reject inserts
//! whose subject matches a marker, which is how the batch
//! partial-failure tests induce errors.

use async_trait::async_trait;
use imap_testbed::{
    Error, MessageFilter, Result, StorageEngine, StorageHandle, StorageOptions, StoredMessage,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub struct MemoryStorage {
    handle: Arc<MemoryStorageHandle>,
    init_calls: AtomicUsize,
    fail_init: bool,
}

impl MemoryStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            handle: Arc::new(MemoryStorageHandle::default()),
            init_calls: AtomicUsize::new(0),
            fail_init: false,
        })
    }

    /// An engine whose `init` always fails, for bring-up error tests.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            handle: Arc::new(MemoryStorageHandle::default()),
            init_calls: AtomicUsize::new(0),
            fail_init: true,
        })
    }

    /// How many times the environment initialized storage.
    pub fn init_count(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    /// The handle every `init` call returns.
    pub fn handle(&self) -> Arc<MemoryStorageHandle> {
        self.handle.clone()
    }
}

#[async_trait]
impl StorageEngine for MemoryStorage {
    async fn init(&self, _options: &StorageOptions) -> Result<Arc<dyn StorageHandle>> {
        if self.fail_init {
            return Err(Error::Storage("connection refused".to_string()));
        }
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.handle.clone() as Arc<dyn StorageHandle>)
    }
}

#[derive(Default)]
pub struct MemoryStorageHandle {
    messages: Mutex<Vec<StoredMessage>>,
    fail_subject: Mutex<Option<String>>,
}

impl MemoryStorageHandle {
    /// Snapshot of every persisted message.
    pub fn messages(&self) -> Vec<StoredMessage> {
        self.messages.lock().unwrap().clone()
    }

    /// Make `insert_message` fail for records with this subject.
    pub fn fail_on_subject(&self, subject: &str) {
        *self.fail_subject.lock().unwrap() = Some(subject.to_string());
    }
}

#[async_trait]
impl StorageHandle for MemoryStorageHandle {
    async fn remove_messages(&self, filter: &MessageFilter) -> Result<u64> {
        let mut messages = self.messages.lock().unwrap();
        let before = messages.len();
        messages.retain(|m| {
            let user_hit = filter.user.as_ref().is_none_or(|u| &m.user == u);
            let folder_hit = filter.folder.as_ref().is_none_or(|f| &m.folder == f);
            !(user_hit && folder_hit)
        });
        Ok((before - messages.len()) as u64)
    }

    async fn insert_message(&self, message: StoredMessage) -> Result<()> {
        let marker = self.fail_subject.lock().unwrap().clone();
        if marker.is_some() && message.subject == marker {
            return Err(Error::Storage("write rejected".to_string()));
        }
        self.messages.lock().unwrap().push(message);
        Ok(())
    }
}
