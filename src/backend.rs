//! Contracts for the environment's external collaborators
//!
//! The controller never talks to a concrete storage engine, user
//! store, or protocol server. It drives these trait objects, so a
//! test suite can plug in anything from a live document store to the
//! in-memory fakes used by this crate's own integration tests.

use crate::config::{ServerOptions, StorageOptions};
use crate::error::Result;
use crate::hasher::Argon2Hasher;
use crate::message::{MessageRecord, StoredMessage};
use crate::parser::MimeParser;
use async_trait::async_trait;
use std::sync::Arc;

/// A user document held in the user store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
}

/// A user document ready for insertion.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

/// Filter for bulk message removal. A field left `None` matches all,
/// so the default filter removes every message.
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    /// Restrict to messages owned by this user id.
    pub user: Option<String>,
    /// Restrict to messages in this folder.
    pub folder: Option<String>,
    /// Free-form document query understood by the backing store.
    pub query: Option<serde_json::Value>,
}

/// Connects to the backing store.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Establish a connection and return a live handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or rejects the
    /// configuration.
    async fn init(&self, options: &StorageOptions) -> Result<Arc<dyn StorageHandle>>;
}

/// A live connection to the message store.
#[async_trait]
pub trait StorageHandle: Send + Sync {
    /// Remove every message matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the operation.
    async fn remove_messages(&self, filter: &MessageFilter) -> Result<u64>;

    /// Persist one canonical message record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the record.
    async fn insert_message(&self, message: StoredMessage) -> Result<()>;
}

/// The document collection users live in.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user document and return it with its store-assigned
    /// identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the document.
    async fn insert(&self, user: NewUser) -> Result<User>;

    /// Remove every user document, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the operation.
    async fn remove_all(&self) -> Result<u64>;
}

/// Hashes the test user's plaintext password for storage.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Hash `plaintext` with a freshly generated salt.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails.
    async fn hash(&self, plaintext: &str) -> Result<String>;
}

/// Parses a complete raw message payload into a canonical record.
#[async_trait]
pub trait RawMessageParser: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the payload is not a parseable message.
    async fn parse(&self, raw: &[u8]) -> Result<MessageRecord>;
}

/// Starts the protocol server under test.
#[async_trait]
pub trait ServerFactory: Send + Sync {
    /// Start a server bound to `port` with the given options and the
    /// already-initialized storage handle injected. Resolves only once
    /// the server is accepting connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot bind or start.
    async fn spawn(
        &self,
        options: ServerOptions,
        storage: Arc<dyn StorageHandle>,
        port: u16,
    ) -> Result<Box<dyn ServerHandle>>;
}

/// A running protocol server.
#[async_trait]
pub trait ServerHandle: Send + Sync {
    /// Shut the server down and release its port.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to close cleanly.
    async fn close(&mut self) -> Result<()>;
}

/// The set of collaborators a test environment drives.
///
/// Storage, users, and the server have no production implementation
/// in this crate and must be supplied by the embedding test suite.
/// Hashing and parsing default to [`Argon2Hasher`] and [`MimeParser`]
/// but can be swapped out.
pub struct Backend {
    pub storage: Arc<dyn StorageEngine>,
    pub users: Arc<dyn UserStore>,
    pub server: Arc<dyn ServerFactory>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub parser: Arc<dyn RawMessageParser>,
}

impl Backend {
    #[must_use]
    pub fn new(
        storage: Arc<dyn StorageEngine>,
        users: Arc<dyn UserStore>,
        server: Arc<dyn ServerFactory>,
    ) -> Self {
        Self {
            storage,
            users,
            server,
            hasher: Arc::new(Argon2Hasher),
            parser: Arc::new(MimeParser),
        }
    }

    #[must_use]
    pub fn with_hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    #[must_use]
    pub fn with_parser(mut self, parser: Arc<dyn RawMessageParser>) -> Self {
        self.parser = parser;
        self
    }
}
