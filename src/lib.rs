//! Test environment lifecycle for IMAP server integration tests
//!
//! Brings a mail-protocol server and its backing store up in a known,
//! idempotent state, seeds deterministic test data (a test user and a
//! set of messages), and tears everything down cleanly so test runs
//! stay repeatable and isolated from each other.
//!
//! The controller drives its collaborators (storage engine, user
//! store, protocol server, password hasher, raw-message parser)
//! through the trait contracts in [`Backend`]. Hashing and parsing
//! ship with default implementations; storage and the server are
//! supplied by the embedding test suite.
//!
//! ```ignore
//! let config = TestbedConfig::from_env()?;
//! let mut env = TestEnvironment::new(config, backend);
//!
//! env.start().await?;
//! env.add_messages(vec![MessageInput::raw(raw_rfc2822)]).await?;
//! // ... run protocol-level assertions against the server ...
//! env.stop().await?;
//! ```

mod backend;
mod cleanup;
mod config;
mod env;
mod error;
mod hasher;
mod ingest;
mod message;
mod parser;
mod uid;

pub use backend::{
    Backend, MessageFilter, NewUser, PasswordHasher, RawMessageParser, ServerFactory,
    ServerHandle, StorageEngine, StorageHandle, User, UserStore,
};
pub use cleanup::remove_tree;
pub use config::{FolderNode, ServerOptions, StorageOptions, TestbedConfig, TlsMaterial};
pub use env::TestEnvironment;
pub use error::{Error, Result};
pub use hasher::Argon2Hasher;
pub use message::{DEFAULT_FOLDER, MessageInput, MessageOverrides, MessageRecord, StoredMessage};
pub use parser::MimeParser;
pub use uid::UidAllocator;
