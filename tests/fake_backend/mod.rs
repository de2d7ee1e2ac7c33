//! In-memory collaborators for exercising the environment lifecycle
//!
//! These stand in for the real backing store and the server under
//! test, so the integration tests can drive `TestEnvironment`
//! end-to-end without a database or a wire-level IMAP
//! implementation:
//!
//! - `storage` -- message store with inspectable records, init
//!   counting, and induced insert failures
//! - `users` -- user document collection with insert counting
//! - `server` -- a server that binds a real TCP socket and greets
//!   with an IMAP-style banner

mod server;
mod storage;
mod users;

pub use server::FakeImapServer;
pub use storage::MemoryStorage;
pub use users::MemoryUserStore;
