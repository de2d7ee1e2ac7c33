//! Environment lifecycle controller

use crate::backend::{Backend, MessageFilter, NewUser, ServerHandle, StorageHandle, User};
use crate::cleanup::remove_tree;
use crate::config::{ServerOptions, TestbedConfig};
use crate::error::{Error, Result};
use crate::ingest::Pipeline;
use crate::message::MessageInput;
use crate::uid::UidAllocator;
use std::io;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

/// One test environment: the protocol server under test, its backing
/// storage, the provisioned test user, and the attachment directory.
///
/// Construct it once per process and drive it through start/stop
/// cycles between test groups. Lifecycle methods take `&mut self`, so
/// a single caller drives the environment serially; there is no
/// support for multiple concurrent independent environments.
///
/// [`start`](Self::start) is idempotent: calling it while the
/// environment is already running is a no-op, and it does not check
/// that the running instance matches the current configuration.
pub struct TestEnvironment {
    config: TestbedConfig,
    backend: Backend,
    uids: UidAllocator,
    running: bool,
    storage: Option<Arc<dyn StorageHandle>>,
    server: Option<Box<dyn ServerHandle>>,
    test_user: Option<User>,
}

impl TestEnvironment {
    #[must_use]
    pub fn new(config: TestbedConfig, backend: Backend) -> Self {
        Self {
            config,
            backend,
            uids: UidAllocator::new(),
            running: false,
            storage: None,
            server: None,
            test_user: None,
        }
    }

    /// Whether the environment is currently running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// The provisioned test user, once the environment has started.
    #[must_use]
    pub const fn test_user(&self) -> Option<&User> {
        self.test_user.as_ref()
    }

    #[must_use]
    pub const fn config(&self) -> &TestbedConfig {
        &self.config
    }

    /// Bring the environment up with the configured server options.
    ///
    /// See [`start_with`](Self::start_with).
    ///
    /// # Errors
    ///
    /// Returns the first failing bring-up stage's error.
    pub async fn start(&mut self) -> Result<()> {
        let options = self.config.server_options();
        self.start_with(options).await
    }

    /// Bring the environment up, overriding the server options for
    /// this run only.
    ///
    /// Runs the bring-up stages in order, each only after the
    /// previous succeeded: create the attachment directory (an
    /// already-existing directory is fine), initialize storage, clear
    /// pre-existing messages and users, hash the configured password
    /// and insert the test user, then start the protocol server and
    /// wait for it to accept connections.
    ///
    /// # Errors
    ///
    /// Returns the first failing stage's error unmodified. No partial
    /// rollback is attempted; the environment stays not-running.
    pub async fn start_with(&mut self, server_options: ServerOptions) -> Result<()> {
        if self.running {
            debug!("environment already running; start is a no-op");
            return Ok(());
        }
        info!("starting test environment");
        self.uids.reset();

        self.create_attachments_dir().await?;

        let storage = self
            .backend
            .storage
            .init(&self.config.storage_options())
            .await?;
        self.clear_store(storage.as_ref()).await?;

        let user = self.provision_user().await?;
        info!(email = %user.email, "test user provisioned");

        let server = self
            .backend
            .server
            .spawn(server_options, Arc::clone(&storage), self.config.port)
            .await?;
        info!(port = self.config.port, "protocol server accepting connections");

        self.storage = Some(storage);
        self.server = Some(server);
        self.test_user = Some(user);
        self.running = true;
        Ok(())
    }

    /// Tear the environment down.
    ///
    /// A no-op if the environment was never started. Otherwise clears
    /// all messages and closes the protocol server, then removes the
    /// attachment directory. Teardown is best-effort around the
    /// server close: failures clearing messages or removing the
    /// directory are logged and swallowed so the environment always
    /// returns to not-running.
    ///
    /// # Errors
    ///
    /// Returns an error only if the protocol server fails to close.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(storage) = self.storage.clone() else {
            debug!("environment was never started; stop is a no-op");
            return Ok(());
        };
        info!("stopping test environment");

        if let Err(e) = storage.remove_messages(&MessageFilter::default()).await {
            warn!(error = %e, "failed to clear messages during teardown");
        }
        if let Some(mut server) = self.server.take() {
            server.close().await?;
        }
        self.running = false;

        if let Err(e) = remove_tree(&self.config.attachments_path).await {
            warn!(error = %e, "failed to remove attachment directory");
        }
        info!("test environment stopped");
        Ok(())
    }

    /// Ingest a batch of messages into the running environment.
    ///
    /// Elements fan out with unordered completion; every element is
    /// attempted before the call returns. On success, returns the
    /// assigned uids in input order (auto-assigned values follow
    /// scheduling order, see [`UidAllocator`]).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRunning`] unless the environment is
    /// started. On a batch failure, returns the first failed
    /// element's error; sibling records that were persisted before
    /// the failure surfaced are not rolled back.
    pub async fn add_messages(&self, inputs: Vec<MessageInput>) -> Result<Vec<u32>> {
        if !self.running {
            return Err(Error::NotRunning);
        }
        let storage = self.storage.as_ref().ok_or(Error::NotRunning)?;
        let user = self.test_user.as_ref().ok_or(Error::NotRunning)?;

        debug!(count = inputs.len(), "ingesting messages");
        let pipeline = Pipeline {
            storage: storage.as_ref(),
            parser: self.backend.parser.as_ref(),
            uids: &self.uids,
            user,
        };
        pipeline.ingest(inputs).await
    }

    async fn create_attachments_dir(&self) -> Result<()> {
        match fs::create_dir(&self.config.attachments_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear_store(&self, storage: &dyn StorageHandle) -> Result<()> {
        storage.remove_messages(&MessageFilter::default()).await?;
        self.backend.users.remove_all().await?;
        debug!("backing store cleared");
        Ok(())
    }

    async fn provision_user(&self) -> Result<User> {
        let hash = self
            .backend
            .hasher
            .hash(&self.config.test_user_password)
            .await?;
        self.backend
            .users
            .insert(NewUser {
                email: self.config.test_user_email.clone(),
                password_hash: hash,
            })
            .await
    }
}
