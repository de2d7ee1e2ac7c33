//! Fake protocol server
//!
//! Binds a real TCP listener so "the server reports it is accepting
//! connections" means exactly that: `spawn` resolves only after the
//! bind succeeds, and a client connecting to the port receives an
//! IMAP-style greeting. No further protocol is spoken -- wire-level
//! command handling belongs to the server under test, not to this
//! fixture.

use async_trait::async_trait;
use imap_testbed::{Result, ServerFactory, ServerHandle, ServerOptions, StorageHandle};
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

pub struct FakeImapServer {
    bound_port: AtomicU16,
}

impl FakeImapServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            bound_port: AtomicU16::new(0),
        })
    }

    /// The port the most recent spawn actually bound. Useful when the
    /// environment is configured with port 0 and the OS picks one.
    pub fn bound_port(&self) -> u16 {
        self.bound_port.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServerFactory for FakeImapServer {
    async fn spawn(
        &self,
        options: ServerOptions,
        _storage: Arc<dyn StorageHandle>,
        port: u16,
    ) -> Result<Box<dyn ServerHandle>> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let bound = listener.local_addr()?.port();
        self.bound_port.store(bound, Ordering::SeqCst);

        let greeting = format!("* OK IMAP4rev1 {} ready\r\n", options.name);
        let task = tokio::spawn(async move {
            loop {
                let Ok((mut stream, _addr)) = listener.accept().await else {
                    break;
                };
                let greeting = greeting.clone();
                tokio::spawn(async move {
                    let _ = stream.write_all(greeting.as_bytes()).await;
                    let _ = stream.flush().await;
                });
            }
        });

        Ok(Box::new(FakeServerHandle { task }))
    }
}

struct FakeServerHandle {
    task: tokio::task::JoinHandle<()>,
}

#[async_trait]
impl ServerHandle for FakeServerHandle {
    async fn close(&mut self) -> Result<()> {
        self.task.abort();
        Ok(())
    }
}
