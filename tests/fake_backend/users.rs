//! In-memory user document collection

use async_trait::async_trait;
use imap_testbed::{NewUser, Result, User, UserStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
    next_id: AtomicUsize,
    insert_calls: AtomicUsize,
}

impl MemoryUserStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of every stored user document.
    pub fn users(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }

    /// How many user documents the environment inserted.
    pub fn insert_count(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        let user = User {
            id: format!("user-{id}"),
            email: user.email,
            password_hash: user.password_hash,
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn remove_all(&self) -> Result<u64> {
        let mut users = self.users.lock().unwrap();
        let removed = users.len() as u64;
        users.clear();
        Ok(removed)
    }
}
