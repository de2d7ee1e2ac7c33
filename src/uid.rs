//! Message uid allocation

use std::sync::atomic::{AtomicU32, Ordering};

/// Issues sequential message uids for one environment lifetime.
///
/// The sequence starts at 1 and increases by one per allocation. The
/// counter is reset once at the start of each environment bring-up, so
/// the first auto-assigned uid after any successful start is always 1.
///
/// Within a concurrent ingestion batch, the order uids are handed out
/// follows task scheduling, not the order messages were passed in.
/// Callers that need a message to carry a specific uid must set it
/// explicitly on the message instead of relying on batch position.
#[derive(Debug)]
pub struct UidAllocator {
    next: AtomicU32,
}

impl UidAllocator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    /// Restart the sequence at 1.
    pub fn reset(&self) {
        self.next.store(1, Ordering::SeqCst);
    }

    /// Hand out the current uid and advance the sequence.
    pub fn allocate(&self) -> u32 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for UidAllocator {
    fn default() -> Self {
        Self::new()
    }
}
