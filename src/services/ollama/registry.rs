use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use futures::stream::{AbortHandle, AbortRegistration};
use tracing::debug;
use uuid::Uuid;

/// Cancellation handles of the streams a client currently has open.
#[derive(Debug, Default)]
pub struct RequestRegistry {
    ongoing: Mutex<HashMap<Uuid, AbortHandle>>,
}

/// Identity and cancellation pair of a stream that is being opened.
#[derive(Debug)]
pub(crate) struct StreamTicket {
    pub id: Uuid,
    pub handle: AbortHandle,
    pub registration: AbortRegistration,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fresh abort pair and records its handle.
    pub(crate) fn register(&self) -> StreamTicket {
        let (handle, registration) = AbortHandle::new_pair();
        let id = Uuid::new_v4();
        self.insert(id, handle.clone());
        StreamTicket {
            id,
            handle,
            registration,
        }
    }

    /// Swaps the handle registered under `id` for a fresh pair, keeping the
    /// id. `None` when the entry is gone because it was aborted or removed.
    pub(crate) fn renew(&self, id: Uuid) -> Option<StreamTicket> {
        let mut ongoing = self.lock();
        let slot = ongoing.get_mut(&id)?;
        let (handle, registration) = AbortHandle::new_pair();
        *slot = handle.clone();
        Some(StreamTicket {
            id,
            handle,
            registration,
        })
    }

    pub fn insert(&self, id: Uuid, handle: AbortHandle) {
        self.lock().insert(id, handle);
    }

    /// Returns whether an entry was removed. Removing twice is a no-op.
    pub fn remove(&self, id: &Uuid) -> bool {
        self.lock().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Aborts and forgets every registered stream, returning how many there were.
    pub fn abort_all(&self) -> usize {
        let mut ongoing = self.lock();
        let count = ongoing.len();
        for (_, handle) in ongoing.drain() {
            handle.abort();
        }
        debug!(count, "aborted ongoing streams");
        count
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, AbortHandle>> {
        self.ongoing.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
