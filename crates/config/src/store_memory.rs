//! In-memory store for testing.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;

use crate::{Error, Result, schema::StoreDocument, store::StorePersistence};

/// Keeps the last saved document in memory. Nothing reaches disk; used by
/// tests and dry runs.
#[derive(Default)]
pub struct InMemoryStore {
    document: Mutex<StoreDocument>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: StoreDocument) -> Self {
        Self {
            document: Mutex::new(document),
            ..Self::default()
        }
    }

    /// The most recently saved document.
    pub fn snapshot(&self) -> StoreDocument {
        self.document
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make subsequent saves fail, to exercise write-error paths.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl StorePersistence for InMemoryStore {
    async fn load(&self) -> Result<StoreDocument> {
        Ok(self.snapshot())
    }

    async fn save(&self, document: &StoreDocument) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::message("in-memory store configured to fail"));
        }
        *self.document.lock().unwrap_or_else(|e| e.into_inner()) = document.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
