//! Persistence trait for the configuration document.

use async_trait::async_trait;

use crate::{Result, schema::StoreDocument};

/// Whole-document persistence backend.
///
/// The document is read once at startup and overwritten in full after every
/// mutation; there is no partial update.
#[async_trait]
pub trait StorePersistence: Send + Sync {
    /// Load the document. A missing or unparsable document yields an empty
    /// [`StoreDocument`]; only I/O failures on an existing file are errors.
    async fn load(&self) -> Result<StoreDocument>;

    /// Replace the persisted document.
    async fn save(&self, document: &StoreDocument) -> Result<()>;
}
