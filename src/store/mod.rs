//! Document store backends
//!
//! A store holds collections of JSON documents. Every document carries a
//! version that each write bumps by one; `merge` can make a write conditional
//! on that version, which is how the trip client avoids lost updates.

mod memory;
mod rest;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::mapper::Document;

pub use memory::MemoryStore;
pub use rest::RestStore;

/// A stored document and its version token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedDocument {
    pub id: String,
    pub version: u64,
    pub fields: Document,
}

/// Kind of change to a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// A change to one document of a watched collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: String,
    pub id: String,
    pub kind: ChangeKind,
    pub version: u64,
}

/// Stream of changes for one collection.
///
/// Dropping the feed stops delivery and any background polling.
pub struct ChangeFeed {
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
    poller: Option<JoinHandle<()>>,
}

impl ChangeFeed {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<ChangeEvent>) -> Self {
        Self { rx, poller: None }
    }

    pub(crate) fn with_poller(
        rx: mpsc::UnboundedReceiver<ChangeEvent>,
        poller: JoinHandle<()>,
    ) -> Self {
        Self {
            rx,
            poller: Some(poller),
        }
    }

    /// Wait for the next change; `None` once the store side has gone away
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    /// Take a change that is already queued, without waiting
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}

/// Collection-of-documents storage with per-document versions
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document, `None` if it does not exist
    async fn get(&self, collection: &str, id: &str) -> Result<Option<VersionedDocument>>;

    /// Every document of the collection, ordered by id
    async fn list(&self, collection: &str) -> Result<Vec<VersionedDocument>>;

    /// Insert a new document; `Conflict` if the id is taken
    async fn create(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<VersionedDocument>;

    /// Insert or replace a document unconditionally
    async fn put(&self, collection: &str, id: &str, fields: Document) -> Result<VersionedDocument>;

    /// Overwrite the given top-level fields of an existing document.
    ///
    /// With `expected_version` the write only happens if the stored version
    /// still matches, otherwise it fails with `Conflict`.
    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
        expected_version: Option<u64>,
    ) -> Result<VersionedDocument>;

    /// Remove a document; `DocumentNotFound` if it does not exist
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Subscribe to changes in a collection
    async fn watch(&self, collection: &str) -> Result<ChangeFeed>;
}

/// Reject ids that cannot be used as a single path segment
pub(crate) fn check_segment(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid_input(format!("{} is empty", what)));
    }
    if value.contains('/') || value.contains('?') || value.contains('#') {
        return Err(Error::invalid_input(format!(
            "{} {:?} contains a reserved character",
            what, value
        )));
    }
    Ok(())
}

/// Reject collection paths with empty segments
pub(crate) fn check_collection(collection: &str) -> Result<()> {
    if collection.is_empty() || collection.split('/').any(|s| s.trim().is_empty()) {
        return Err(Error::invalid_input(format!("bad collection path {:?}", collection)));
    }
    Ok(())
}
