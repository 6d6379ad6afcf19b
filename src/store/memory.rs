//! In-process document store

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex, RwLock};

use super::{
    check_collection, check_segment, ChangeEvent, ChangeFeed, ChangeKind, DocumentStore,
    VersionedDocument,
};
use crate::error::{Error, Result};
use crate::mapper::Document;

type Collection = BTreeMap<String, VersionedDocument>;

/// Document store kept in memory.
///
/// Writes to one collection are serialized by a single lock, so version checks
/// and the change notifications they produce happen in commit order.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    watchers: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<ChangeEvent>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn notify(&self, collection: &str, id: &str, kind: ChangeKind, version: u64) {
        let mut watchers = self.watchers.lock().await;
        if let Some(senders) = watchers.get_mut(collection) {
            let event = ChangeEvent {
                collection: collection.to_string(),
                id: id.to_string(),
                kind,
                version,
            };
            senders.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<VersionedDocument>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|c| c.get(id)).cloned())
    }

    async fn list(&self, collection: &str) -> Result<Vec<VersionedDocument>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn create(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<VersionedDocument> {
        check_collection(collection)?;
        check_segment("document id", id)?;

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Err(Error::conflict(format!("{}/{} already exists", collection, id)));
        }
        let doc = VersionedDocument {
            id: id.to_string(),
            version: 1,
            fields,
        };
        docs.insert(id.to_string(), doc.clone());
        self.notify(collection, id, ChangeKind::Created, doc.version).await;
        Ok(doc)
    }

    async fn put(&self, collection: &str, id: &str, fields: Document) -> Result<VersionedDocument> {
        check_collection(collection)?;
        check_segment("document id", id)?;

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        let (version, kind) = match docs.get(id) {
            Some(existing) => (existing.version + 1, ChangeKind::Updated),
            None => (1, ChangeKind::Created),
        };
        let doc = VersionedDocument {
            id: id.to_string(),
            version,
            fields,
        };
        docs.insert(id.to_string(), doc.clone());
        self.notify(collection, id, kind, version).await;
        Ok(doc)
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
        expected_version: Option<u64>,
    ) -> Result<VersionedDocument> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| Error::document_not_found(collection, id))?;

        if let Some(expected) = expected_version {
            if doc.version != expected {
                return Err(Error::conflict(format!(
                    "{}/{} is at version {}, expected {}",
                    collection, id, doc.version, expected
                )));
            }
        }

        doc.fields.extend(fields);
        doc.version += 1;
        let doc = doc.clone();
        self.notify(collection, id, ChangeKind::Updated, doc.version).await;
        Ok(doc)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        let removed = collections
            .get_mut(collection)
            .and_then(|c| c.remove(id))
            .ok_or_else(|| Error::document_not_found(collection, id))?;
        self.notify(collection, id, ChangeKind::Deleted, removed.version + 1).await;
        Ok(())
    }

    async fn watch(&self, collection: &str) -> Result<ChangeFeed> {
        check_collection(collection)?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.watchers
            .lock()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(tx);
        Ok(ChangeFeed::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn create_get_list_delete() {
        let store = MemoryStore::new();
        let created = store.create("trips", "b", fields(json!({"title": "B"}))).await.unwrap();
        assert_eq!(created.version, 1);
        store.create("trips", "a", fields(json!({"title": "A"}))).await.unwrap();

        let ids: Vec<String> =
            store.list("trips").await.unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(matches!(
            store.create("trips", "a", Document::new()).await,
            Err(Error::Conflict(_))
        ));

        store.delete("trips", "a").await.unwrap();
        assert!(store.get("trips", "a").await.unwrap().is_none());
        assert!(matches!(
            store.delete("trips", "a").await,
            Err(Error::DocumentNotFound { .. })
        ));
        assert!(store.list("empty").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn merge_checks_version() {
        let store = MemoryStore::new();
        store
            .create("trips", "t1", fields(json!({"title": "Paris", "expenses": []})))
            .await
            .unwrap();

        let merged = store
            .merge("trips", "t1", fields(json!({"expenses": [1]})), Some(1))
            .await
            .unwrap();
        assert_eq!(merged.version, 2);
        assert_eq!(merged.fields["title"], json!("Paris"));
        assert_eq!(merged.fields["expenses"], json!([1]));

        let stale = store
            .merge("trips", "t1", fields(json!({"expenses": []})), Some(1))
            .await;
        assert!(matches!(stale, Err(Error::Conflict(_))));

        let blind = store
            .merge("trips", "t1", fields(json!({"title": "Lyon"})), None)
            .await
            .unwrap();
        assert_eq!(blind.version, 3);

        assert!(matches!(
            store.merge("trips", "nope", Document::new(), None).await,
            Err(Error::DocumentNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn put_upserts() {
        let store = MemoryStore::new();
        assert_eq!(store.put("users", "u1", Document::new()).await.unwrap().version, 1);
        assert_eq!(store.put("users", "u1", Document::new()).await.unwrap().version, 2);
    }

    #[tokio::test]
    async fn watchers_see_changes_in_order() {
        let store = MemoryStore::new();
        let mut feed = store.watch("trips").await.unwrap();
        let mut other = store.watch("other").await.unwrap();

        store.create("trips", "t1", Document::new()).await.unwrap();
        store.merge("trips", "t1", Document::new(), None).await.unwrap();
        store.delete("trips", "t1").await.unwrap();

        let kinds: Vec<(ChangeKind, u64)> = (0..3)
            .map(|_| feed.try_recv().map(|e| (e.kind, e.version)).unwrap())
            .collect();
        assert_eq!(
            kinds,
            vec![(ChangeKind::Created, 1), (ChangeKind::Updated, 2), (ChangeKind::Deleted, 3)]
        );
        assert!(other.try_recv().is_none());
    }

    #[tokio::test]
    async fn dropped_feed_is_pruned() {
        let store = MemoryStore::new();
        drop(store.watch("trips").await.unwrap());
        store.create("trips", "t1", Document::new()).await.unwrap();
        assert!(store.watchers.lock().await["trips"].is_empty());
    }
}
