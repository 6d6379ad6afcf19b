//! Hosted document service over HTTP

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tokio::sync::mpsc;

use super::{
    check_collection, check_segment, ChangeEvent, ChangeFeed, ChangeKind, DocumentStore,
    VersionedDocument,
};
use crate::auth::SessionHandle;
use crate::config::{ClientOptions, JournyConfig};
use crate::error::{Error, Result};
use crate::fetch::{status_error, Fetch, FetchBuilder};
use crate::mapper::Document;

#[derive(Serialize)]
struct CreateBody<'a> {
    id: &'a str,
    fields: &'a Document,
}

#[derive(Serialize)]
struct FieldsBody<'a> {
    fields: &'a Document,
}

/// Client for the hosted document service
#[derive(Clone)]
pub struct RestStore {
    base_url: String,
    api_key: String,
    client: Client,
    session: SessionHandle,
    poll_interval: Duration,
}

impl RestStore {
    /// Create a store client sharing the given session with the auth client
    pub fn new(
        config: &JournyConfig,
        client: Client,
        session: SessionHandle,
        options: &ClientOptions,
    ) -> Self {
        Self {
            base_url: config.base_url(),
            api_key: config.api_key.clone(),
            client,
            session,
            poll_interval: options.poll_interval,
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/documents/v1/{}", self.base_url, collection)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.collection_url(collection), id)
    }

    fn authorize<'a>(&self, builder: FetchBuilder<'a>) -> FetchBuilder<'a> {
        let token = self.session.access_token();
        builder
            .header("apikey", &self.api_key)
            .maybe_bearer_auth(token.as_deref())
    }

    /// Send a request addressed to a single document, mapping 404 to
    /// `DocumentNotFound`
    async fn send_document(
        &self,
        builder: FetchBuilder<'_>,
        collection: &str,
        id: &str,
    ) -> Result<Option<reqwest::Response>> {
        let response = self.authorize(builder).execute_raw().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::debug!(%collection, %id, %status, "document request failed");
            return Err(status_error(status, text));
        }
        Ok(Some(response))
    }
}

#[async_trait]
impl DocumentStore for RestStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<VersionedDocument>> {
        check_segment("document id", id)?;
        tracing::debug!(%collection, %id, "get document");
        let url = self.document_url(collection, id);
        match self.send_document(Fetch::get(&self.client, &url), collection, id).await? {
            Some(response) => Ok(Some(response.json().await?)),
            None => Ok(None),
        }
    }

    async fn list(&self, collection: &str) -> Result<Vec<VersionedDocument>> {
        check_collection(collection)?;
        tracing::debug!(%collection, "list documents");
        let url = self.collection_url(collection);
        let mut docs: Vec<VersionedDocument> = self
            .authorize(Fetch::get(&self.client, &url))
            .execute()
            .await?;
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }

    async fn create(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<VersionedDocument> {
        check_collection(collection)?;
        check_segment("document id", id)?;
        tracing::debug!(%collection, %id, "create document");
        let url = self.collection_url(collection);
        self.authorize(Fetch::post(&self.client, &url))
            .json(&CreateBody { id, fields: &fields })?
            .execute()
            .await
    }

    async fn put(&self, collection: &str, id: &str, fields: Document) -> Result<VersionedDocument> {
        check_collection(collection)?;
        check_segment("document id", id)?;
        tracing::debug!(%collection, %id, "put document");
        let url = self.document_url(collection, id);
        self.authorize(Fetch::put(&self.client, &url))
            .json(&FieldsBody { fields: &fields })?
            .execute()
            .await
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
        expected_version: Option<u64>,
    ) -> Result<VersionedDocument> {
        check_segment("document id", id)?;
        tracing::debug!(%collection, %id, ?expected_version, "merge document");
        let url = self.document_url(collection, id);
        let mut builder = Fetch::patch(&self.client, &url).json(&FieldsBody { fields: &fields })?;
        if let Some(version) = expected_version {
            builder = builder.header("If-Match", &version.to_string());
        }
        match self.send_document(builder, collection, id).await? {
            Some(response) => Ok(response.json().await?),
            None => Err(Error::document_not_found(collection, id)),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        check_segment("document id", id)?;
        tracing::debug!(%collection, %id, "delete document");
        let url = self.document_url(collection, id);
        match self.send_document(Fetch::delete(&self.client, &url), collection, id).await? {
            Some(_) => Ok(()),
            None => Err(Error::document_not_found(collection, id)),
        }
    }

    async fn watch(&self, collection: &str) -> Result<ChangeFeed> {
        let mut known = versions_of(&self.list(collection).await?);
        let (tx, rx) = mpsc::unbounded_channel();
        let store = self.clone();
        let collection = collection.to_string();

        let poller = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(store.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let docs = match store.list(&collection).await {
                    Ok(docs) => docs,
                    Err(error) => {
                        tracing::warn!(%collection, %error, "polling collection failed");
                        continue;
                    }
                };
                for event in diff_versions(&collection, &mut known, &docs) {
                    if tx.send(event).is_err() {
                        return;
                    }
                }
            }
        });

        Ok(ChangeFeed::with_poller(rx, poller))
    }
}

fn versions_of(docs: &[VersionedDocument]) -> HashMap<String, u64> {
    docs.iter().map(|d| (d.id.clone(), d.version)).collect()
}

/// Events turning the `known` snapshot into `docs`; updates `known` in place
fn diff_versions(
    collection: &str,
    known: &mut HashMap<String, u64>,
    docs: &[VersionedDocument],
) -> Vec<ChangeEvent> {
    let mut events = Vec::new();
    let event = |id: &str, kind: ChangeKind, version: u64| ChangeEvent {
        collection: collection.to_string(),
        id: id.to_string(),
        kind,
        version,
    };

    for doc in docs {
        match known.get(&doc.id) {
            None => events.push(event(doc.id.as_str(), ChangeKind::Created, doc.version)),
            Some(&version) if version != doc.version => {
                events.push(event(doc.id.as_str(), ChangeKind::Updated, doc.version))
            }
            _ => {}
        }
    }

    let current = versions_of(docs);
    let mut vanished: Vec<(&String, &u64)> = known
        .iter()
        .filter(|(id, _)| !current.contains_key(*id))
        .collect();
    vanished.sort();
    for (id, version) in vanished {
        events.push(event(id.as_str(), ChangeKind::Deleted, *version + 1));
    }

    *known = current;
    events
}
