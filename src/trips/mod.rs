//! Per-user trip client
//!
//! Trips live in `users/{uid}/trips`, one document per trip, with expenses,
//! flights, stays and activities embedded as arrays. Array edits are
//! read-modify-write cycles guarded by the document version: when another
//! writer got there first the edit is replayed on a fresh read.

mod entries;

use std::sync::Arc;

use serde_json::Value;

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::mapper::{
    decode_entries, decode_trip, decode_trips, encode_trip, trip_scalar_fields, DecodeError,
    DecodeWarning, Decoded,
    Document, FieldProblem,
};
use crate::models::Trip;
use crate::realtime::TripSubscription;
use crate::store::{check_segment, DocumentStore, VersionedDocument};

pub use entries::TripEntry;

/// Collection holding a user's trips
pub fn trips_collection(user_id: &str) -> String {
    format!("users/{}/trips", user_id)
}

/// Trip operations scoped to one user
#[derive(Clone)]
pub struct TripStore {
    store: Arc<dyn DocumentStore>,
    user_id: String,
    collection: String,
    max_write_attempts: u32,
}

impl TripStore {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        user_id: &str,
        options: &ClientOptions,
    ) -> Result<Self> {
        check_segment("user id", user_id)?;
        Ok(Self {
            store,
            user_id: user_id.to_string(),
            collection: trips_collection(user_id),
            max_write_attempts: options.max_write_attempts.max(1),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub(crate) fn store_handle(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Store a new trip with whatever entries it already carries
    pub async fn add_trip(&self, trip: &Trip) -> Result<()> {
        trip.validate()?;
        tracing::debug!(user_id = %self.user_id, trip_id = %trip.id, "add trip");
        self.store
            .create(&self.collection, &trip.id, encode_trip(trip))
            .await?;
        Ok(())
    }

    /// Overwrite title, location, dates and image. Embedded entries are not
    /// touched.
    pub async fn update_trip(&self, trip: &Trip) -> Result<()> {
        trip.validate()?;
        tracing::debug!(user_id = %self.user_id, trip_id = %trip.id, "update trip");
        self.store
            .merge(&self.collection, &trip.id, trip_scalar_fields(trip), None)
            .await?;
        Ok(())
    }

    /// Delete a trip together with its embedded entries
    pub async fn delete_trip(&self, trip_id: &str) -> Result<()> {
        tracing::debug!(user_id = %self.user_id, %trip_id, "delete trip");
        self.store.delete(&self.collection, trip_id).await
    }

    /// Fetch one trip.
    ///
    /// Entries that do not decode are dropped and reported in the result. A
    /// trip whose own fields do not decode is an `Error::Decode`, so the
    /// result is never `Decoded::Failed`.
    pub async fn fetch_trip(&self, trip_id: &str) -> Result<Decoded<Trip>> {
        let doc = self.get_document(trip_id).await?;
        match decode_trip(&doc.fields) {
            failed @ Decoded::Failed(_) => failed.into_result().map(Decoded::Complete),
            decoded => Ok(decoded),
        }
    }

    /// Fetch every trip of the user, ordered by id
    pub async fn fetch_trips(&self) -> Result<Decoded<Vec<Trip>>> {
        tracing::debug!(user_id = %self.user_id, "fetch trips");
        let docs = self.store.list(&self.collection).await?;
        Ok(decode_trips(docs.iter().map(|doc| &doc.fields)))
    }

    /// Watch the user's trips.
    ///
    /// `callback` gets the current list right away and the full list again
    /// after every change. Changes that pile up while a list is being fetched
    /// are folded into one delivery.
    pub async fn subscribe<F>(&self, callback: F) -> Result<TripSubscription>
    where
        F: FnMut(Result<Decoded<Vec<Trip>>>) + Send + 'static,
    {
        TripSubscription::start(self.clone(), callback).await
    }

    /// Append an entry to its array; `DuplicateEntry` if the id is present
    pub async fn add_entry<E: TripEntry>(&self, trip_id: &str, entry: &E) -> Result<()> {
        if entry.id().trim().is_empty() {
            return Err(Error::invalid_input(format!("{} id is empty", E::KIND)));
        }
        let id = entry.id();
        let encoded = Value::Object(entry.to_document());
        self.modify_array(trip_id, E::FIELD, |items| {
            if position_of(items, id).is_some() {
                return Err(Error::DuplicateEntry {
                    field: E::FIELD.to_string(),
                    id: id.to_string(),
                });
            }
            items.push(encoded.clone());
            Ok(())
        })
        .await
    }

    /// Replace the entry with the same id, keeping its position
    pub async fn update_entry<E: TripEntry>(&self, trip_id: &str, entry: &E) -> Result<()> {
        let id = entry.id();
        let encoded = Value::Object(entry.to_document());
        self.modify_array(trip_id, E::FIELD, |items| {
            let index = position_of(items, id).ok_or_else(|| entry_not_found(E::FIELD, id))?;
            items[index] = encoded.clone();
            Ok(())
        })
        .await
    }

    /// Remove the entry with `entry_id`; every other element is kept as stored
    pub async fn remove_entry<E: TripEntry>(&self, trip_id: &str, entry_id: &str) -> Result<()> {
        self.modify_array(trip_id, E::FIELD, |items| {
            let index = position_of(items, entry_id)
                .ok_or_else(|| entry_not_found(E::FIELD, entry_id))?;
            items.remove(index);
            Ok(())
        })
        .await
    }

    /// Decode one embedded array of a trip
    pub async fn fetch_entries<E: TripEntry>(&self, trip_id: &str) -> Result<Decoded<Vec<E>>> {
        let doc = self.get_document(trip_id).await?;
        Ok(match doc.fields.get(E::FIELD) {
            None | Some(Value::Null) => Decoded::Complete(Vec::new()),
            Some(Value::Array(values)) => decode_entries(values).in_trip(trip_id),
            Some(_) => {
                let problem = FieldProblem::WrongType { expected: "array" };
                let error = DecodeError::new("trip", E::FIELD, problem);
                tracing::warn!(%trip_id, %error, "embedded entries are not an array");
                Decoded::Failed(vec![DecodeWarning {
                    index: 0,
                    id: None,
                    trip_id: Some(trip_id.to_string()),
                    error,
                }])
            }
        })
    }

    async fn get_document(&self, trip_id: &str) -> Result<VersionedDocument> {
        tracing::debug!(user_id = %self.user_id, %trip_id, "fetch trip");
        self.store
            .get(&self.collection, trip_id)
            .await?
            .ok_or_else(|| Error::document_not_found(&self.collection, trip_id))
    }

    /// Apply `edit` to one embedded array and write it back if the trip has
    /// not changed in between, retrying on a fresh read otherwise
    async fn modify_array<F>(&self, trip_id: &str, field: &'static str, mut edit: F) -> Result<()>
    where
        F: FnMut(&mut Vec<Value>) -> Result<()> + Send,
    {
        for attempt in 1..=self.max_write_attempts {
            let doc = self.get_document(trip_id).await?;
            let mut items = match doc.fields.get(field) {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(items)) => items.clone(),
                Some(_) => {
                    let problem = FieldProblem::WrongType { expected: "array" };
                    return Err(DecodeError::new("trip", field, problem).into());
                }
            };
            edit(&mut items)?;

            let mut fields = Document::new();
            fields.insert(field.to_string(), Value::Array(items));
            match self
                .store
                .merge(&self.collection, trip_id, fields, Some(doc.version))
                .await
            {
                Ok(_) => return Ok(()),
                Err(error) if error.is_conflict() => {
                    tracing::warn!(
                        %trip_id,
                        field,
                        attempt,
                        version = doc.version,
                        "trip changed during write, retrying"
                    );
                }
                Err(error) => return Err(error),
            }
        }

        Err(Error::conflict(format!(
            "{} of trip {} still changing after {} attempts",
            field, trip_id, self.max_write_attempts
        )))
    }
}

fn position_of(items: &[Value], id: &str) -> Option<usize> {
    items
        .iter()
        .position(|item| item.get("id").and_then(Value::as_str) == Some(id))
}

fn entry_not_found(field: &str, id: &str) -> Error {
    Error::EntryNotFound {
        field: field.to_string(),
        id: id.to_string(),
    }
}
