//! User profile documents

use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::mapper::{decode_profile, encode_profile, Document, PROFILE_IMAGE_URL};
use crate::models::AuthUser;
use crate::storage::{profile_image_path, ObjectStore};
use crate::store::{check_segment, DocumentStore};

/// Collection of profile documents, keyed by user id
pub const USERS: &str = "users";

/// Reads and writes `users/{uid}` profile documents
#[derive(Clone)]
pub struct ProfileStore {
    store: Arc<dyn DocumentStore>,
    objects: Option<Arc<dyn ObjectStore>>,
}

impl ProfileStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            objects: None,
        }
    }

    /// Use `objects` for profile pictures
    pub fn with_objects(mut self, objects: Arc<dyn ObjectStore>) -> Self {
        self.objects = Some(objects);
        self
    }

    /// The stored profile, `None` if the user never saved one
    pub async fn fetch_profile(&self, user_id: &str) -> Result<Option<AuthUser>> {
        check_segment("user id", user_id)?;
        tracing::debug!(%user_id, "fetch profile");
        match self.store.get(USERS, user_id).await? {
            Some(doc) => Ok(Some(decode_profile(user_id, &doc.fields)?)),
            None => Ok(None),
        }
    }

    /// Save email, display name and picture, leaving other fields alone
    pub async fn update_profile(&self, user: &AuthUser) -> Result<()> {
        check_segment("user id", &user.id)?;
        tracing::debug!(user_id = %user.id, "update profile");
        let fields = encode_profile(user);
        match self.store.merge(USERS, &user.id, fields.clone(), None).await {
            Err(Error::DocumentNotFound { .. }) => {
                self.store.put(USERS, &user.id, fields).await?;
                Ok(())
            }
            other => other.map(|_| ()),
        }
    }

    /// Upload a JPEG picture to `profile_images/{uid}.jpg` and point the
    /// profile at its public URL.
    ///
    /// The profile must already exist; the upload happens first, so a missing
    /// profile leaves the picture stored but unreferenced.
    pub async fn upload_profile_image(&self, user_id: &str, jpeg: Vec<u8>) -> Result<String> {
        let objects = self
            .objects
            .as_ref()
            .ok_or_else(|| Error::config("no object storage configured for profile images"))?;
        let path = profile_image_path(user_id)?;
        let url = objects.upload(&path, jpeg, "image/jpeg").await?;
        tracing::debug!(%user_id, %url, "profile image uploaded");

        let mut fields = Document::new();
        fields.insert(PROFILE_IMAGE_URL.to_string(), Value::String(url.clone()));
        self.store.merge(USERS, user_id, fields, None).await?;
        Ok(url)
    }
}
