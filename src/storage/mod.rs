//! File uploads for profile pictures and other binary objects

mod memory;

use std::path::Path;

use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};

use crate::auth::SessionHandle;
use crate::config::JournyConfig;
use crate::error::{Error, Result};
use crate::fetch::{status_error, Fetch, CLIENT_INFO};
use crate::store::check_segment;

pub use memory::MemoryObjectStore;

/// Folder holding one picture per user
pub const PROFILE_IMAGES: &str = "profile_images";

/// Object path of a user's profile picture
pub fn profile_image_path(user_id: &str) -> Result<String> {
    check_segment("user id", user_id)?;
    Ok(format!("{}/{}.jpg", PROFILE_IMAGES, user_id))
}

/// A bucket of binary objects addressed by slash separated paths
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` at `path`, replacing what was there, and return the
    /// object's public URL
    async fn upload(&self, path: &str, data: Vec<u8>, content_type: &str) -> Result<String>;

    /// Bytes stored at `path`, `DocumentNotFound` if there are none
    async fn download(&self, path: &str) -> Result<Vec<u8>>;

    fn public_url(&self, path: &str) -> String;
}

pub(crate) fn check_object_path(path: &str) -> Result<()> {
    for segment in path.split('/') {
        check_segment("object path segment", segment)?;
    }
    Ok(())
}

/// Client for the hosted object storage service
#[derive(Clone)]
pub struct StorageClient {
    base_url: String,
    api_key: String,
    bucket: String,
    client: Client,
    session: SessionHandle,
}

impl StorageClient {
    pub fn new(
        config: &JournyConfig,
        client: Client,
        session: SessionHandle,
        bucket: &str,
    ) -> Self {
        Self {
            base_url: config.base_url(),
            api_key: config.api_key.clone(),
            bucket: bucket.to_string(),
            client,
            session,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }
}

#[async_trait]
impl ObjectStore for StorageClient {
    async fn upload(&self, path: &str, data: Vec<u8>, content_type: &str) -> Result<String> {
        check_object_path(path)?;
        tracing::debug!(bucket = %self.bucket, %path, bytes = data.len(), "upload object");

        let file_name = Path::new(path)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());
        let part = multipart::Part::bytes(data)
            .file_name(file_name)
            .mime_str(content_type)?;
        let form = multipart::Form::new().part("file", part);

        let mut request = self
            .client
            .post(self.object_url(path))
            .header("apikey", &self.api_key)
            .header("X-Client-Info", CLIENT_INFO)
            .header("Cache-Control", "3600")
            .header("x-upsert", "true")
            .multipart(form);
        if let Some(token) = self.session.access_token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::debug!(bucket = %self.bucket, %path, %status, "upload failed");
            return Err(status_error(status, text));
        }
        Ok(self.public_url(path))
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>> {
        check_object_path(path)?;
        let token = self.session.access_token();
        let response = Fetch::get(&self.client, &self.object_url(path))
            .header("apikey", &self.api_key)
            .maybe_bearer_auth(token.as_deref())
            .execute_raw()
            .await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::document_not_found(&self.bucket, path));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, text));
        }
        Ok(response.bytes().await?.to_vec())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, self.bucket, path)
    }
}
