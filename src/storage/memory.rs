//! In-process object storage

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{check_object_path, ObjectStore};
use crate::error::{Error, Result};

const BUCKET: &str = "memory";

/// Objects kept in memory with their content type
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, (String, Vec<u8>)>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type recorded with the object at `path`
    pub async fn content_type(&self, path: &str) -> Option<String> {
        let objects = self.objects.read().await;
        objects.get(path).map(|(content_type, _)| content_type.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, path: &str, data: Vec<u8>, content_type: &str) -> Result<String> {
        check_object_path(path)?;
        let mut objects = self.objects.write().await;
        objects.insert(path.to_string(), (content_type.to_string(), data));
        Ok(self.public_url(path))
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>> {
        check_object_path(path)?;
        let objects = self.objects.read().await;
        objects
            .get(path)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| Error::document_not_found(BUCKET, path))
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://{}/{}", BUCKET, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_replaces_previous_object() {
        let storage = MemoryObjectStore::new();
        let url = storage.upload("profile_images/u1.jpg", vec![1, 2], "image/jpeg").await.unwrap();
        assert_eq!(url, "memory://memory/profile_images/u1.jpg");

        storage.upload("profile_images/u1.jpg", vec![3], "image/png").await.unwrap();
        assert_eq!(storage.download("profile_images/u1.jpg").await.unwrap(), vec![3]);
        assert_eq!(
            storage.content_type("profile_images/u1.jpg").await.as_deref(),
            Some("image/png")
        );

        assert!(matches!(
            storage.download("profile_images/u2.jpg").await,
            Err(Error::DocumentNotFound { .. })
        ));
        assert!(storage.upload("profile_images//x.jpg", vec![], "image/jpeg").await.is_err());
    }
}
