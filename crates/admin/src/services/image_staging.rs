//! Deferred product image upload.
//!
//! Files picked in the product form are validated and parked here under a
//! random id. Only when the form is saved are they sent to the API; until
//! then the form carries `staged:<id>` values. Entries expire after an hour.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, info, warn};
use uuid::Uuid;

use segishop_core::upload::{ImageSlot, UploadError, UploadPolicy};

use crate::api::CatalogApi;

const STAGING_TTL: Duration = Duration::from_secs(60 * 60);
const STAGING_CAPACITY: u64 = 200;

/// A validated file waiting for upload.
#[derive(Debug)]
pub struct StagedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// In-memory staging area shared by all admin requests.
#[derive(Clone)]
pub struct ImageStaging {
    cache: Cache<String, Arc<StagedImage>>,
    policy: UploadPolicy,
}

impl ImageStaging {
    #[must_use]
    pub fn new(policy: UploadPolicy) -> Self {
        let cache = Cache::builder()
            .max_capacity(STAGING_CAPACITY)
            .time_to_live(STAGING_TTL)
            .build();
        Self { cache, policy }
    }

    #[must_use]
    pub const fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Validate a file and park it. Returns the staging id.
    ///
    /// # Errors
    ///
    /// Returns the [`UploadError`] for a wrong type, an empty file or one
    /// over the size limit.
    pub async fn stage(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, UploadError> {
        self.policy.validate(content_type, bytes.len())?;
        let id = Uuid::new_v4().to_string();
        debug!(staging_id = %id, file_name, size = bytes.len(), "Image staged");
        self.cache
            .insert(
                id.clone(),
                Arc::new(StagedImage {
                    file_name: file_name.to_owned(),
                    content_type: content_type.trim().to_ascii_lowercase(),
                    bytes,
                }),
            )
            .await;
        Ok(id)
    }

    pub async fn get(&self, id: &str) -> Option<Arc<StagedImage>> {
        self.cache.get(id).await
    }

    pub async fn discard(&self, id: &str) {
        self.cache.invalidate(id).await;
    }

    /// Turn form slots into stored URLs, uploading staged files in order.
    ///
    /// A staged file that fails to upload, or has expired, is logged and
    /// skipped; the rest continue.
    pub async fn resolve(&self, api: &dyn CatalogApi, slots: &[ImageSlot]) -> Vec<String> {
        let mut urls = Vec::with_capacity(slots.len());
        for slot in slots {
            match slot {
                ImageSlot::Uploaded(url) => urls.push(url.clone()),
                ImageSlot::Staged(id) => {
                    let Some(staged) = self.get(id).await else {
                        warn!(staging_id = %id, "Staged image expired before upload");
                        continue;
                    };
                    match api
                        .upload_image(&staged.file_name, &staged.content_type, staged.bytes.clone())
                        .await
                    {
                        Ok(url) => {
                            info!(staging_id = %id, url = %url, "Staged image uploaded");
                            self.discard(id).await;
                            urls.push(url);
                        }
                        Err(e) => {
                            warn!(staging_id = %id, file_name = %staged.file_name, error = %e, "Image upload failed, skipping");
                        }
                    }
                }
            }
        }
        urls
    }
}

impl std::fmt::Debug for ImageStaging {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageStaging")
            .field("entries", &self.cache.entry_count())
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stage_and_fetch() {
        let staging = ImageStaging::new(UploadPolicy::default());
        let id = staging
            .stage("mug.png", "image/PNG", vec![1, 2, 3])
            .await
            .unwrap();
        let staged = staging.get(&id).await.unwrap();
        assert_eq!(staged.file_name, "mug.png");
        assert_eq!(staged.content_type, "image/png");

        staging.discard(&id).await;
        assert!(staging.get(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_stage_rejects_invalid_files() {
        let staging = ImageStaging::new(UploadPolicy::default());
        assert!(matches!(
            staging.stage("a.gif", "image/gif", vec![1]).await,
            Err(UploadError::UnsupportedType { .. })
        ));
        assert_eq!(
            staging.stage("a.png", "image/png", Vec::new()).await,
            Err(UploadError::Empty)
        );
    }
}
