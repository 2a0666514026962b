//! Product image upload rules.
//!
//! Files are checked here before any upload request is made.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Image types the API stores.
pub const ACCEPTED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// Why a file was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("File type {content_type} is not supported. Please use {}.", ACCEPTED_IMAGE_TYPES.join(", "))]
    UnsupportedType { content_type: String },

    #[error("File size must be less than {max_mb}MB.")]
    TooLarge { size: usize, max_mb: usize },

    #[error("File is empty.")]
    Empty,

    #[error("You can only upload up to {max} images.")]
    TooMany { max: usize },
}

/// Limits for one image field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_file_size_mb: usize,
    pub max_images: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size_mb: 5,
            max_images: 10,
        }
    }
}

impl UploadPolicy {
    #[must_use]
    pub const fn max_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Check one file's declared type and size.
    ///
    /// # Errors
    ///
    /// Returns the first rule the file breaks.
    pub fn validate(&self, content_type: &str, size: usize) -> Result<(), UploadError> {
        let normalized = content_type.trim().to_ascii_lowercase();
        if !ACCEPTED_IMAGE_TYPES.contains(&normalized.as_str()) {
            return Err(UploadError::UnsupportedType {
                content_type: content_type.to_owned(),
            });
        }
        if size == 0 {
            return Err(UploadError::Empty);
        }
        if size > self.max_bytes() {
            return Err(UploadError::TooLarge {
                size,
                max_mb: self.max_file_size_mb,
            });
        }
        Ok(())
    }

    /// Check that `adding` more images fit next to `existing` ones.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::TooMany`] when the total would exceed the limit.
    pub const fn check_count(&self, existing: usize, adding: usize) -> Result<(), UploadError> {
        if existing + adding > self.max_images {
            return Err(UploadError::TooMany {
                max: self.max_images,
            });
        }
        Ok(())
    }

    /// "Supports: image/jpeg, ... • Max 5MB each • Up to 10 images"
    #[must_use]
    pub fn hint(&self) -> String {
        format!(
            "Supports: {} • Max {}MB each • Up to {} images",
            ACCEPTED_IMAGE_TYPES.join(", "),
            self.max_file_size_mb,
            self.max_images
        )
    }
}

/// An image in a product form: either already stored, or staged and
/// waiting to be uploaded when the form is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ImageSlot {
    Uploaded(String),
    Staged(String),
}

impl ImageSlot {
    /// Parse a form value: `staged:<id>` or a URL.
    #[must_use]
    pub fn from_form_value(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        Some(value.strip_prefix("staged:").map_or_else(
            || Self::Uploaded(value.to_owned()),
            |id| Self::Staged(id.to_owned()),
        ))
    }

    #[must_use]
    pub fn form_value(&self) -> String {
        match self {
            Self::Uploaded(url) => url.clone(),
            Self::Staged(id) => format!("staged:{id}"),
        }
    }
}

/// `POST /admin/image/upload` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_supported_types() {
        let policy = UploadPolicy::default();
        for t in ACCEPTED_IMAGE_TYPES {
            assert!(policy.validate(t, 1024).is_ok());
        }
        assert!(policy.validate("IMAGE/PNG", 1024).is_ok());
    }

    #[test]
    fn test_rejects_other_types() {
        let err = UploadPolicy::default()
            .validate("image/gif", 10)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "File type image/gif is not supported. Please use image/jpeg, image/png, image/webp."
        );
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let policy = UploadPolicy::default();
        assert!(policy.validate("image/png", 5 * 1024 * 1024).is_ok());
        assert_eq!(
            policy.validate("image/png", 5 * 1024 * 1024 + 1),
            Err(UploadError::TooLarge {
                size: 5 * 1024 * 1024 + 1,
                max_mb: 5
            })
        );
        assert_eq!(policy.validate("image/png", 0), Err(UploadError::Empty));
    }

    #[test]
    fn test_image_count() {
        let policy = UploadPolicy::default();
        assert!(policy.check_count(8, 2).is_ok());
        assert!(policy.check_count(9, 2).is_err());
    }

    #[test]
    fn test_slot_form_values() {
        assert_eq!(
            ImageSlot::from_form_value("staged:abc"),
            Some(ImageSlot::Staged("abc".to_string()))
        );
        assert_eq!(
            ImageSlot::from_form_value("https://cdn.example.com/a.png"),
            Some(ImageSlot::Uploaded("https://cdn.example.com/a.png".to_string()))
        );
        assert_eq!(ImageSlot::from_form_value("  "), None);
        assert_eq!(ImageSlot::Staged("x".to_string()).form_value(), "staged:x");
    }
}
