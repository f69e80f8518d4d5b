//! Local image attachment.
//!
//! Images are embedded in the product record as base64 data URLs, so they
//! are checked for size and type before being read.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

use super::form::AttachedImage;

/// Largest accepted image, inclusive.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Image rejected before reading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("Image size should be less than 5MB")]
    TooLarge { size: u64 },

    #[error("Please upload a valid image file")]
    NotAnImage { content_type: String },
}

/// A file chosen for the product image.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    /// Declared media type, e.g. `image/png`.
    pub content_type: String,
    /// Size in bytes as reported for the file.
    pub size: u64,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Upload from in-memory bytes.
    #[must_use]
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            size: bytes.len() as u64,
            bytes,
        }
    }

    /// Upload from a file on disk. The media type comes from the extension.
    ///
    /// Oversized files are not read; [`ImageUpload::validate`] rejects them
    /// from the reported size.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be inspected or read.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let size = std::fs::metadata(path)?.len();
        let bytes = if size > MAX_IMAGE_BYTES {
            Vec::new()
        } else {
            std::fs::read(path)?
        };

        Ok(Self {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            content_type: content_type_for(path).to_string(),
            size,
            bytes,
        })
    }

    /// Check size, then media type.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::TooLarge` above [`MAX_IMAGE_BYTES`] and
    /// `ImageError::NotAnImage` for a non-`image/` media type.
    pub fn validate(&self) -> Result<(), ImageError> {
        if self.size > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge { size: self.size });
        }
        if !self.content_type.starts_with("image/") {
            return Err(ImageError::NotAnImage {
                content_type: self.content_type.clone(),
            });
        }
        Ok(())
    }

    /// Validate and encode as a `data:` URL.
    ///
    /// # Errors
    ///
    /// See [`ImageUpload::validate`].
    pub fn into_data_url(self) -> Result<(AttachedImage, String), ImageError> {
        self.validate()?;
        let data_url = format!(
            "data:{};base64,{}",
            self.content_type,
            STANDARD.encode(&self.bytes)
        );
        let attached = AttachedImage {
            file_name: self.file_name,
            content_type: self.content_type,
            size: self.size,
        };
        Ok((attached, data_url))
    }
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Media type for a file path, from its extension.
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "avif" => "image/avif",
        "ico" => "image/x-icon",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}
