use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Local;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Upper bound for ingested image payloads. Oversized inputs are rejected
/// before anything enters the document model.
pub const MAX_IMAGE_BYTES: usize = 1_500_000;

/// Errors that can occur while ingesting a schedule image.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image is {0} bytes, over the {MAX_IMAGE_BYTES} byte limit")]
    TooLarge(usize),
}

/// A shared schedule photo, stored as an opaque data URI or remote URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleImage {
    pub id: String,
    pub url: String,
    /// Display date stamped at upload time.
    pub date: String,
}

impl ScheduleImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url: url.into(),
            date: Local::now().format("%d/%m/%Y").to_string(),
        }
    }

    /// Builds an image from raw file bytes as a `data:` URI.
    pub fn from_bytes(bytes: &[u8], mime: &str) -> Result<Self, ImageError> {
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge(bytes.len()));
        }
        let url = format!("data:{};base64,{}", mime, STANDARD.encode(bytes));
        Ok(Self::new(url))
    }
}
