//! Backend contracts: scores, media, signed URLs
//!
//! Features:
//! - `scores` / `media` row types with the backend's JSON field names
//! - Input sanitizing and validation that runs before any store call
//! - BLAKE3 password digests for protected media
//! - Signing endpoint decision logic and its JSON envelope
//! - Storage URL parsing and gallery paging
//! - In-memory stores behind the `ScoreStore` / `MediaStore` traits

pub mod gallery;
pub mod media;
pub mod scores;
pub mod sign;
pub mod url;

pub use gallery::{GalleryPager, PageRequest};
pub use media::{Cursor, MediaRecord, MediaStore, MemoryMediaStore, Page, UploadRequest, upload};
pub use scores::{MemoryScoreStore, NewScore, ScoreRecord, ScoreStore};
pub use sign::{SignConfig, SignRequest, SignResponse, handle_sign, handle_sign_json, parse_sign_response};
pub use url::{StorageKey, extract_storage_key, normalize_storage_url};

use crate::error::BackendError;

/// Project URL and anon key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendConfig {
    pub url: Option<String>,
    pub key: Option<String>,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            key: Some(key.into()),
        }
    }

    /// Both values, or `NotConfigured` when either is missing or blank
    pub fn require(&self) -> Result<(&str, &str), BackendError> {
        match (present(&self.url), present(&self.key)) {
            (Some(url), Some(key)) => Ok((url.trim_end_matches('/'), key)),
            _ => Err(BackendError::NotConfigured),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
