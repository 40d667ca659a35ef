//! Uploaded images: metadata rows, object naming and password digests
//!
//! Objects live in a storage bucket; each upload also gets a `media` row
//! describing it. A protected row keeps only the SHA-256 digest of its
//! password, which the signing endpoint compares against.

use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::url::{StorageKey, public_url, signed_url};
use crate::error::{BackendError, SignError};

pub const DEFAULT_BUCKET: &str = "images";
pub const DEFAULT_EXTENSION: &str = "png";
pub const UNTITLED: &str = "Untitled";

/// A row of the `media` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: u64,
    pub bucket: String,
    pub path: String,
    pub title: String,
    pub is_protected: bool,
    pub password_hash: Option<String>,
    /// Milliseconds since the Unix epoch
    pub created_at: u64,
    pub updated_at: u64,
}

impl MediaRecord {
    pub fn display_name(&self) -> &str {
        if self.title.is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }

    pub fn key(&self) -> StorageKey {
        StorageKey {
            bucket: self.bucket.clone(),
            path: self.path.clone(),
        }
    }
}

/// Listing position: the last row of the previous page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub created_at: u64,
    pub id: u64,
}

impl Cursor {
    fn of(record: &MediaRecord) -> Self {
        Self {
            created_at: record.created_at,
            id: record.id,
        }
    }

    /// Newest-first: rows strictly after the cursor
    fn precedes(&self, record: &MediaRecord) -> bool {
        (record.created_at, record.id) < (self.created_at, self.id)
    }
}

/// One page of a newest-first listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub rows: Vec<MediaRecord>,
    /// `None` once the listing is exhausted
    pub next_cursor: Option<Cursor>,
}

/// Lower-cased text after the last dot. A name without a dot is used whole;
/// an empty result falls back to `png`.
pub fn file_extension(file_name: &str) -> String {
    let ext = file_name.rsplit('.').next().unwrap_or("");
    if ext.is_empty() {
        DEFAULT_EXTENSION.to_string()
    } else {
        ext.to_lowercase()
    }
}

fn base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Collision-resistant object name: `<ms>-<base36 random>.<ext>`
pub fn object_name<R: Rng + ?Sized>(now_ms: u64, file_name: &str, rng: &mut R) -> String {
    format!(
        "{}-{}.{}",
        now_ms,
        base36(rng.random::<u64>()),
        file_extension(file_name)
    )
}

/// Lower-case hex SHA-256 of a password, surrounding whitespace ignored.
/// Rows written by the web uploader store the same digest.
pub fn password_digest(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.trim().as_bytes()))
}

/// Upload form contents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub title: String,
    /// `Some` when the upload should be protected
    pub password: Option<String>,
    pub bucket: Option<String>,
}

impl UploadRequest {
    /// Checks that run before anything is sent
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.file_name.trim().is_empty() {
            return Err(BackendError::MissingField("file_name"));
        }
        if self.password.as_deref().is_some_and(|pw| pw.trim().is_empty()) {
            return Err(BackendError::MissingField("password"));
        }
        Ok(())
    }

    pub fn bucket(&self) -> &str {
        self.bucket.as_deref().unwrap_or(DEFAULT_BUCKET)
    }
}

/// Row contents before the store assigns id and timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct NewMedia {
    pub bucket: String,
    pub path: String,
    pub title: String,
    pub password_hash: Option<String>,
}

/// Object storage plus the `media` table
pub trait MediaStore {
    /// Write an object; fails if the path already exists
    fn put_object(&mut self, bucket: &str, path: &str, bytes: &[u8]) -> Result<(), BackendError>;

    fn insert(&mut self, media: NewMedia) -> Result<MediaRecord, BackendError>;

    fn get(&self, id: u64) -> Option<MediaRecord>;

    /// Newest first, starting after `cursor`
    fn list(&self, bucket: &str, cursor: Option<Cursor>, limit: usize) -> Result<Page, BackendError>;

    /// Case-insensitive title substring match, newest first
    fn search(&self, bucket: &str, query: &str, limit: usize) -> Result<Vec<MediaRecord>, BackendError>;

    fn rename(&mut self, id: u64, title: &str) -> Result<(), BackendError>;

    /// Time-limited URL for an object
    fn sign(&self, key: &StorageKey, ttl_secs: u32) -> Result<String, SignError>;

    fn public_url(&self, key: &StorageKey) -> String;
}

/// Validate, store the object, then record it
pub fn upload<S, R>(
    store: &mut S,
    request: &UploadRequest,
    now_ms: u64,
    rng: &mut R,
) -> Result<MediaRecord, BackendError>
where
    S: MediaStore + ?Sized,
    R: Rng + ?Sized,
{
    request.validate()?;
    let bucket = request.bucket().to_string();
    let path = object_name(now_ms, &request.file_name, rng);
    store.put_object(&bucket, &path, &request.bytes)?;

    let record = store.insert(NewMedia {
        bucket,
        path,
        title: request.title.clone(),
        password_hash: request.password.as_deref().map(password_digest),
    })?;
    log::info!(
        "Uploaded {}/{} ({})",
        record.bucket,
        record.path,
        if record.is_protected { "protected" } else { "public" }
    );
    Ok(record)
}

/// In-process media backend
#[derive(Debug, Clone)]
pub struct MemoryMediaStore {
    base_url: String,
    objects: BTreeSet<(String, String)>,
    rows: Vec<MediaRecord>,
    next_id: u64,
    clock_ms: u64,
}

impl MemoryMediaStore {
    pub fn new(base_url: impl Into<String>, start_ms: u64) -> Self {
        Self {
            base_url: base_url.into(),
            objects: BTreeSet::new(),
            rows: Vec::new(),
            next_id: 1,
            clock_ms: start_ms,
        }
    }

    fn tick(&mut self) -> u64 {
        let now = self.clock_ms;
        self.clock_ms += 1;
        now
    }

    fn newest_first<'a>(&'a self, bucket: &'a str) -> impl Iterator<Item = &'a MediaRecord> + 'a {
        let mut rows: Vec<&MediaRecord> = self.rows.iter().filter(|r| r.bucket == bucket).collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        rows.into_iter()
    }
}

impl MediaStore for MemoryMediaStore {
    fn put_object(&mut self, bucket: &str, path: &str, _bytes: &[u8]) -> Result<(), BackendError> {
        if !self.objects.insert((bucket.to_string(), path.to_string())) {
            return Err(BackendError::StorageConflict(format!("{}/{}", bucket, path)));
        }
        Ok(())
    }

    fn insert(&mut self, media: NewMedia) -> Result<MediaRecord, BackendError> {
        if media.path.is_empty() {
            return Err(BackendError::MissingField("path"));
        }
        let now = self.tick();
        let record = MediaRecord {
            id: self.next_id,
            bucket: media.bucket,
            path: media.path,
            title: media.title,
            is_protected: media.password_hash.is_some(),
            password_hash: media.password_hash,
            created_at: now,
            updated_at: now,
        };
        self.next_id += 1;
        self.rows.push(record.clone());
        Ok(record)
    }

    fn get(&self, id: u64) -> Option<MediaRecord> {
        self.rows.iter().find(|r| r.id == id).cloned()
    }

    fn list(&self, bucket: &str, cursor: Option<Cursor>, limit: usize) -> Result<Page, BackendError> {
        let mut after = self
            .newest_first(bucket)
            .filter(|r| cursor.is_none_or(|c| c.precedes(r)));
        let rows: Vec<MediaRecord> = after.by_ref().take(limit).cloned().collect();
        let more = after.next().is_some();
        let next_cursor = if more { rows.last().map(Cursor::of) } else { None };
        Ok(Page { rows, next_cursor })
    }

    fn search(&self, bucket: &str, query: &str, limit: usize) -> Result<Vec<MediaRecord>, BackendError> {
        let needle = query.to_lowercase();
        Ok(self
            .newest_first(bucket)
            .filter(|r| r.title.to_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect())
    }

    fn rename(&mut self, id: u64, title: &str) -> Result<(), BackendError> {
        let now = self.tick();
        let row = self
            .rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(BackendError::NotFound(id))?;
        row.title = title.to_string();
        row.updated_at = now;
        Ok(())
    }

    fn sign(&self, key: &StorageKey, ttl_secs: u32) -> Result<String, SignError> {
        if !self.objects.contains(&(key.bucket.clone(), key.path.clone())) {
            return Err(SignError::SignFailed);
        }
        let token = blake3::hash(format!("{}/{}:{}", key.bucket, key.path, ttl_secs).as_bytes());
        Ok(signed_url(&self.base_url, key, &token.to_hex()[..32]))
    }

    fn public_url(&self, key: &StorageKey) -> String {
        public_url(&self.base_url, key)
    }
}
