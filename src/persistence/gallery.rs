//! Infinite-scroll gallery paging
//!
//! One page may be in flight at a time. A `begin` while busy is refused,
//! and a response that arrives after a `reset` is still applied.

use super::media::{Cursor, MediaRecord, MediaStore, Page};
use crate::error::BackendError;

pub const DEFAULT_PAGE_SIZE: usize = 24;

/// What to fetch next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub cursor: Option<Cursor>,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryPager {
    pub page_size: usize,
    cursor: Option<Cursor>,
    busy: bool,
    exhausted: bool,
}

impl Default for GalleryPager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl GalleryPager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            cursor: None,
            busy: false,
            exhausted: false,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Claim the next load, or `None` while one is running or nothing is left
    pub fn begin(&mut self) -> Option<PageRequest> {
        if self.busy || self.exhausted {
            return None;
        }
        self.busy = true;
        Some(PageRequest {
            cursor: self.cursor,
            limit: self.page_size,
        })
    }

    /// Apply the outcome of the load started by `begin`. A failure keeps
    /// the cursor so the same page can be retried.
    pub fn finish(&mut self, result: Result<Page, BackendError>) -> Result<Vec<MediaRecord>, BackendError> {
        self.busy = false;
        let page = result?;
        match page.next_cursor {
            Some(cursor) => self.cursor = Some(cursor),
            None => self.exhausted = true,
        }
        Ok(page.rows)
    }

    /// Start over from the newest row
    pub fn reset(&mut self) {
        self.cursor = None;
        self.exhausted = false;
    }

    /// `begin` + `list` + `finish` against a synchronous store. `Ok(None)`
    /// when the load was refused.
    pub fn load_next<S: MediaStore + ?Sized>(
        &mut self,
        store: &S,
        bucket: &str,
    ) -> Result<Option<Vec<MediaRecord>>, BackendError> {
        let Some(request) = self.begin() else {
            return Ok(None);
        };
        let rows = self.finish(store.list(bucket, request.cursor, request.limit))?;
        Ok(Some(rows))
    }
}
