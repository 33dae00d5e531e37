//! Opaque forward-only pagination tokens.
//!
//! A cursor wraps the internal id of the last row a caller has seen. Pages are
//! always ordered by ascending internal id with an exclusive lower bound, so
//! rows inserted while a caller is paging are neither repeated nor skipped.
//! Rows deleted after being returned can leave gaps; that is accepted.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(rename = "id")]
    pub anchor: i64,
}

impl Cursor {
    /// Sentinel for "start of sequence". Internal ids start at 1.
    pub const START: Cursor = Cursor { anchor: 0 };

    pub fn after(anchor: i64) -> Self {
        Self { anchor }
    }

    pub fn encode(&self) -> String {
        let json = serde_json::json!({ "id": self.anchor });
        URL_SAFE_NO_PAD.encode(json.to_string())
    }

    /// Decodes a token. Absent, malformed or negative tokens all map to
    /// [`Cursor::START`].
    pub fn decode(token: Option<&str>) -> Self {
        token
            .and_then(|t| URL_SAFE_NO_PAD.decode(t.trim()).ok())
            .and_then(|bytes| serde_json::from_slice::<Cursor>(&bytes).ok())
            .filter(|c| c.anchor >= 0)
            .unwrap_or(Self::START)
    }

    pub fn is_start(&self) -> bool {
        self.anchor == Self::START.anchor
    }
}

/// One page of results plus the token for the next one, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Builds a page from a query that fetched up to `count + 1` rows.
    /// The extra row only signals that another page exists and is dropped.
    pub fn from_rows<F>(mut rows: Vec<T>, count: usize, anchor_of: F) -> Self
    where
        F: Fn(&T) -> i64,
    {
        if rows.len() > count {
            rows.truncate(count);
            let next_cursor = rows.last().map(|last| Cursor::after(anchor_of(last)).encode());
            Page { items: rows, next_cursor }
        } else {
            Page { items: rows, next_cursor: None }
        }
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

/// Page size policy shared by every "list many" operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub max_page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { max_page_size: 100 }
    }
}

/// A validated page request: clamped page size plus decoded anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub count: usize,
    pub after: Cursor,
}

impl PageRequest {
    /// Rows to fetch from the store, one more than the page size.
    pub fn limit(&self) -> i64 {
        self.count as i64 + 1
    }
}

impl Pagination {
    pub fn request(&self, count: u32, after: Option<&str>) -> DomainResult<PageRequest> {
        if count == 0 {
            return Err(DomainError::invalid("page size must be at least 1"));
        }
        Ok(PageRequest {
            count: count.min(self.max_page_size.max(1)) as usize,
            after: Cursor::decode(after),
        })
    }
}
