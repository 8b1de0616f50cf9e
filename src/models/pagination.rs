//! Pagination parameters

use serde::Deserialize;

/// Hard upper bound on page size
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Raw `limit`/`offset` as received from a caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageQuery {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }
}

/// A validated `LIMIT`/`OFFSET` window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// Start/end indices of this window over a slice of `len` items
    pub fn bounds(&self, len: usize) -> (usize, usize) {
        let start = (self.offset as usize).min(len);
        let end = start.saturating_add(self.limit as usize).min(len);
        (start, end)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 5,
            offset: 0,
        }
    }
}
