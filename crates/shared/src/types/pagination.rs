//! Pagination types for list endpoints.
//!
//! `PageRequest::new` is strict and is what repositories accept.
//! `PageRequest::from_query` is the lenient HTTP-facing variant: missing or
//! out-of-range values fall back to the defaults instead of failing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest page size any list endpoint will serve.
pub const MAX_PAGE_SIZE: u64 = 100;

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_LIMIT: u64 = 20;

/// Rejected pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageError {
    /// Page numbers start at 1.
    #[error("page must be at least 1, got {0}")]
    InvalidPage(u64),

    /// Page size outside `1..=MAX_PAGE_SIZE`.
    #[error("page size must be between 1 and 100, got {0}")]
    InvalidPageSize(u64),
}

/// Validated pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    page: u64,
    limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Creates a page request, rejecting out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns `PageError` if `page < 1` or `limit` is outside `1..=100`.
    pub const fn new(page: u64, limit: u64) -> Result<Self, PageError> {
        if page < 1 {
            return Err(PageError::InvalidPage(page));
        }
        if limit < 1 || limit > MAX_PAGE_SIZE {
            return Err(PageError::InvalidPageSize(limit));
        }
        Ok(Self { page, limit })
    }

    /// Builds a page request from optional query parameters, falling back to
    /// defaults for anything missing or out of range.
    #[must_use]
    pub fn from_query(page: Option<u64>, limit: Option<u64>) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE);
        let limit = limit
            .filter(|l| (1..=MAX_PAGE_SIZE).contains(l))
            .unwrap_or(DEFAULT_LIMIT);
        Self { page, limit }
    }

    /// Page number (1-indexed).
    #[must_use]
    pub const fn page(&self) -> u64 {
        self.page
    }

    /// Page size.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Calculates the offset for database queries.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Number of pages needed to hold `total` items.
    #[must_use]
    pub const fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

/// Response wrapper for paginated data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The items in the current page.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub pagination: PageMeta,
}

/// Pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Current page number.
    pub page: u64,
    /// Items per page.
    pub limit: u64,
    /// Total number of items across all pages.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

impl PageMeta {
    /// Builds the metadata for `request` over a result set of `total` items.
    #[must_use]
    pub const fn new(request: PageRequest, total: u64) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages: request.total_pages(total),
        }
    }
}

impl<T> PageResponse<T> {
    /// Creates a new paginated response.
    #[must_use]
    pub fn new(data: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            data,
            pagination: PageMeta::new(request, total),
        }
    }

    /// Maps the items of the page, keeping the metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResponse<U> {
        PageResponse {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod tests;
