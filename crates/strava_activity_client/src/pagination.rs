//! Page-number pagination driver.
//!
//! The driver is independent of HTTP: it calls a page loader with page
//! numbers starting at 1 and decides when the collection is exhausted.

use crate::StravaError;
use std::future::Future;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub per_page: u32,
    /// Hard cap on the number of non-empty pages one fetch accepts.
    pub max_pages: u32,
}

impl Pagination {
    pub fn new(per_page: u32, max_pages: u32) -> Self {
        Self {
            per_page,
            max_pages,
        }
    }

    /// Load pages until one comes back empty or shorter than `per_page`.
    ///
    /// Items are returned in load order. A full page always triggers one more
    /// load. After `max_pages` full pages, page `max_pages + 1` must come back
    /// empty; anything else fails with [`StravaError::PageLimitExceeded`]
    /// instead of returning a truncated list. A collection of exactly
    /// `max_pages * per_page` items therefore succeeds. Any loader error
    /// aborts the whole fetch.
    pub async fn collect<T, F, Fut>(&self, mut load_page: F) -> Result<Vec<T>, StravaError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>, StravaError>>,
    {
        if self.per_page == 0 {
            return Err(StravaError::InvalidInput(
                "per_page must be at least 1".into(),
            ));
        }
        if self.max_pages == 0 {
            return Err(StravaError::InvalidInput(
                "max_pages must be at least 1".into(),
            ));
        }

        let mut items = Vec::new();
        for page in 1..=self.max_pages {
            let batch = load_page(page).await?;
            let len = batch.len();
            tracing::debug!(page, items = len, "fetched page");
            items.extend(batch);
            if len < self.per_page as usize {
                return Ok(items);
            }
        }

        if load_page(self.max_pages.saturating_add(1)).await?.is_empty() {
            return Ok(items);
        }
        tracing::warn!(
            max_pages = self.max_pages,
            items = items.len(),
            "page limit reached before a short page"
        );
        Err(StravaError::PageLimitExceeded {
            max_pages: self.max_pages,
        })
    }
}
