//! Offset/limit pagination over listing endpoints
//!
//! [`PaginatedFetcher`] drives a listing operation page by page until the
//! service reports that every item has been returned. Each page is fetched
//! through the [`RetryPolicy`], so a failing page is retried on its own.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::model::Page;
use crate::retry::RetryPolicy;
use std::future::Future;
use tracing::{debug, warn};

/// Default number of items requested per page
pub const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginatedFetcher {
    retry: RetryPolicy,
    page_size: usize,
}

impl PaginatedFetcher {
    pub fn new(retry: RetryPolicy, page_size: usize) -> Self {
        Self {
            retry,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Fetch every page and return the items in page order
    ///
    /// `list` is called with `(offset, limit)`. Fetching stops once
    /// `returned + offset >= total`, or as soon as a page comes back empty.
    ///
    /// # Errors
    ///
    /// The first page error that survives the retry policy aborts the whole
    /// listing; items gathered so far are discarded. A page whose reported
    /// position overflows, or that does not move past the requested offset,
    /// fails the listing with a `Remote` error (not retried).
    pub async fn fetch_all<T, F, Fut>(&self, ctx: &Context, mut list: F) -> Result<Vec<T>>
    where
        F: FnMut(usize, usize) -> Fut,
        Fut: Future<Output = Result<Page<T>>>,
    {
        let mut items = Vec::new();
        let mut offset = 0;
        let mut page_count = 0;

        loop {
            let limit = self.page_size;
            let page = self.retry.run(ctx, || list(offset, limit)).await?;
            page_count += 1;

            let info = page.info;
            let empty = page.items.is_empty();
            items.extend(page.items);

            debug!(
                page = page_count,
                offset = info.offset,
                returned = info.returned_count,
                total = info.total_count,
                "Fetched page"
            );

            let Some(next_offset) = info.returned_count.checked_add(info.offset) else {
                return Err(Error::remote_unknown(format!(
                    "listing reported an out-of-range page (offset {}, returned {})",
                    info.offset, info.returned_count
                )));
            };
            if next_offset >= info.total_count {
                break;
            }
            if empty || info.returned_count == 0 {
                warn!(
                    offset = info.offset,
                    total = info.total_count,
                    "Listing returned an empty page before reaching the reported total"
                );
                break;
            }
            if next_offset <= offset {
                return Err(Error::remote_unknown(format!(
                    "listing did not advance past offset {} (page reported offset {}, returned {})",
                    offset, info.offset, info.returned_count
                )));
            }
            offset = next_offset;
        }

        debug!(pages = page_count, items = items.len(), "Completed paginated listing");
        Ok(items)
    }
}

impl Default for PaginatedFetcher {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), DEFAULT_PAGE_SIZE)
    }
}
