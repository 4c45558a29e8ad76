//! Page arithmetic for listings
//!
//! ```rust
//! use user_registry::users::PaginationMeta;
//!
//! let meta = PaginationMeta::new(2, 10, 25);
//! assert_eq!(meta.total_pages, 3);
//! assert_eq!(meta.skip(), 10);
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Pagination metadata returned alongside a page of users
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// Total number of matching users across all pages
    pub total: u64,
    /// Current page number (1-indexed)
    pub page: u32,
    pub page_size: u32,
    /// `ceil(total / page_size)`, zero for an empty result
    pub total_pages: u32,
}

impl PaginationMeta {
    /// Build metadata for `page` of size `page_size` out of `total` results.
    ///
    /// A zero page or page size is treated as 1.
    #[must_use]
    pub fn new(page: u32, page_size: u32, total: u64) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1);
        Self {
            total,
            page,
            page_size,
            total_pages: calculate_total_pages(total, page_size),
        }
    }

    /// Number of results before this page
    #[must_use]
    pub fn skip(&self) -> u64 {
        skip(self.page, self.page_size)
    }
}

/// `(page - 1) * page_size`, never negative
#[must_use]
pub fn skip(page: u32, page_size: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(page_size)
}

/// Total pages, rounding up
fn calculate_total_pages(total: u64, page_size: u32) -> u32 {
    let pages = total.div_ceil(u64::from(page_size.max(1)));
    u32::try_from(pages).unwrap_or(u32::MAX)
}
