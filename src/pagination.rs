//! This modules defines the common functionality for paging data.

use serde::Serialize;

/// The config for pagination
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationConfig {
    /// The number of items per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a client may request.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// Where a page sits within the full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// The 1-based page number of this page.
    pub current_page: u64,
    /// The number of pages, never less than one.
    pub total_pages: u64,
    /// The number of items across all pages.
    pub total_items: u64,
    /// The maximum number of items on a page.
    pub items_per_page: u64,
}

/// One page of items plus the metadata a data grid needs to page through the rest.
///
/// Serializes as `{"data": [...], "pagination": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedResult<T> {
    /// The items on the current page, in order.
    #[serde(rename = "data")]
    pub items: Vec<T>,
    /// The page metadata.
    pub pagination: Pagination,
}

/// Slice `items` down to the 1-based `page` of `page_size` items.
///
/// Requesting a page past the end gives an empty page with the correct totals.
/// The caller should ensure `page` and `page_size` are at least one.
pub fn paginate<T>(items: Vec<T>, page: u64, page_size: u64) -> PaginatedResult<T> {
    debug_assert!(page >= 1 && page_size >= 1);
    let page = page.max(1);
    let page_size = page_size.max(1);

    let total_items = items.len() as u64;
    let total_pages = total_items.div_ceil(page_size).max(1);
    let offset = (page - 1).saturating_mul(page_size);

    let items = items
        .into_iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(usize::try_from(page_size).unwrap_or(usize::MAX))
        .collect();

    PaginatedResult {
        items,
        pagination: Pagination {
            current_page: page,
            total_pages,
            total_items,
            items_per_page: page_size,
        },
    }
}
