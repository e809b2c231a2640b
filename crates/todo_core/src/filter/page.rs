//! Paginated result envelope.

use serde::{Deserialize, Serialize};

/// One page of an ordered read.
///
/// `total_pages` is `floor(total_count / page_size) + 1`, so an exact
/// multiple of the page size reports one trailing empty page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub page_index: u32,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl<T> PaginatedResult<T> {
    /// Builds a page and derives the navigation fields.
    pub fn new(items: Vec<T>, page_index: u32, total_count: u64, page_size: u32) -> Self {
        let total_pages = total_pages(total_count, page_size);
        Self {
            items,
            page_index,
            total_pages,
            has_next_page: u64::from(page_index) < total_pages,
            has_previous_page: page_index > 1,
        }
    }

    /// Converts every item, keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            page_index: self.page_index,
            total_pages: self.total_pages,
            has_next_page: self.has_next_page,
            has_previous_page: self.has_previous_page,
        }
    }
}

fn total_pages(total_count: u64, page_size: u32) -> u64 {
    total_count / u64::from(page_size.max(1)) + 1
}
