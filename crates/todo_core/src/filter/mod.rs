//! Declarative filter/pagination over the todo store.
//!
//! # Responsibility
//! - Validate read-side filter input.
//! - Translate a [`FilterSpec`] into predicate + ordering + page window.
//!
//! # Invariants
//! - Predicates are AND-combined; unset fields are skipped.
//! - Default order is `created_at DESC, id DESC`. A due-date bound switches
//!   the leading sort key to `due_date DESC`.
//! - Window is `skip (page_index - 1) * page_size, take page_size`.

mod page;

pub use page::PaginatedResult;

use crate::model::todo::{TodoItem, TodoStatus};
use crate::repo::todo_repo::{StoreResult, TodoOrder, TodoPredicate, TodoQuery, TodoStore};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Smallest accepted page size.
pub const MIN_PAGE_SIZE: u32 = 10;
/// Page size used when the caller does not choose one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Read-side query descriptor, constructed per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub status: Option<TodoStatus>,
    pub created_on_or_before: Option<NaiveDate>,
    pub due_on_or_before: Option<NaiveDate>,
    /// Case-sensitive "contains" match. Empty strings are ignored.
    pub title: Option<String>,
    /// 1-based.
    pub page_index: u32,
    pub page_size: u32,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            status: None,
            created_on_or_before: None,
            due_on_or_before: None,
            title: None,
            page_index: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Rejected filter input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidFilterError {
    PageIndexOutOfRange(u32),
    PageSizeTooSmall { min: u32, actual: u32 },
}

impl Display for InvalidFilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PageIndexOutOfRange(actual) => {
                write!(f, "page index must be greater than or equal to 1, got {actual}")
            }
            Self::PageSizeTooSmall { min, actual } => {
                write!(f, "page size must be at least {min}, got {actual}")
            }
        }
    }
}

impl Error for InvalidFilterError {}

impl FilterSpec {
    /// Validates pagination input against `min_page_size`.
    ///
    /// # Errors
    /// - `PageIndexOutOfRange` when `page_index < 1`.
    /// - `PageSizeTooSmall` when `page_size < min_page_size`.
    pub fn validate(&self, min_page_size: u32) -> Result<(), InvalidFilterError> {
        if self.page_index < 1 {
            return Err(InvalidFilterError::PageIndexOutOfRange(self.page_index));
        }
        if self.page_size < min_page_size {
            return Err(InvalidFilterError::PageSizeTooSmall {
                min: min_page_size,
                actual: self.page_size,
            });
        }
        Ok(())
    }

    /// Store predicate for this filter.
    pub fn predicate(&self) -> TodoPredicate {
        TodoPredicate {
            status: self.status,
            created_on_or_before: self.created_on_or_before,
            due_on_or_before: self.due_on_or_before,
            title_contains: self.title.clone().filter(|title| !title.is_empty()),
        }
    }

    /// Ordering implied by this filter.
    pub fn order(&self) -> TodoOrder {
        if self.due_on_or_before.is_some() {
            TodoOrder::DueDateDesc
        } else {
            TodoOrder::CreatedDesc
        }
    }

    /// Full windowed store query for this filter.
    pub fn to_query(&self) -> TodoQuery {
        let skipped_pages = u64::from(self.page_index.saturating_sub(1));
        TodoQuery {
            predicate: self.predicate(),
            order: self.order(),
            limit: Some(self.page_size),
            offset: skipped_pages * u64::from(self.page_size),
        }
    }
}

/// Runs `spec` against `store`. Input must already be validated.
pub fn apply<S>(store: &S, spec: &FilterSpec) -> StoreResult<PaginatedResult<TodoItem>>
where
    S: TodoStore + ?Sized,
{
    let query = spec.to_query();
    let total_count = store.count(&query.predicate)?;
    let items = store.query(&query)?;
    debug!(
        "event=filter_apply module=filter status=ok matched={} page_index={} returned={}",
        total_count,
        spec.page_index,
        items.len()
    );
    Ok(PaginatedResult::new(
        items,
        spec.page_index,
        total_count,
        spec.page_size,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spec_is_valid() {
        assert_eq!(FilterSpec::default().validate(MIN_PAGE_SIZE), Ok(()));
    }

    #[test]
    fn validate_rejects_zero_page_index_and_small_page() {
        let zero_index = FilterSpec {
            page_index: 0,
            ..FilterSpec::default()
        };
        assert_eq!(
            zero_index.validate(MIN_PAGE_SIZE),
            Err(InvalidFilterError::PageIndexOutOfRange(0))
        );

        let small = FilterSpec {
            page_size: 9,
            ..FilterSpec::default()
        };
        assert_eq!(
            small.validate(MIN_PAGE_SIZE),
            Err(InvalidFilterError::PageSizeTooSmall { min: 10, actual: 9 })
        );
    }

    #[test]
    fn window_skips_previous_pages() {
        let spec = FilterSpec {
            page_index: 3,
            page_size: 10,
            ..FilterSpec::default()
        };
        let query = spec.to_query();
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.offset, 20);
        assert_eq!(query.order, TodoOrder::CreatedDesc);
    }

    #[test]
    fn due_bound_switches_order_and_empty_title_is_ignored() {
        let spec = FilterSpec {
            due_on_or_before: NaiveDate::from_ymd_opt(2024, 5, 1),
            title: Some(String::new()),
            ..FilterSpec::default()
        };
        assert_eq!(spec.order(), TodoOrder::DueDateDesc);
        assert_eq!(spec.predicate().title_contains, None);
    }
}
