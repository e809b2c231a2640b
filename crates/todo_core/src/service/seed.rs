//! Sample data for fresh databases.

use crate::model::id;
use crate::model::todo::{TodoItem, TodoStatus};
use crate::repo::todo_repo::{TodoPredicate, TodoStore};
use crate::service::todo_service::ServiceResult;
use chrono::{Duration, NaiveDateTime};
use log::info;

/// `(due offset days, status, created offset days)` relative to now.
const SAMPLES: [(i64, TodoStatus, i64); 9] = [
    (-4, TodoStatus::Overdue, -14),
    (-2, TodoStatus::Overdue, -12),
    (-2, TodoStatus::Pending, -10),
    (4, TodoStatus::Pending, -8),
    (30, TodoStatus::Pending, -6),
    (-2, TodoStatus::Completed, -4),
    (-1, TodoStatus::Completed, -2),
    (0, TodoStatus::Completed, 0),
    (2, TodoStatus::Pending, 0),
];

/// Inserts the sample items when the store is empty.
///
/// Returns the number of inserted items (0 when data already exists).
pub fn seed_sample_items<R>(repo: &R, now: NaiveDateTime) -> ServiceResult<usize>
where
    R: TodoStore + ?Sized,
{
    if repo.count(&TodoPredicate::default())? > 0 {
        info!("event=seed module=service status=skipped reason=not_empty");
        return Ok(0);
    }

    for (index, (due_offset, status, created_offset)) in SAMPLES.into_iter().enumerate() {
        let number = index + 1;
        let created_at = now + Duration::days(created_offset);
        let item = TodoItem {
            id: id::generate_for(created_at)?,
            title: format!("Sample Task {number}"),
            description: Some(format!("This is sample task {number} description.")),
            due_date: now + Duration::days(due_offset),
            status,
            created_at,
            updated_at: created_at,
        };
        repo.add(&item)?;
    }

    info!("event=seed module=service status=ok inserted={}", SAMPLES.len());
    Ok(SAMPLES.len())
}
