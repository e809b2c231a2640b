//! Temporal status reconciliation.
//!
//! # Responsibility
//! - Derive item status from wall-clock time (`Pending -> Overdue`).
//! - Persist changed items one by one and announce the change once per cycle.
//! - Drive cycles on a fixed, cancellable interval (see [`Reconciler`]).
//!
//! # Invariants
//! - The transition is a pure function of `(status, due_date, now)`; a
//!   second cycle at the same `now` writes nothing.
//! - `Completed` and `Overdue` items are never modified here.
//! - A failed item write never blocks the remaining items. It is retried by
//!   the next cycle because the item is still pending and past due.
//! - Writes race with user updates; last write wins at the store.

mod runner;
mod signal;

pub use runner::{LoopSummary, Reconciler, ReconcilerConfig, DEFAULT_RECONCILE_INTERVAL};
pub use signal::{Latch, LatchHandle};

use crate::model::todo::{to_stored_precision, TodoItem, TodoStatus};
use crate::notify::{Notifier, TODO_UPDATED_MESSAGE, TODO_UPDATED_TOPIC};
use crate::repo::todo_repo::TodoStore;
use chrono::NaiveDateTime;
use log::{error, info, warn};

/// Status an item should have at `now`.
pub fn derive_status(status: TodoStatus, due_date: NaiveDateTime, now: NaiveDateTime) -> TodoStatus {
    match status {
        TodoStatus::Pending if due_date.date() < now.date() => TodoStatus::Overdue,
        other => other,
    }
}

/// Returns the transitioned copy of `item`, or `None` when nothing changes.
pub fn reconcile_item(item: &TodoItem, now: NaiveDateTime) -> Option<TodoItem> {
    let status = derive_status(item.status, item.due_date, now);
    if status == item.status {
        return None;
    }
    Some(TodoItem {
        status,
        updated_at: to_stored_precision(now).max(item.created_at),
        ..item.clone()
    })
}

/// Outcome of one reconciliation cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Items loaded by the scan.
    pub scanned: usize,
    /// Items whose transition was persisted.
    pub changed: usize,
    /// Items whose write failed.
    pub failed: usize,
    /// Whether a change notification was published.
    pub notified: bool,
    /// The scan itself failed; nothing was written.
    pub read_failed: bool,
    /// Cancellation stopped the cycle before every write was dispatched.
    pub interrupted: bool,
}

/// Runs one scan/persist/notify cycle at `now`.
///
/// Checks `cancel` before each write and dispatches no further writes once it
/// has fired. Items already persisted are still announced.
pub fn run_cycle<S, N>(
    store: &S,
    notifier: &N,
    now: NaiveDateTime,
    cancel: &LatchHandle,
) -> CycleReport
where
    S: TodoStore + ?Sized,
    N: Notifier + ?Sized,
{
    let mut report = CycleReport::default();

    let items = match store.get_all() {
        Ok(items) => items,
        Err(err) => {
            error!("event=reconcile_scan module=reconcile status=error error={err}");
            report.read_failed = true;
            return report;
        }
    };
    report.scanned = items.len();

    for updated in items.iter().filter_map(|item| reconcile_item(item, now)) {
        if cancel.is_triggered() {
            report.interrupted = true;
            break;
        }
        match store.update(&updated) {
            Ok(()) => report.changed += 1,
            Err(err) => {
                warn!(
                    "event=reconcile_write module=reconcile status=error item_id={} error={err}",
                    updated.id
                );
                report.failed += 1;
            }
        }
    }

    if report.changed > 0 {
        notifier.publish(TODO_UPDATED_TOPIC, TODO_UPDATED_MESSAGE);
        report.notified = true;
    }

    info!(
        "event=reconcile_cycle module=reconcile status=ok scanned={} changed={} failed={} interrupted={}",
        report.scanned, report.changed, report.failed, report.interrupted
    );
    report
}
