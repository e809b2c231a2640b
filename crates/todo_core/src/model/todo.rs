//! Todo item domain model.
//!
//! # Responsibility
//! - Define the canonical tracked unit of work and its closed status set.
//! - Provide validation shared by every persistence path.
//!
//! # Invariants
//! - `id` is stable and never reused for another item.
//! - `updated_at` is never earlier than `created_at`.
//! - `Overdue` is only entered from `Pending`; see `crate::reconcile`.

use crate::model::id::TodoId;
use chrono::{NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum description length accepted by the write paths.
pub const DESCRIPTION_MAX_CHARS: usize = 80;

/// Sub-second digits kept by storage.
pub const TIMESTAMP_PRECISION_DIGITS: u16 = 3;

/// Truncates `value` to the precision storage keeps.
pub fn to_stored_precision(value: NaiveDateTime) -> NaiveDateTime {
    value.trunc_subsecs(TIMESTAMP_PRECISION_DIGITS)
}

/// Lifecycle state of a todo item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    /// Open and not yet past its due date (as last observed).
    Pending,
    /// Finished by the user. Never touched by the reconciler.
    Completed,
    /// Observed past due while still pending.
    Overdue,
}

impl TodoStatus {
    /// Stable storage/wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Overdue => "overdue",
        }
    }

    /// Parses a storage/wire label. Unknown values are rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "overdue" => Some(Self::Overdue),
            _ => None,
        }
    }
}

impl Display for TodoStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical domain record for one todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Time-sortable stable identifier.
    pub id: TodoId,
    /// Non-empty, unique across items (uniqueness enforced by the service).
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDateTime,
    pub status: TodoStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Validation failures for a `TodoItem`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoValidationError {
    EmptyTitle,
    DescriptionTooLong { max_chars: usize, actual_chars: usize },
    UpdatedBeforeCreated,
}

impl Display for TodoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::DescriptionTooLong {
                max_chars,
                actual_chars,
            } => write!(
                f,
                "description must be at most {max_chars} characters, got {actual_chars}"
            ),
            Self::UpdatedBeforeCreated => write!(f, "updated_at must not be earlier than created_at"),
        }
    }
}

impl Error for TodoValidationError {}

impl TodoItem {
    /// Creates a pending item stamped with `now` for both timestamps.
    ///
    /// Timestamps are truncated to millisecond precision.
    pub fn new_pending(
        id: TodoId,
        title: impl Into<String>,
        description: Option<String>,
        due_date: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Self {
        let now = to_stored_precision(now);
        Self {
            id,
            title: title.into(),
            description,
            due_date: to_stored_precision(due_date),
            status: TodoStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validates field-level invariants.
    ///
    /// # Errors
    /// - `EmptyTitle` when the title is blank.
    /// - `DescriptionTooLong` when the description exceeds
    ///   [`DESCRIPTION_MAX_CHARS`] characters.
    /// - `UpdatedBeforeCreated` when timestamps are inverted.
    pub fn validate(&self) -> Result<(), TodoValidationError> {
        if self.title.trim().is_empty() {
            return Err(TodoValidationError::EmptyTitle);
        }
        if let Some(description) = self.description.as_deref() {
            let actual_chars = description.chars().count();
            if actual_chars > DESCRIPTION_MAX_CHARS {
                return Err(TodoValidationError::DescriptionTooLong {
                    max_chars: DESCRIPTION_MAX_CHARS,
                    actual_chars,
                });
            }
        }
        if self.updated_at < self.created_at {
            return Err(TodoValidationError::UpdatedBeforeCreated);
        }
        Ok(())
    }
}

/// Externally exposed projection of a `TodoItem`.
///
/// Timestamps stay internal to core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItemView {
    pub id: TodoId,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDateTime,
    pub status: TodoStatus,
}

impl From<&TodoItem> for TodoItemView {
    fn from(item: &TodoItem) -> Self {
        let TodoItem {
            id,
            title,
            description,
            due_date,
            status,
            created_at: _,
            updated_at: _,
        } = item;
        Self {
            id: *id,
            title: title.clone(),
            description: description.clone(),
            due_date: *due_date,
            status: *status,
        }
    }
}

impl From<TodoItem> for TodoItemView {
    fn from(item: TodoItem) -> Self {
        Self::from(&item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .and_then(|date| date.and_hms_opt(9, 0, 0))
            .unwrap()
    }

    #[test]
    fn status_labels_roundtrip_and_reject_unknown() {
        for status in [TodoStatus::Pending, TodoStatus::Completed, TodoStatus::Overdue] {
            assert_eq!(TodoStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TodoStatus::parse("done"), None);
        assert_eq!(TodoStatus::parse("Pending"), None);
    }

    #[test]
    fn validate_rejects_blank_title() {
        let item = TodoItem::new_pending(Uuid::nil(), "   ", None, at(2), at(1));
        assert_eq!(item.validate(), Err(TodoValidationError::EmptyTitle));
    }

    #[test]
    fn validate_counts_description_in_chars() {
        let mut item = TodoItem::new_pending(Uuid::nil(), "t", None, at(2), at(1));
        item.description = Some("é".repeat(DESCRIPTION_MAX_CHARS));
        assert!(item.validate().is_ok());

        item.description = Some("x".repeat(DESCRIPTION_MAX_CHARS + 1));
        assert_eq!(
            item.validate(),
            Err(TodoValidationError::DescriptionTooLong {
                max_chars: DESCRIPTION_MAX_CHARS,
                actual_chars: DESCRIPTION_MAX_CHARS + 1,
            })
        );
    }

    #[test]
    fn validate_rejects_inverted_timestamps() {
        let mut item = TodoItem::new_pending(Uuid::nil(), "t", None, at(2), at(5));
        item.updated_at = at(4);
        assert_eq!(item.validate(), Err(TodoValidationError::UpdatedBeforeCreated));
    }

    #[test]
    fn view_carries_every_public_field() {
        let mut item = TodoItem::new_pending(
            Uuid::from_u128(7),
            "write report",
            Some("quarterly".to_string()),
            at(9),
            at(1),
        );
        item.status = TodoStatus::Overdue;

        let view = TodoItemView::from(&item);
        assert_eq!(view.id, item.id);
        assert_eq!(view.title, "write report");
        assert_eq!(view.description.as_deref(), Some("quarterly"));
        assert_eq!(view.due_date, at(9));
        assert_eq!(view.status, TodoStatus::Overdue);
    }

    #[test]
    fn view_serializes_status_as_snake_case_label() {
        let item = TodoItem::new_pending(Uuid::from_u128(7), "t", None, at(9), at(1));
        let json = serde_json::to_value(TodoItemView::from(item)).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn item_deserializes_from_its_json_form() {
        let item = TodoItem::new_pending(Uuid::from_u128(9), "t", Some("d".into()), at(9), at(1));
        let json = serde_json::to_string(&item).unwrap();
        let decoded: TodoItem = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, item);
    }

    #[test]
    fn new_pending_drops_sub_millisecond_digits() {
        let due = at(9) + chrono::Duration::microseconds(1_500);
        let now = at(1) + chrono::Duration::nanoseconds(2_000_700);
        let item = TodoItem::new_pending(Uuid::nil(), "t", None, due, now);

        assert_eq!(item.due_date, at(9) + chrono::Duration::milliseconds(1));
        assert_eq!(item.created_at, at(1) + chrono::Duration::milliseconds(2));
        assert_eq!(item.updated_at, item.created_at);
    }
}
