//! Todo use-case service.
//!
//! # Responsibility
//! - Provide the write paths (create/update/delete) with request validation.
//! - Provide the read paths (get/list) as externally exposed views.
//!
//! # Invariants
//! - Titles are unique across items; checked before every create/update.
//! - New items always start as `Pending` with `created_at == updated_at`.
//! - Service APIs never bypass store validation.

use crate::clock::Clock;
use crate::filter::{self, FilterSpec, InvalidFilterError, PaginatedResult, MIN_PAGE_SIZE};
use crate::model::id::{self, IdGenerationError, TodoId};
use crate::model::todo::{
    to_stored_precision, TodoItem, TodoItemView, TodoStatus, TodoValidationError,
};
use crate::repo::todo_repo::{StoreError, TodoStore};
use chrono::{NaiveDate, NaiveDateTime};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for todo use-cases.
#[derive(Debug)]
pub enum TodoServiceError {
    /// Field-level validation failure.
    Validation(TodoValidationError),
    /// Due date lies before today.
    DueDateInPast { due: NaiveDate, today: NaiveDate },
    /// Another item already uses this title.
    DuplicateTitle(String),
    /// Updates must carry a non-blank description.
    DescriptionRequired,
    NotFound(TodoId),
    InvalidFilter(InvalidFilterError),
    IdGeneration(IdGenerationError),
    /// Persistence-layer failure.
    Store(StoreError),
}

impl Display for TodoServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DueDateInPast { due, today } => {
                write!(f, "due date {due} is before today ({today})")
            }
            Self::DuplicateTitle(title) => {
                write!(f, "todo item with title `{title}` already exists")
            }
            Self::DescriptionRequired => write!(f, "description must not be empty on update"),
            Self::NotFound(id) => write!(f, "todo item not found: {id}"),
            Self::InvalidFilter(err) => write!(f, "{err}"),
            Self::IdGeneration(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TodoServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidFilter(err) => Some(err),
            Self::IdGeneration(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for TodoServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Validation(err) => Self::Validation(err),
            other => Self::Store(other),
        }
    }
}

impl From<TodoValidationError> for TodoServiceError {
    fn from(value: TodoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<InvalidFilterError> for TodoServiceError {
    fn from(value: InvalidFilterError) -> Self {
        Self::InvalidFilter(value)
    }
}

impl From<IdGenerationError> for TodoServiceError {
    fn from(value: IdGenerationError) -> Self {
        Self::IdGeneration(value)
    }
}

pub type ServiceResult<T> = Result<T, TodoServiceError>;

/// Input for creating an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTodoRequest {
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDateTime,
}

/// Full replacement of the user-editable fields of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTodoRequest {
    pub id: TodoId,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDateTime,
    pub status: TodoStatus,
}

/// Use-case facade over a todo store.
pub struct TodoService<R: TodoStore, C: Clock> {
    repo: R,
    clock: C,
}

impl<R: TodoStore, C: Clock> TodoService<R, C> {
    pub fn new(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Creates a pending item.
    ///
    /// # Errors
    /// - `DuplicateTitle` when the title is taken.
    /// - `DueDateInPast` when the due date is before today.
    /// - `Validation` for empty titles or oversized descriptions.
    pub fn create(&self, request: CreateTodoRequest) -> ServiceResult<TodoItemView> {
        let now = self.clock.now();
        ensure_not_past(request.due_date, now)?;
        if self.repo.exists_by_title(&request.title, None)? {
            return Err(TodoServiceError::DuplicateTitle(request.title));
        }

        let item = TodoItem::new_pending(
            id::generate_for(now)?,
            request.title,
            request.description,
            request.due_date,
            now,
        );
        item.validate()?;
        self.repo.add(&item)?;

        info!("event=todo_create module=service status=ok item_id={}", item.id);
        Ok(TodoItemView::from(&item))
    }

    /// Replaces title, description, due date and status of an item.
    ///
    /// Any status may be set, including reverting `Overdue` to `Pending`.
    ///
    /// # Errors
    /// - `NotFound` when no item has `request.id`.
    /// - `DuplicateTitle` when another item uses the title.
    /// - `DueDateInPast` when the due date is before today.
    /// - `DescriptionRequired` when the description is missing or blank.
    /// - `Validation` for empty titles or oversized descriptions.
    pub fn update(&self, request: UpdateTodoRequest) -> ServiceResult<TodoItem> {
        let now = to_stored_precision(self.clock.now());
        let existing = self
            .repo
            .get_by_id(request.id)?
            .ok_or(TodoServiceError::NotFound(request.id))?;

        if self.repo.exists_by_title(&request.title, Some(request.id))? {
            return Err(TodoServiceError::DuplicateTitle(request.title));
        }
        ensure_not_past(request.due_date, now)?;
        if request
            .description
            .as_deref()
            .map_or(true, |description| description.trim().is_empty())
        {
            return Err(TodoServiceError::DescriptionRequired);
        }

        let updated = TodoItem {
            id: existing.id,
            title: request.title,
            description: request.description,
            due_date: to_stored_precision(request.due_date),
            status: request.status,
            created_at: existing.created_at,
            updated_at: now.max(existing.created_at),
        };
        updated.validate()?;
        self.repo.update(&updated)?;

        info!("event=todo_update module=service status=ok item_id={}", updated.id);
        Ok(updated)
    }

    /// Hard-deletes an item.
    pub fn delete(&self, id: TodoId) -> ServiceResult<()> {
        if self.repo.get_by_id(id)?.is_none() {
            return Err(TodoServiceError::NotFound(id));
        }
        self.repo.remove(id)?;
        info!("event=todo_delete module=service status=ok item_id={id}");
        Ok(())
    }

    pub fn get(&self, id: TodoId) -> ServiceResult<Option<TodoItemView>> {
        Ok(self.repo.get_by_id(id)?.map(TodoItemView::from))
    }

    /// Filtered, paginated listing.
    ///
    /// # Errors
    /// - `InvalidFilter` when `page_index < 1` or `page_size < MIN_PAGE_SIZE`.
    pub fn list(&self, spec: &FilterSpec) -> ServiceResult<PaginatedResult<TodoItemView>> {
        spec.validate(MIN_PAGE_SIZE)?;
        let page = filter::apply(&self.repo, spec)?;
        Ok(page.map(TodoItemView::from))
    }
}

fn ensure_not_past(due_date: NaiveDateTime, now: NaiveDateTime) -> ServiceResult<()> {
    if due_date.date() < now.date() {
        return Err(TodoServiceError::DueDateInPast {
            due: due_date.date(),
            today: now.date(),
        });
    }
    Ok(())
}
