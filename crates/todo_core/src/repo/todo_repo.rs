//! Todo item store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and filtered reads over canonical `todo_items` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `TodoItem::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Each write is independently atomic; no cross-item transaction is taken.
//! - Concurrent writes to the same item are last-write-wins.

use crate::db::DbError;
use crate::model::id::TodoId;
use crate::model::todo::{TodoItem, TodoStatus, TodoValidationError};
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Storage format for timestamps. Fixed width, so text order is time order.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
const DATE_FORMAT: &str = "%Y-%m-%d";

const TODO_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    due_date,
    status,
    created_at,
    updated_at
FROM todo_items";

pub type StoreResult<T> = Result<T, StoreError>;

/// Store error for todo persistence and query operations.
#[derive(Debug)]
pub enum StoreError {
    Validation(TodoValidationError),
    Db(DbError),
    NotFound(TodoId),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "todo item not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted todo data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<TodoValidationError> for StoreError {
    fn from(value: TodoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// AND-combined item predicate. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPredicate {
    /// Exact status match.
    pub status: Option<TodoStatus>,
    /// Keep items whose `created_at` date is on or before this date.
    pub created_on_or_before: Option<NaiveDate>,
    /// Keep items whose `due_date` date is on or before this date.
    pub due_on_or_before: Option<NaiveDate>,
    /// Case-sensitive substring of the title.
    pub title_contains: Option<String>,
}

impl TodoPredicate {
    /// In-process evaluation with the same semantics as the SQL translation.
    pub fn matches(&self, item: &TodoItem) -> bool {
        self.status.map_or(true, |status| item.status == status)
            && self
                .created_on_or_before
                .map_or(true, |bound| item.created_at.date() <= bound)
            && self
                .due_on_or_before
                .map_or(true, |bound| item.due_date.date() <= bound)
            && self
                .title_contains
                .as_deref()
                .map_or(true, |needle| item.title.contains(needle))
    }

    fn push_sql(&self, sql: &mut String, bind_values: &mut Vec<Value>) {
        sql.push_str(" WHERE 1 = 1");
        if let Some(status) = self.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(bound) = self.created_on_or_before {
            sql.push_str(" AND substr(created_at, 1, 10) <= ?");
            bind_values.push(Value::Text(bound.format(DATE_FORMAT).to_string()));
        }
        if let Some(bound) = self.due_on_or_before {
            sql.push_str(" AND substr(due_date, 1, 10) <= ?");
            bind_values.push(Value::Text(bound.format(DATE_FORMAT).to_string()));
        }
        if let Some(needle) = self.title_contains.as_deref() {
            sql.push_str(" AND instr(title, ?) > 0");
            bind_values.push(Value::Text(needle.to_string()));
        }
    }
}

/// Result ordering. Every variant ends with `id DESC` so order is total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TodoOrder {
    /// `created_at DESC, id DESC`.
    #[default]
    CreatedDesc,
    /// `due_date DESC, created_at DESC, id DESC`.
    DueDateDesc,
}

impl TodoOrder {
    fn sql(self) -> &'static str {
        match self {
            Self::CreatedDesc => " ORDER BY created_at DESC, id DESC",
            Self::DueDateDesc => " ORDER BY due_date DESC, created_at DESC, id DESC",
        }
    }
}

/// Filtered, ordered and windowed read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoQuery {
    pub predicate: TodoPredicate,
    pub order: TodoOrder,
    pub limit: Option<u32>,
    pub offset: u64,
}

/// Durable collection of todo items.
pub trait TodoStore: Send + Sync {
    /// Returns every item under the default ordering.
    fn get_all(&self) -> StoreResult<Vec<TodoItem>>;
    fn query(&self, query: &TodoQuery) -> StoreResult<Vec<TodoItem>>;
    fn count(&self, predicate: &TodoPredicate) -> StoreResult<u64>;
    fn get_by_id(&self, id: TodoId) -> StoreResult<Option<TodoItem>>;
    fn add(&self, item: &TodoItem) -> StoreResult<()>;
    /// Replaces every field of an existing item.
    fn update(&self, item: &TodoItem) -> StoreResult<()>;
    fn remove(&self, id: TodoId) -> StoreResult<()>;
    fn exists_by_title(&self, title: &str, exclude_id: Option<TodoId>) -> StoreResult<bool>;
}

impl<S: TodoStore + ?Sized> TodoStore for std::sync::Arc<S> {
    fn get_all(&self) -> StoreResult<Vec<TodoItem>> {
        (**self).get_all()
    }
    fn query(&self, query: &TodoQuery) -> StoreResult<Vec<TodoItem>> {
        (**self).query(query)
    }
    fn count(&self, predicate: &TodoPredicate) -> StoreResult<u64> {
        (**self).count(predicate)
    }
    fn get_by_id(&self, id: TodoId) -> StoreResult<Option<TodoItem>> {
        (**self).get_by_id(id)
    }
    fn add(&self, item: &TodoItem) -> StoreResult<()> {
        (**self).add(item)
    }
    fn update(&self, item: &TodoItem) -> StoreResult<()> {
        (**self).update(item)
    }
    fn remove(&self, id: TodoId) -> StoreResult<()> {
        (**self).remove(id)
    }
    fn exists_by_title(&self, title: &str, exclude_id: Option<TodoId>) -> StoreResult<bool> {
        (**self).exists_by_title(title, exclude_id)
    }
}

/// SQLite-backed todo store.
///
/// The connection is guarded by a mutex so the store can be shared between
/// request paths and the reconciler.
pub struct SqliteTodoRepository {
    conn: Mutex<Connection>,
}

impl SqliteTodoRepository {
    /// Wraps a migrated connection (see `crate::db::open_db`).
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Runs `f` with exclusive access to the underlying connection.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        let conn = self.conn.lock();
        f(&conn)
    }
}

impl TodoStore for SqliteTodoRepository {
    fn get_all(&self) -> StoreResult<Vec<TodoItem>> {
        self.query(&TodoQuery::default())
    }

    fn query(&self, query: &TodoQuery) -> StoreResult<Vec<TodoItem>> {
        let mut sql = TODO_SELECT_SQL.to_string();
        let mut bind_values: Vec<Value> = Vec::new();
        query.predicate.push_sql(&mut sql, &mut bind_values);
        sql.push_str(query.order.sql());

        sql.push_str(" LIMIT ? OFFSET ?");
        bind_values.push(Value::Integer(query.limit.map_or(-1, i64::from)));
        bind_values.push(Value::Integer(
            i64::try_from(query.offset).unwrap_or(i64::MAX),
        ));

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_todo_row(row)?);
        }
        Ok(items)
    }

    fn count(&self, predicate: &TodoPredicate) -> StoreResult<u64> {
        let mut sql = "SELECT COUNT(*) FROM todo_items".to_string();
        let mut bind_values: Vec<Value> = Vec::new();
        predicate.push_sql(&mut sql, &mut bind_values);

        let conn = self.conn.lock();
        let count: i64 = conn.query_row(&sql, params_from_iter(bind_values), |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("negative row count `{count}`")))
    }

    fn get_by_id(&self, id: TodoId) -> StoreResult<Option<TodoItem>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("{TODO_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_todo_row(row)?)),
            None => Ok(None),
        }
    }

    fn add(&self, item: &TodoItem) -> StoreResult<()> {
        item.validate()?;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO todo_items (
                id,
                title,
                description,
                due_date,
                status,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                item.id.to_string(),
                item.title.as_str(),
                item.description.as_deref(),
                format_datetime(item.due_date),
                item.status.as_str(),
                format_datetime(item.created_at),
                format_datetime(item.updated_at),
            ],
        )?;
        Ok(())
    }

    fn update(&self, item: &TodoItem) -> StoreResult<()> {
        item.validate()?;

        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE todo_items
             SET
                title = ?1,
                description = ?2,
                due_date = ?3,
                status = ?4,
                created_at = ?5,
                updated_at = ?6
             WHERE id = ?7;",
            params![
                item.title.as_str(),
                item.description.as_deref(),
                format_datetime(item.due_date),
                item.status.as_str(),
                format_datetime(item.created_at),
                format_datetime(item.updated_at),
                item.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(item.id));
        }
        Ok(())
    }

    fn remove(&self, id: TodoId) -> StoreResult<()> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM todo_items WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn exists_by_title(&self, title: &str, exclude_id: Option<TodoId>) -> StoreResult<bool> {
        let conn = self.conn.lock();
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM todo_items
                 WHERE title = ?1
                   AND (?2 IS NULL OR id <> ?2)
                 LIMIT 1;",
                params![title, exclude_id.map(|id| id.to_string())],
                |row| row.get(0),
            )
            .optional()?;
        Ok(exists.is_some())
    }
}

/// Formats a timestamp in storage format.
pub fn format_datetime(value: NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

fn parse_datetime(value: &str, column: &str) -> StoreResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT).map_err(|_| {
        StoreError::InvalidData(format!("invalid timestamp `{value}` in todo_items.{column}"))
    })
}

fn parse_todo_row(row: &Row<'_>) -> StoreResult<TodoItem> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        StoreError::InvalidData(format!("invalid id value `{id_text}` in todo_items.id"))
    })?;

    let status_text: String = row.get("status")?;
    let status = TodoStatus::parse(&status_text).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid status `{status_text}` in todo_items.status"
        ))
    })?;

    let due_date: String = row.get("due_date")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    let item = TodoItem {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        due_date: parse_datetime(&due_date, "due_date")?,
        status,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    };
    item.validate()?;
    Ok(item)
}
