//! Core domain logic for the todo tracker.
//! This crate is the single source of truth for item invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod filter;
pub mod logging;
pub mod model;
pub mod notify;
pub mod reconcile;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use filter::{FilterSpec, InvalidFilterError, PaginatedResult, MIN_PAGE_SIZE};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::id::{IdGenerationError, TodoId};
pub use model::todo::{TodoItem, TodoItemView, TodoStatus, TodoValidationError};
pub use notify::{BroadcastNotifier, Notification, Notifier, TODO_UPDATED_TOPIC};
pub use reconcile::{
    CycleReport, Latch, LatchHandle, LoopSummary, Reconciler, ReconcilerConfig,
};
pub use repo::todo_repo::{
    SqliteTodoRepository, StoreError, StoreResult, TodoOrder, TodoPredicate, TodoQuery, TodoStore,
};
pub use service::seed::seed_sample_items;
pub use service::todo_service::{
    CreateTodoRequest, TodoService, TodoServiceError, UpdateTodoRequest,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
