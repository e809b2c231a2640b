//! Store contracts and persistence implementations.
//!
//! # Responsibility
//! - Define the item store contract consumed by services, the filter engine
//!   and the reconciler.
//! - Isolate SQLite query details from orchestration code.
//!
//! # Invariants
//! - Store writes enforce `TodoItem::validate()` before persistence.
//! - Store APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod todo_repo;
