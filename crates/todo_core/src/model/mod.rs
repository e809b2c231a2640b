//! Domain model definitions for core business entities.
//!
//! # Responsibility
//! - Define the todo item record, its status set and its exposed view.
//! - Define the time-sortable identifier scheme.
//!
//! # Invariants
//! - Model types must stay storage-agnostic.

pub mod id;
pub mod todo;
