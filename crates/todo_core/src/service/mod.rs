//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into request-level read/write APIs.
//! - Keep outer layers (CLI, future HTTP) decoupled from storage details.

pub mod seed;
pub mod todo_service;
