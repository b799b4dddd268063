//! Database models
//!
//! Each model is a `sqlx::FromRow` struct with associated async functions for
//! its database operations, following one-module-per-entity layout.

pub mod attachment;
pub mod comment;
pub mod invitation;
pub mod membership;
pub mod project;
pub mod task;
pub mod user;
