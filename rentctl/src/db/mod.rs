//! PostgreSQL persistence: database models, repositories and error classification.
//!
//! Repositories borrow a `&mut PgConnection` (usually the connection of an open transaction) and
//! expose one method per statement. The [`crate::store::postgres`] backend composes them into
//! store transactions.

pub mod errors;
pub mod handlers;
pub mod models;
