//! SurrealDB connection management and repository implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - SurrealDB implementations of every `resman-core` collaborator trait,
//!   including the availability resolver

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use repository::{
    SurrealAllocationRequestRepository, SurrealAssignmentRepository, SurrealAvailabilityResolver,
    SurrealChangeNoteRepository, SurrealEmployeeRepository, SurrealNotifier,
};
pub use schema::{run_migrations, schema_v1};
