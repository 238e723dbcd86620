//! Database-specific error types and conversions.

use resman_core::error::ResmanError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Stored value could not be decoded: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<DbError> for ResmanError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ResmanError::NotFound { entity, id },
            other => ResmanError::CollaboratorUnavailable(other.to_string()),
        }
    }
}
