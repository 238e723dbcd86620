//! Error types for the resource allocation system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResmanError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Invalid state transition: cannot {action} from {from}")]
    InvalidStateTransition { from: String, action: String },

    /// An external collaborator (persistence, availability lookup) failed.
    /// Retrying is left to the caller.
    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResmanError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

pub type ResmanResult<T> = Result<T, ResmanError>;
