//! Error types for the Systiva access-control engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SystivaError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Scope violation: {message}")]
    ScopeViolation { message: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SystivaError {
    /// Shorthand for the not-found variant.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        SystivaError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// True when the error means "the record is absent", as opposed to a
    /// failure reaching the store. Readers tolerate absence (dangling
    /// references read as "removed"); store failures always propagate.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SystivaError::NotFound { .. })
    }
}

pub type SystivaResult<T> = Result<T, SystivaError>;
