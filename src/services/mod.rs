use thiserror::Error;

use crate::repository::errors::BackendError;

pub mod errors;
pub mod notifications;
pub mod orders;

/// Errors surfaced to callers of the service layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ServiceError {
    /// Required view context (acting user, batch) is not available yet.
    #[error("{0} is not available yet")]
    ContextNotReady(&'static str),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("type constraint violation: {0}")]
    TypeConstraint(String),

    #[error("invalid form: {0}")]
    Form(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
