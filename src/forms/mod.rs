//! Form definitions and form-error handling for the order views.

use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::types::TypeConstraintError;

pub mod orders;
pub mod validation;

#[derive(Debug, Error)]
/// Errors that can occur when processing form data.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("malformed query string: {0}")]
    MalformedQuery(String),

    #[error("invalid status")]
    InvalidStatus,

    #[error(transparent)]
    TypeConstraint(#[from] TypeConstraintError),
}
