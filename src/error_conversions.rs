//! Error conversion glue between layers.
//!
//! The domain and form layers must not depend on service error types, so the
//! `From` impls that lift their errors into [`ServiceError`] live here.

use crate::domain::types::TypeConstraintError;
use crate::forms::FormError;
use crate::services::ServiceError;

impl From<TypeConstraintError> for ServiceError {
    fn from(val: TypeConstraintError) -> Self {
        ServiceError::TypeConstraint(val.to_string())
    }
}

impl From<FormError> for ServiceError {
    fn from(val: FormError) -> Self {
        match val {
            FormError::TypeConstraint(e) => e.into(),
            other => ServiceError::Form(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_type_constraint_maps_to_service_type_constraint() {
        let err: ServiceError = FormError::TypeConstraint(TypeConstraintError::NonPositiveId).into();
        assert!(matches!(err, ServiceError::TypeConstraint(_)));

        let err: ServiceError = FormError::InvalidStatus.into();
        assert_eq!(err, ServiceError::Form("invalid status".to_string()));
    }
}
