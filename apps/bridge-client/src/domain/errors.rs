//! Domain validation errors.

/// Errors raised while constructing domain values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Invalid value for a field.
    #[error("invalid {field}: {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },
}

impl DomainError {
    /// Shorthand for [`DomainError::InvalidValue`].
    #[must_use]
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
