use thiserror::Error;

use crate::domain::user::UserId;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    /// The targeted identifier has no corresponding record.
    #[error("User with id {id} not found.")]
    UserNotFound { id: UserId },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Unclassified store-level failure. The original cause is kept as a
    /// structured source so diagnostics see the full chain.
    #[error("Operation failed: {message}")]
    OperationFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl DomainError {
    pub fn user_not_found(id: UserId) -> Self {
        Self::UserNotFound { id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::OperationFailed {
            message: message.into(),
            source: None,
        }
    }

    pub fn operation_failed_with(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::OperationFailed {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_not_found_message() {
        let error = DomainError::user_not_found(UserId::new(42));
        assert_eq!(error.to_string(), "User with id 42 not found.");
    }

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("Login cannot be empty");
        assert_eq!(error.to_string(), "Validation error: Login cannot be empty");
    }

    #[test]
    fn test_operation_failed_keeps_source() {
        let cause = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
        let error = DomainError::operation_failed_with("Failed to commit transaction", cause);

        assert_eq!(
            error.to_string(),
            "Operation failed: Failed to commit transaction"
        );

        let source = std::error::Error::source(&error).expect("source should be preserved");
        assert_eq!(source.to_string(), "connection reset");
    }

    #[test]
    fn test_operation_failed_without_source() {
        let error = DomainError::operation_failed("injected failure");
        assert!(std::error::Error::source(&error).is_none());
    }
}
