//! User validation utilities

use thiserror::Error;

/// Errors that can occur during user validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoginValidationError {
    #[error("Login cannot be empty")]
    Empty,

    #[error("Login exceeds maximum length of {0} characters")]
    TooLong(usize),
}

const MAX_LOGIN_LENGTH: usize = 100;

/// Validate a login name
///
/// Rules:
/// - Cannot be empty or whitespace-only
/// - Maximum 100 characters
pub fn validate_login(login: &str) -> Result<(), LoginValidationError> {
    if login.trim().is_empty() {
        return Err(LoginValidationError::Empty);
    }

    if login.len() > MAX_LOGIN_LENGTH {
        return Err(LoginValidationError::TooLong(MAX_LOGIN_LENGTH));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_logins() {
        assert!(validate_login("alice").is_ok());
        assert!(validate_login("user@example.com").is_ok());
        assert!(validate_login("a").is_ok());
    }

    #[test]
    fn test_empty_login() {
        assert_eq!(validate_login(""), Err(LoginValidationError::Empty));
        assert_eq!(validate_login("   "), Err(LoginValidationError::Empty));
    }

    #[test]
    fn test_login_too_long() {
        let long_login = "a".repeat(101);
        assert_eq!(
            validate_login(&long_login),
            Err(LoginValidationError::TooLong(100))
        );
    }
}
