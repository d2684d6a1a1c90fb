//! Field validation helpers for `tickets`.
//!
//! These routines enforce the boundary input constraints and return
//! structured validation errors without touching storage. Cross-entity
//! reference checks live in the service layer, next to the writes they gate.

use crate::error::{Result, TicketsError, ValidationError};
use crate::model::{CreateIssueInput, UpdateIssueInput};

pub const TITLE_MAX: usize = 255;
pub const TAG_NAME_MAX: usize = 50;
pub const PASSWORD_MIN: usize = 6;

/// Validate an issue title (1-255 chars).
pub fn validate_title(title: &str, errors: &mut Vec<ValidationError>) {
    if title.is_empty() {
        errors.push(ValidationError::new("title", "cannot be empty"));
    }
    if title.chars().count() > TITLE_MAX {
        errors.push(ValidationError::new("title", "exceeds 255 characters"));
    }
}

/// Validate a tag name (1-50 chars).
///
/// # Errors
///
/// Returns a `Validation` error when the name is empty or too long.
pub fn validate_tag_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TicketsError::validation("name", "cannot be empty"));
    }
    if name.chars().count() > TAG_NAME_MAX {
        return Err(TicketsError::validation("name", "exceeds 50 characters"));
    }
    Ok(())
}

/// Validate an email address.
///
/// Shape check only: one `@` with a non-empty local part and a domain
/// containing a dot. Deliverability is not this layer's concern.
///
/// # Errors
///
/// Returns a `Validation` error when the address is malformed.
pub fn validate_email(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(TicketsError::validation("email", "invalid email address"))
    }
}

/// Validate a registration password (minimum 6 chars).
///
/// # Errors
///
/// Returns a `Validation` error when the password is too short.
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(TicketsError::validation(
            "password",
            "must be at least 6 characters",
        ));
    }
    Ok(())
}

/// Validate issue-creation input fields, collecting all errors.
///
/// # Errors
///
/// Returns one error carrying every field violation found.
pub fn validate_create_issue(input: &CreateIssueInput) -> Result<()> {
    let mut errors = Vec::new();
    validate_title(&input.title, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TicketsError::from_validation_errors(errors))
    }
}

/// Validate issue-update input fields, collecting all errors.
///
/// # Errors
///
/// Returns one error carrying every field violation found.
pub fn validate_update_issue(input: &UpdateIssueInput) -> Result<()> {
    let mut errors = Vec::new();
    if let Some(ref title) = input.title {
        validate_title(title, &mut errors);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TicketsError::from_validation_errors(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_boundaries() {
        let mut errors = Vec::new();
        validate_title(&"x".repeat(255), &mut errors);
        assert!(errors.is_empty());

        validate_title(&"x".repeat(256), &mut errors);
        assert_eq!(errors.len(), 1);

        errors.clear();
        validate_title("", &mut errors);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn tag_name_boundaries() {
        assert!(validate_tag_name("bug").is_ok());
        assert!(validate_tag_name(&"x".repeat(50)).is_ok());
        assert!(validate_tag_name(&"x".repeat(51)).is_err());
        assert!(validate_tag_name("").is_err());
    }

    #[test]
    fn email_shapes() {
        assert!(validate_email("a@example.com").is_ok());
        assert!(validate_email("a.b+c@sub.example.org").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@nodot").is_err());
        assert!(validate_email("a@.com").is_err());
        assert!(validate_email("a b@example.com").is_err());
    }

    #[test]
    fn password_minimum() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("short").is_err());
    }
}
