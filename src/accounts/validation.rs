use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AccountError;

pub const MIN_PASSWORD_LEN: usize = 7;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trims and lower-cases the address, then checks its shape.
pub fn email(raw: &str) -> Result<String, AccountError> {
    let email = normalize_email(raw);
    if !is_valid_email(&email) {
        return Err(AccountError::Validation(
            "A valid email is required.".into(),
        ));
    }
    Ok(email)
}

pub fn name(raw: &str, field: &str) -> Result<String, AccountError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AccountError::Validation(format!(
            "Please provide a {}.",
            field
        )));
    }
    Ok(name.to_string())
}

/// At least MIN_PASSWORD_LEN characters with an uppercase letter, a digit and a
/// symbol.
pub fn password(raw: &str) -> Result<(), AccountError> {
    let long_enough = raw.chars().count() >= MIN_PASSWORD_LEN;
    let upper = raw.chars().any(|c| c.is_uppercase());
    let digit = raw.chars().any(|c| c.is_ascii_digit());
    let symbol = raw.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace());
    if long_enough && upper && digit && symbol {
        Ok(())
    } else {
        Err(AccountError::Validation(format!(
            "Password must be at least {} characters and contain an uppercase letter, a number and a special character.",
            MIN_PASSWORD_LEN
        )))
    }
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn test_email() {
        assert_eq!(email("  Ann@Example.COM ").unwrap(), "ann@example.com");
        assert!(email("ann@example").is_err());
        assert!(email("not an email").is_err());
    }

    #[test]
    fn test_name() {
        assert_eq!(name(" Ann ", "first name").unwrap(), "Ann");
        let err = name("   ", "last name").unwrap_err();
        assert_eq!(err.user_message(), "Please provide a last name.");
    }

    #[test]
    fn test_password_policy() {
        assert!(password("Secr3t!").is_ok());
        assert!(password("secr3t!").is_err());
        assert!(password("Secret!").is_err());
        assert!(password("Secr3tt").is_err());
        assert!(password("S3t!").is_err());
    }
}
