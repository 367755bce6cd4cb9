//! Field-level validation helpers
//!
//! Format checks applied before user registration payloads leave the
//! client. Pure predicates plus `check_*` wrappers that produce
//! [`Error::Validation`].

use crate::error::{Error, Result};

/// Whether a string looks like an email address
///
/// One `@`, non-empty local part, dotted domain.
pub fn is_valid_email(value: &str) -> bool {
    let mut parts = value.splitn(2, '@');
    let (Some(local), Some(domain)) = (parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty() && !value.contains(char::is_whitespace)
}

/// Whether a string is a phone number
///
/// Global form: `+` followed by 6 or more digits. Local form: 7 or more
/// digits.
pub fn is_valid_phone(value: &str) -> bool {
    match value.strip_prefix('+') {
        Some(digits) => digits.len() >= 6 && digits.chars().all(|c| c.is_ascii_digit()),
        None => value.len() >= 7 && value.chars().all(|c| c.is_ascii_digit()),
    }
}

/// Whether a string is an acceptable password
///
/// Printable ASCII, 4 to 50 characters.
pub fn is_valid_password(value: &str) -> bool {
    (4..=50).contains(&value.len()) && value.chars().all(|c| (' '..='~').contains(&c))
}

/// Validate an email address
pub fn check_email(value: &str) -> Result<()> {
    if is_valid_email(value) {
        Ok(())
    } else {
        Err(Error::Validation(format!("invalid email address: {value}")))
    }
}

/// Validate a phone number
pub fn check_phone(value: &str) -> Result<()> {
    if is_valid_phone(value) {
        Ok(())
    } else {
        Err(Error::Validation(format!("invalid phone number: {value}")))
    }
}

/// Validate a password
pub fn check_password(value: &str) -> Result<()> {
    if is_valid_password(value) {
        Ok(())
    } else {
        Err(Error::Validation(
            "password must be 4-50 printable ASCII characters".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(is_valid_email("a@example.com"));
        assert!(is_valid_email("first.last@sub.example.co"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("a b@example.com"));
    }

    #[test]
    fn test_phone() {
        assert!(is_valid_phone("+4915123456"));
        assert!(is_valid_phone("0891234567"));
        assert!(!is_valid_phone("+123"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("+49-151-23456"));
        assert!(!is_valid_phone("phone"));
    }

    #[test]
    fn test_password() {
        assert!(is_valid_password("abcd"));
        assert!(is_valid_password("correct horse battery"));
        assert!(!is_valid_password("abc"));
        assert!(!is_valid_password(&"x".repeat(51)));
        assert!(!is_valid_password("pässwörter"));
    }

    #[test]
    fn test_check_wrappers() {
        assert!(check_email("a@example.com").is_ok());
        assert!(matches!(check_email("bad"), Err(Error::Validation(_))));
        assert!(matches!(check_phone("bad"), Err(Error::Validation(_))));
        assert!(matches!(check_password("x"), Err(Error::Validation(_))));
    }
}
