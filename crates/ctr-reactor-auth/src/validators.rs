//! Input validation for signup: email format and password policy.

use ctr_reactor_core::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});

/// Longest accepted email address.
const MAX_EMAIL_LENGTH: usize = 254;
/// Longest accepted display name.
const MAX_NAME_LENGTH: usize = 150;

/// Validates an already-normalized email address.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::new("Email is required.", "required").for_field("email"));
    }
    if email.len() > MAX_EMAIL_LENGTH || !EMAIL_RE.is_match(email) {
        return Err(
            ValidationError::new("Enter a valid email address.", "invalid_email").for_field("email"),
        );
    }
    Ok(())
}

/// Validates an optional display name.
pub fn validate_name(name: Option<&str>) -> Result<(), ValidationError> {
    match name {
        Some(name) if name.chars().count() > MAX_NAME_LENGTH => Err(ValidationError::new(
            format!("Name must be at most {MAX_NAME_LENGTH} characters."),
            "name_too_long",
        )
        .for_field("name")),
        _ => Ok(()),
    }
}

/// A single password policy rule.
pub trait PasswordValidator: Send + Sync {
    /// Validates a password, returning an error message if it fails.
    fn validate(&self, password: &str) -> Result<(), String>;
}

/// Validates that a password meets a minimum length requirement.
#[derive(Debug, Clone)]
pub struct MinimumLengthValidator {
    /// The minimum allowed password length, in characters.
    pub min_length: usize,
}

impl Default for MinimumLengthValidator {
    fn default() -> Self {
        Self { min_length: 8 }
    }
}

impl PasswordValidator for MinimumLengthValidator {
    fn validate(&self, password: &str) -> Result<(), String> {
        if password.chars().count() < self.min_length {
            Err(format!(
                "This password is too short. It must contain at least {} characters.",
                self.min_length
            ))
        } else {
            Ok(())
        }
    }
}

/// Rejects passwords from a built-in list of commonly used passwords.
#[derive(Debug, Clone)]
pub struct CommonPasswordValidator {
    common_passwords: Vec<&'static str>,
}

impl Default for CommonPasswordValidator {
    fn default() -> Self {
        Self {
            common_passwords: vec![
                "password", "password1", "password123", "12345678", "123456789",
                "1234567890", "qwerty123", "qwertyuiop", "iloveyou", "sunshine",
                "princess", "football", "baseball", "welcome1", "letmein1",
                "trustno1", "superman", "starwars", "whatever", "passw0rd",
                "abc12345", "11111111", "00000000", "admin123", "changeme",
            ],
        }
    }
}

impl PasswordValidator for CommonPasswordValidator {
    fn validate(&self, password: &str) -> Result<(), String> {
        let lower = password.to_lowercase();
        if self.common_passwords.iter().any(|p| *p == lower) {
            Err("This password is too common.".to_string())
        } else {
            Ok(())
        }
    }
}

/// Rejects passwords made only of digits.
#[derive(Debug, Clone, Default)]
pub struct NumericPasswordValidator;

impl PasswordValidator for NumericPasswordValidator {
    fn validate(&self, password: &str) -> Result<(), String> {
        if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
            Err("This password is entirely numeric.".to_string())
        } else {
            Ok(())
        }
    }
}

/// Validates a password against the signup policy.
///
/// All rule failures are reported together, joined into one message.
pub fn validate_password(password: &str, min_length: usize) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(
            ValidationError::new("Password is required.", "required").for_field("password"),
        );
    }

    let validators: Vec<Box<dyn PasswordValidator>> = vec![
        Box::new(MinimumLengthValidator { min_length }),
        Box::new(CommonPasswordValidator::default()),
        Box::new(NumericPasswordValidator),
    ];

    let errors: Vec<String> = validators
        .iter()
        .filter_map(|v| v.validate(password).err())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(errors.join(" "), "weak_password")
            .for_field("password")
            .with_param("min_length", min_length.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_accepts_common_forms() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.co").is_ok());
    }

    #[test]
    fn test_validate_email_rejects_garbage() {
        for bad in ["", "plain", "a@b", "@b.com", "a b@c.com", "a@b.c"] {
            assert!(validate_email(bad).is_err(), "accepted {bad:?}");
        }
        let err = validate_email("nope").unwrap_err();
        assert_eq!(err.code, "invalid_email");
        assert_eq!(err.field.as_deref(), Some("email"));
    }

    #[test]
    fn test_validate_email_too_long() {
        let email = format!("{}@example.com", "a".repeat(250));
        assert!(validate_email(&email).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name(None).is_ok());
        assert!(validate_name(Some("Ada")).is_ok());
        assert!(validate_name(Some(&"x".repeat(151))).is_err());
    }

    #[test]
    fn test_minimum_length() {
        let v = MinimumLengthValidator { min_length: 8 };
        assert!(v.validate("short").is_err());
        assert!(v.validate("longenough").is_ok());
        // Counts characters, not bytes.
        assert!(v.validate("ééééééé").is_err());
    }

    #[test]
    fn test_common_password() {
        let v = CommonPasswordValidator::default();
        assert!(v.validate("Password1").is_err());
        assert!(v.validate("unusual-phrase-42").is_ok());
    }

    #[test]
    fn test_numeric_password() {
        assert!(NumericPasswordValidator.validate("12345678901").is_err());
        assert!(NumericPasswordValidator.validate("1234abcd").is_ok());
    }

    #[test]
    fn test_validate_password_collects_all_failures() {
        let err = validate_password("1234", 8).unwrap_err();
        assert!(err.message.contains("too short"));
        assert!(err.message.contains("entirely numeric"));
        assert_eq!(err.code, "weak_password");
    }

    #[test]
    fn test_validate_password_empty_is_required() {
        let err = validate_password("", 8).unwrap_err();
        assert_eq!(err.code, "required");
    }

    #[test]
    fn test_validate_password_ok() {
        assert!(validate_password("correct horse battery", 8).is_ok());
    }
}
