//! Field-scoped form validation.
//!
//! Validation runs before any request is made. A form with invalid fields
//! never reaches the backend; every offending field is reported at once so a
//! form can mark all of them.

use std::fmt;

use crate::{Email, Lrn};

/// Minimum password length accepted at signup.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A form field that can carry an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    FirstName,
    LastName,
    Lrn,
    Email,
    Identifier,
    Password,
    ConfirmPassword,
    Title,
    Instructions,
    Question(usize),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstName => f.write_str("first name"),
            Self::LastName => f.write_str("last name"),
            Self::Lrn => f.write_str("LRN"),
            Self::Email => f.write_str("email"),
            Self::Identifier => f.write_str("email or LRN"),
            Self::Password => f.write_str("password"),
            Self::ConfirmPassword => f.write_str("password confirmation"),
            Self::Title => f.write_str("title"),
            Self::Instructions => f.write_str("instructions"),
            Self::Question(index) => write!(f, "question {}", index + 1),
        }
    }
}

/// One invalid field and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// All field errors found in a form. Never empty when returned as an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Record an error against `field`.
    pub fn push(&mut self, field: Field, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Whether no errors were recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The recorded errors, in form order.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// The first error recorded for `field`.
    #[must_use]
    pub fn for_field(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// `Ok(value)` when nothing was recorded, the errors otherwise.
    ///
    /// # Errors
    ///
    /// Returns `self` if any field error was recorded.
    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Raw signup form input.
///
/// Not `Debug`: holds the plaintext password.
#[derive(Clone, Copy)]
pub struct SignupForm<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub lrn: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

/// Signup fields that passed validation. The password stays with the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSignup {
    pub first_name: String,
    pub last_name: String,
    pub lrn: Lrn,
    pub email: Email,
}

impl SignupForm<'_> {
    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns every field error found.
    pub fn validate(&self) -> Result<ValidSignup, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            errors.push(Field::FirstName, "first name is required");
        }
        let last_name = self.last_name.trim();
        if last_name.is_empty() {
            errors.push(Field::LastName, "last name is required");
        }
        let lrn = Lrn::parse(self.lrn)
            .map_err(|e| errors.push(Field::Lrn, e.to_string()))
            .ok();
        let email = Email::parse(self.email)
            .map_err(|e| errors.push(Field::Email, e.to_string()))
            .ok();
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.push(
                Field::Password,
                format!("password must be at least {MIN_PASSWORD_LENGTH} characters"),
            );
        }
        if self.password != self.confirm_password {
            errors.push(Field::ConfirmPassword, "passwords do not match");
        }

        match (lrn, email) {
            (Some(lrn), Some(email)) if errors.is_empty() => Ok(ValidSignup {
                first_name: first_name.to_owned(),
                last_name: last_name.to_owned(),
                lrn,
                email,
            }),
            _ => Err(errors),
        }
    }
}

/// Raw login form input. Not `Debug` for the same reason as [`SignupForm`].
#[derive(Clone, Copy)]
pub struct LoginForm<'a> {
    /// Email address or LRN.
    pub identifier: &'a str,
    pub password: &'a str,
}

impl LoginForm<'_> {
    /// Check that both fields are filled in.
    ///
    /// Returns the trimmed identifier.
    ///
    /// # Errors
    ///
    /// Returns every empty field.
    pub fn validate(&self) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let identifier = self.identifier.trim();
        if identifier.is_empty() {
            errors.push(Field::Identifier, "email or LRN is required");
        }
        if self.password.is_empty() {
            errors.push(Field::Password, "password is required");
        }
        errors.into_result(|| identifier.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> SignupForm<'static> {
        SignupForm {
            first_name: "Andres",
            last_name: "Bonifacio",
            lrn: "136512140001",
            email: "andres@example.com",
            password: "katipunan1896",
            confirm_password: "katipunan1896",
        }
    }

    #[test]
    fn test_valid_signup() {
        let valid = form().validate().unwrap();
        assert_eq!(valid.first_name, "Andres");
        assert_eq!(valid.lrn.as_str(), "136512140001");
    }

    #[test]
    fn test_signup_reports_every_field() {
        let errors = SignupForm {
            first_name: " ",
            last_name: "",
            lrn: "12",
            email: "not-an-email",
            password: "short",
            confirm_password: "different",
        }
        .validate()
        .unwrap_err();

        let fields: Vec<Field> = errors.errors().iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                Field::FirstName,
                Field::LastName,
                Field::Lrn,
                Field::Email,
                Field::Password,
                Field::ConfirmPassword,
            ]
        );
        assert_eq!(errors.for_field(Field::LastName), Some("last name is required"));
    }

    #[test]
    fn test_signup_password_mismatch_only() {
        let errors = SignupForm {
            confirm_password: "katipunan1897",
            ..form()
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        assert!(errors.to_string().starts_with("password confirmation:"));
    }

    #[test]
    fn test_login_requires_both_fields() {
        let errors = LoginForm {
            identifier: "  ",
            password: "",
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.errors().len(), 2);

        let identifier = LoginForm {
            identifier: " 136512140001 ",
            password: "x",
        }
        .validate()
        .unwrap();
        assert_eq!(identifier, "136512140001");
    }
}
