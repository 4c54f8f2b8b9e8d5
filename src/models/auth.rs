use std::fmt;
use std::fmt::{Display, Formatter};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_derive::{Deserialize, Serialize};

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Serialize, Debug)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Deserialize, Debug)]
pub struct TokenData {
    pub token: String,
}

/// Account fields submitted to `/auth/register`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupField {
    Name,
    Email,
    Password,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: SignupField,
    pub message: &'static str,
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl SignupForm {
    pub fn new<S: Into<String>>(name: S, email: S, password: S) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Presence and format checks only; every failing field is reported.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        static EMAIL: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^[a-zA-Z0-9._-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
        });

        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError { field: SignupField::Name, message: "Name is required" });
        }
        if !EMAIL.is_match(&self.email) {
            errors.push(FieldError { field: SignupField::Email, message: "Please enter a valid email address" });
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.push(FieldError { field: SignupField::Password, message: "Password must be at least 6 characters" });
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
