// User accounts and their API-facing shapes

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::validation::{check_text, ValidationErrors, BLANK, REQUIRED};

pub const MIN_PASSWORD_LENGTH: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.email)
    }
}

/// A user about to be inserted; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    /// `Some(false)` deactivates the account; its token stops working
    pub is_active: Option<bool>,
}

/// Public view of a user. The password never leaves the service.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub email: String,
    pub name: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Lowercases the domain part of an address, leaving the local part as typed.
pub fn normalize_email(email: &str) -> String {
    let email: &str = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_owned(),
    }
}

pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && !email.chars().any(char::is_whitespace)
        && (domain == "localhost"
            || (domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Validated account fields; the password is still in clear text here
#[derive(Debug, Default)]
pub struct AccountFields {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

fn check_email(errors: &mut ValidationErrors, email: Option<String>, required: bool) -> Option<String> {
    let email: String = check_text(errors, "email", email, required, false)?;
    if is_valid_email(&email) {
        Some(normalize_email(&email))
    } else {
        errors.add("email", "Enter a valid email address.");
        None
    }
}

fn check_password(errors: &mut ValidationErrors, password: Option<String>, required: bool) -> Option<String> {
    match password {
        None => {
            if required {
                errors.add("password", REQUIRED);
            }
            None
        }
        Some(password) if password.is_empty() => {
            errors.add("password", BLANK);
            None
        }
        Some(password) if password.chars().count() < MIN_PASSWORD_LENGTH => {
            errors.add(
                "password",
                format!("Ensure this field has at least {MIN_PASSWORD_LENGTH} characters."),
            );
            None
        }
        Some(password) => Some(password),
    }
}

impl CreateUserRequest {
    pub fn validate(self) -> Result<AccountFields, ValidationErrors> {
        let mut errors: ValidationErrors = ValidationErrors::new();
        let fields: AccountFields = AccountFields {
            email: check_email(&mut errors, self.email, true),
            password: check_password(&mut errors, self.password, true),
            name: check_text(&mut errors, "name", self.name, true, false),
        };
        errors.finish(fields)
    }
}

impl UpdateUserRequest {
    pub fn validate(self) -> Result<AccountFields, ValidationErrors> {
        let mut errors: ValidationErrors = ValidationErrors::new();
        let fields: AccountFields = AccountFields {
            email: check_email(&mut errors, self.email, false),
            password: check_password(&mut errors, self.password, false),
            name: check_text(&mut errors, "name", self.name, false, false),
        };
        errors.finish(fields)
    }
}
