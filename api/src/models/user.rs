use std::fmt;
use std::sync::LazyLock;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use regex::Regex;
use serde::Serialize;

const PASSWORD_MIN_LEN: usize = 6;
const PASSWORD_MAX_LEN: usize = 100;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("email pattern compiles")
});

/// A registered account.
///
/// Only `id` and `email` are ever serialized; the plaintext password and
/// its hash stay on the server.
#[derive(Debug, Clone, Default, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip)]
    #[sqlx(skip)]
    pub password: String,
    #[serde(skip)]
    pub encrypted_password: String,
}

impl User {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Checks the shape of the email and password, collecting every failing
    /// field. A password is only required while no hash exists.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();

        if self.email.is_empty() {
            errors.push(FieldError::new("email", "cannot be blank"));
        } else if !EMAIL_RE.is_match(&self.email) {
            errors.push(FieldError::new("email", "must be a valid email address"));
        }

        let len = self.password.chars().count();
        if len == 0 {
            if self.encrypted_password.is_empty() {
                errors.push(FieldError::new("password", "cannot be blank"));
            }
        } else if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
            errors.push(FieldError::new(
                "password",
                "the length must be between 6 and 100",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }

    /// Derives `encrypted_password` from the plaintext, if one was given.
    pub fn before_create(&mut self) -> Result<(), argon2::password_hash::Error> {
        if !self.password.is_empty() {
            self.encrypted_password = encrypt_string(&self.password)?;
        }
        Ok(())
    }

    pub fn compare_password(&self, candidate: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.encrypted_password) else {
            return false;
        };
        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed_hash)
            .is_ok()
    }

    pub fn erase_password(&mut self) {
        self.password.clear();
    }
}

fn encrypt_string(s: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(s.as_bytes(), &salt)?
        .to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", join_fields(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|e| e.field)
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
