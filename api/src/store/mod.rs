//! User persistence.
//!
//! [`Store`] hands out the [`UserRepository`] bound to its backend. Two
//! backends exist: [`sqlstore::SqlStore`] over a SQLite pool and
//! [`teststore::TestStore`] kept in memory. Both run the same validation and
//! hashing before a user is written.

pub mod sqlstore;
pub mod teststore;

use async_trait::async_trait;

use crate::models::user::{User, ValidationErrors};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    RecordNotFound,

    #[error("email: has already been taken")]
    EmailTaken,

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Validates and hashes `user`, writes it, and returns it with the
    /// assigned id.
    async fn create(&self, user: User) -> Result<User, StoreError>;

    async fn find(&self, id: i64) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError>;
}

pub trait Store: Send + Sync {
    fn user(&self) -> &dyn UserRepository;
}

fn prepare(user: &mut User) -> Result<(), StoreError> {
    user.validate()?;
    user.before_create()?;
    Ok(())
}
