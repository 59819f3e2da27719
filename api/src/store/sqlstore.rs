use std::sync::OnceLock;

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use super::{prepare, Store, StoreError, UserRepository};
use crate::models::user::User;

pub struct SqlStore {
    db: SqlitePool,
    user_repository: OnceLock<SqlUserRepository>,
}

impl SqlStore {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            user_repository: OnceLock::new(),
        }
    }

    /// Opens a pool for `database_url` and checks that it answers.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(Self::new(pool))
    }

    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                encrypted_password TEXT NOT NULL
            )",
        )
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

impl Store for SqlStore {
    fn user(&self) -> &dyn UserRepository {
        self.user_repository.get_or_init(|| SqlUserRepository {
            db: self.db.clone(),
        })
    }
}

pub struct SqlUserRepository {
    db: SqlitePool,
}

#[async_trait]
impl UserRepository for SqlUserRepository {
    async fn create(&self, mut user: User) -> Result<User, StoreError> {
        prepare(&mut user)?;

        user.id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (email, encrypted_password) VALUES (?, ?) RETURNING id",
        )
        .bind(&user.email)
        .bind(&user.encrypted_password)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db_err| db_err.is_unique_violation())
            {
                StoreError::EmailTaken
            } else {
                StoreError::Database(e)
            }
        })?;

        Ok(user)
    }

    async fn find(&self, id: i64) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>("SELECT id, email, encrypted_password FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(StoreError::RecordNotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, encrypted_password FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::RecordNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqlStore {
        // Each SQLite connection gets its own in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqlStore::new(pool);
        store.ensure_schema().await.unwrap();
        store
    }

    #[tokio::test]
    async fn create() {
        let s = test_store().await;
        let u = s
            .user()
            .create(User::new("user@example.org", "password"))
            .await
            .unwrap();
        assert_eq!(u.id, 1);
        assert!(u.compare_password("password"));

        let stored: String =
            sqlx::query_scalar("SELECT encrypted_password FROM users WHERE id = ?")
                .bind(u.id)
                .fetch_one(&s.db)
                .await
                .unwrap();
        assert_ne!(stored, "password");
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let s = test_store().await;
        s.user()
            .create(User::new("user@example.org", "password"))
            .await
            .unwrap();
        let err = s
            .user()
            .create(User::new("user@example.org", "password2"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::EmailTaken));
    }

    #[tokio::test]
    async fn create_rejects_invalid_user() {
        let s = test_store().await;
        let err = s
            .user()
            .create(User::new("example@example.net", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn find() {
        let s = test_store().await;
        assert!(matches!(
            s.user().find(1).await,
            Err(StoreError::RecordNotFound)
        ));

        let u = s
            .user()
            .create(User::new("user@example.org", "password"))
            .await
            .unwrap();
        let found = s.user().find(u.id).await.unwrap();
        assert_eq!(found.email, "user@example.org");
        assert!(found.password.is_empty());
        assert!(found.compare_password("password"));
    }

    #[tokio::test]
    async fn find_by_email() {
        let s = test_store().await;
        assert!(matches!(
            s.user().find_by_email("user@example.org").await,
            Err(StoreError::RecordNotFound)
        ));

        let u = s
            .user()
            .create(User::new("user@example.org", "password"))
            .await
            .unwrap();
        let found = s.user().find_by_email("user@example.org").await.unwrap();
        assert_eq!(found.id, u.id);
    }

    #[tokio::test]
    async fn user_repository_is_reused() {
        let s = test_store().await;
        let first = s.user() as *const dyn UserRepository as *const ();
        let second = s.user() as *const dyn UserRepository as *const ();
        assert_eq!(first, second);
    }
}
