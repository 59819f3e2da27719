use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use async_trait::async_trait;

use super::{prepare, Store, StoreError, UserRepository};
use crate::models::user::User;

/// In-memory store with the same contract as the SQL one.
#[derive(Default)]
pub struct TestStore {
    user_repository: OnceLock<MemUserRepository>,
}

impl TestStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for TestStore {
    fn user(&self) -> &dyn UserRepository {
        self.user_repository.get_or_init(MemUserRepository::default)
    }
}

#[derive(Default)]
pub struct MemUserRepository {
    users: Mutex<HashMap<i64, User>>,
}

impl MemUserRepository {
    fn users(&self) -> MutexGuard<'_, HashMap<i64, User>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserRepository for MemUserRepository {
    async fn create(&self, mut user: User) -> Result<User, StoreError> {
        prepare(&mut user)?;

        let mut users = self.users();
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::EmailTaken);
        }
        user.id = users.len() as i64 + 1;

        let mut row = user.clone();
        row.erase_password();
        users.insert(row.id, row);

        Ok(user)
    }

    async fn find(&self, id: i64) -> Result<User, StoreError> {
        self.users()
            .get(&id)
            .cloned()
            .ok_or(StoreError::RecordNotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.users()
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::RecordNotFound)
    }
}
