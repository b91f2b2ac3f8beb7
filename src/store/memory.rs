//! In-memory stores with the same contracts as the PostgreSQL ones.
//!
//! Each store keeps its rows behind one `std::sync::Mutex`; the lock is never
//! held across an `.await`. The uniqueness check and the insert happen under
//! the same lock, which gives the same guarantee as a unique index.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};

use super::{CredentialStore, StoreError, TaskStore};
use crate::models::{Identity, NewIdentity, NewTask, Task};

struct Table<T> {
    rows: Vec<T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn lock<T>(mutex: &Mutex<Table<T>>) -> MutexGuard<'_, Table<T>> {
    // A panic while holding the lock cannot leave a row half-written.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
pub struct InMemoryCredentialStore {
    table: Mutex<Table<Identity>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, predicate: impl Fn(&Identity) -> bool) -> Result<Identity, StoreError> {
        lock(&self.table)
            .rows
            .iter()
            .find(|identity| predicate(identity))
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_id(&self, id: i64) -> Result<Identity, StoreError> {
        self.find(|identity| identity.id == id)
    }

    async fn find_by_email(&self, email: &str) -> Result<Identity, StoreError> {
        self.find(|identity| identity.email == email)
    }

    async fn find_by_username(&self, username: &str) -> Result<Identity, StoreError> {
        self.find(|identity| identity.username == username)
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Identity, StoreError> {
        self.find(|identity| identity.username == username || identity.email == email)
    }

    async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let mut table = lock(&self.table);
        if table
            .rows
            .iter()
            .any(|row| row.username == identity.username || row.email == identity.email)
        {
            return Err(StoreError::UniquenessViolation);
        }

        let now = Utc::now();
        let stored = Identity {
            id: table.allocate_id(),
            username: identity.username,
            email: identity.email,
            password_hash: identity.password_hash,
            created_at: now,
            updated_at: now,
        };
        table.rows.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, identity: &Identity) -> Result<Identity, StoreError> {
        let mut table = lock(&self.table);
        if table.rows.iter().any(|row| {
            row.id != identity.id
                && (row.username == identity.username || row.email == identity.email)
        }) {
            return Err(StoreError::UniquenessViolation);
        }

        let row = table
            .rows
            .iter_mut()
            .find(|row| row.id == identity.id)
            .ok_or(StoreError::NotFound)?;
        row.username = identity.username.clone();
        row.email = identity.email.clone();
        row.password_hash = identity.password_hash.clone();
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut table = lock(&self.table);
        let before = table.rows.len();
        table.rows.retain(|row| row.id != id);
        if table.rows.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryTaskStore {
    table: Mutex<Table<Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, task: NewTask) -> Result<Task, StoreError> {
        let mut table = lock(&self.table);
        let now = Utc::now();
        let stored = Task {
            id: table.allocate_id(),
            user_id: task.user_id,
            title: task.title,
            description: task.description,
            is_completed: false,
            created_at: now,
            updated_at: now,
        };
        table.rows.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: i64) -> Result<Task, StoreError> {
        lock(&self.table)
            .rows
            .iter()
            .find(|task| task.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = lock(&self.table)
            .rows
            .iter()
            .filter(|task| task.user_id == user_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tasks)
    }

    async fn update(&self, task: &Task) -> Result<Task, StoreError> {
        let mut table = lock(&self.table);
        let row = table
            .rows
            .iter_mut()
            .find(|row| row.id == task.id)
            .ok_or(StoreError::NotFound)?;
        row.title = task.title.clone();
        row.description = task.description.clone();
        row.is_completed = task.is_completed;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut table = lock(&self.table);
        let before = table.rows.len();
        table.rows.retain(|row| row.id != id);
        if table.rows.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
