//! Persistence ports.
//!
//! `CredentialStore` is the single writer of `users` rows and `TaskStore` the
//! single writer of `tasks` rows. Each has a PostgreSQL implementation and an
//! in-memory one used by tests. Uniqueness of usernames and emails is enforced
//! by the storage layer itself; callers may pre-check, but a concurrent insert
//! that loses the race comes back as [`StoreError::UniquenessViolation`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Identity, NewIdentity, NewTask, Task};

pub use memory::{InMemoryCredentialStore, InMemoryTaskStore};
pub use postgres::{PgCredentialStore, PgTaskStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("unique constraint violated")]
    UniquenessViolation,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    async fn find_by_id(&self, id: i64) -> Result<Identity, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Identity, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Identity, StoreError>;

    /// First identity whose username or email matches.
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Identity, StoreError>;

    async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError>;

    /// Persists username, email and password hash, refreshing `updated_at`.
    async fn update(&self, identity: &Identity) -> Result<Identity, StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync + 'static {
    async fn create(&self, task: NewTask) -> Result<Task, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Task, StoreError>;

    /// All tasks owned by `user_id`, newest first.
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Task>, StoreError>;

    /// Persists title, description and completion flag, refreshing `updated_at`.
    async fn update(&self, task: &Task) -> Result<Task, StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}
