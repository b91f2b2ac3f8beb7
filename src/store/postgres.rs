use async_trait::async_trait;
use sqlx::PgPool;

use super::{CredentialStore, StoreError, TaskStore};
use crate::models::{Identity, NewIdentity, NewTask, Task};

const IDENTITY_COLUMNS: &str = "id, username, email, password_hash, created_at, updated_at";
const TASK_COLUMNS: &str = "id, user_id, title, description, is_completed, created_at, updated_at";

/// Translates sqlx errors: missing rows and unique-index violations get their
/// own variants, everything else stays a database error.
fn map_err(error: sqlx::Error) -> StoreError {
    match error {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            StoreError::UniquenessViolation
        }
        other => StoreError::Database(other),
    }
}

pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, filter: &str, value: &str) -> Result<Identity, StoreError> {
        sqlx::query_as::<_, Identity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM users WHERE {filter} = $1"
        ))
        .bind(value)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_id(&self, id: i64) -> Result<Identity, StoreError> {
        sqlx::query_as::<_, Identity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn find_by_email(&self, email: &str) -> Result<Identity, StoreError> {
        self.fetch_one_by("email", email).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Identity, StoreError> {
        self.fetch_one_by("username", username).await
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Identity, StoreError> {
        sqlx::query_as::<_, Identity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM users WHERE username = $1 OR email = $2 ORDER BY id LIMIT 1"
        ))
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        sqlx::query_as::<_, Identity>(&format!(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING {IDENTITY_COLUMNS}"
        ))
        .bind(&identity.username)
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn update(&self, identity: &Identity) -> Result<Identity, StoreError> {
        sqlx::query_as::<_, Identity>(&format!(
            "UPDATE users SET username = $1, email = $2, password_hash = $3, updated_at = NOW() \
             WHERE id = $4 RETURNING {IDENTITY_COLUMNS}"
        ))
        .bind(&identity.username)
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(identity.id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn create(&self, task: NewTask) -> Result<Task, StoreError> {
        sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (user_id, title, description) VALUES ($1, $2, $3) \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(task.user_id)
        .bind(&task.title)
        .bind(&task.description)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn find_by_id(&self, id: i64) -> Result<Task, StoreError> {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Task>, StoreError> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn update(&self, task: &Task) -> Result<Task, StoreError> {
        sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET title = $1, description = $2, is_completed = $3, updated_at = NOW() \
             WHERE id = $4 RETURNING {TASK_COLUMNS}"
        ))
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.is_completed)
        .bind(task.id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(
            map_err(sqlx::Error::RowNotFound),
            StoreError::NotFound
        ));
    }

    #[test]
    fn test_other_errors_stay_database_errors() {
        assert!(matches!(
            map_err(sqlx::Error::PoolTimedOut),
            StoreError::Database(_)
        ));
    }
}
