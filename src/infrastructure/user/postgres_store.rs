//! PostgreSQL user store implementation

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};

use crate::config::DatabaseConfig;
use crate::domain::user::{User, UserId, UserStore, UserTransaction};
use crate::domain::DomainError;

/// PostgreSQL implementation of [`UserStore`]
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new store with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a pool configured from [`DatabaseConfig`]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DomainError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| DomainError::operation_failed("database.url is not configured"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(std::time::Duration::from_secs(config.idle_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| {
                DomainError::operation_failed_with("Failed to connect to PostgreSQL", e)
            })?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn begin(&self) -> Result<Box<dyn UserTransaction>, DomainError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::operation_failed_with("Failed to begin transaction", e))?;

        Ok(Box::new(PgUserTransaction { tx }))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(
            "SELECT id, login, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::operation_failed_with("Failed to get user", e))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        let rows = sqlx::query(
            "SELECT id, login, created_at, updated_at FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::operation_failed_with("Failed to list users", e))?;

        rows.iter().map(row_to_user).collect()
    }
}

/// One open transaction over the users table
pub struct PgUserTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UserTransaction for PgUserTransaction {
    async fn find_by_id(&mut self, id: UserId) -> Result<Option<User>, DomainError> {
        // FOR UPDATE: a concurrent transaction removing the same id blocks
        // here until this one resolves, then observes the committed state.
        let row = sqlx::query(
            "SELECT id, login, created_at, updated_at FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(id.value())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| DomainError::operation_failed_with("Failed to get user", e))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn insert(&mut self, login: &str) -> Result<User, DomainError> {
        let now = chrono::Utc::now();

        let row = sqlx::query(
            r#"
            INSERT INTO users (login, created_at, updated_at)
            VALUES ($1, $2, $3)
            RETURNING id, login, created_at, updated_at
            "#,
        )
        .bind(login)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| DomainError::operation_failed_with("Failed to insert user", e))?;

        row_to_user(&row)
    }

    async fn remove(&mut self, user: &User) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user.id().value())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DomainError::operation_failed_with("Failed to delete user", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::operation_failed(format!(
                "User {} vanished within the transaction",
                user.id()
            )));
        }

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        // A failed commit aborts server-side; nothing is published.
        self.tx
            .commit()
            .await
            .map_err(|e| DomainError::operation_failed_with("Failed to commit transaction", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DomainError::operation_failed_with("Failed to roll back transaction", e))
    }
}

fn row_to_user(row: &PgRow) -> Result<User, DomainError> {
    let id: i64 = row.try_get("id").map_err(invalid_row)?;
    let login: String = row.try_get("login").map_err(invalid_row)?;
    let created_at: chrono::DateTime<chrono::Utc> =
        row.try_get("created_at").map_err(invalid_row)?;
    let updated_at: chrono::DateTime<chrono::Utc> =
        row.try_get("updated_at").map_err(invalid_row)?;

    Ok(User::restore(UserId::new(id), login, created_at, updated_at))
}

fn invalid_row(e: sqlx::Error) -> DomainError {
    DomainError::operation_failed_with("Invalid user row in database", e)
}
