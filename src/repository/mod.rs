//! Repository layer: credential and book stores

pub mod books;
pub mod memory;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use uuid::Uuid;

use crate::{
    config::DatabaseConfig,
    error::AppResult,
    models::{Book, BookChanges, DeleteResult, InsertOneResult, Role, UpdateResult, User},
};

/// Point lookups and upserts of user records, keyed by email
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersStore: Send + Sync {
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Fails with `Conflict` when the email is already taken
    async fn insert(&self, user: &User) -> AppResult<InsertOneResult>;

    /// Set the roles of `email`, creating a bare record when none exists
    async fn upsert_roles(&self, email: &str, roles: &[Role]) -> AppResult<UpdateResult>;
}

/// Book record storage. Listing follows store iteration order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BooksStore: Send + Sync {
    async fn insert(&self, book: &Book) -> AppResult<InsertOneResult>;

    async fn list(&self, owner: Option<String>) -> AppResult<Vec<Book>>;

    /// First book shared by `email`
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Book>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>>;

    /// Apply `changes` to book `id`. When it does not exist, a record is
    /// created from `changes` alone, dated `upload_date`.
    async fn upsert(
        &self,
        id: Uuid,
        changes: &BookChanges,
        upload_date: DateTime<Utc>,
    ) -> AppResult<UpdateResult>;

    /// Deleting a missing id is a zero-count success
    async fn delete(&self, id: Uuid) -> AppResult<DeleteResult>;
}

/// Process-wide store handle, built once at startup and shared by all services
#[derive(Clone)]
pub struct Repository {
    pool: Option<Pool<Postgres>>,
    pub users: Arc<dyn UsersStore>,
    pub books: Arc<dyn BooksStore>,
}

impl Repository {
    /// Open the configured backend and make sure its tables exist
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        if config.in_memory {
            tracing::warn!("Using in-memory store, data is lost on shutdown");
            return Ok(Self::in_memory());
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;

        let repository = Self::postgres(pool);
        repository.ensure_schema().await?;
        Ok(repository)
    }

    /// Create a repository over an existing Postgres pool
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            users: Arc::new(users::PgUsersStore::new(pool.clone())),
            books: Arc::new(books::PgBooksStore::new(pool.clone())),
            pool: Some(pool),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_stores(
            Arc::new(memory::MemoryUsersStore::default()),
            Arc::new(memory::MemoryBooksStore::default()),
        )
    }

    pub fn from_stores(users: Arc<dyn UsersStore>, books: Arc<dyn BooksStore>) -> Self {
        Self {
            pool: None,
            users,
            books,
        }
    }

    async fn ensure_schema(&self) -> AppResult<()> {
        if let Some(ref pool) = self.pool {
            users::PgUsersStore::ensure_schema(pool).await?;
            books::PgBooksStore::ensure_schema(pool).await?;
            tracing::info!("Database schema ready");
        }
        Ok(())
    }

    /// Check that the backend answers
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(ref pool) = self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }

    /// Release pooled connections
    pub async fn close(&self) {
        if let Some(ref pool) = self.pool {
            pool.close().await;
            tracing::info!("Database pool closed");
        }
    }
}
