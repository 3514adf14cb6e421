//! Books repository for Postgres

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Book, BookChanges, DeleteResult, InsertOneResult, UpdateResult},
};

use super::BooksStore;

#[derive(Debug, FromRow)]
struct BookRow {
    id: Uuid,
    title: Option<String>,
    description: Option<String>,
    email: Option<String>,
    name: Option<String>,
    url: Option<String>,
    upload_date: DateTime<Utc>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: row.id,
            title: row.title,
            description: row.description,
            email: row.email,
            name: row.name,
            url: row.url,
            upload_date: row.upload_date,
        }
    }
}

const BOOK_COLUMNS: &str = "id, title, description, email, name, url, upload_date";

#[derive(Clone)]
pub struct PgBooksStore {
    pool: Pool<Postgres>,
}

impl PgBooksStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(pool: &Pool<Postgres>) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS books (
                id UUID PRIMARY KEY,
                title TEXT,
                description TEXT,
                email TEXT,
                name TEXT,
                url TEXT,
                upload_date TIMESTAMPTZ NOT NULL,
                seq BIGSERIAL
            )
            "#,
        )
        .execute(pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS books_email_idx ON books (email)")
            .execute(pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl BooksStore for PgBooksStore {
    async fn insert(&self, book: &Book) -> AppResult<InsertOneResult> {
        tracing::debug!(id = %book.id, "books.insert_one");
        sqlx::query(
            r#"
            INSERT INTO books (id, title, description, email, name, url, upload_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.description)
        .bind(&book.email)
        .bind(&book.name)
        .bind(&book.url)
        .bind(book.upload_date)
        .execute(&self.pool)
        .await?;

        Ok(InsertOneResult::new(book.id.to_string()))
    }

    async fn list(&self, owner: Option<String>) -> AppResult<Vec<Book>> {
        tracing::debug!(?owner, "books.find");
        let query = format!(
            "SELECT {} FROM books WHERE ($1::TEXT IS NULL OR email = $1) ORDER BY seq",
            BOOK_COLUMNS
        );
        let rows = sqlx::query_as::<_, BookRow>(&query)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Book>> {
        tracing::debug!(email, "books.find_one");
        let query = format!(
            "SELECT {} FROM books WHERE email = $1 ORDER BY seq LIMIT 1",
            BOOK_COLUMNS
        );
        let row = sqlx::query_as::<_, BookRow>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Book::from))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        tracing::debug!(%id, "books.find_one");
        let query = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);
        let row = sqlx::query_as::<_, BookRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Book::from))
    }

    async fn upsert(
        &self,
        id: Uuid,
        changes: &BookChanges,
        upload_date: DateTime<Utc>,
    ) -> AppResult<UpdateResult> {
        tracing::debug!(%id, "books.update_one upsert");
        // xmax is zero only on rows created by this statement.
        // No row comes back when the changes leave the record as it was.
        let inserted: Option<bool> = sqlx::query_scalar(
            r#"
            INSERT INTO books (id, title, description, email, name, url, upload_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                title = COALESCE(EXCLUDED.title, books.title),
                description = COALESCE(EXCLUDED.description, books.description),
                email = COALESCE(EXCLUDED.email, books.email),
                name = COALESCE(EXCLUDED.name, books.name),
                url = COALESCE(EXCLUDED.url, books.url)
            WHERE (books.title, books.description, books.email, books.name, books.url)
                IS DISTINCT FROM (
                    COALESCE(EXCLUDED.title, books.title),
                    COALESCE(EXCLUDED.description, books.description),
                    COALESCE(EXCLUDED.email, books.email),
                    COALESCE(EXCLUDED.name, books.name),
                    COALESCE(EXCLUDED.url, books.url)
                )
            RETURNING (xmax = 0)
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.email)
        .bind(&changes.name)
        .bind(&changes.url)
        .bind(upload_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match inserted {
            Some(true) => UpdateResult::upserted(id.to_string()),
            Some(false) => UpdateResult::matched(true),
            None => UpdateResult::matched(false),
        })
    }

    async fn delete(&self, id: Uuid) -> AppResult<DeleteResult> {
        tracing::debug!(%id, "books.delete_one");
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(DeleteResult::new(result.rows_affected()))
    }
}
