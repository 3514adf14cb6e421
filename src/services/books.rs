//! Book record lifecycle

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BookListQuery, BookLookup},
        Book, BookChanges, DeleteResult, InsertOneResult, NewBook, SessionClaims, UpdateResult,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Insert a new book. Every call creates a distinct record.
    pub async fn create_book(
        &self,
        requester: &SessionClaims,
        book: NewBook,
        now: DateTime<Utc>,
    ) -> AppResult<InsertOneResult> {
        let book = Book {
            id: Uuid::new_v4(),
            title: book.title,
            description: book.description,
            email: Some(book.email.unwrap_or_else(|| requester.email.clone())),
            name: book.name,
            url: book.url,
            upload_date: book.upload_date.unwrap_or(now),
        };

        let result = self.repository.books.insert(&book).await?;
        tracing::info!(id = %book.id, requester = %requester.email, "Book created");
        Ok(result)
    }

    /// List books, optionally restricted to one owner and one recency class
    pub async fn list_books(&self, query: &BookListQuery, now: DateTime<Utc>) -> AppResult<Vec<Book>> {
        let books = self.repository.books.list(query.owner()).await?;

        Ok(match query.recency() {
            Some(recency) => books
                .into_iter()
                .filter(|book| book.recency(now) == Some(recency))
                .collect(),
            None => books,
        })
    }

    pub async fn find_book(&self, lookup: BookLookup) -> AppResult<Book> {
        let found = match lookup {
            BookLookup::ByEmail(ref email) => self.repository.books.find_by_email(email).await?,
            BookLookup::ById(id) => self.repository.books.find_by_id(id).await?,
        };

        found.ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    /// Update-or-create: a missing id gets a record built from `changes`
    pub async fn update_book(
        &self,
        id: Uuid,
        changes: BookChanges,
        now: DateTime<Utc>,
    ) -> AppResult<UpdateResult> {
        let result = self.repository.books.upsert(id, &changes, now).await?;
        if result.upserted_count > 0 {
            tracing::info!(%id, "Book update created a new record");
        }
        Ok(result)
    }

    pub async fn delete_book(&self, id: Uuid) -> AppResult<DeleteResult> {
        let result = self.repository.books.delete(id).await?;
        tracing::info!(%id, deleted = result.deleted_count, "Book delete");
        Ok(result)
    }
}
