//! In-process stores used for tests and `database.in_memory` runs.
//! Locks are released before returning, never held across an await.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookChanges, DeleteResult, InsertOneResult, Role, UpdateResult, User},
};

use super::{BooksStore, UsersStore};

#[derive(Default)]
pub struct MemoryUsersStore {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UsersStore for MemoryUsersStore {
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.users.read().iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: &User) -> AppResult<InsertOneResult> {
        let mut users = self.users.write();
        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("User Already Registered".to_string()));
        }
        users.push(user.clone());
        Ok(InsertOneResult::new(user.email.clone()))
    }

    async fn upsert_roles(&self, email: &str, roles: &[Role]) -> AppResult<UpdateResult> {
        let mut users = self.users.write();
        match users.iter_mut().find(|u| u.email == email) {
            Some(user) => {
                let modified = user.roles != roles;
                user.roles = roles.to_vec();
                Ok(UpdateResult::matched(modified))
            }
            None => {
                users.push(User {
                    email: email.to_string(),
                    username: None,
                    password_hash: None,
                    roles: roles.to_vec(),
                });
                Ok(UpdateResult::upserted(email))
            }
        }
    }
}

#[derive(Default)]
pub struct MemoryBooksStore {
    books: RwLock<Vec<Book>>,
}

#[async_trait]
impl BooksStore for MemoryBooksStore {
    async fn insert(&self, book: &Book) -> AppResult<InsertOneResult> {
        let mut books = self.books.write();
        if books.iter().any(|b| b.id == book.id) {
            return Err(AppError::Conflict(format!("Book {} already exists", book.id)));
        }
        books.push(book.clone());
        Ok(InsertOneResult::new(book.id.to_string()))
    }

    async fn list(&self, owner: Option<String>) -> AppResult<Vec<Book>> {
        let books = self.books.read();
        Ok(books
            .iter()
            .filter(|b| owner.is_none() || b.email == owner)
            .cloned()
            .collect())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Book>> {
        Ok(self
            .books
            .read()
            .iter()
            .find(|b| b.email.as_deref() == Some(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        Ok(self.books.read().iter().find(|b| b.id == id).cloned())
    }

    async fn upsert(
        &self,
        id: Uuid,
        changes: &BookChanges,
        upload_date: DateTime<Utc>,
    ) -> AppResult<UpdateResult> {
        let mut books = self.books.write();
        match books.iter_mut().find(|b| b.id == id) {
            Some(book) => {
                let before = book.clone();
                changes.apply_to(book);
                Ok(UpdateResult::matched(*book != before))
            }
            None => {
                books.push(changes.clone().into_book(id, upload_date));
                Ok(UpdateResult::upserted(id.to_string()))
            }
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<DeleteResult> {
        let mut books = self.books.write();
        let before = books.len();
        books.retain(|b| b.id != id);
        Ok(DeleteResult::new((before - books.len()) as u64))
    }
}
