//! Book model, request bodies and recency classification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::AppError;

/// Age separating "new" books from "old" ones
pub const RECENCY_WINDOW_SECS: i64 = 10 * 60;

/// Stored book record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Email of the user who shared the book
    pub email: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
    pub upload_date: DateTime<Utc>,
}

impl Book {
    pub fn recency(&self, now: DateTime<Utc>) -> Option<Recency> {
        Recency::classify(self.upload_date, now)
    }
}

/// Fields of a book to create. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Defaults to the requester's email
    pub email: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
    /// Stamped with the current time when absent
    pub upload_date: Option<DateTime<Utc>>,
}

/// Partial set of book fields for an update-or-create.
/// `uploadDate` is not part of it: it is fixed at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
}

impl BookChanges {
    /// Overwrite the supplied fields of `book`, leave the others untouched
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(ref title) = self.title {
            book.title = Some(title.clone());
        }
        if let Some(ref description) = self.description {
            book.description = Some(description.clone());
        }
        if let Some(ref email) = self.email {
            book.email = Some(email.clone());
        }
        if let Some(ref name) = self.name {
            book.name = Some(name.clone());
        }
        if let Some(ref url) = self.url {
            book.url = Some(url.clone());
        }
    }

    /// Record created when an update targets an id that does not exist
    pub fn into_book(self, id: Uuid, upload_date: DateTime<Utc>) -> Book {
        Book {
            id,
            title: self.title,
            description: self.description,
            email: self.email,
            name: self.name,
            url: self.url,
            upload_date,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookRequest {
    #[serde(rename = "bookDetails")]
    pub book_details: NewBook,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBookRequest {
    #[serde(rename = "bookDetails")]
    pub book_details: BookChanges,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteBookRequest {
    pub id: String,
}

/// Query for `/books`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookListQuery {
    /// Only books shared by this email
    pub email: Option<String>,
    /// Only books older than the recency window
    pub old: Option<String>,
    /// Only books younger than the recency window
    #[serde(alias = "New")]
    pub new: Option<String>,
}

/// Empty query values count as absent
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl BookListQuery {
    pub fn owner(&self) -> Option<String> {
        present(self.email.clone())
    }

    /// `old` wins when both flags are set
    pub fn recency(&self) -> Option<Recency> {
        let is_set = |flag: &Option<String>| flag.as_deref().is_some_and(|v| !v.is_empty());
        if is_set(&self.old) {
            Some(Recency::Old)
        } else if is_set(&self.new) {
            Some(Recency::New)
        } else {
            None
        }
    }
}

/// Query for `/book`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookLookupQuery {
    pub email: Option<String>,
    pub id: Option<String>,
}

/// Exactly one lookup key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookLookup {
    ByEmail(String),
    ById(Uuid),
}

impl TryFrom<BookLookupQuery> for BookLookup {
    type Error = AppError;

    fn try_from(query: BookLookupQuery) -> Result<Self, Self::Error> {
        match (present(query.email), present(query.id)) {
            (Some(email), None) => Ok(BookLookup::ByEmail(email)),
            (None, Some(id)) => Ok(BookLookup::ById(parse_book_id(&id)?)),
            (Some(_), Some(_)) => Err(AppError::BadRequest(
                "Provide either email or id, not both".to_string(),
            )),
            (None, None) => Err(AppError::BadRequest(
                "Provide either email or id".to_string(),
            )),
        }
    }
}

pub fn parse_book_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::BadRequest(format!("Invalid book id: {}", id)))
}

/// Recency class of a book relative to now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recency {
    New,
    Old,
}

impl Recency {
    /// Elapsed time is counted in whole seconds. A book exactly on the
    /// window boundary is neither new nor old.
    pub fn classify(upload_date: DateTime<Utc>, now: DateTime<Utc>) -> Option<Recency> {
        let elapsed = (now - upload_date).num_seconds();
        match elapsed.cmp(&RECENCY_WINDOW_SECS) {
            std::cmp::Ordering::Less => Some(Recency::New),
            std::cmp::Ordering::Greater => Some(Recency::Old),
            std::cmp::Ordering::Equal => None,
        }
    }
}
