//! Data models for Bookshare

pub mod book;
pub mod results;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookChanges, NewBook, Recency};
pub use results::{DeleteResult, InsertOneResult, UpdateResult};
pub use user::{Role, SessionClaims, User, UserProfile};
