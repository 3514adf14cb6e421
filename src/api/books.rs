//! Book endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;

use crate::{
    error::AppResult,
    models::{
        book::{
            parse_book_id, BookListQuery, BookLookup, BookLookupQuery, CreateBookRequest,
            DeleteBookRequest, UpdateBookRequest,
        },
        Book, DeleteResult, InsertOneResult, UpdateResult,
    },
    AppState,
};

use super::{ApiJson, ApiQuery, AuthenticatedUser, CreatorUser};

/// Share a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBookRequest,
    responses(
        (status = 200, description = "Book created", body = InsertOneResult),
        (status = 401, description = "Not authenticated or not a CREATOR"),
        (status = 403, description = "Invalid token")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    CreatorUser(claims): CreatorUser,
    ApiJson(request): ApiJson<CreateBookRequest>,
) -> AppResult<Json<InsertOneResult>> {
    let result = state
        .services
        .books
        .create_book(&claims, request.book_details, Utc::now())
        .await?;
    Ok(Json(result))
}

/// List books, optionally by owner and recency
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookListQuery),
    responses(
        (status = 200, description = "Matching books", body = [Book]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    ApiQuery(query): ApiQuery<BookListQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.list_books(&query, Utc::now()).await?;
    Ok(Json(books))
}

/// Get one book by owner email or by id
#[utoipa::path(
    get,
    path = "/book",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookLookupQuery),
    responses(
        (status = 200, description = "Book", body = Book),
        (status = 400, description = "Neither or both of email and id given"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    ApiQuery(query): ApiQuery<BookLookupQuery>,
) -> AppResult<Json<Book>> {
    let lookup = BookLookup::try_from(query)?;
    let book = state.services.books.find_book(lookup).await?;
    Ok(Json(book))
}

/// Update a book, creating it when the id is unknown
#[utoipa::path(
    put,
    path = "/book/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "Book updated or created", body = UpdateResult),
        (status = 400, description = "Invalid book id"),
        (status = 401, description = "Not authenticated or not a CREATOR")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    CreatorUser(_claims): CreatorUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateBookRequest>,
) -> AppResult<Json<UpdateResult>> {
    let id = parse_book_id(&id)?;
    let result = state
        .services
        .books
        .update_book(id, request.book_details, Utc::now())
        .await?;
    Ok(Json(result))
}

/// Delete a book by id
#[utoipa::path(
    delete,
    path = "/books/delete",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = DeleteBookRequest,
    responses(
        (status = 200, description = "Delete acknowledgment, zero count when absent", body = DeleteResult),
        (status = 400, description = "Invalid book id"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiJson(request): ApiJson<DeleteBookRequest>,
) -> AppResult<Json<DeleteResult>> {
    if state.config.auth.require_creator_for_delete {
        state.services.auth.verify_creator(&claims).await?;
    }

    let id = parse_book_id(&request.id)?;
    let result = state.services.books.delete_book(id).await?;
    Ok(Json(result))
}
