//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookshare API",
        version = "1.0.0",
        description = "Book sharing REST API"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        // Users
        users::add_user,
        users::check_user,
        users::update_user,
        // Books
        books::create_book,
        books::list_books,
        books::get_book,
        books::update_book,
        books::delete_book,
    ),
    components(
        schemas(
            // Auth
            crate::models::user::RegisterRequest,
            crate::models::user::LoginRequest,
            crate::models::user::AuthResponse,
            // Users
            crate::models::user::Role,
            crate::models::user::UserProfile,
            crate::models::user::AddUserRequest,
            crate::models::user::UpdateRolesRequest,
            crate::models::user::UserLookupResponse,
            // Books
            crate::models::book::Book,
            crate::models::book::NewBook,
            crate::models::book::BookChanges,
            crate::models::book::CreateBookRequest,
            crate::models::book::UpdateBookRequest,
            crate::models::book::DeleteBookRequest,
            // Store acknowledgments
            crate::models::results::InsertOneResult,
            crate::models::results::UpdateResult,
            crate::models::results::DeleteResult,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and login"),
        (name = "users", description = "User records and roles"),
        (name = "books", description = "Shared books")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
