//! API handlers for Bookshare REST endpoints

pub mod auth;
pub mod books;
pub mod health;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        request::Parts,
        HeaderValue, Method,
    },
    routing::{delete, get, post, put},
    Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejectionReason,
    TypedHeader,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{config::ServerConfig, error::AppError, models::SessionClaims, AppState};

/// Extractor for a request carrying a valid `Authorization: Bearer` session token.
/// Missing header is a 401, anything unverifiable a 403.
pub struct AuthenticatedUser(pub SessionClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| match rejection.reason() {
                    TypedHeaderRejectionReason::Missing => {
                        AppError::Authentication("Unauthorized access".to_string())
                    }
                    _ => AppError::Authorization("Forbidden access".to_string()),
                })?;

        let claims = state.services.auth.verify_token(bearer.token())?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Extractor for an authenticated requester holding the CREATOR role
pub struct CreatorUser(pub SessionClaims);

#[async_trait]
impl FromRequestParts<AppState> for CreatorUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(claims) = AuthenticatedUser::from_request_parts(parts, state).await?;
        state.services.auth.verify_creator(&claims).await?;
        Ok(CreatorUser(claims))
    }
}

/// JSON body extractor whose rejections render as error JSON
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections render as error JSON
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server);

    let api = Router::new()
        .route("/", get(health::root))
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Credentials
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        // Users
        .route("/addUser", post(users::add_user))
        .route("/user", get(users::check_user))
        .route("/update-user", put(users::update_user))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/", get(books::list_books).post(books::create_book))
        .route("/books/delete", delete(books::delete_book))
        .route("/book", get(books::get_book))
        .route("/book/", get(books::get_book))
        .route("/book/:id", put(books::update_book))
        .with_state(state);

    Router::new()
        .merge(api)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Credentialed CORS for a single configured origin, permissive otherwise
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let permissive = || {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    match config.allowed_origin.as_deref() {
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(origin) => CorsLayer::new()
                .allow_origin(origin)
                .allow_credentials(true)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE]),
            Err(_) => {
                tracing::warn!("Invalid allowed origin {:?}, allowing any origin", origin);
                permissive()
            }
        },
        None => permissive(),
    }
}
