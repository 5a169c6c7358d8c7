// # Routes Module
//
// - HTTP route handlers, organized by functionality into separate submodules.
// - Public routers (`health`, `auth`) are mounted outside the auth middleware;
//   `users` and `cards` sit behind it. See `server::build_router`.

use axum::extract::State;
use axum::http::{HeaderMap, Uri};
use serde::Serialize;

use crate::auth::middleware::AuthMiddleware;
use crate::error::ApiError;
use crate::server::AppState;

/// Health check endpoint
pub mod health;

/// Sign-up, sign-in and sign-out
pub mod auth;

/// Profile endpoints
pub mod users;

/// Card and like endpoints
pub mod cards;

/// Success envelope: every user/card payload is returned as `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Fallback for unknown paths. Only reached by authenticated requests.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("Path {} not found", uri.path()))
}

/// A public path hit with a method it does not serve is treated like any other
/// unknown route: the caller must authenticate first, then gets the 404.
pub async fn public_method_not_allowed(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> ApiError {
    match AuthMiddleware::authenticate(&app_state.jwt_service, &headers) {
        Ok(_) => not_found(uri).await,
        Err(err) => err,
    }
}
