//! # User Routes
//!
//! Profile lookup and editing. All endpoints require authentication via JWT
//! middleware; `me` always resolves to the identity carried by the token.

use axum::{
    Router,
    extract::{Path, State},
    response::Json,
    routing::{get, patch},
};
use axum_extra::extract::WithRejection;
use once_cell::sync::Lazy;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::models::AuthUser;
use crate::database::User;
use crate::error::ApiError;
use crate::routes::DataResponse;
use crate::server::AppState;
use crate::validation::{FieldRule, Schema, Validate, ValidatedJson};

const USER_NOT_FOUND: &str = "User not found";

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub about: String,
}

#[derive(Debug, Deserialize)]
pub struct AvatarUpdate {
    pub avatar: String,
}

static PROFILE_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::new(vec![
        FieldRule::text("name").required().length(2, 30),
        FieldRule::text("about").required().length(2, 30),
    ])
});

static AVATAR_SCHEMA: Lazy<Schema> =
    Lazy::new(|| Schema::new(vec![FieldRule::url("avatar").required()]));

impl Validate for ProfileUpdate {
    fn schema() -> &'static Schema {
        &PROFILE_SCHEMA
    }
}

impl Validate for AvatarUpdate {
    fn schema() -> &'static Schema {
        &AVATAR_SCHEMA
    }
}

pub async fn list_users(
    State(app_state): State<AppState>,
) -> Result<Json<DataResponse<Vec<User>>>, ApiError> {
    let users = app_state.store.list_users().await?;
    Ok(Json(DataResponse::new(users)))
}

pub async fn current_user(
    State(app_state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<DataResponse<User>>, ApiError> {
    let user = app_state
        .store
        .find_user(auth_user.id)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;
    Ok(Json(DataResponse::new(user)))
}

pub async fn get_user(
    State(app_state): State<AppState>,
    WithRejection(Path(user_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<DataResponse<User>>, ApiError> {
    let user = app_state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;
    Ok(Json(DataResponse::new(user)))
}

pub async fn update_profile(
    State(app_state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(payload): ValidatedJson<ProfileUpdate>,
) -> Result<Json<DataResponse<User>>, ApiError> {
    let user = app_state
        .store
        .update_profile(auth_user.id, &payload.name, &payload.about)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;
    Ok(Json(DataResponse::new(user)))
}

pub async fn update_avatar(
    State(app_state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(payload): ValidatedJson<AvatarUpdate>,
) -> Result<Json<DataResponse<User>>, ApiError> {
    let user = app_state
        .store
        .update_avatar(auth_user.id, &payload.avatar)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;
    Ok(Json(DataResponse::new(user)))
}

pub fn create_user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/me", get(current_user).patch(update_profile))
        .route("/users/me/avatar", patch(update_avatar))
        .route("/users/{user_id}", get(get_user))
}
