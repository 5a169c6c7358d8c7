//! # Card Routes
//!
//! Image cards: listing, posting, deleting (owner only) and likes.
//! All endpoints require authentication via JWT middleware.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, put},
};
use axum_extra::extract::WithRejection;
use once_cell::sync::Lazy;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::models::AuthUser;
use crate::database::{Card, NewCard};
use crate::error::ApiError;
use crate::routes::DataResponse;
use crate::server::AppState;
use crate::validation::{FieldRule, Schema, Validate, ValidatedJson};

type CardId = WithRejection<Path<Uuid>, ApiError>;

const CARD_NOT_FOUND: &str = "Card not found";

#[derive(Debug, Deserialize)]
pub struct CreateCardRequest {
    pub name: String,
    pub link: String,
}

static CARD_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::new(vec![
        FieldRule::text("name").required().length(2, 30),
        FieldRule::url("link").required(),
    ])
});

impl Validate for CreateCardRequest {
    fn schema() -> &'static Schema {
        &CARD_SCHEMA
    }
}

pub async fn list_cards(
    State(app_state): State<AppState>,
) -> Result<Json<DataResponse<Vec<Card>>>, ApiError> {
    let cards = app_state.store.list_cards().await?;
    Ok(Json(DataResponse::new(cards)))
}

pub async fn create_card(
    State(app_state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateCardRequest>,
) -> Result<(StatusCode, Json<DataResponse<Card>>), ApiError> {
    let card = app_state
        .store
        .create_card(NewCard {
            name: payload.name,
            link: payload.link,
            owner: auth_user.id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(card))))
}

pub async fn delete_card(
    State(app_state): State<AppState>,
    auth_user: AuthUser,
    WithRejection(Path(card_id), _): CardId,
) -> Result<Json<DataResponse<Card>>, ApiError> {
    let card = app_state
        .store
        .find_card(card_id)
        .await?
        .ok_or_else(|| ApiError::not_found(CARD_NOT_FOUND))?;

    if card.owner != auth_user.id {
        tracing::warn!(
            "User {} tried to delete card {} owned by {}",
            auth_user.id,
            card.id,
            card.owner
        );
        return Err(ApiError::Forbidden("You can only delete your own cards".to_string()));
    }

    // Another request may have removed it in between.
    let deleted = app_state
        .store
        .delete_card(card_id)
        .await?
        .ok_or_else(|| ApiError::not_found(CARD_NOT_FOUND))?;
    Ok(Json(DataResponse::new(deleted)))
}

async fn set_like(
    app_state: AppState,
    auth_user: AuthUser,
    card_id: Uuid,
    liked: bool,
) -> Result<Json<DataResponse<Card>>, ApiError> {
    let card = app_state
        .store
        .set_like(card_id, auth_user.id, liked)
        .await?
        .ok_or_else(|| ApiError::not_found(CARD_NOT_FOUND))?;
    Ok(Json(DataResponse::new(card)))
}

pub async fn like_card(
    State(app_state): State<AppState>,
    auth_user: AuthUser,
    WithRejection(Path(card_id), _): CardId,
) -> Result<Json<DataResponse<Card>>, ApiError> {
    set_like(app_state, auth_user, card_id, true).await
}

pub async fn unlike_card(
    State(app_state): State<AppState>,
    auth_user: AuthUser,
    WithRejection(Path(card_id), _): CardId,
) -> Result<Json<DataResponse<Card>>, ApiError> {
    set_like(app_state, auth_user, card_id, false).await
}

pub fn create_card_routes() -> Router<AppState> {
    Router::new()
        .route("/cards", get(list_cards).post(create_card))
        .route("/cards/{card_id}", delete(delete_card))
        .route("/cards/{card_id}/likes", put(like_card).delete(unlike_card))
}
