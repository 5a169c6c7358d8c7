//! Auth routes for registration, sign-in and sign-out.
//!
//! These routes are public: they are mounted outside the auth middleware.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use once_cell::sync::Lazy;
use serde_json::json;

use crate::auth::middleware::TOKEN_COOKIE;
use crate::auth::models::{SigninRequest, SignupRequest, TokenResponse};
use crate::auth::password::{hash_password, verify_password};
use crate::database::NewUser;
use crate::error::ApiError;
use crate::routes::DataResponse;
use crate::server::AppState;
use crate::validation::{FieldRule, Schema, Validate, ValidatedJson};

const BAD_CREDENTIALS: &str = "Incorrect email or password";

static SIGNUP_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::new(vec![
        FieldRule::text("name").length(2, 30),
        FieldRule::text("about").length(2, 30),
        FieldRule::url("avatar"),
        FieldRule::email("email").required(),
        FieldRule::text("password").required(),
    ])
});

static SIGNIN_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::new(vec![
        FieldRule::email("email").required(),
        FieldRule::text("password").required(),
    ])
});

impl Validate for SignupRequest {
    fn schema() -> &'static Schema {
        &SIGNUP_SCHEMA
    }
}

impl Validate for SigninRequest {
    fn schema() -> &'static Schema {
        &SIGNIN_SCHEMA
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Token cookie. Cross-site frontends need `SameSite=None`, which browsers only
/// accept together with `Secure`.
fn token_cookie(value: String, max_age: time::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, value))
        .http_only(true)
        .secure(secure)
        .same_site(if secure { SameSite::None } else { SameSite::Lax })
        .path("/")
        .max_age(max_age)
        .build()
}

pub async fn signup(
    State(app_state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&payload.email);
    let password_hash = hash_password(payload.password).await?;

    let user = app_state
        .store
        .create_user(NewUser::with_defaults(
            email,
            password_hash,
            payload.name,
            payload.about,
            payload.avatar,
        ))
        .await?;

    tracing::info!("Registered user id={}", user.id);
    Ok((StatusCode::CREATED, Json(DataResponse::new(user))))
}

pub async fn signin(
    State(app_state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<SigninRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&payload.email);

    let user = app_state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::BadCredentials(BAD_CREDENTIALS.to_string()))?;

    if !verify_password(payload.password, user.password_hash.clone()).await? {
        tracing::warn!("Failed sign-in for user id={}", user.id);
        return Err(ApiError::BadCredentials(BAD_CREDENTIALS.to_string()));
    }

    let issued = app_state.jwt_service.create_token(user.id, &user.email)?;
    tracing::info!("Signed in user id={} (token expires at {})", user.id, issued.expires_at);

    let cookie = token_cookie(
        issued.token.clone(),
        time::Duration::seconds(app_state.jwt_service.ttl().num_seconds()),
        app_state.cookie_secure,
    );

    Ok((jar.add(cookie), Json(TokenResponse { token: issued.token })))
}

/// Tokens are stateless, so signing out only clears the cookie.
///
/// The removal is always sent, with the attributes `/signin` used, even when the
/// request carried no cookie (a `jar.remove` would then emit nothing).
pub async fn signout(State(app_state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let mut cookie = token_cookie(String::new(), time::Duration::ZERO, app_state.cookie_secure);
    cookie.make_removal();

    (jar.add(cookie), Json(json!({ "message": "Signed out" })))
}

pub fn create_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
}
