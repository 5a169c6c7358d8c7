//! Authentication Middleware
//!
//! Axum middleware for JWT token validation and user authentication.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::auth::{jwt::JwtService, models::AuthUser};
use crate::error::ApiError;

/// Name of the cookie `/signin` sets alongside the JSON token.
pub const TOKEN_COOKIE: &str = "jwt";

/// Authentication middleware that validates JWT tokens and injects user info
pub struct AuthMiddleware;

impl AuthMiddleware {
    /// Middleware function for validating JWT tokens
    pub async fn validate_token(
        State(jwt_service): State<Arc<JwtService>>,
        mut req: Request,
        next: Next,
    ) -> Result<Response, ApiError> {
        let auth_user = Self::authenticate(&jwt_service, req.headers()).inspect_err(|_| {
            tracing::warn!("[AuthMiddleware] rejected {} {}", req.method(), req.uri());
        })?;

        req.extensions_mut().insert(auth_user);

        Ok(next.run(req).await)
    }

    /// Resolve the caller from request headers, or fail with `Unauthorized`.
    pub fn authenticate(
        jwt_service: &JwtService,
        headers: &HeaderMap,
    ) -> Result<AuthUser, ApiError> {
        let token = extract_token(headers).map_err(|reason| {
            tracing::warn!("[AuthMiddleware] {}", reason);
            ApiError::Unauthorized
        })?;

        let claims = jwt_service.verify(&token).map_err(|e| {
            tracing::warn!("[AuthMiddleware] {}", e);
            ApiError::Unauthorized
        })?;

        tracing::debug!("[AuthMiddleware] authenticated id={}", claims.sub);
        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}

/// Bearer header first; the cookie is consulted only when no header is sent.
fn extract_token(headers: &HeaderMap) -> Result<String, &'static str> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| "authorization header is not valid text")?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or("authorization header is not a Bearer credential")?
            .trim();
        if token.is_empty() {
            return Err("empty bearer token");
        }
        return Ok(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or("missing authorization header and token cookie")
}

/// Handlers behind the middleware take `AuthUser` as an extractor.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn bearer_header_is_extracted() {
        let map = headers(&[(header::AUTHORIZATION, "Bearer abc.def.ghi")]);
        assert_eq!(extract_token(&map).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn malformed_headers_are_rejected() {
        for value in ["abc.def.ghi", "Basic dXNlcjpwYXNz", "Bearer ", "bearer abc"] {
            let map = headers(&[(header::AUTHORIZATION, value)]);
            assert!(extract_token(&map).is_err(), "accepted {value:?}");
        }
        assert!(extract_token(&HeaderMap::new()).is_err());
    }

    #[test]
    fn cookie_is_used_without_header() {
        let map = headers(&[(header::COOKIE, "theme=dark; jwt=abc.def.ghi")]);
        assert_eq!(extract_token(&map).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn bad_header_does_not_fall_back_to_cookie() {
        let map = headers(&[
            (header::AUTHORIZATION, "Token abc"),
            (header::COOKIE, "jwt=abc.def.ghi"),
        ]);
        assert!(extract_token(&map).is_err());
    }
}
