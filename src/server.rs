//! # Server Module
//!
//! HTTP server setup and route configuration for the Mesto server.

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method, header};
use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::auth::jwt::JwtService;
use crate::auth::middleware::AuthMiddleware;
use crate::config::Config;
use crate::database::{DatabaseConnection, MemoryStore, Store};
use crate::routes;

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub jwt_service: Arc<JwtService>,
    pub store: Arc<dyn Store>,
    /// Attributes for the token cookie set by `/signin` and cleared by `/signout`.
    pub cookie_secure: bool,
}

/// Assemble the full router.
///
/// Order matters: the public router is merged in as-is, while every route in
/// the protected router (and its fallbacks) is wrapped by the auth middleware.
/// Method mismatches never produce axum's bare 405; they answer like an
/// unknown path (401 without a token, then 404).
pub fn build_router(app_state: AppState, cors_origins: &[String]) -> Result<Router> {
    let public_routes = Router::new()
        .route("/ping", get(routes::health::ping))
        .merge(routes::auth::create_auth_routes())
        .method_not_allowed_fallback(routes::public_method_not_allowed);

    let protected_routes = Router::new()
        .merge(routes::users::create_user_routes())
        .merge(routes::cards::create_card_routes())
        .fallback(routes::not_found)
        .method_not_allowed_fallback(routes::not_found)
        .layer(middleware::from_fn_with_state(
            app_state.jwt_service.clone(),
            AuthMiddleware::validate_token,
        ));

    let origins = cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {origin}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .allow_credentials(true);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("SAMEORIGIN"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::REFERRER_POLICY,
                    HeaderValue::from_static("no-referrer"),
                )),
        )
        .with_state(app_state);

    Ok(app)
}

/// Pick the backing store from configuration.
async fn open_store(config: &Config) -> Result<Arc<dyn Store>> {
    match &config.database {
        Some(db_config) => {
            let db = DatabaseConnection::new(db_config)
                .await
                .context("Failed to connect to database")?;
            Ok(Arc::new(db))
        }
        None => {
            tracing::warn!(
                "⚠️  DATABASE_URL not set, using in-memory store (data is lost on restart)"
            );
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Starts the HTTP server and runs until Ctrl+C / SIGTERM.
pub async fn start(config: Config) -> Result<()> {
    let jwt_service = Arc::new(JwtService::new(
        &config.auth.jwt_secret,
        chrono::Duration::hours(config.auth.token_ttl_hours),
    ));

    let app_state = AppState {
        jwt_service,
        store: open_store(&config).await?,
        cookie_secure: config.auth.cookie_secure,
    };

    let app = build_router(app_state, &config.server.cors_origins)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr} - port may already be in use"))?;

    tracing::info!("🚀 Mesto server listening on http://{}", listener.local_addr()?);
    tracing::info!("🏥 Health check available at http://{}/ping", addr);
    tracing::info!("🌐 CORS origins: {:?}", config.server.cors_origins);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
