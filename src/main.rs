//! # Mesto Server
//!
//! HTTP API for a photo-sharing app: user accounts, image cards and likes,
//! built with Axum and Tokio.
//!
//! ## Architecture
//! - `config`: environment configuration, loaded once at startup
//! - `auth`: JWT issuance/verification, password hashing, auth middleware
//! - `validation`: declarative request schemas
//! - `error`: mapping of every failure to the `{"message": ...}` envelope
//! - `database`: `Store` trait with PostgreSQL and in-memory backends
//! - `routes`: handlers for `/signup`, `/signin`, `/users`, `/cards`
//! - `server`: router composition and startup
//!
//! ## Running the Server
//! ```bash
//! JWT_SECRET=change-me cargo run
//! ```
//!
//! Set `DATABASE_URL` to use PostgreSQL; without it data lives in memory.

mod auth;
mod config;
mod database;
mod error;
mod routes;
mod server;
mod validation;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false) // Don't show module targets for cleaner output
                .compact(),
        )
        .init();

    tracing::info!("🏁 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    // A missing signing secret stops the process here.
    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Invalid configuration: {:#}", e);
            return Err(e);
        }
    };

    server::start(config).await
}
