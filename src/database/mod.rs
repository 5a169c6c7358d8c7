//! # Database Module
//!
//! Persistence for users and cards behind the [`Store`] trait, with a
//! PostgreSQL implementation (tokio-postgres + deadpool) and an in-memory one
//! for development and tests.

pub mod connection;
pub mod memory;
pub mod migrations;
pub mod models;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use connection::DatabaseConnection;
pub use memory::MemoryStore;
pub use models::*;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Operations the route handlers need from the backing store.
///
/// Lookups return `Ok(None)` for missing records; only backend failures and
/// uniqueness conflicts are errors.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn update_profile(&self, id: Uuid, name: &str, about: &str) -> StoreResult<Option<User>>;
    async fn update_avatar(&self, id: Uuid, avatar: &str) -> StoreResult<Option<User>>;

    /// All cards, oldest first.
    async fn list_cards(&self) -> StoreResult<Vec<Card>>;
    async fn create_card(&self, card: NewCard) -> StoreResult<Card>;
    async fn find_card(&self, id: Uuid) -> StoreResult<Option<Card>>;
    async fn delete_card(&self, id: Uuid) -> StoreResult<Option<Card>>;

    /// Adds or removes `user_id` from the card's likes. Both directions are idempotent.
    async fn set_like(
        &self,
        card_id: Uuid,
        user_id: Uuid,
        liked: bool,
    ) -> StoreResult<Option<Card>>;
}
