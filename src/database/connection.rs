// Database Connection Management
//
// Handles PostgreSQL connection pooling using tokio-postgres and deadpool, and
// implements the `Store` trait on top of it.
use anyhow::{Context, Result};
use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use std::str::FromStr;
use std::time::Duration;
use tokio_postgres::NoTls;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use uuid::Uuid;

use super::models::FromRow;
use super::{Card, NewCard, NewUser, Store, StoreError, StoreResult, User};
use crate::config::DatabaseConfig;

const USER_COLUMNS: &str = "id, name, about, avatar, email, password_hash, created_at";
const CARD_COLUMNS: &str = "id, name, link, owner, likes, created_at";

/// Database connection wrapper
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    pool: Pool,
}

impl DatabaseConnection {
    /// Create a pool, check it can hand out a connection and bring the schema up to date
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pg_config = tokio_postgres::Config::from_str(&config.url)
            .context("Failed to parse DATABASE_URL")?;
        tracing::info!(
            "🔌 Connecting to database: {:?}/{}",
            pg_config.get_hosts(),
            pg_config.get_dbname().unwrap_or_default()
        );

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = if config.tls {
            let tls_connector = TlsConnector::builder()
                .build()
                .context("Failed to build TLS connector")?;
            Manager::from_config(pg_config, MakeTlsConnector::new(tls_connector), mgr_config)
        } else {
            Manager::from_config(pg_config, NoTls, mgr_config)
        };

        let timeout = Some(Duration::from_secs(30));
        let pool = Pool::builder(mgr)
            .max_size(config.max_connections)
            .wait_timeout(timeout)
            .create_timeout(timeout)
            .recycle_timeout(timeout)
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .context("Failed to create database pool")?;

        let db = Self { pool };
        db.health_check().await?;
        super::migrations::run_migrations(&db.pool).await?;

        tracing::info!("✅ Database connection established");
        Ok(db)
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<()> {
        let client = self
            .pool
            .get()
            .await
            .context("Failed to get connection for health check")?;

        client
            .query("SELECT 1", &[])
            .await
            .context("Database health check failed")?;
        Ok(())
    }

    async fn user_query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> StoreResult<Option<User>> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        let row = client.query_opt(sql, params).await.context("User query failed")?;
        row.map(|r| User::from_row(&r))
            .transpose()
            .context("Failed to decode user row")
            .map_err(StoreError::from)
    }

    async fn card_query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> StoreResult<Option<Card>> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        let row = client.query_opt(sql, params).await.context("Card query failed")?;
        row.map(|r| Card::from_row(&r))
            .transpose()
            .context("Failed to decode card row")
            .map_err(StoreError::from)
    }
}

#[async_trait]
impl Store for DatabaseConnection {
    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        let sql = format!(
            "INSERT INTO users (id, name, about, avatar, email, password_hash) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        let row = client
            .query_one(
                &sql,
                &[
                    &Uuid::new_v4(),
                    &new.name,
                    &new.about,
                    &new.avatar,
                    &new.email,
                    &new.password_hash,
                ],
            )
            .await
            .map_err(|e| {
                if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                    StoreError::DuplicateEmail(new.email.clone())
                } else {
                    StoreError::Backend(anyhow::Error::new(e).context("Failed to insert user"))
                }
            })?;
        Ok(User::from_row(&row).context("Failed to decode user row")?)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        self.user_query(&sql, &[&id]).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        self.user_query(&sql, &[&email]).await
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, email");
        let rows = client.query(&sql, &[]).await.context("Failed to list users")?;
        let users = rows
            .iter()
            .map(User::from_row)
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to decode user row")?;
        Ok(users)
    }

    async fn update_profile(&self, id: Uuid, name: &str, about: &str) -> StoreResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET name = $2, about = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        self.user_query(&sql, &[&id, &name, &about]).await
    }

    async fn update_avatar(&self, id: Uuid, avatar: &str) -> StoreResult<Option<User>> {
        let sql = format!("UPDATE users SET avatar = $2 WHERE id = $1 RETURNING {USER_COLUMNS}");
        self.user_query(&sql, &[&id, &avatar]).await
    }

    async fn list_cards(&self) -> StoreResult<Vec<Card>> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        let sql = format!("SELECT {CARD_COLUMNS} FROM cards ORDER BY created_at, id");
        let rows = client.query(&sql, &[]).await.context("Failed to list cards")?;
        let cards = rows
            .iter()
            .map(Card::from_row)
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to decode card row")?;
        Ok(cards)
    }

    async fn create_card(&self, new: NewCard) -> StoreResult<Card> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        let sql = format!(
            "INSERT INTO cards (id, name, link, owner) VALUES ($1, $2, $3, $4) \
             RETURNING {CARD_COLUMNS}"
        );
        let row = client
            .query_one(&sql, &[&Uuid::new_v4(), &new.name, &new.link, &new.owner])
            .await
            .context("Failed to insert card")?;
        Ok(Card::from_row(&row).context("Failed to decode card row")?)
    }

    async fn find_card(&self, id: Uuid) -> StoreResult<Option<Card>> {
        let sql = format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = $1");
        self.card_query(&sql, &[&id]).await
    }

    async fn delete_card(&self, id: Uuid) -> StoreResult<Option<Card>> {
        let sql = format!("DELETE FROM cards WHERE id = $1 RETURNING {CARD_COLUMNS}");
        self.card_query(&sql, &[&id]).await
    }

    async fn set_like(
        &self,
        card_id: Uuid,
        user_id: Uuid,
        liked: bool,
    ) -> StoreResult<Option<Card>> {
        // Single statement each way, so concurrent likes cannot duplicate an entry.
        let update = if liked {
            "likes = CASE WHEN $2 = ANY(likes) THEN likes ELSE array_append(likes, $2) END"
        } else {
            "likes = array_remove(likes, $2)"
        };
        let sql = format!("UPDATE cards SET {update} WHERE id = $1 RETURNING {CARD_COLUMNS}");
        self.card_query(&sql, &[&card_id, &user_id]).await
    }
}
