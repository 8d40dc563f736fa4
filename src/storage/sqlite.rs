use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

use super::{
    chat_key, decode_chat, decode_stories, decode_universes, needs_write_back, DocumentStore,
    STORIES_KEY, UNIVERSES_KEY,
};
use crate::chat::ChatMessage;
use crate::config::DatabaseConfig;
use crate::encyclopedia::{StoryDocument, UniverseDocument};
use crate::error::{StorageError, StorageResult};
use crate::ids::IdGenerator;

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed document store
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `config.path`
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Private in-memory database, for tests and dry runs
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            }
        })?;

        // Every connection to :memory: is its own database, so keep exactly one.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying pool for advanced queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Raw stored text under `key`
    pub async fn get_raw(&self, key: &str) -> StorageResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    /// Store raw text under `key`, replacing any previous value
    pub async fn put_raw(&self, key: &str, value: &str) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(key = %key, bytes = value.len(), "Stored value");
        Ok(())
    }

    /// Remove `key`
    pub async fn delete_raw(&self, key: &str) -> StorageResult<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn put_json<T: Serialize + ?Sized + Sync>(&self, key: &str, value: &T) -> StorageResult<()> {
        let text = serde_json::to_string(value).map_err(|source| StorageError::Serialization {
            key: key.to_string(),
            source,
        })?;
        self.put_raw(key, &text).await
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn load_stories(&self, ids: &dyn IdGenerator) -> StorageResult<Vec<StoryDocument>> {
        let Some(text) = self.get_raw(STORIES_KEY).await? else {
            return Ok(Vec::new());
        };
        let stories = decode_stories(&text, ids);

        // Persist upgrades so minted ids survive the next load
        if needs_write_back(&text, &stories) {
            info!(key = STORIES_KEY, count = stories.len(), "Persisting migrated stories");
            self.save_stories(&stories).await?;
        }
        Ok(stories)
    }

    async fn save_stories(&self, stories: &[StoryDocument]) -> StorageResult<()> {
        self.put_json(STORIES_KEY, stories).await
    }

    async fn load_universes(
        &self,
        ids: &dyn IdGenerator,
    ) -> StorageResult<Vec<UniverseDocument>> {
        let Some(text) = self.get_raw(UNIVERSES_KEY).await? else {
            return Ok(Vec::new());
        };
        let universes = decode_universes(&text, ids);

        if needs_write_back(&text, &universes) {
            info!(key = UNIVERSES_KEY, count = universes.len(), "Persisting migrated universes");
            self.save_universes(&universes).await?;
        }
        Ok(universes)
    }

    async fn save_universes(&self, universes: &[UniverseDocument]) -> StorageResult<()> {
        self.put_json(UNIVERSES_KEY, universes).await
    }

    async fn load_chat(&self, story_id: &str) -> StorageResult<Vec<ChatMessage>> {
        let key = chat_key(story_id);
        Ok(self
            .get_raw(&key)
            .await?
            .map(|text| decode_chat(&key, &text))
            .unwrap_or_default())
    }

    async fn save_chat(&self, story_id: &str, messages: &[ChatMessage]) -> StorageResult<()> {
        let kept: Vec<&ChatMessage> = messages.iter().filter(|m| !m.is_greeting()).collect();
        if kept.is_empty() {
            return Ok(());
        }
        self.put_json(&chat_key(story_id), &kept).await
    }

    async fn delete_chat(&self, story_id: &str) -> StorageResult<()> {
        self.delete_raw(&chat_key(story_id)).await
    }
}
