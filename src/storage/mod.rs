//! Local persistence for stories, universes and chat histories.
//!
//! Documents live in a single key-value table under the same keys the web
//! app used in browser storage. Everything read back goes through the
//! migrator, so callers only ever see current-shape documents.

mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::chat::ChatMessage;
use crate::encyclopedia::{StoryDocument, UniverseDocument};
use crate::error::StorageResult;
use crate::ids::IdGenerator;
use crate::migrate::{migrate_story_list, migrate_universe_list};

/// Key holding the story list.
pub const STORIES_KEY: &str = "webnovel_stories";
/// Key holding the universe library.
pub const UNIVERSES_KEY: &str = "webnovel_universes";

/// Key holding the chat history of one story.
pub fn chat_key(story_id: &str) -> String {
    format!("webnovel_chat_{}", story_id)
}

/// Parse stored text, logging and discarding anything unreadable.
fn parse_stored(key: &str, text: &str) -> Option<Value> {
    match serde_json::from_str(text) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key = %key, error = %e, "Stored value is not valid JSON, ignoring it");
            None
        }
    }
}

/// Decode and migrate a stored story list.
pub fn decode_stories(text: &str, ids: &dyn IdGenerator) -> Vec<StoryDocument> {
    let Some(value) = parse_stored(STORIES_KEY, text) else {
        return Vec::new();
    };
    migrate_story_list(&value, ids).unwrap_or_else(|| {
        warn!(key = STORIES_KEY, "Stored stories are not a list, ignoring them");
        Vec::new()
    })
}

/// Decode and migrate a stored universe library.
pub fn decode_universes(text: &str, ids: &dyn IdGenerator) -> Vec<UniverseDocument> {
    let Some(value) = parse_stored(UNIVERSES_KEY, text) else {
        return Vec::new();
    };
    migrate_universe_list(&value, ids).unwrap_or_else(|| {
        warn!(key = UNIVERSES_KEY, "Stored universes are not a list, ignoring them");
        Vec::new()
    })
}

/// Decode a stored chat history; messages that fail to parse are skipped.
pub fn decode_chat(key: &str, text: &str) -> Vec<ChatMessage> {
    let Some(Value::Array(items)) = parse_stored(key, text) else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(key = %key, error = %e, "Skipping unreadable chat message");
                None
            }
        })
        .collect()
}

/// Whether a migrated list differs from the stored text it came from.
///
/// Text that is not a JSON list is never rewritten.
pub fn needs_write_back<T: Serialize>(text: &str, migrated: &[T]) -> bool {
    let Ok(stored) = serde_json::from_str::<Value>(text) else {
        return false;
    };
    if !stored.is_array() {
        return false;
    }
    serde_json::to_value(migrated).is_ok_and(|current| current != stored)
}

/// Storage trait for document persistence.
///
/// Loads never fail on bad stored data: unreadable values are logged and
/// come back empty. Only the backing store itself can produce errors.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load and migrate all stories.
    ///
    /// Implementations persist the migrated list whenever migration changed
    /// it, so ids minted for legacy entries stay stable across loads.
    async fn load_stories(&self, ids: &dyn IdGenerator) -> StorageResult<Vec<StoryDocument>>;
    /// Replace the stored story list.
    async fn save_stories(&self, stories: &[StoryDocument]) -> StorageResult<()>;

    /// Load and migrate the universe library.
    async fn load_universes(&self, ids: &dyn IdGenerator)
        -> StorageResult<Vec<UniverseDocument>>;
    /// Replace the stored universe library.
    async fn save_universes(&self, universes: &[UniverseDocument]) -> StorageResult<()>;

    /// Load the chat history of a story.
    async fn load_chat(&self, story_id: &str) -> StorageResult<Vec<ChatMessage>>;
    /// Replace the chat history of a story. The greeting is never written.
    async fn save_chat(&self, story_id: &str, messages: &[ChatMessage]) -> StorageResult<()>;
    /// Forget the chat history of a story.
    async fn delete_chat(&self, story_id: &str) -> StorageResult<()>;

    /// Look up one story by id.
    async fn find_story(
        &self,
        id: &str,
        ids: &dyn IdGenerator,
    ) -> StorageResult<Option<StoryDocument>> {
        let stories = self.load_stories(ids).await?;
        Ok(stories.into_iter().find(|s| s.id == id))
    }

    /// Insert `story`, or replace the stored story with the same id.
    async fn upsert_story(&self, story: &StoryDocument, ids: &dyn IdGenerator) -> StorageResult<()> {
        let mut stories = self.load_stories(ids).await?;
        match stories.iter_mut().find(|s| s.id == story.id) {
            Some(slot) => *slot = story.clone(),
            None => stories.push(story.clone()),
        }
        self.save_stories(&stories).await
    }

    /// Remove a story and its chat history. Returns whether it existed.
    async fn delete_story(&self, id: &str, ids: &dyn IdGenerator) -> StorageResult<bool> {
        let mut stories = self.load_stories(ids).await?;
        let before = stories.len();
        stories.retain(|s| s.id != id);
        let removed = stories.len() != before;
        if removed {
            self.save_stories(&stories).await?;
        }
        self.delete_chat(id).await?;
        Ok(removed)
    }

    /// Look up one universe by id.
    async fn find_universe(
        &self,
        id: &str,
        ids: &dyn IdGenerator,
    ) -> StorageResult<Option<UniverseDocument>> {
        let universes = self.load_universes(ids).await?;
        Ok(universes.into_iter().find(|u| u.id == id))
    }

    /// Insert `universe`, or replace the stored universe with the same id.
    async fn upsert_universe(
        &self,
        universe: &UniverseDocument,
        ids: &dyn IdGenerator,
    ) -> StorageResult<()> {
        let mut universes = self.load_universes(ids).await?;
        match universes.iter_mut().find(|u| u.id == universe.id) {
            Some(slot) => *slot = universe.clone(),
            None => universes.push(universe.clone()),
        }
        self.save_universes(&universes).await
    }

    /// Remove a universe from the library. Returns whether it existed.
    async fn delete_universe(&self, id: &str, ids: &dyn IdGenerator) -> StorageResult<bool> {
        let mut universes = self.load_universes(ids).await?;
        let before = universes.len();
        universes.retain(|u| u.id != id);
        let removed = universes.len() != before;
        if removed {
            self.save_universes(&universes).await?;
        }
        Ok(removed)
    }
}
