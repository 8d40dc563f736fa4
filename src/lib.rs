//! # Story Encyclopedia
//!
//! Toolkit behind a webnovel writing assistant. A story's "encyclopedia"
//! (premise, characters, relationships, arc, world lore, tone and prose
//! style) is stored as JSON, drafted section by section with Google Gemini,
//! and discussed with an AI assistant that knows the whole encyclopedia.
//!
//! ## Features
//!
//! - **Migration**: Any previously stored story or universe, however old its
//!   shape, is brought to the current schema without losing data
//! - **Section Generation**: Localized prompts with strict JSON schemas for
//!   every encyclopedia section, post-processed and merged into the story
//! - **Assistant Chat**: Per-story conversations with an optional deep
//!   thinking mode
//! - **Universe Library**: Reusable world-building shared between stories
//! - **Import/Export**: Shareable Markdown files with the document embedded
//!
//! ## Architecture
//!
//! ```text
//! CLI → Generator / Chat → Gemini (HTTP)
//!   ↓
//! Migrator ← SQLite key-value store
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use story_encyclopedia::{migrate_story, ids::UuidGenerator};
//!
//! let legacy = serde_json::json!({ "title": "Ashfall", "protagonist": "Amy" });
//! let story = migrate_story(&legacy, &UuidGenerator);
//! assert_eq!(story.characters[0].name, "Amy");
//! ```

#![warn(missing_docs)]

/// Assistant chat sessions bound to one story.
pub mod chat;
/// Command-line interface.
pub mod cli;
/// Configuration management.
pub mod config;
/// Story and universe document types.
pub mod encyclopedia;
/// Error types and result aliases for the application.
pub mod error;
/// Gemini API client and wire types.
pub mod gemini;
/// AI drafting of encyclopedia sections.
pub mod generation;
/// Identifier generation.
pub mod ids;
/// Migration of stored documents to the current schema.
pub mod migrate;
/// Prose styles and the assistant's system instruction.
pub mod prompts;
/// SQLite storage layer for persistence.
pub mod storage;
/// Markdown import/export of single documents.
pub mod transfer;

pub use config::Config;
pub use encyclopedia::{Language, StoryDocument, UniverseDocument};
pub use error::{AppError, AppResult};
pub use migrate::{migrate_story, migrate_universe};
pub use storage::{DocumentStore, SqliteStore};
