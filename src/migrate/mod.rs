//! Migration of stored Story and Universe documents to the current schema.
//!
//! Input is whatever JSON a previous version wrote; output is a typed
//! document satisfying every invariant of [`crate::encyclopedia`]. The pass
//! is pure and permissive:
//!
//! - missing or malformed fields become empty values, never errors
//! - ids are minted only where the stored id is missing or empty
//! - legacy `protagonist`/`loveInterests`/`antagonists` fold into `characters`
//! - name-keyed relationships are re-keyed by character id, and any
//!   relationship that cannot be resolved is dropped
//!
//! Re-running a migration on its own serialized output is a no-op.

mod character;
mod fields;
mod lore;
mod relationship;
mod story;
mod universe;


pub use character::{
    absorb_legacy_roles, normalize_character, RawCharacter, ROLE_ANTAGONIST, ROLE_LOVE_INTEREST,
    ROLE_PROTAGONIST,
};
pub use lore::PLACEHOLDER_CHAPTER_TITLE;
pub use relationship::{migrate_relationships, RelationshipFormat};
pub use story::migrate_story;
pub use universe::migrate_universe;

use serde_json::Value;

use crate::encyclopedia::{StoryDocument, UniverseDocument};
use crate::ids::IdGenerator;

/// Migrate every element of a stored story list.
///
/// A value that is not a list yields `None` so the caller can decide how to
/// report it.
pub fn migrate_story_list(raw: &Value, ids: &dyn IdGenerator) -> Option<Vec<StoryDocument>> {
    raw.as_array()
        .map(|items| items.iter().map(|item| migrate_story(item, ids)).collect())
}

/// Migrate every element of a stored universe list.
pub fn migrate_universe_list(raw: &Value, ids: &dyn IdGenerator) -> Option<Vec<UniverseDocument>> {
    raw.as_array()
        .map(|items| items.iter().map(|item| migrate_universe(item, ids)).collect())
}
