use serde_json::Value;
use tracing::debug;

use super::character::{absorb_legacy_roles, normalize_character};
use super::fields;
use super::lore::{chapters, lore_entries, story_arc};
use super::relationship::migrate_relationships;
use crate::encyclopedia::{Language, StoryDocument};
use crate::ids::IdGenerator;

/// Top-level story keys this version models.
const STORY_KEYS: &[&str] = &[
    "id",
    "language",
    "title",
    "genres",
    "otherGenre",
    "setting",
    "totalChapters",
    "wordsPerChapter",
    "mainPlot",
    "characters",
    "relationships",
    "storyArc",
    "comedyLevel",
    "romanceLevel",
    "actionLevel",
    "maturityLevel",
    "proseStyle",
    "customProseStyleByExample",
    "chapters",
    "universeId",
    "universeName",
    "locations",
    "factions",
    "lore",
    "magicSystem",
    "worldBuilding",
    "disguiseRealWorldNames",
];

/// Pre-`characters` fields; always removed.
const LEGACY_STORY_KEYS: &[&str] = &["protagonist", "loveInterests", "antagonists"];

/// Migrate a stored story value of any vintage to the current shape.
///
/// Never fails and never touches `raw`. Running it on its own output
/// (re-serialized) yields the same document.
pub fn migrate_story(raw: &Value, ids: &dyn IdGenerator) -> StoryDocument {
    let doc = fields::as_object(raw);
    let language = Language::from_code(doc.get("language").and_then(Value::as_str));

    let mut characters: Vec<_> = fields::list(doc, "characters")
        .map(|items| {
            items
                .iter()
                .map(|c| normalize_character(c, &[], ids))
                .collect()
        })
        .unwrap_or_default();
    absorb_legacy_roles(doc, &mut characters, ids);

    let relationships = migrate_relationships(doc.get("relationships"), &characters, ids);

    let universe_name = match doc.get("universeName").and_then(Value::as_str) {
        Some(name) => name.to_string(),
        None => language.custom_world_name().to_string(),
    };

    let story = StoryDocument {
        id: fields::id_or_new(doc, "id", ids),
        language,
        title: fields::text(doc, "title"),
        genres: fields::string_list(doc, "genres"),
        other_genre: fields::text(doc, "otherGenre"),
        setting: fields::text(doc, "setting"),
        total_chapters: fields::text(doc, "totalChapters"),
        words_per_chapter: fields::text(doc, "wordsPerChapter"),
        main_plot: fields::text(doc, "mainPlot"),
        characters,
        relationships,
        story_arc: story_arc(doc, language, ids),
        comedy_level: fields::text(doc, "comedyLevel"),
        romance_level: fields::text(doc, "romanceLevel"),
        action_level: fields::text(doc, "actionLevel"),
        maturity_level: fields::text(doc, "maturityLevel"),
        prose_style: fields::text(doc, "proseStyle"),
        custom_prose_style_by_example: fields::text(doc, "customProseStyleByExample"),
        chapters: chapters(doc, ids),
        universe_id: doc
            .get("universeId")
            .and_then(Value::as_str)
            .map(str::to_string),
        universe_name,
        locations: lore_entries(doc, "locations", ids),
        factions: lore_entries(doc, "factions", ids),
        lore: lore_entries(doc, "lore", ids),
        magic_system: fields::text(doc, "magicSystem"),
        world_building: fields::text(doc, "worldBuilding"),
        disguise_real_world_names: fields::flag(doc, "disguiseRealWorldNames"),
        extra: fields::unknown_keys(doc, &[STORY_KEYS, LEGACY_STORY_KEYS].concat()),
    };

    debug!(
        story_id = %story.id,
        characters = story.characters.len(),
        relationships = story.relationships.len(),
        chapters = story.chapters.len(),
        "Story migrated"
    );

    story
}
