use serde_json::Value;
use tracing::debug;

use super::fields;
use super::lore::lore_entries;
use crate::encyclopedia::{Language, UniverseDocument};
use crate::ids::IdGenerator;

const UNIVERSE_KEYS: &[&str] = &[
    "id",
    "language",
    "name",
    "description",
    "isFavorite",
    "locations",
    "factions",
    "lore",
    "magicSystem",
    "worldBuilding",
];

/// Migrate a stored universe value to the current shape.
pub fn migrate_universe(raw: &Value, ids: &dyn IdGenerator) -> UniverseDocument {
    let doc = fields::as_object(raw);

    let universe = UniverseDocument {
        id: fields::id_or_new(doc, "id", ids),
        language: Language::from_code(doc.get("language").and_then(Value::as_str)),
        name: fields::text(doc, "name"),
        description: fields::text(doc, "description"),
        is_favorite: doc.get("isFavorite").and_then(Value::as_bool),
        locations: lore_entries(doc, "locations", ids),
        factions: lore_entries(doc, "factions", ids),
        lore: lore_entries(doc, "lore", ids),
        magic_system: fields::text(doc, "magicSystem"),
        world_building: fields::text(doc, "worldBuilding"),
        extra: fields::unknown_keys(doc, UNIVERSE_KEYS),
    };

    debug!(universe_id = %universe.id, "Universe migrated");
    universe
}
