use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::debug;

use super::fields::{self, Object};
use crate::encyclopedia::{Character, Relationship};
use crate::ids::IdGenerator;

/// Stored relationship list formats, told apart by probing the first entry.
///
/// There is no version tag. A list can look like more than one format (a
/// name-keyed entry usually has no `id` either), so the probe order is the
/// definition: `character1` present wins, then a missing `id`, then current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipFormat {
    /// Entries name their characters via `character1`/`character2`.
    NameKeyed,
    /// Id-keyed entries written before relationships had their own id.
    MissingIds,
    /// Current format, or an empty list.
    Current,
}

impl RelationshipFormat {
    /// Classify a stored list by its first entry.
    pub fn sniff(entries: &[Value]) -> Self {
        let Some(first) = entries.first() else {
            return RelationshipFormat::Current;
        };
        let first = fields::as_object(first);
        if first.contains_key("character1") {
            RelationshipFormat::NameKeyed
        } else if fields::non_empty_text(first, "id").is_none() {
            RelationshipFormat::MissingIds
        } else {
            RelationshipFormat::Current
        }
    }
}

fn id_keyed(obj: &Object, id: String) -> Relationship {
    Relationship {
        id,
        character1_id: fields::text(obj, "character1Id"),
        character2_id: fields::text(obj, "character2Id"),
        kind: fields::text(obj, "type"),
        description: fields::text(obj, "description"),
    }
}

/// Bring a stored relationship list up to the current id-keyed shape.
///
/// `characters` must already be migrated. Any relationship that does not
/// reference two ids present in `characters` is dropped; for name-keyed
/// entries that includes every name that fails to resolve.
pub fn migrate_relationships(
    raw: Option<&Value>,
    characters: &[Character],
    ids: &dyn IdGenerator,
) -> Vec<Relationship> {
    let Some(entries) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };

    let format = RelationshipFormat::sniff(entries);
    let objects = entries.iter().filter_map(Value::as_object);

    let migrated: Vec<Relationship> = match format {
        RelationshipFormat::NameKeyed => {
            // Later characters overwrite earlier ones with the same name.
            let by_name: HashMap<&str, &str> = characters
                .iter()
                .map(|c| (c.name.as_str(), c.id.as_str()))
                .collect();
            let resolve = |obj: &Object, key: &str| -> String {
                obj.get(key)
                    .and_then(Value::as_str)
                    .and_then(|name| by_name.get(name))
                    .map(|id| id.to_string())
                    .unwrap_or_default()
            };

            objects
                .map(|obj| Relationship {
                    id: ids.next_id(),
                    character1_id: resolve(obj, "character1"),
                    character2_id: resolve(obj, "character2"),
                    kind: fields::text(obj, "type"),
                    description: fields::text(obj, "description"),
                })
                .filter(|rel| !rel.character1_id.is_empty() && !rel.character2_id.is_empty())
                .collect()
        }
        RelationshipFormat::MissingIds => objects.map(|obj| id_keyed(obj, ids.next_id())).collect(),
        RelationshipFormat::Current => objects
            .map(|obj| id_keyed(obj, fields::id_or_new(obj, "id", ids)))
            .collect(),
    };

    let known: HashSet<&str> = characters.iter().map(|c| c.id.as_str()).collect();
    let before = migrated.len();
    let resolved: Vec<Relationship> = migrated
        .into_iter()
        .filter(|rel| {
            known.contains(rel.character1_id.as_str()) && known.contains(rel.character2_id.as_str())
        })
        .collect();

    if resolved.len() != entries.len() {
        debug!(
            format = ?format,
            stored = entries.len(),
            unresolved = before - resolved.len(),
            kept = resolved.len(),
            "Dropped relationships that do not resolve to characters"
        );
    }

    resolved
}
