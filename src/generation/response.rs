use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::Section;
use crate::encyclopedia::StoryDocument;
use crate::error::{GenerationError, GenerationResult};
use crate::ids::IdGenerator;
use crate::migrate::migrate_story;

/// Parsed and id-stamped output of one drafting call
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedSection {
    pub section: Section,
    pub data: Map<String, Value>,
}

/// Lore lists the model may return for core and world-lore drafts.
const LORE_KEYS: [&str; 3] = ["locations", "factions", "lore"];

/// Give every object in `list` a fresh id, replacing any the model invented.
fn stamp_ids(list: Option<&mut Value>, ids: &dyn IdGenerator) {
    let Some(Value::Array(items)) = list else {
        return;
    };
    for item in items.iter_mut() {
        if let Value::Object(obj) = item {
            obj.insert("id".to_string(), Value::String(ids.next_id()));
        }
    }
}

fn default_custom_fields(character: &mut Map<String, Value>) {
    let missing = character
        .get("customFields")
        .map_or(true, |v| v.is_null());
    if missing {
        character.insert("customFields".to_string(), Value::Array(Vec::new()));
    }
}

/// Parse the model's JSON text for `section` and sanitize it.
///
/// Relationships, plot points and lore entries get fresh ids; core characters
/// get an id only when the model left it out.
pub fn post_process(
    section: Section,
    raw_text: &str,
    ids: &dyn IdGenerator,
) -> GenerationResult<GeneratedSection> {
    let invalid = |message: String| GenerationError::InvalidResponse {
        section: section.to_string(),
        message,
    };

    let value: Value = serde_json::from_str(raw_text.trim()).map_err(|e| {
        warn!(section = %section, error = %e, "Unparseable section response");
        invalid(e.to_string())
    })?;
    let Value::Object(mut data) = value else {
        return Err(invalid("Expected a JSON object".to_string()));
    };

    match section {
        Section::Character => default_custom_fields(&mut data),
        Section::Relationships => stamp_ids(data.get_mut("relationships"), ids),
        Section::SingleArcAct => {
            if !matches!(data.get("plotPoints"), Some(Value::Array(_))) {
                data.insert("plotPoints".to_string(), Value::Array(Vec::new()));
            }
            stamp_ids(data.get_mut("plotPoints"), ids);
        }
        Section::Arc => {
            if let Some(Value::Array(acts)) = data.get_mut("storyArc") {
                for act in acts.iter_mut().filter_map(Value::as_object_mut) {
                    if !matches!(act.get("plotPoints"), Some(Value::Array(_))) {
                        act.insert("plotPoints".to_string(), Value::Array(Vec::new()));
                    }
                    stamp_ids(act.get_mut("plotPoints"), ids);
                }
            }
        }
        Section::Core => {
            if let Some(Value::Array(characters)) = data.get_mut("characters") {
                for character in characters.iter_mut().filter_map(Value::as_object_mut) {
                    default_custom_fields(character);
                    let has_id = character
                        .get("id")
                        .and_then(Value::as_str)
                        .is_some_and(|id| !id.is_empty());
                    if !has_id {
                        character.insert("id".to_string(), Value::String(ids.next_id()));
                    }
                }
            }
            for key in LORE_KEYS {
                stamp_ids(data.get_mut(key), ids);
            }
        }
        Section::WorldLore => {
            for key in LORE_KEYS {
                stamp_ids(data.get_mut(key), ids);
            }
        }
        _ => {}
    }

    debug!(section = %section, keys = data.len(), "Post-processed section response");
    Ok(GeneratedSection { section, data })
}

impl GeneratedSection {
    /// Example paragraph of a style-example draft.
    pub fn example(&self) -> Option<&str> {
        self.data.get("example").and_then(Value::as_str)
    }

    /// Apply this draft to `story` and return the re-migrated result.
    ///
    /// A character draft replaces the character at `index` (keeping its id), an
    /// act draft replaces the act at `index`, relationships are appended and
    /// every other section is merged key by key. Style examples leave the story
    /// untouched.
    pub fn merge_into(
        &self,
        story: &StoryDocument,
        index: usize,
        ids: &dyn IdGenerator,
    ) -> GenerationResult<StoryDocument> {
        if self.section == Section::StyleExample {
            return Ok(story.clone());
        }

        let mut doc = match serde_json::to_value(story) {
            Ok(Value::Object(doc)) => doc,
            _ => {
                return Err(GenerationError::InvalidResponse {
                    section: self.section.to_string(),
                    message: "Story could not be serialized".to_string(),
                })
            }
        };

        match self.section {
            Section::Character => {
                let existing = story.characters.get(index).ok_or_else(|| {
                    self.out_of_range(index, story.characters.len())
                })?;
                let mut character = self.data.clone();
                character.insert("id".to_string(), Value::String(existing.id.clone()));
                replace_at(&mut doc, "characters", index, Value::Object(character));
            }
            Section::SingleArcAct => {
                if index >= story.story_arc.len() {
                    return Err(self.out_of_range(index, story.story_arc.len()));
                }
                replace_at(&mut doc, "storyArc", index, Value::Object(self.data.clone()));
            }
            Section::Relationships => {
                let added = match self.data.get("relationships") {
                    Some(Value::Array(added)) => added.clone(),
                    _ => Vec::new(),
                };
                if let Some(Value::Array(existing)) = doc.get_mut("relationships") {
                    existing.extend(added);
                }
            }
            _ => {
                for (key, value) in &self.data {
                    doc.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(migrate_story(&Value::Object(doc), ids))
    }

    fn out_of_range(&self, index: usize, len: usize) -> GenerationError {
        GenerationError::IndexOutOfRange {
            section: self.section.to_string(),
            index,
            len,
        }
    }
}

fn replace_at(doc: &mut Map<String, Value>, key: &str, index: usize, value: Value) {
    if let Some(slot) = doc
        .get_mut(key)
        .and_then(Value::as_array_mut)
        .and_then(|items| items.get_mut(index))
    {
        *slot = value;
    }
}
