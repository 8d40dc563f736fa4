use serde_json::Value;
use tracing::debug;

use super::fields::{self, Object};
use crate::encyclopedia::{Character, CustomField};
use crate::ids::IdGenerator;

/// Role given to an absorbed legacy `protagonist`.
pub const ROLE_PROTAGONIST: &str = "Protagonist";
/// Role given to absorbed legacy `loveInterests`.
pub const ROLE_LOVE_INTEREST: &str = "Love Interest";
/// Role given to absorbed legacy `antagonists`.
pub const ROLE_ANTAGONIST: &str = "Antagonist";

/// Canonical character fields and the older name each one replaced.
const FIELD_ALIASES: &[(&str, Option<&str>)] = &[
    ("age", None),
    ("gender", None),
    ("physicalDescription", None),
    ("voiceAndSpeechStyle", Some("voiceDescription")),
    ("personalityTraits", Some("protagonistPersonality")),
    ("habits", None),
    ("goal", Some("protagonistGoal")),
    ("principles", None),
    ("conflict", Some("protagonistConflict")),
];

/// Shapes a stored character value can take.
#[derive(Debug, Clone, Copy)]
pub enum RawCharacter<'a> {
    /// Oldest format: the character is just its name.
    Name(&'a str),
    /// A profile object, current or carrying legacy aliases.
    Profile(&'a Object),
    /// Anything else; normalized as an empty profile.
    Unrecognized,
}

impl<'a> RawCharacter<'a> {
    /// Classify a stored value.
    pub fn probe(value: &'a Value) -> Self {
        match value {
            Value::String(name) => RawCharacter::Name(name),
            Value::Object(obj) => RawCharacter::Profile(obj),
            _ => RawCharacter::Unrecognized,
        }
    }
}

/// Normalize any stored character value into the current shape.
///
/// Canonical fields win when non-empty, then the legacy alias, then `""`.
/// `roles` falls back to `default_roles` when missing or empty.
pub fn normalize_character(
    raw: &Value,
    default_roles: &[&str],
    ids: &dyn IdGenerator,
) -> Character {
    let defaults = || default_roles.iter().map(|r| r.to_string()).collect();

    let obj = match RawCharacter::probe(raw) {
        RawCharacter::Name(name) => {
            return Character {
                id: ids.next_id(),
                name: name.to_string(),
                roles: defaults(),
                ..Character::default()
            };
        }
        RawCharacter::Profile(obj) => obj,
        RawCharacter::Unrecognized => fields::empty_object(),
    };

    let field = |canonical: &str| -> String {
        let alias = FIELD_ALIASES
            .iter()
            .find(|(name, _)| *name == canonical)
            .and_then(|(_, alias)| *alias);
        fields::non_empty_text(obj, canonical)
            .or_else(|| alias.and_then(|a| fields::non_empty_text(obj, a)))
            .unwrap_or_default()
            .to_string()
    };

    let roles = fields::string_list(obj, "roles");

    Character {
        id: fields::id_or_new(obj, "id", ids),
        name: fields::text(obj, "name"),
        roles: if roles.is_empty() { defaults() } else { roles },
        age: field("age"),
        gender: field("gender"),
        physical_description: field("physicalDescription"),
        voice_and_speech_style: field("voiceAndSpeechStyle"),
        personality_traits: field("personalityTraits"),
        habits: field("habits"),
        goal: field("goal"),
        principles: field("principles"),
        conflict: field("conflict"),
        custom_fields: custom_fields(obj, ids),
    }
}

fn custom_fields(obj: &Object, ids: &dyn IdGenerator) -> Vec<CustomField> {
    fields::list(obj, "customFields")
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .map(|cf| CustomField {
                    id: fields::id_or_new(cf, "id", ids),
                    label: fields::text(cf, "label"),
                    value: fields::text(cf, "value"),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Fold the legacy `protagonist`, `loveInterests` and `antagonists` fields
/// into `characters`.
///
/// Order is protagonist, then love interests, then antagonists, each in
/// array order; every candidate is checked against the list as it stands,
/// including earlier appends. Matching is on the exact `name` string, so a
/// love interest sharing the protagonist's name is dropped rather than
/// duplicated. The protagonist is appended even when nameless; love
/// interests and antagonists need a non-empty name.
pub fn absorb_legacy_roles(doc: &Object, characters: &mut Vec<Character>, ids: &dyn IdGenerator) {
    let taken = |characters: &[Character], name: &str| characters.iter().any(|c| c.name == name);

    if !fields::is_missing(doc, "protagonist") {
        let protagonist = normalize_character(&doc["protagonist"], &[ROLE_PROTAGONIST], ids);
        if !taken(characters, &protagonist.name) {
            debug!(name = %protagonist.name, "Absorbed legacy protagonist");
            characters.push(protagonist);
        }
    }

    for (key, role) in [
        ("loveInterests", ROLE_LOVE_INTEREST),
        ("antagonists", ROLE_ANTAGONIST),
    ] {
        let Some(entries) = fields::list(doc, key) else {
            continue;
        };
        for raw in entries {
            let character = normalize_character(raw, &[role], ids);
            if character.name.is_empty() || taken(characters, &character.name) {
                continue;
            }
            debug!(name = %character.name, role, "Absorbed legacy character");
            characters.push(character);
        }
    }
}
