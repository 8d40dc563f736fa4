//! Canonical Story Encyclopedia and Universe document types.
//!
//! These are the post-migration shapes. Stored or imported JSON never
//! deserializes into them directly; it goes through [`crate::migrate`] first,
//! which is the only place that knows about legacy field names.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::IdGenerator;
use crate::prompts::prose_styles;


/// Content language of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English.
    #[default]
    En,
    /// Bahasa Indonesia.
    Id,
}

impl Language {
    /// Map a stored language code; anything other than `"id"` is English.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("id") => Language::Id,
            _ => Language::En,
        }
    }

    /// Short code as stored on the wire.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Id => "id",
        }
    }

    /// Universe name used when a story has no linked universe.
    pub fn custom_world_name(self) -> &'static str {
        match self {
            Language::En => "Custom World",
            Language::Id => "Dunia Kustom",
        }
    }

    /// Title of the first act of a fresh story arc.
    pub fn first_act_title(self) -> &'static str {
        match self {
            Language::En => "Act 1",
            Language::Id => "Babak 1",
        }
    }

    /// Title of the first chapter of a fresh story.
    pub fn first_chapter_title(self) -> &'static str {
        match self {
            Language::En => "Chapter 1",
            Language::Id => "Bab 1",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "id" => Ok(Language::Id),
            _ => Err(format!("Unknown language: {}", s)),
        }
    }
}

/// Free-form labelled detail attached to a character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub id: String,
    pub label: String,
    pub value: String,
}

/// A character profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    pub name: String,
    /// Role tags such as `Protagonist` or `Mentor`, in insertion order.
    pub roles: Vec<String>,
    pub age: String,
    pub gender: String,
    pub physical_description: String,
    pub voice_and_speech_style: String,
    pub personality_traits: String,
    pub habits: String,
    pub goal: String,
    pub principles: String,
    pub conflict: String,
    pub custom_fields: Vec<CustomField>,
}

impl Character {
    /// An empty profile with a fresh id.
    pub fn empty(ids: &dyn IdGenerator) -> Self {
        Self {
            id: ids.next_id(),
            ..Self::default()
        }
    }
}

/// A link between two characters, by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "character1Id")]
    pub character1_id: String,
    #[serde(rename = "character2Id")]
    pub character2_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

/// A named world-building fact: a location, faction, or lore item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoreEntry {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// A single beat inside an act.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotPoint {
    pub id: String,
    pub summary: String,
}

/// One act of the story arc.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryArcAct {
    pub title: String,
    pub description: String,
    pub plot_points: Vec<PlotPoint>,
}

/// A written chapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    pub content: String,
}

/// The full encyclopedia of one webnovel project.
///
/// After migration `chapters` and `story_arc` are never empty and every
/// relationship references two ids present in `characters`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDocument {
    pub id: String,
    pub language: Language,
    pub title: String,
    pub genres: Vec<String>,
    pub other_genre: String,
    pub setting: String,
    pub total_chapters: String,
    pub words_per_chapter: String,
    pub main_plot: String,
    pub characters: Vec<Character>,
    pub relationships: Vec<Relationship>,
    pub story_arc: Vec<StoryArcAct>,
    pub comedy_level: String,
    pub romance_level: String,
    pub action_level: String,
    pub maturity_level: String,
    pub prose_style: String,
    pub custom_prose_style_by_example: String,
    pub chapters: Vec<Chapter>,

    /// Master universe this story snapshots, `None` for a custom world.
    pub universe_id: Option<String>,
    pub universe_name: String,
    pub locations: Vec<LoreEntry>,
    pub factions: Vec<LoreEntry>,
    pub lore: Vec<LoreEntry>,
    pub magic_system: String,
    pub world_building: String,
    pub disguise_real_world_names: bool,

    /// Keys this version does not model, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A reusable world-building bundle that stories can snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniverseDocument {
    pub id: String,
    pub language: Language,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    pub locations: Vec<LoreEntry>,
    pub factions: Vec<LoreEntry>,
    pub lore: Vec<LoreEntry>,
    pub magic_system: String,
    pub world_building: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoryDocument {
    /// A new blank story, as the setup screen starts one.
    ///
    /// The prose style is the first one offered for `language`, so an
    /// Indonesian story is never seeded with an English style.
    pub fn blank(language: Language, ids: &dyn IdGenerator) -> Self {
        let mut protagonist = Character::empty(ids);
        protagonist.roles = vec!["Protagonist".to_string()];

        Self {
            id: ids.next_id(),
            language,
            characters: vec![protagonist],
            story_arc: vec![StoryArcAct {
                title: language.first_act_title().to_string(),
                ..StoryArcAct::default()
            }],
            comedy_level: "5".to_string(),
            romance_level: "5".to_string(),
            action_level: "5".to_string(),
            maturity_level: "1".to_string(),
            prose_style: prose_styles(language)[0].value.to_string(),
            chapters: vec![Chapter {
                id: ids.next_id(),
                title: language.first_chapter_title().to_string(),
                content: String::new(),
            }],
            universe_id: None,
            universe_name: language.custom_world_name().to_string(),
            ..Self::default()
        }
    }

    /// Look up a character's name by id.
    pub fn character_name(&self, id: &str) -> Option<&str> {
        self.characters
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
    }

    /// Genres plus the free-text "other" genre, blanks removed.
    pub fn all_genres(&self) -> Vec<&str> {
        self.genres
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.other_genre.as_str()))
            .filter(|g| !g.is_empty())
            .collect()
    }

    /// Snapshot a universe's world-building into this story.
    ///
    /// Lore entries are copied with fresh ids so edits in the story never
    /// alias the master universe.
    pub fn attach_universe(&mut self, universe: &UniverseDocument, ids: &dyn IdGenerator) {
        let copy = |entries: &[LoreEntry]| -> Vec<LoreEntry> {
            entries
                .iter()
                .map(|entry| LoreEntry {
                    id: ids.next_id(),
                    ..entry.clone()
                })
                .collect()
        };

        self.universe_id = Some(universe.id.clone());
        self.universe_name = universe.name.clone();
        self.locations = copy(&universe.locations);
        self.factions = copy(&universe.factions);
        self.lore = copy(&universe.lore);
        self.magic_system = universe.magic_system.clone();
        self.world_building = universe.world_building.clone();
        self.disguise_real_world_names = false;
    }

    /// Unlink from any universe and start from a blank custom world.
    pub fn detach_universe(&mut self) {
        self.universe_id = None;
        self.universe_name = self.language.custom_world_name().to_string();
        self.locations.clear();
        self.factions.clear();
        self.lore.clear();
        self.magic_system.clear();
        self.world_building.clear();
        self.disguise_real_world_names = false;
    }

    /// Whether the story carries any world-building worth saving.
    pub fn has_world_building(&self) -> bool {
        !self.world_building.is_empty()
            || !self.magic_system.is_empty()
            || !self.locations.is_empty()
            || !self.factions.is_empty()
            || !self.lore.is_empty()
    }

    /// Extract this story's world-building as a new reusable universe.
    ///
    /// Returns `None` when there is nothing to save.
    pub fn to_universe(&self, name: &str, ids: &dyn IdGenerator) -> Option<UniverseDocument> {
        if !self.has_world_building() {
            return None;
        }

        let description = match self.language {
            Language::En => format!("World-building saved from \"{}\".", self.title),
            Language::Id => format!("Pembangunan dunia yang disimpan dari \"{}\".", self.title),
        };

        Some(UniverseDocument {
            id: ids.next_id(),
            language: self.language,
            name: name.to_string(),
            description,
            is_favorite: None,
            locations: self.locations.clone(),
            factions: self.factions.clone(),
            lore: self.lore.clone(),
            magic_system: self.magic_system.clone(),
            world_building: self.world_building.clone(),
            extra: Map::new(),
        })
    }
}

impl UniverseDocument {
    /// A new empty universe.
    pub fn blank(language: Language, ids: &dyn IdGenerator) -> Self {
        Self {
            id: ids.next_id(),
            language,
            ..Self::default()
        }
    }
}
