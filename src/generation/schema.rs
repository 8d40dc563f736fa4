//! Response schemas passed as `responseSchema` for each section.

use serde_json::{json, Value};

use super::Section;

fn custom_field_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "label": {"type": "STRING", "description": "The name of the custom detail, e.g., 'Magical Ability'."},
            "value": {"type": "STRING", "description": "The description of the custom detail."}
        },
        "required": ["label", "value"]
    })
}

fn character_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "name": {"type": "STRING"},
            "roles": {
                "type": "ARRAY",
                "items": {"type": "STRING"},
                "description": "An array of roles for this character, e.g., ['Protagonist', 'Mentor']."
            },
            "age": {"type": "STRING"},
            "gender": {"type": "STRING"},
            "physicalDescription": {"type": "STRING", "description": "A 1-2 sentence description of their physical appearance."},
            "voiceAndSpeechStyle": {"type": "STRING", "description": "A short description of their physical voice AND their typical speech patterns (e.g., speaks quickly, uses sarcasm, has a catchphrase)."},
            "personalityTraits": {"type": "STRING", "description": "A 1-2 sentence summary of their key personality traits."},
            "habits": {"type": "STRING", "description": "A short description of a notable habit or quirk."},
            "goal": {"type": "STRING", "description": "Their primary motivation or goal in the story."},
            "principles": {"type": "STRING", "description": "A core principle or value they live by."},
            "conflict": {"type": "STRING", "description": "The central internal or external conflict they face."},
            "customFields": {
                "type": "ARRAY",
                "description": "Optional: An array of custom key-value details about the character.",
                "items": custom_field_schema()
            }
        },
        "required": [
            "name", "roles", "age", "gender", "physicalDescription", "voiceAndSpeechStyle",
            "personalityTraits", "habits", "goal", "principles", "conflict"
        ]
    })
}

fn relationship_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "character1Id": {"type": "STRING", "description": "The ID of the first character in the relationship."},
            "character2Id": {"type": "STRING", "description": "The ID of the second character in the relationship."},
            "type": {"type": "STRING", "description": "The type of relationship (e.g., 'Rivals', 'Childhood Friends', 'Mentor-Mentee')."},
            "description": {"type": "STRING", "description": "A 1-sentence description of their dynamic."}
        },
        "required": ["character1Id", "character2Id", "type", "description"]
    })
}

fn plot_point_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": {"type": "STRING", "description": "A brief summary of the plot point or scene."}
        },
        "required": ["summary"]
    })
}

fn lore_entry_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "name": {"type": "STRING"},
            "description": {"type": "STRING", "description": "A 1-2 sentence description."}
        },
        "required": ["name", "description"]
    })
}

fn lore_list(description: &str) -> Value {
    json!({"type": "ARRAY", "description": description, "items": lore_entry_schema()})
}

fn act_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": {"type": "STRING"},
            "description": {"type": "STRING"},
            "plotPoints": {"type": "ARRAY", "items": plot_point_schema()}
        },
        "required": ["title", "description", "plotPoints"]
    })
}

fn single_string(key: &str, description: &str) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {key: {"type": "STRING", "description": description}},
        "required": [key]
    })
}

/// JSON schema the model must answer `section` with.
pub fn response_schema(section: Section) -> Value {
    match section {
        Section::Basic => json!({
            "type": "OBJECT",
            "properties": {
                "title": {"type": "STRING", "description": "The title of the webnovel."},
                "setting": {"type": "STRING", "description": "A one or two sentence description of the story's setting."},
                "totalChapters": {"type": "STRING", "description": "A number between 100 and 300."},
                "wordsPerChapter": {"type": "STRING", "description": "A number between 1500 and 3000."}
            },
            "required": ["title", "setting", "totalChapters", "wordsPerChapter"]
        }),
        Section::Core => json!({
            "type": "OBJECT",
            "properties": {
                "mainPlot": {"type": "STRING"},
                "characters": {
                    "type": "ARRAY",
                    "description": "An array of 3-4 detailed character profiles.",
                    "items": character_schema()
                },
                "locations": lore_list("Optional: A list of 1-2 key locations."),
                "factions": lore_list("Optional: A list of 1-2 key factions or groups."),
                "lore": lore_list("Optional: A list of 1-2 key lore items or concepts."),
                "worldBuilding": {"type": "STRING", "description": "Optional: World-building details. Can be an empty string if not relevant to the genre."},
                "magicSystem": {"type": "STRING", "description": "Optional: Magic/System rules. Can be an empty string if not relevant to the genre."}
            },
            "required": ["mainPlot", "characters"]
        }),
        Section::WorldLore => json!({
            "type": "OBJECT",
            "properties": {
                "locations": lore_list("A list of key locations."),
                "factions": lore_list("A list of key factions or groups."),
                "lore": lore_list("A list of key lore items or concepts.")
            },
            "required": ["locations", "factions", "lore"]
        }),
        Section::MainPlot => single_string("mainPlot", "A 3-5 sentence summary of the main plot."),
        Section::Character => character_schema(),
        Section::Relationships => json!({
            "type": "OBJECT",
            "properties": {
                "relationships": {"type": "ARRAY", "items": relationship_schema()}
            },
            "required": ["relationships"]
        }),
        Section::WorldBuilding => {
            single_string("worldBuilding", "Key aspects of the world building.")
        }
        Section::MagicSystem => single_string(
            "magicSystem",
            "Description of the rules of magic or the 'System'.",
        ),
        Section::SingleArcAct => act_schema(),
        Section::Arc => json!({
            "type": "OBJECT",
            "properties": {
                "storyArc": {"type": "ARRAY", "items": act_schema()}
            },
            "required": ["storyArc"]
        }),
        Section::Tone => json!({
            "type": "OBJECT",
            "properties": {
                "comedyLevel": {"type": "STRING", "description": "A number from 1 to 10."},
                "romanceLevel": {"type": "STRING", "description": "A number from 1 to 10."},
                "actionLevel": {"type": "STRING", "description": "A number from 1 to 10."},
                "maturityLevel": {"type": "STRING", "description": "A number from 1 to 10."},
                "proseStyle": {"type": "STRING", "description": "The most fitting prose style."}
            },
            "required": ["comedyLevel", "romanceLevel", "actionLevel", "maturityLevel", "proseStyle"]
        }),
        Section::StyleExample => {
            single_string("example", "The generated example paragraph.")
        }
    }
}
