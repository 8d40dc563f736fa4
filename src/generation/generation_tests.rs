//! Unit tests for section drafting.

use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::encyclopedia::{Character, StoryArcAct};
use crate::error::{AppError, GeminiError};
use crate::gemini::{Candidate, Content, GenerateContentResponse, MockGenerativeBackend};
use crate::ids::SequentialIds;

fn story_with_cast(ids: &SequentialIds) -> StoryDocument {
    let mut story = StoryDocument::blank(Language::En, ids);
    story.title = "Ashfall".to_string();
    story.characters = vec![
        Character {
            id: "c1".to_string(),
            name: "Amy".to_string(),
            roles: vec!["Protagonist".to_string()],
            ..Character::default()
        },
        Character {
            id: "c2".to_string(),
            name: "Vex".to_string(),
            ..Character::default()
        },
    ];
    story
}

fn text_response(text: &str) -> GenerateContentResponse {
    GenerateContentResponse {
        candidates: vec![Candidate {
            content: Some(Content::model(text)),
            finish_reason: Some("STOP".to_string()),
        }],
        usage_metadata: None,
        model_version: None,
    }
}

#[test]
fn test_section_names_round_trip() {
    for section in Section::ALL {
        assert_eq!(section.name().parse::<Section>().unwrap(), section);
    }
    assert_eq!(Section::WorldLore.to_string(), "worldLore");
    assert!(matches!(
        "plot".parse::<Section>(),
        Err(GenerationError::UnknownSection { .. })
    ));
}

#[test]
fn test_basic_requires_idea() {
    let ids = SequentialIds::new("t");
    let story = StoryDocument::blank(Language::En, &ids);
    let err = build_prompt(&SectionRequest::new(Section::Basic, Language::En), &story).unwrap_err();
    assert_eq!(err.to_string(), "Missing input for basic: idea");
}

#[test]
fn test_basic_prompt_branches() {
    let ids = SequentialIds::new("t");
    let mut story = StoryDocument::blank(Language::En, &ids);
    story.genres = vec!["Fantasy".to_string()];
    let request = SectionRequest::new(Section::Basic, Language::En).with_idea("a thief who steals time");

    let prompt = build_prompt(&request, &story).unwrap();
    assert!(prompt.starts_with("Generate the entire JSON response strictly in English.\n\n"));
    assert!(prompt.contains("\"a thief who steals time\""));
    assert!(prompt.contains("chosen genres: \"Fantasy\""));
    assert!(prompt.contains("Come up with a fitting title"));

    story.title = "Stolen Hours".to_string();
    let prompt = build_prompt(&request, &story).unwrap();
    assert!(prompt.contains("Title: \"Stolen Hours\""));
    assert!(prompt.contains("COMPLETE the remaining fields"));
}

#[test]
fn test_indonesian_language_instruction() {
    let ids = SequentialIds::new("t");
    let story = StoryDocument::blank(Language::Id, &ids);
    let prompt = build_prompt(&SectionRequest::new(Section::MainPlot, Language::Id), &story).unwrap();
    assert!(prompt.starts_with("Generate the entire JSON response strictly in Bahasa Indonesia."));
}

#[test]
fn test_character_prompt_lists_partial_details() {
    let ids = SequentialIds::new("t");
    let story = story_with_cast(&ids);

    let prompt = build_prompt(
        &SectionRequest::new(Section::Character, Language::En).with_index(0),
        &story,
    )
    .unwrap();
    assert!(prompt.contains("- name: \"Amy\""));
    assert!(prompt.contains("- roles: [\"Protagonist\"]"));
    assert!(!prompt.contains("- id:"));

    let err = build_prompt(
        &SectionRequest::new(Section::Character, Language::En).with_index(5),
        &story,
    )
    .unwrap_err();
    assert!(matches!(err, GenerationError::IndexOutOfRange { index: 5, len: 2, .. }));
}

#[test]
fn test_world_lore_real_world_disguise() {
    let ids = SequentialIds::new("t");
    let mut story = StoryDocument::blank(Language::En, &ids);
    story.universe_name = "The Real World".to_string();
    story.setting = "Tokyo".to_string();
    story.disguise_real_world_names = true;

    let request = SectionRequest::new(Section::WorldLore, Language::En);
    let prompt = build_prompt(&request, &story).unwrap();
    assert!(prompt.contains("in/around \"Tokyo\""));
    assert!(prompt.contains("fictional but recognizable names"));

    story.disguise_real_world_names = false;
    let prompt = build_prompt(&request, &story).unwrap();
    assert!(prompt.contains("real, official names"));
}

#[test]
fn test_relationships_prompt_includes_roster_ids() {
    let ids = SequentialIds::new("t");
    let story = story_with_cast(&ids);
    let prompt =
        build_prompt(&SectionRequest::new(Section::Relationships, Language::En), &story).unwrap();
    assert!(prompt.contains("\"id\": \"c1\""));
    assert!(prompt.contains("DO NOT use their names"));
}

#[test]
fn test_single_act_prompt_numbering() {
    let ids = SequentialIds::new("t");
    let mut story = StoryDocument::blank(Language::En, &ids);
    story.story_arc.push(StoryArcAct::default());

    let prompt = build_prompt(
        &SectionRequest::new(Section::SingleArcAct, Language::En).with_index(1),
        &story,
    )
    .unwrap();
    assert!(prompt.contains("Act 2 of a 2-act story structure"));
    assert!(prompt.contains("Generate a title, a 1-2 sentence description"));
}

#[test]
fn test_tone_prompt_lists_styles_for_language() {
    let ids = SequentialIds::new("t");
    let story = StoryDocument::blank(Language::Id, &ids);
    let prompt = build_prompt(&SectionRequest::new(Section::Tone, Language::Id), &story).unwrap();
    for style in crate::prompts::PROSE_STYLES_ID {
        assert!(prompt.contains(&format!("- \"{}\"", style.value)));
    }
}

#[test]
fn test_style_example_requires_style() {
    let story = StoryDocument::default();
    let request = SectionRequest::new(Section::StyleExample, Language::Id);
    assert!(build_prompt(&request, &story).is_err());

    let prompt = build_prompt(&request.with_style("Terse"), &story).unwrap();
    assert!(prompt.contains("\"Terse\""));
    assert!(prompt.ends_with("Tulis paragraf dalam Bahasa Indonesia."));
}

#[test]
fn test_every_section_has_object_schema() {
    for section in Section::ALL {
        let schema = response_schema(section);
        assert_eq!(schema["type"], "OBJECT", "{}", section);
        assert!(schema["required"].is_array(), "{}", section);
    }
}

#[test]
fn test_post_process_rejects_invalid_json() {
    let ids = SequentialIds::new("p");
    let err = post_process(Section::MainPlot, "not json", &ids).unwrap_err();
    assert!(err
        .to_string()
        .starts_with("The AI returned an invalid response for mainPlot."));

    let err = post_process(Section::MainPlot, "[1, 2]", &ids).unwrap_err();
    assert!(matches!(err, GenerationError::InvalidResponse { .. }));
}

#[test]
fn test_post_process_stamps_ids() {
    let ids = SequentialIds::new("p");

    let rels = post_process(
        Section::Relationships,
        r#"{"relationships": [{"id": "fake", "character1Id": "c1", "character2Id": "c2", "type": "Rivals", "description": ""}]}"#,
        &ids,
    )
    .unwrap();
    assert_eq!(rels.data["relationships"][0]["id"], "p-1");

    let arc = post_process(
        Section::Arc,
        r#"{"storyArc": [{"title": "Rise", "description": "", "plotPoints": [{"summary": "a"}]}, {"title": "Fall"}]}"#,
        &ids,
    )
    .unwrap();
    assert_eq!(arc.data["storyArc"][0]["plotPoints"][0]["id"], "p-2");
    assert_eq!(arc.data["storyArc"][1]["plotPoints"], json!([]));

    let core = post_process(
        Section::Core,
        r#"{"mainPlot": "x", "characters": [{"name": "Amy"}, {"id": "keep", "name": "Bo"}], "locations": [{"name": "Spire", "description": ""}]}"#,
        &ids,
    )
    .unwrap();
    assert_eq!(core.data["characters"][0]["id"], "p-3");
    assert_eq!(core.data["characters"][0]["customFields"], json!([]));
    assert_eq!(core.data["characters"][1]["id"], "keep");
    assert_eq!(core.data["locations"][0]["id"], "p-4");
    assert!(!core.data.contains_key("factions"));
}

#[test]
fn test_merge_character_keeps_slot_id() {
    let ids = SequentialIds::new("m");
    let story = story_with_cast(&ids);
    let draft = post_process(
        Section::Character,
        r#"{"name": "Vexa", "roles": ["Antagonist"], "goal": "rule", "voiceDescription": "cold"}"#,
        &ids,
    )
    .unwrap();

    let merged = draft.merge_into(&story, 1, &ids).unwrap();
    assert_eq!(merged.characters.len(), 2);
    assert_eq!(merged.characters[1].id, "c2");
    assert_eq!(merged.characters[1].name, "Vexa");
    assert_eq!(merged.characters[1].goal, "rule");
    assert_eq!(merged.characters[1].voice_and_speech_style, "cold");
    assert!(draft.merge_into(&story, 2, &ids).is_err());
}

#[test]
fn test_merge_relationships_appends_and_drops_dangling() {
    let ids = SequentialIds::new("m");
    let story = story_with_cast(&ids);
    let draft = post_process(
        Section::Relationships,
        r#"{"relationships": [
            {"character1Id": "c1", "character2Id": "c2", "type": "Rivals", "description": "old feud"},
            {"character1Id": "c1", "character2Id": "ghost", "type": "Haunted", "description": ""}
        ]}"#,
        &ids,
    )
    .unwrap();

    let merged = draft.merge_into(&story, 0, &ids).unwrap();
    assert_eq!(merged.relationships.len(), 1);
    assert_eq!(merged.relationships[0].kind, "Rivals");

    let again = draft.merge_into(&merged, 0, &ids).unwrap();
    assert_eq!(again.relationships.len(), 2);
}

#[test]
fn test_merge_single_act_and_shallow_sections() {
    let ids = SequentialIds::new("m");
    let story = StoryDocument::blank(Language::En, &ids);

    let act = post_process(
        Section::SingleArcAct,
        r#"{"title": "Spark", "description": "It begins.", "plotPoints": [{"summary": "A theft"}]}"#,
        &ids,
    )
    .unwrap();
    let merged = act.merge_into(&story, 0, &ids).unwrap();
    assert_eq!(merged.story_arc.len(), 1);
    assert_eq!(merged.story_arc[0].title, "Spark");
    assert_eq!(merged.story_arc[0].plot_points[0].summary, "A theft");

    let tone = post_process(
        Section::Tone,
        r#"{"comedyLevel": "2", "romanceLevel": "7", "actionLevel": "4", "maturityLevel": "1", "proseStyle": "Lyrical"}"#,
        &ids,
    )
    .unwrap();
    let merged = tone.merge_into(&merged, 0, &ids).unwrap();
    assert_eq!(merged.romance_level, "7");
    assert_eq!(merged.prose_style, "Lyrical");
    assert_eq!(merged.story_arc[0].title, "Spark");
    assert_eq!(merged.chapters, story.chapters);
}

#[test]
fn test_style_example_leaves_story_untouched() {
    let ids = SequentialIds::new("m");
    let story = StoryDocument::blank(Language::En, &ids);
    let draft = post_process(Section::StyleExample, r#"{"example": "Rain fell."}"#, &ids).unwrap();
    assert_eq!(draft.example(), Some("Rain fell."));
    assert_eq!(draft.merge_into(&story, 0, &ids).unwrap(), story);
}

#[tokio::test]
async fn test_generator_sends_schema_constrained_prompt() {
    let mut backend = MockGenerativeBackend::new();
    backend
        .expect_generate_content()
        .withf(|model, request| {
            let config = request.generation_config.as_ref();
            model.to_string() == "gemini-2.5-flash"
                && request.contents.len() == 1
                && config.and_then(|c| c.response_mime_type.as_deref()) == Some("application/json")
                && config.and_then(|c| c.response_schema.as_ref())
                    == Some(&response_schema(Section::MainPlot))
        })
        .times(1)
        .returning(|_, _| Ok(text_response(r#"{"mainPlot": "A heist goes wrong."}"#)));

    let ids = SequentialIds::new("g");
    let story = StoryDocument::blank(Language::En, &ids);
    let generator = EncyclopediaGenerator::new(backend, "gemini-2.5-flash");

    let generated = generator
        .generate(&SectionRequest::new(Section::MainPlot, Language::En), &story, &ids)
        .await
        .unwrap();
    assert_eq!(generated.data["mainPlot"], "A heist goes wrong.");
}

#[tokio::test]
async fn test_generator_validates_before_calling_backend() {
    let mut backend = MockGenerativeBackend::new();
    backend.expect_generate_content().times(0);

    let ids = SequentialIds::new("g");
    let story = StoryDocument::blank(Language::En, &ids);
    let generator = EncyclopediaGenerator::new(backend, "gemini-2.5-flash");

    let err = generator
        .generate(&SectionRequest::new(Section::Basic, Language::En), &story, &ids)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Generation(GenerationError::MissingInput { .. })
    ));
}

#[tokio::test]
async fn test_generator_propagates_backend_errors() {
    let mut backend = MockGenerativeBackend::new();
    backend.expect_generate_content().returning(|_, _| {
        Err(GeminiError::Api {
            status: 400,
            message: "bad key".to_string(),
        })
    });

    let ids = SequentialIds::new("g");
    let story = StoryDocument::blank(Language::En, &ids);
    let generator = EncyclopediaGenerator::new(backend, "gemini-2.5-flash");

    let err = generator
        .generate(&SectionRequest::new(Section::Arc, Language::En), &story, &ids)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Gemini(GeminiError::Api { status: 400, .. })));
}

#[tokio::test]
async fn test_generator_rejects_empty_candidates() {
    let mut backend = MockGenerativeBackend::new();
    backend.expect_generate_content().returning(|_, _| {
        Ok(GenerateContentResponse {
            candidates: Vec::new(),
            usage_metadata: None,
            model_version: None,
        })
    });

    let ids = SequentialIds::new("g");
    let story = StoryDocument::blank(Language::En, &ids);
    let generator = EncyclopediaGenerator::new(backend, "gemini-2.5-flash");

    let err = generator
        .generate(&SectionRequest::new(Section::Tone, Language::En), &story, &ids)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Generation(GenerationError::InvalidResponse { .. })
    ));
}
