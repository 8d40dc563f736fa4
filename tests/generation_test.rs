//! End-to-end section drafting against a mocked Gemini endpoint
//!
//! Drives `EncyclopediaGenerator<GeminiClient>` through wiremock and merges
//! the drafts into a story the way the CLI does.

use serde_json::json;
use wiremock::{
    matchers::{body_string_contains, method, path},
    Mock, MockServer, ResponseTemplate,
};

use story_encyclopedia::config::{GeminiConfig, RequestConfig};
use story_encyclopedia::encyclopedia::{Character, Language, StoryDocument};
use story_encyclopedia::error::{AppError, GenerationError};
use story_encyclopedia::gemini::GeminiClient;
use story_encyclopedia::generation::{EncyclopediaGenerator, Section, SectionRequest};
use story_encyclopedia::ids::SequentialIds;

const FLASH_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn create_generator(base_url: &str) -> EncyclopediaGenerator<GeminiClient> {
    let config = GeminiConfig {
        api_key: Some("test-api-key".to_string()),
        base_url: base_url.to_string(),
        generation_model: "gemini-2.5-flash".to_string(),
    };
    let request_config = RequestConfig {
        timeout_ms: 5000,
        max_retries: 0,
        retry_delay_ms: 10,
    };
    let client = GeminiClient::new(&config, request_config).expect("Failed to create client");
    EncyclopediaGenerator::new(client, "gemini-2.5-flash")
}

/// Wrap a section payload the way Gemini returns JSON-mode output.
fn json_reply(payload: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": payload.to_string() }] },
            "finishReason": "STOP"
        }]
    }))
}

fn story_with_cast(ids: &SequentialIds) -> StoryDocument {
    let mut story = StoryDocument::blank(Language::En, ids);
    story.title = "Ashfall".to_string();
    story.characters[0].name = "Amy".to_string();
    let mut rival = Character::empty(ids);
    rival.name = "Vex".to_string();
    story.characters.push(rival);
    story
}

#[tokio::test]
async fn test_basic_section_drafts_and_merges() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(FLASH_PATH))
        .and(body_string_contains("A courier carries a dying god"))
        .and(body_string_contains("strictly in English"))
        .respond_with(json_reply(json!({
            "title": "Godfreight",
            "setting": "A rust-belt empire of rail and relics.",
            "totalChapters": "150",
            "wordsPerChapter": "2000"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ids = SequentialIds::new("g");
    let story = StoryDocument::blank(Language::En, &ids);
    let generator = create_generator(&mock_server.uri());
    let request = SectionRequest::new(Section::Basic, Language::En)
        .with_idea("A courier carries a dying god across the continent");

    let generated = generator.generate(&request, &story, &ids).await.unwrap();
    let merged = generated.merge_into(&story, 0, &ids).unwrap();

    assert_eq!(merged.id, story.id);
    assert_eq!(merged.title, "Godfreight");
    assert_eq!(merged.total_chapters, "150");
    assert_eq!(merged.characters, story.characters);
}

#[tokio::test]
async fn test_relationships_are_appended_with_fresh_ids() {
    let mock_server = MockServer::start().await;
    let ids = SequentialIds::new("g");
    let story = story_with_cast(&ids);
    let (amy, vex) = (story.characters[0].id.clone(), story.characters[1].id.clone());

    Mock::given(method("POST"))
        .and(path(FLASH_PATH))
        .respond_with(json_reply(json!({
            "relationships": [
                { "id": "model-made-up", "character1Id": amy, "character2Id": vex, "type": "Rivals", "description": "Old wounds." },
                { "character1Id": amy, "character2Id": "ghost", "type": "Allies", "description": "Nobody." }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let generator = create_generator(&mock_server.uri());
    let request = SectionRequest::new(Section::Relationships, Language::En);
    let generated = generator.generate(&request, &story, &ids).await.unwrap();
    let merged = generated.merge_into(&story, 0, &ids).unwrap();

    // The dangling relationship is dropped by the migration pass.
    assert_eq!(merged.relationships.len(), 1);
    let rel = &merged.relationships[0];
    assert_ne!(rel.id, "model-made-up");
    assert!(rel.id.starts_with("g-"));
    assert_eq!(rel.kind, "Rivals");
}

#[tokio::test]
async fn test_character_draft_keeps_slot_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(FLASH_PATH))
        .and(body_string_contains("Vex"))
        .respond_with(json_reply(json!({
            "name": "Vex",
            "roles": ["Antagonist"],
            "goal": "Claim the god's heart."
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ids = SequentialIds::new("g");
    let story = story_with_cast(&ids);
    let generator = create_generator(&mock_server.uri());
    let request = SectionRequest::new(Section::Character, Language::En).with_index(1);

    let generated = generator.generate(&request, &story, &ids).await.unwrap();
    let merged = generated.merge_into(&story, 1, &ids).unwrap();

    let vex = &merged.characters[1];
    assert_eq!(vex.id, story.characters[1].id);
    assert_eq!(vex.goal, "Claim the god's heart.");
    assert_eq!(vex.roles, vec!["Antagonist"]);
    assert!(vex.custom_fields.is_empty());
}

#[tokio::test]
async fn test_non_json_reply_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(FLASH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Sure! Here is a tone:" }] }
            }]
        })))
        .mount(&mock_server)
        .await;

    let ids = SequentialIds::new("g");
    let story = StoryDocument::blank(Language::En, &ids);
    let generator = create_generator(&mock_server.uri());
    let request = SectionRequest::new(Section::Tone, Language::En);

    let err = generator.generate(&request, &story, &ids).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Generation(GenerationError::InvalidResponse { .. })
    ));
}

#[tokio::test]
async fn test_missing_idea_never_calls_the_api() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(json_reply(json!({})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let ids = SequentialIds::new("g");
    let story = StoryDocument::blank(Language::En, &ids);
    let generator = create_generator(&mock_server.uri());
    let request = SectionRequest::new(Section::Basic, Language::En).with_idea("  ");

    let err = generator.generate(&request, &story, &ids).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Generation(GenerationError::MissingInput { .. })
    ));
}
