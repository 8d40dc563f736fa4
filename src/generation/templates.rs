//! Per-section prompt templates.

use serde_json::{json, Value};

use super::{Section, SectionRequest};
use crate::encyclopedia::{Character, Language, StoryDocument};
use crate::error::{GenerationError, GenerationResult};
use crate::prompts::prose_styles;

/// First line of every drafting prompt.
pub fn json_language_instruction(language: Language) -> &'static str {
    match language {
        Language::Id => "Generate the entire JSON response strictly in Bahasa Indonesia.",
        Language::En => "Generate the entire JSON response strictly in English.",
    }
}

/// Build the full prompt for `request`, language instruction included.
pub fn build_prompt(request: &SectionRequest, story: &StoryDocument) -> GenerationResult<String> {
    let context = serde_json::to_string_pretty(story).unwrap_or_default();
    let index = request.index.unwrap_or(0);

    let prompt = match request.section {
        Section::Basic => {
            let idea = request
                .idea
                .as_deref()
                .filter(|idea| !idea.trim().is_empty())
                .ok_or_else(|| missing(Section::Basic, "idea"))?;
            basic_prompt(story, idea)
        }
        Section::Core => core_prompt(story, &context),
        Section::WorldLore => world_lore_prompt(story, &context),
        Section::MainPlot => enhance_or_create(
            &story.main_plot,
            "enhance and expand the user's existing plot summary into a more compelling version (3-5 sentences), keeping the core ideas intact.\n\nExisting Plot",
            "generate a compelling main plot summary in 3-5 sentences.",
            &context,
        ),
        Section::Character => {
            let character = story
                .characters
                .get(index)
                .ok_or_else(|| out_of_range(Section::Character, index, story.characters.len()))?;
            character_prompt(character, &context)
        }
        Section::Relationships => relationships_prompt(story, &context),
        Section::WorldBuilding => enhance_or_create(
            &story.world_building,
            "enhance and expand the user's existing world-building details into 2-3 rich sentences.\n\nExisting Details",
            "describe the key world-building details in 2-3 sentences. This is for genres like Fantasy, Sci-Fi, etc.",
            &context,
        ),
        Section::MagicSystem => enhance_or_create(
            &story.magic_system,
            "enhance and expand the user's existing magic/power system details into 2-3 rich sentences.\n\nExisting System",
            "describe the magic or power system in 2-3 sentences. This is for genres like System, Fantasy, Wuxia, etc.",
            &context,
        ),
        Section::SingleArcAct => {
            if index >= story.story_arc.len() {
                return Err(out_of_range(Section::SingleArcAct, index, story.story_arc.len()));
            }
            single_act_prompt(story, index, &context)
        }
        Section::Arc => arc_prompt(story, &context),
        Section::Tone => tone_prompt(request.language, &context),
        Section::StyleExample => {
            let style = request
                .style
                .as_deref()
                .filter(|style| !style.trim().is_empty())
                .ok_or_else(|| missing(Section::StyleExample, "style"))?;
            style_example_prompt(style, request.language)
        }
    };

    Ok(format!(
        "{}\n\n{}",
        json_language_instruction(request.language),
        prompt
    ))
}

fn missing(section: Section, field: &str) -> GenerationError {
    GenerationError::MissingInput {
        section: section.to_string(),
        field: field.to_string(),
    }
}

fn out_of_range(section: Section, index: usize, len: usize) -> GenerationError {
    GenerationError::IndexOutOfRange {
        section: section.to_string(),
        index,
        len,
    }
}

fn basic_prompt(story: &StoryDocument, idea: &str) -> String {
    let genres = story.all_genres().join(", ");
    let mut instruction = format!(
        "Based on the user's core idea: \"{}\" and their chosen genres: \"{}\", generate the basic info for a webnovel.\n",
        idea, genres
    );

    let mut existing = Vec::new();
    if !story.title.is_empty() {
        existing.push(format!("Title: \"{}\"", story.title));
    }
    if !story.setting.is_empty() {
        existing.push(format!("Setting: \"{}\"", story.setting));
    }

    if existing.is_empty() {
        instruction.push_str("Come up with a fitting title, a setting, a planned number of chapters (between 100-300), and words per chapter (between 1500-3000).");
    } else {
        instruction.push_str(&format!(
            "The user has already started writing some details: {}. Your task is to COMPLETE the remaining fields (title, setting, totalChapters, wordsPerChapter). Enhance the existing details if you can, but prioritize filling in the blanks. Ensure the number of chapters is between 100-300 and words per chapter is between 1500-3000.",
            existing.join(", ")
        ));
    }
    instruction
}

fn core_prompt(story: &StoryDocument, context: &str) -> String {
    let has_plot = !story.main_plot.trim().is_empty();
    let named = story
        .characters
        .iter()
        .filter(|c| !c.name.trim().is_empty())
        .count();

    let mut instruction = format!("Based on the story context: \n\n{}\n\n", context);
    if has_plot || named > 0 {
        instruction.push_str("The user has already provided some core elements. Your task is to COMPLETE and EXPAND upon them. \n- If 'mainPlot' is present, refine it. \n- If characters exist, either complete their profiles or add new ones to reach a total of 3-4 diverse characters. \n- Generate 1-2 important locations and factions. \n- If relevant to the genre, also generate brief 'worldBuilding' and 'magicSystem' descriptions. Do not replace existing valid information, build upon it.");
    } else {
        instruction.push_str("Generate all core story elements. This includes:\n1. A compelling main plot summary (3-5 sentences).\n2. A list of 3-4 diverse and detailed main characters. For each character, assign logical roles and provide a full profile.\n3. A list of 1-2 important locations and factions.\n4. If relevant to the genre, generate brief 'worldBuilding' and 'magicSystem' descriptions.");
    }
    instruction
}

fn world_lore_prompt(story: &StoryDocument, context: &str) -> String {
    let real_world = story.universe_name.to_lowercase().contains("real world");

    let mut prompt = if real_world && !story.setting.is_empty() {
        let naming = if story.disguise_real_world_names {
            "You MUST create fictional but recognizable names for all generated locations and factions (e.g., 'New York' becomes 'Liberty City', 'NYPD' becomes 'LCPD')."
        } else {
            "Use the real, official names for all locations and factions."
        };
        format!(
            "The story is set in the real world, specifically in/around \"{}\". Based on this setting, generate a list of 3-5 key locations and 2-3 key factions that define the area. {}",
            story.setting, naming
        )
    } else {
        format!(
            "Based on the story context: \n\n{}\n\nGenerate a list of 2-3 important locations, 2-3 important factions/groups, and 2-3 key lore items/concepts with brief descriptions that fit the story's genre and plot.",
            context
        )
    };

    if !story.locations.is_empty() || !story.factions.is_empty() || !story.lore.is_empty() {
        prompt.push_str("\n\nThe user has already created some entries. Do not replace them. Your task is to ADD NEW, distinct entries to supplement the existing ones.");
    }
    prompt
}

/// Shared shape of the single-field sections.
fn enhance_or_create(existing: &str, enhance: &str, create: &str, context: &str) -> String {
    let existing = existing.trim();
    if existing.is_empty() {
        format!(
            "Based on the story context provided below, {}\n\n{}",
            create, context
        )
    } else {
        format!(
            "Based on the story context provided below, {}: \"{}\"\n\nFull Context:\n{}",
            enhance, existing, context
        )
    }
}

/// Fields the user has already filled in, in profile order.
fn partial_details(character: &Character) -> Vec<(&'static str, Value)> {
    let text_fields = [
        ("name", &character.name),
        ("age", &character.age),
        ("gender", &character.gender),
        ("physicalDescription", &character.physical_description),
        ("voiceAndSpeechStyle", &character.voice_and_speech_style),
        ("personalityTraits", &character.personality_traits),
        ("habits", &character.habits),
        ("goal", &character.goal),
        ("principles", &character.principles),
        ("conflict", &character.conflict),
    ];

    let mut details = Vec::new();
    for (key, value) in text_fields {
        if !value.is_empty() {
            details.push((key, Value::from(value.as_str())));
        }
        if key == "name" && !character.roles.is_empty() {
            details.push(("roles", json!(character.roles)));
        }
    }
    details
}

fn character_prompt(character: &Character, context: &str) -> String {
    let details = partial_details(character);
    let partial = if details.is_empty() {
        "The user has not provided any specific details for this new character. Generate a full profile from scratch that fits the story.".to_string()
    } else {
        let lines: Vec<String> = details
            .iter()
            .map(|(key, value)| format!("- {}: {}", key, value))
            .collect();
        format!(
            "The user has provided these starting details for the character:\n{}\n\nYour task is to COMPLETE the rest of the profile, elaborating on the provided details and filling in any missing fields to create a cohesive and compelling character.",
            lines.join("\n")
        )
    };

    format!(
        "Based on the full story context provided below, generate a compelling and unique character profile.\n\n{}\n\nEnsure ALL fields are filled out in your response: name, roles, age, gender, physicalDescription, voiceAndSpeechStyle, personalityTraits, habits, goal, principles, and conflict.\n\nFull Story Context:\n{}",
        partial, context
    )
}

fn relationships_prompt(story: &StoryDocument, context: &str) -> String {
    let roster: Vec<Value> = story
        .characters
        .iter()
        .map(|c| json!({"id": c.id, "name": c.name}))
        .collect();
    let roster = serde_json::to_string_pretty(&roster).unwrap_or_default();

    format!(
        "Based on the character profiles in the context below, generate a list of 3-5 interesting and potentially conflict-driving relationships between them. For each relationship, you MUST use the character IDs provided in the JSON blob of characters. DO NOT use their names. \n\nStory Context:\n{}\n\nCharacter Data (use these IDs):\n{}",
        context, roster
    )
}

fn single_act_prompt(story: &StoryDocument, index: usize, context: &str) -> String {
    let total = story.story_arc.len();
    let act = &story.story_arc[index];
    let title = act.title.trim();
    let description = act.description.trim();

    let mut instruction = format!(
        "Based on the story context provided below, generate details for Act {} of a {}-act story structure.\n",
        index + 1,
        total
    );

    if title.is_empty() && description.is_empty() && act.plot_points.is_empty() {
        instruction.push_str(
            "Generate a title, a 1-2 sentence description, and 2-3 key plot points for this act.",
        );
    } else {
        instruction.push_str("The user has provided the following: \n");
        if !title.is_empty() {
            instruction.push_str(&format!("- Title: {}\n", title));
        }
        if !description.is_empty() {
            instruction.push_str(&format!("- Description: {}\n", description));
        }
        if !act.plot_points.is_empty() {
            let points: Vec<&str> = act.plot_points.iter().map(|p| p.summary.as_str()).collect();
            instruction.push_str(&format!("- Plot Points: {}\n", points.join(", ")));
        }
        instruction.push_str("Your task is to COMPLETE this act. Fill in any missing fields (title, description, 2-3 plot points) and enhance the existing details to be more compelling.");
    }

    instruction.push_str(&format!("\n\nFull Context:\n{}", context));
    instruction
}

fn arc_prompt(story: &StoryDocument, context: &str) -> String {
    let started = story
        .story_arc
        .iter()
        .any(|act| !act.title.is_empty() || !act.description.is_empty());

    if started {
        format!(
            "Based on the following story context: \n\n{}\n\nThe user has already started outlining the story arc. Your task is to COMPLETE the 4-act structure. For each act, if it's already started, enhance it. If it's empty, generate a title, a 1-2 sentence description, and 2-4 key plot points that logically follow the previous act and build towards the main plot's conclusion.",
            context
        )
    } else {
        format!(
            "Based on the following story context: \n\n{}\n\nGenerate a 4-act story arc. For each act, provide a title, a 1-2 sentence description, and 2-4 key plot points that outline what happens in that act.",
            context
        )
    }
}

fn tone_prompt(language: Language, context: &str) -> String {
    let options: Vec<String> = prose_styles(language)
        .iter()
        .map(|s| format!("- \"{}\"", s.value))
        .collect();

    format!(
        "Based on the following story context: \n\n{}\n\nSuggest the tone and style. Provide a comedy, romance, and action level from 1-10. If the context contains mature genres, also suggest a maturity level from 1-10, otherwise default maturity to \"1\". For the 'proseStyle' field, you MUST select ONE of the following options. Return the value exactly as it appears in the list.\n\nValid Prose Styles:\n{}",
        context,
        options.join("\n")
    )
}

fn style_example_prompt(style: &str, language: Language) -> String {
    let paragraph_language = match language {
        Language::Id => "Tulis paragraf dalam Bahasa Indonesia.",
        Language::En => "Write the paragraph in English.",
    };
    format!(
        "Generate a short, illustrative paragraph (about 3-4 sentences) that perfectly demonstrates the following prose style for a webnovel: \"{}\". The paragraph should be about a generic fantasy or urban fantasy scene. {}",
        style, paragraph_language
    )
}
