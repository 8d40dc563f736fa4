//! Centralized prompt definitions for the writing assistant
//!
//! This module contains the chat system instructions, the genre and prose
//! style vocabularies offered to the model, and the rendering of a Story
//! Encyclopedia into the context block every chat session starts with.

use crate::encyclopedia::{Character, Language, LoreEntry, Relationship, StoryDocument};

/// System instruction for English-language stories.
pub const SYSTEM_INSTRUCTION_EN: &str = r#"You are a world-class webnovel writing assistant. Your goal is to help the user brainstorm ideas, develop characters, create outlines, write chapter drafts, and refine their story.

Follow these rules:
- You must respond ONLY in English.
- Be creative, encouraging, and helpful.
- Provide detailed and structured responses when asked for outlines or character sheets.
- When drafting prose, adopt the user's requested tone and style.
- If the user asks for something complex, break it down into manageable steps.
- Maintain consistency with the story encyclopedia and previously established plot points.
- You are an assistant, not the author. Your role is to empower the user's creativity."#;

/// System instruction for Indonesian-language stories.
pub const SYSTEM_INSTRUCTION_ID: &str = r#"Anda adalah asisten penulis webnovel kelas dunia. Tujuan Anda adalah membantu pengguna bertukar pikiran, mengembangkan karakter, membuat kerangka, menulis draf bab, dan menyempurnakan cerita mereka.

Ikuti aturan ini:
- Anda harus merespons HANYA dalam Bahasa Indonesia.
- Jadilah kreatif, memberi semangat, dan membantu.
- Berikan tanggapan yang terperinci dan terstruktur saat diminta untuk kerangka atau lembar karakter.
- Saat menyusun prosa, gunakan nada dan gaya yang diminta pengguna.
- Jika pengguna meminta sesuatu yang rumit, pecah menjadi langkah-langkah yang dapat dikelola.
- Jaga konsistensi dengan ensiklopedia cerita dan poin plot yang telah ditetapkan sebelumnya.
- Anda adalah asisten, bukan penulis. Peran Anda adalah memberdayakan kreativitas pengguna."#;

/// Thinking token budget for the Pro model in thinking mode.
pub const MAX_THINKING_BUDGET: u32 = 32768;

/// Genre tags offered for English stories.
pub const GENRES_EN: &[&str] = &[
    "Harem",
    "Transmigration",
    "Romance",
    "System",
    "Fantasy",
    "Sci-Fi",
    "Action",
    "Adventure",
    "Comedy",
    "Mystery",
    "Urban",
    "Wuxia",
    "Xianxia",
    "Mature",
];

/// Genre tags offered for Indonesian stories.
pub const GENRES_ID: &[&str] = &[
    "Harem",
    "Transmigrasi",
    "Romansa",
    "Sistem",
    "Fantasi",
    "Fiksi Ilmiah",
    "Aksi",
    "Petualangan",
    "Komedi",
    "Misteri",
    "Perkotaan",
    "Wuxia",
    "Xianxia",
    "Dewasa",
];

/// A selectable prose style and its explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProseStyle {
    /// The exact value stored in `proseStyle`.
    pub value: &'static str,
    /// What the style is good for.
    pub description: &'static str,
}

/// Prose styles for English stories.
pub const PROSE_STYLES_EN: &[ProseStyle] = &[
    ProseStyle {
        value: "Light and descriptive, with witty dialogue.",
        description: "Ideal for stories balancing world-building with character interactions.",
    },
    ProseStyle {
        value: "Fast-paced and punchy, focusing on action.",
        description: "Keeps the reader on the edge of their seat. Great for thrillers and action scenes.",
    },
    ProseStyle {
        value: "Deeply introspective and character-focused.",
        description: "Explores the inner thoughts and emotions of characters. Best for dramas and psychological stories.",
    },
    ProseStyle {
        value: "Formal and elegant, like a classic novel.",
        description: "Uses sophisticated language and a more traditional narrative structure.",
    },
    ProseStyle {
        value: "Informal and conversational, first-person POV.",
        description: "Creates a close, personal connection between the reader and the protagonist.",
    },
];

/// Prose styles for Indonesian stories.
pub const PROSE_STYLES_ID: &[ProseStyle] = &[
    ProseStyle {
        value: "Ringan dan deskriptif, dengan dialog jenaka.",
        description: "Ideal untuk cerita yang menyeimbangkan pembangunan dunia dengan interaksi karakter.",
    },
    ProseStyle {
        value: "Cepat dan lugas, berfokus pada aksi.",
        description: "Membuat pembaca tegang. Bagus untuk thriller dan adegan aksi.",
    },
    ProseStyle {
        value: "Sangat introspektif dan berfokus pada karakter.",
        description: "Mengeksplorasi pikiran dan emosi batin karakter. Terbaik untuk drama dan cerita psikologis.",
    },
    ProseStyle {
        value: "Formal dan elegan, seperti novel klasik.",
        description: "Menggunakan bahasa yang canggih dan struktur naratif yang lebih tradisional.",
    },
    ProseStyle {
        value: "Informal dan seperti percakapan, sudut pandang orang pertama.",
        description: "Menciptakan hubungan pribadi yang erat antara pembaca dan protagonis.",
    },
];

/// Prose styles for a language.
pub fn prose_styles(language: Language) -> &'static [ProseStyle] {
    match language {
        Language::En => PROSE_STYLES_EN,
        Language::Id => PROSE_STYLES_ID,
    }
}

/// Base system instruction for a language.
pub fn base_instruction(language: Language) -> &'static str {
    match language {
        Language::En => SYSTEM_INSTRUCTION_EN,
        Language::Id => SYSTEM_INSTRUCTION_ID,
    }
}

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

/// Render one character sheet. Nameless characters render as nothing.
pub fn format_character(character: &Character) -> String {
    if character.name.is_empty() {
        return String::new();
    }

    let roles = if character.roles.is_empty() {
        String::new()
    } else {
        format!(" [{}]", character.roles.join(", "))
    };

    let mut out = format!(
        "\n**Character: {}{}**\n- Age: {}\n- Gender: {}\n- Physical Description: {}\n- Voice & Speech Style: {}\n- Personality Traits: {}\n- Habits: {}\n- Goal: {}\n- Principles: {}\n- Core Conflict: {}",
        character.name,
        roles,
        or_na(&character.age),
        or_na(&character.gender),
        or_na(&character.physical_description),
        or_na(&character.voice_and_speech_style),
        or_na(&character.personality_traits),
        or_na(&character.habits),
        or_na(&character.goal),
        or_na(&character.principles),
        or_na(&character.conflict),
    );

    if !character.custom_fields.is_empty() {
        let details = character
            .custom_fields
            .iter()
            .map(|cf| format!("- {}: {}", cf.label, or_na(&cf.value)))
            .collect::<Vec<_>>()
            .join("\n");
        out.push_str("\n- Custom Details:\n");
        out.push_str(&details);
    }

    out
}

/// Render relationships with ids resolved to names.
pub fn format_relationships(relationships: &[Relationship], characters: &[Character]) -> String {
    if relationships.is_empty() {
        return "N/A".to_string();
    }

    let name_of = |id: &str| -> String {
        characters
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Unknown".to_string())
    };

    relationships
        .iter()
        .map(|rel| {
            format!(
                "- {} & {}: [{}] {}",
                name_of(&rel.character1_id),
                name_of(&rel.character2_id),
                rel.kind,
                rel.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a titled lore list, or nothing when empty.
pub fn format_lore(entries: &[LoreEntry], title: &str) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let lines = entries
        .iter()
        .map(|item| format!("- {}: {}", item.name, item.description))
        .collect::<Vec<_>>()
        .join("\n");
    format!("\n**{}:**\n{}", title.to_uppercase(), lines)
}

/// Render the whole encyclopedia as the chat model's context block.
pub fn format_story_context(story: &StoryDocument) -> String {
    let genres = story.all_genres().join(", ");

    let story_arc = story
        .story_arc
        .iter()
        .map(|act| {
            let points = act
                .plot_points
                .iter()
                .map(|pp| format!("  - {}", pp.summary))
                .collect::<Vec<_>>()
                .join("\n");
            let mut line = format!("- {}: {}", act.title, act.description);
            if !points.is_empty() {
                line.push('\n');
                line.push_str(&points);
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut characters: String = story.characters.iter().map(format_character).collect();
    if characters.is_empty() {
        characters = "N/A".to_string();
    }
    let relationships = format_relationships(&story.relationships, &story.characters);

    let locations = format_lore(&story.locations, "Locations");
    let factions = format_lore(&story.factions, "Factions");
    let lore = format_lore(&story.lore, "General Lore");

    let universe_name = if story.disguise_real_world_names {
        match story.language {
            Language::Id => format!("{} (nama disamarkan)", story.universe_name),
            Language::En => format!("{} (names disguised)", story.universe_name),
        }
    } else {
        story.universe_name.clone()
    };

    let chapter_titles = if story.chapters.is_empty() {
        "(No chapters written yet)".to_string()
    } else {
        story
            .chapters
            .iter()
            .map(|chap| format!("- {}", chap.title))
            .collect::<Vec<_>>()
            .join("\n")
    };

    // Last two chapters in full, for continuity and style mimicry.
    let recent_start = story.chapters.len().saturating_sub(2);
    let recent_chapters = if story.chapters.is_empty() {
        "(No recent chapters to display.)".to_string()
    } else {
        story.chapters[recent_start..]
            .iter()
            .map(|chap| {
                let content = if chap.content.is_empty() {
                    "(No content written for this chapter yet.)"
                } else {
                    chap.content.as_str()
                };
                format!("**{}**\n{}", chap.title, content)
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    };

    let custom_style = story.custom_prose_style_by_example.trim();
    let custom_style_block = if custom_style.is_empty() {
        String::new()
    } else {
        format!(
            "\n\n**CRITICAL: CUSTOM PROSE STYLE BY EXAMPLE**\nThe user has provided a specific writing style to mimic. Your top priority for prose generation is to analyze and replicate this style in terms of sentence structure, vocabulary, pacing, and tone. This overrides the standard 'Prose' selection. Here is the sample:\n---\n{}\n---",
            custom_style
        )
    };

    let world_building = if story.world_building.is_empty() {
        String::new()
    } else {
        format!("\n**WORLD BUILDING (SUMMARY):** {}", story.world_building)
    };
    let magic_system = if story.magic_system.is_empty() {
        String::new()
    } else {
        format!("\n**MAGIC/SYSTEM RULES (SUMMARY):** {}", story.magic_system)
    };

    let maturity = match story.maturity_level.trim().parse::<i64>() {
        Ok(level) if level > 1 => format!("- Maturity: {}/10", story.maturity_level),
        _ => String::new(),
    };

    let total_chapters = if story.total_chapters.is_empty() {
        "Not Specified"
    } else {
        story.total_chapters.as_str()
    };
    let words_per_chapter = if story.words_per_chapter.is_empty() {
        "Not specified"
    } else {
        story.words_per_chapter.as_str()
    };

    format!(
        r#"
--- STORY ENCYCLOPEDIA CONTEXT ---

**TITLE:** {title}
**UNIVERSE:** {universe_name}
**GENRE:** {genres}
**SETTING:** {setting}

**TARGET STRUCTURE:**
- Total Chapters: {total_chapters}
- Words Per Chapter: {words_per_chapter}

**CORE PLOT:** {main_plot}

**CHARACTERS:**
{characters}

**RELATIONSHIPS:**
{relationships}

{world_building}
{locations}
{factions}
{lore}
{magic_system}

**STORY ARC (OVERVIEW & PLOT POINTS):**
{story_arc}

**CHAPTERS (TITLES ONLY - FULL OVERVIEW):**
{chapter_titles}

**RECENT CHAPTERS (FULL TEXT FOR IMMEDIATE CONTEXT):**
{recent_chapters}

**TONE & STYLE:**
- Comedy: {comedy}/10
- Romance: {romance}/10
- Action: {action}/10
{maturity}
- Prose: {prose}{custom_style_block}

--- END OF CONTEXT ---

Based on this context, assist the user in developing their story.
- When asked to draft a chapter, try to adhere to the target words per chapter and **mimic the style and continue the events from the most recent chapters provided. If a custom style sample is provided, prioritize mimicking that style above all else.**
- When asked about plot progression, consider the total number of chapters planned.
"#,
        title = story.title,
        setting = story.setting,
        main_plot = story.main_plot,
        comedy = story.comedy_level,
        romance = story.romance_level,
        action = story.action_level,
        prose = story.prose_style,
    )
}

/// Language instruction followed by the rendered encyclopedia.
pub fn system_instruction(story: &StoryDocument) -> String {
    format!(
        "{}{}",
        base_instruction(story.language),
        format_story_context(story)
    )
}
