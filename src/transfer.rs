//! Import/export of single documents as shareable Markdown files.
//!
//! An exported file is a readable summary followed by a fenced JSON block
//! carrying the whole document. Import reads that block back (or a bare JSON
//! document) and runs it through the migrator.

use serde::Serialize;
use serde_json::Value;
use std::fmt::Write;
use tracing::debug;

use crate::encyclopedia::{LoreEntry, StoryDocument, UniverseDocument};
use crate::error::{TransferError, TransferResult};
use crate::ids::IdGenerator;
use crate::migrate::{migrate_story, migrate_universe};

/// Fence tag of an embedded story.
pub const STORY_TAG: &str = "story-encyclopedia";
/// Fence tag of an embedded universe.
pub const UNIVERSE_TAG: &str = "universe";

const FENCE: &str = "```";

fn or_placeholder(text: &str) -> &str {
    if text.trim().is_empty() {
        "N/A"
    } else {
        text
    }
}

fn write_lore(out: &mut String, heading: &str, entries: &[LoreEntry]) {
    if entries.is_empty() {
        return;
    }
    let _ = writeln!(out, "## {}\n", heading);
    for entry in entries {
        let _ = writeln!(out, "- **{}**: {}", entry.name, entry.description);
    }
    out.push('\n');
}

fn write_payload<T: Serialize>(out: &mut String, tag: &str, document: &T) -> TransferResult<()> {
    let json = serde_json::to_string_pretty(document)?;
    let _ = writeln!(out, "{}{}\n{}\n{}", FENCE, tag, json, FENCE);
    Ok(())
}

/// Render a story as Markdown with the full document embedded.
pub fn export_story(story: &StoryDocument) -> TransferResult<String> {
    let mut out = String::new();
    let title = if story.title.trim().is_empty() {
        "Untitled Story"
    } else {
        story.title.as_str()
    };

    let _ = writeln!(out, "# {}\n", title);
    let _ = writeln!(out, "- **Language:** {}", story.language);
    let _ = writeln!(out, "- **Genres:** {}", or_placeholder(&story.all_genres().join(", ")));
    let _ = writeln!(out, "- **Universe:** {}", story.universe_name);
    let _ = writeln!(out, "- **Setting:** {}", or_placeholder(&story.setting));
    let _ = writeln!(
        out,
        "- **Chapters:** {} written, {} planned\n",
        story.chapters.len(),
        or_placeholder(&story.total_chapters)
    );

    let _ = writeln!(out, "## Main Plot\n\n{}\n", or_placeholder(&story.main_plot));

    let named: Vec<_> = story.characters.iter().filter(|c| !c.name.is_empty()).collect();
    if !named.is_empty() {
        out.push_str("## Characters\n\n");
        for character in named {
            let roles = if character.roles.is_empty() {
                String::new()
            } else {
                format!(" ({})", character.roles.join(", "))
            };
            let _ = writeln!(
                out,
                "- **{}**{}: {}",
                character.name,
                roles,
                or_placeholder(&character.goal)
            );
        }
        out.push('\n');
    }

    out.push_str("## Story Arc\n\n");
    for (i, act) in story.story_arc.iter().enumerate() {
        let _ = writeln!(out, "{}. **{}**: {}", i + 1, act.title, act.description);
    }
    out.push('\n');

    write_lore(&mut out, "Locations", &story.locations);
    write_lore(&mut out, "Factions", &story.factions);
    write_lore(&mut out, "Lore", &story.lore);

    write_payload(&mut out, STORY_TAG, story)?;
    debug!(story_id = %story.id, bytes = out.len(), "Exported story");
    Ok(out)
}

/// Render a universe as Markdown with the full document embedded.
pub fn export_universe(universe: &UniverseDocument) -> TransferResult<String> {
    let mut out = String::new();

    let _ = writeln!(out, "# {}\n", or_placeholder(&universe.name));
    let _ = writeln!(out, "{}\n", or_placeholder(&universe.description));
    let _ = writeln!(out, "- **Language:** {}\n", universe.language);

    if !universe.world_building.is_empty() {
        let _ = writeln!(out, "## World Building\n\n{}\n", universe.world_building);
    }
    if !universe.magic_system.is_empty() {
        let _ = writeln!(out, "## Magic System\n\n{}\n", universe.magic_system);
    }
    write_lore(&mut out, "Locations", &universe.locations);
    write_lore(&mut out, "Factions", &universe.factions);
    write_lore(&mut out, "Lore", &universe.lore);

    write_payload(&mut out, UNIVERSE_TAG, universe)?;
    debug!(universe_id = %universe.id, bytes = out.len(), "Exported universe");
    Ok(out)
}

/// Text of the last fenced block tagged `tag`.
///
/// The payload is always written after the summary, so a fence quoted inside
/// user text never shadows it.
fn embedded_block<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let opening = format!("{}{}", FENCE, tag);
    let mut search = text;

    while let Some(at) = search.rfind(&opening) {
        search = &search[..at];
        let line_start = at == 0 || text[..at].ends_with('\n');
        let rest = &text[at + opening.len()..];
        // The tag must end the fence line; "```universe" is not "```universe-x".
        let Some(eol) = rest.find('\n') else {
            continue;
        };
        if !line_start || !rest[..eol].trim().is_empty() {
            continue;
        }
        let body = &rest[eol + 1..];
        if let Some(end) = body.find(&format!("\n{}", FENCE)) {
            return Some(&body[..end]);
        }
    }
    None
}

/// Locate and parse the document carried by an exported file.
fn extract_document(text: &str, tag: &str, kind: &str) -> TransferResult<Value> {
    let payload = match embedded_block(text, tag) {
        Some(block) => block,
        None if text.trim_start().starts_with('{') => text,
        None => {
            return Err(TransferError::MissingPayload {
                kind: kind.to_string(),
            })
        }
    };

    let value: Value = serde_json::from_str(payload.trim())?;
    if !value.is_object() {
        return Err(TransferError::NotAnObject {
            kind: kind.to_string(),
        });
    }
    Ok(value)
}

/// Read a story back from an exported file or bare JSON.
pub fn import_story(text: &str, ids: &dyn IdGenerator) -> TransferResult<StoryDocument> {
    let value = extract_document(text, STORY_TAG, "story")?;
    let story = migrate_story(&value, ids);
    debug!(story_id = %story.id, "Imported story");
    Ok(story)
}

/// Read a universe back from an exported file or bare JSON.
pub fn import_universe(text: &str, ids: &dyn IdGenerator) -> TransferResult<UniverseDocument> {
    let value = extract_document(text, UNIVERSE_TAG, "universe")?;
    let universe = migrate_universe(&value, ids);
    debug!(universe_id = %universe.id, "Imported universe");
    Ok(universe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encyclopedia::Language;
    use crate::ids::SequentialIds;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_story_export_is_readable_and_reimportable() {
        let ids = SequentialIds::new("x");
        let mut story = StoryDocument::blank(Language::En, &ids);
        story.title = "Ashfall".to_string();
        story.characters[0].name = "Amy".to_string();

        let text = export_story(&story).unwrap();
        assert!(text.starts_with("# Ashfall\n"));
        assert!(text.contains("- **Amy** (Protagonist): N/A"));
        assert!(text.contains("```story-encyclopedia\n"));

        let back = import_story(&text, &ids).unwrap();
        assert_eq!(back, story);
    }

    #[test]
    fn test_universe_round_trip() {
        let ids = SequentialIds::new("x");
        let mut universe = UniverseDocument::blank(Language::Id, &ids);
        universe.name = "Aetheria".to_string();
        universe.magic_system = "Runes".to_string();

        let text = export_universe(&universe).unwrap();
        assert!(text.contains("## Magic System\n\nRunes"));
        assert_eq!(import_universe(&text, &ids).unwrap(), universe);
    }

    #[test]
    fn test_import_accepts_bare_legacy_json() {
        let ids = SequentialIds::new("x");
        let story = import_story(r#"{"title": "Old", "protagonist": "Amy"}"#, &ids).unwrap();
        assert_eq!(story.title, "Old");
        assert_eq!(story.characters[0].name, "Amy");
    }

    #[test]
    fn test_import_errors() {
        let ids = SequentialIds::new("x");
        assert!(matches!(
            import_story("# Just notes", &ids),
            Err(TransferError::MissingPayload { .. })
        ));
        assert!(matches!(
            import_story("```story-encyclopedia\n{oops\n```", &ids),
            Err(TransferError::Json(_))
        ));
        assert!(matches!(
            import_universe("```universe\n[1]\n```", &ids),
            Err(TransferError::NotAnObject { .. })
        ));
    }

    #[test]
    fn test_fence_quoted_in_plot_does_not_shadow_payload() {
        let ids = SequentialIds::new("x");
        let mut story = StoryDocument::blank(Language::En, &ids);
        story.main_plot = "Notes:\n```story-encyclopedia\nnot json\n```\nThe end.".to_string();

        let text = export_story(&story).unwrap();
        assert_eq!(import_story(&text, &ids).unwrap(), story);
    }

    #[test]
    fn test_embedded_block_requires_exact_tag() {
        let text = "```universe-notes\nx\n```\n```universe\n{}\n```";
        assert_eq!(embedded_block(text, "universe"), Some("{}"));
    }
}
