use serde_json::Value;

use super::fields::{self, Object};
use crate::encyclopedia::{Chapter, Language, LoreEntry, PlotPoint, StoryArcAct};
use crate::ids::IdGenerator;

/// Title of the placeholder chapter added to chapterless documents.
pub const PLACEHOLDER_CHAPTER_TITLE: &str = "Chapter 1";

fn lore_entry(value: &Value, ids: &dyn IdGenerator) -> Option<LoreEntry> {
    match value {
        Value::Object(obj) => Some(LoreEntry {
            id: fields::id_or_new(obj, "id", ids),
            name: fields::text(obj, "name"),
            description: fields::text(obj, "description"),
        }),
        Value::String(name) => Some(LoreEntry {
            id: ids.next_id(),
            name: name.clone(),
            description: String::new(),
        }),
        _ => None,
    }
}

/// A `locations`/`factions`/`lore` list.
///
/// Absent or `null` becomes `[]`; an explicit list is kept entry by entry.
pub fn lore_entries(doc: &Object, key: &str, ids: &dyn IdGenerator) -> Vec<LoreEntry> {
    fields::list(doc, key)
        .map(|items| items.iter().filter_map(|v| lore_entry(v, ids)).collect())
        .unwrap_or_default()
}

/// Chapters, with a single empty placeholder when none survive.
pub fn chapters(doc: &Object, ids: &dyn IdGenerator) -> Vec<Chapter> {
    let chapters: Vec<Chapter> = fields::list(doc, "chapters")
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .map(|obj| Chapter {
                    id: fields::id_or_new(obj, "id", ids),
                    title: fields::text(obj, "title"),
                    content: fields::text(obj, "content"),
                })
                .collect()
        })
        .unwrap_or_default();

    if chapters.is_empty() {
        return vec![Chapter {
            id: ids.next_id(),
            title: PLACEHOLDER_CHAPTER_TITLE.to_string(),
            content: String::new(),
        }];
    }
    chapters
}

fn plot_points(act: &Object, ids: &dyn IdGenerator) -> Vec<PlotPoint> {
    fields::list(act, "plotPoints")
        .map(|items| {
            items
                .iter()
                .filter_map(|value| match value {
                    Value::Object(obj) => Some(PlotPoint {
                        id: fields::id_or_new(obj, "id", ids),
                        summary: fields::text(obj, "summary"),
                    }),
                    Value::String(summary) => Some(PlotPoint {
                        id: ids.next_id(),
                        summary: summary.clone(),
                    }),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Story arc acts, each with a plot point list, never empty.
pub fn story_arc(doc: &Object, language: Language, ids: &dyn IdGenerator) -> Vec<StoryArcAct> {
    let acts: Vec<StoryArcAct> = fields::list(doc, "storyArc")
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .map(|act| StoryArcAct {
                    title: fields::text(act, "title"),
                    description: fields::text(act, "description"),
                    plot_points: plot_points(act, ids),
                })
                .collect()
        })
        .unwrap_or_default();

    if acts.is_empty() {
        return vec![StoryArcAct {
            title: language.first_act_title().to_string(),
            description: String::new(),
            plot_points: Vec::new(),
        }];
    }
    acts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use serde_json::json;

    #[test]
    fn test_lore_entries_null_and_absent() {
        let ids = SequentialIds::new("l");
        let doc = json!({"locations": null, "lore": []});
        let obj = fields::as_object(&doc);
        assert!(lore_entries(obj, "locations", &ids).is_empty());
        assert!(lore_entries(obj, "factions", &ids).is_empty());
        assert!(lore_entries(obj, "lore", &ids).is_empty());
    }

    #[test]
    fn test_lore_entries_keep_ids() {
        let ids = SequentialIds::new("l");
        let doc = json!({"factions": [{"id": "f1", "name": "Guild"}, {"name": "Court"}, 7]});
        let entries = lore_entries(fields::as_object(&doc), "factions", &ids);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "f1");
        assert_eq!(entries[1].id, "l-1");
        assert_eq!(entries[1].description, "");
    }

    #[test]
    fn test_empty_chapters_get_placeholder() {
        let ids = SequentialIds::new("ch");
        let doc = json!({"chapters": []});
        let chapters = chapters(fields::as_object(&doc), &ids);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Chapter 1");
        assert_eq!(chapters[0].content, "");
    }

    #[test]
    fn test_story_arc_fills_plot_points() {
        let ids = SequentialIds::new("pp");
        let doc = json!({"storyArc": [
            {"title": "Rise", "description": "d"},
            {"title": "Fall", "plotPoints": [{"summary": "betrayal"}]}
        ]});
        let acts = story_arc(fields::as_object(&doc), Language::En, &ids);
        assert_eq!(acts.len(), 2);
        assert!(acts[0].plot_points.is_empty());
        assert_eq!(acts[1].plot_points[0].id, "pp-1");
        assert_eq!(acts[1].plot_points[0].summary, "betrayal");
    }

    #[test]
    fn test_story_arc_default_by_language() {
        let ids = SequentialIds::new("pp");
        let doc = json!({});
        let acts = story_arc(fields::as_object(&doc), Language::Id, &ids);
        assert_eq!(acts.len(), 1);
        assert_eq!(acts[0].title, "Babak 1");
        assert_eq!(acts[0].description, "");
    }
}
