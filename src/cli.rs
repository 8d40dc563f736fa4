//! Command-line front end.
//!
//! Every command returns a [`CliResult`]; the binary prints the message and
//! exits with the code. Document access goes through [`DocumentStore`], so
//! everything a command reads has already been migrated.

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::chat::{ChatSession, MessageAuthor};
use crate::config::Config;
use crate::encyclopedia::{Language, StoryDocument};
use crate::gemini::{GeminiClient, GenerativeBackend};
use crate::generation::{EncyclopediaGenerator, Section, SectionRequest};
use crate::ids::IdGenerator;
use crate::migrate::{migrate_story, migrate_story_list, migrate_universe, migrate_universe_list};
use crate::storage::DocumentStore;
use crate::transfer::{export_story, export_universe, import_story, import_universe};

const RULE: &str =
    "═══════════════════════════════════════════════════════════════════════════════\n";

/// Story Encyclopedia command-line interface.
#[derive(Parser, Debug)]
#[command(name = "story-encyclopedia", version, about)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Migrate a stored JSON file and print the current-shape result
    Migrate {
        /// File holding one document or a list of documents
        file: PathBuf,

        /// Treat the file as universe data
        #[arg(long)]
        universe: bool,
    },

    /// List stored stories
    List,

    /// List the universe library
    Universes,

    /// Create a blank story
    New {
        /// Story title
        #[arg(long)]
        title: String,

        /// Content language: en or id
        #[arg(long, default_value = "en")]
        language: String,

        /// Universe to snapshot into the story
        #[arg(long)]
        universe: Option<String>,
    },

    /// Import an exported file (or bare JSON) into the library
    Import {
        /// Exported Markdown or JSON file
        file: PathBuf,

        /// Import a universe instead of a story
        #[arg(long)]
        universe: bool,
    },

    /// Export a story or universe as Markdown with embedded data
    Export {
        /// Story or universe id
        id: String,

        /// Export a universe instead of a story
        #[arg(long)]
        universe: bool,

        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Draft one encyclopedia section with the AI and merge it into the story
    Generate {
        /// Story id
        id: String,

        /// Section: basic, core, worldLore, mainPlot, character, relationships,
        /// worldBuilding, magicSystem, singleArcAct, arc, tone, styleExample
        section: String,

        /// Character or act index
        #[arg(long)]
        index: Option<usize>,

        /// Core idea (required for basic)
        #[arg(long)]
        idea: Option<String>,

        /// Prose style (styleExample; defaults to the story's)
        #[arg(long)]
        style: Option<String>,
    },

    /// Send a message to the writing assistant
    Chat {
        /// Story id
        id: String,

        /// Message text
        message: String,

        /// Use the deeper thinking model
        #[arg(long)]
        thinking: bool,
    },

    /// Show the chat history of a story
    History {
        /// Story id
        id: String,
    },

    /// Save a story's world-building as a reusable universe
    SaveUniverse {
        /// Story id
        id: String,

        /// Name of the new universe
        #[arg(long)]
        name: String,
    },

    /// Toggle the favorite flag of a universe
    Favorite {
        /// Universe id
        id: String,
    },

    /// Delete a story (and its chat) or a universe
    Delete {
        /// Story or universe id
        id: String,

        /// Delete a universe instead of a story
        #[arg(long)]
        universe: bool,
    },
}

/// Result of CLI command execution.
#[derive(Debug)]
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    /// Create a success result with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    /// Create an error result with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }
}

/// Execute a CLI command.
pub async fn execute_command<S: DocumentStore>(
    command: Commands,
    store: &S,
    config: &Config,
    ids: &dyn IdGenerator,
) -> CliResult {
    match command {
        Commands::Migrate { file, universe } => execute_migrate(&file, universe, ids),
        Commands::List => execute_list(store, ids).await,
        Commands::Universes => execute_universes(store, ids).await,
        Commands::New {
            title,
            language,
            universe,
        } => execute_new(store, &title, &language, universe.as_deref(), ids).await,
        Commands::Import { file, universe } => execute_import(store, &file, universe, ids).await,
        Commands::Export { id, universe, out } => {
            execute_export(store, &id, universe, out.as_deref(), ids).await
        }
        Commands::Generate {
            id,
            section,
            index,
            idea,
            style,
        } => match GeminiClient::new(&config.gemini, config.request.clone()) {
            Ok(client) => {
                let generator =
                    EncyclopediaGenerator::new(client, config.gemini.generation_model.clone());
                execute_generate(store, &generator, &id, &section, index, idea, style, ids).await
            }
            Err(e) => CliResult::error(e.to_string()),
        },
        Commands::Chat {
            id,
            message,
            thinking,
        } => match GeminiClient::new(&config.gemini, config.request.clone()) {
            Ok(client) => execute_chat(store, &client, &id, &message, thinking, ids).await,
            Err(e) => CliResult::error(e.to_string()),
        },
        Commands::History { id } => execute_history(store, &id, ids).await,
        Commands::SaveUniverse { id, name } => execute_save_universe(store, &id, &name, ids).await,
        Commands::Favorite { id } => execute_favorite(store, &id, ids).await,
        Commands::Delete { id, universe } => execute_delete(store, &id, universe, ids).await,
    }
}

fn read_file(path: &Path) -> Result<String, CliResult> {
    std::fs::read_to_string(path)
        .map_err(|e| CliResult::error(format!("Failed to read {}: {}", path.display(), e)))
}

async fn load_story<S: DocumentStore>(
    store: &S,
    id: &str,
    ids: &dyn IdGenerator,
) -> Result<StoryDocument, CliResult> {
    match store.find_story(id, ids).await {
        Ok(Some(story)) => Ok(story),
        Ok(None) => Err(CliResult::error(format!("Story not found: {}", id))),
        Err(e) => Err(CliResult::error(format!("Failed to load stories: {}", e))),
    }
}

/// Execute migrate command.
fn execute_migrate(file: &Path, universe: bool, ids: &dyn IdGenerator) -> CliResult {
    let text = match read_file(file) {
        Ok(text) => text,
        Err(result) => return result,
    };
    let raw: Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(e) => return CliResult::error(format!("{} is not valid JSON: {}", file.display(), e)),
    };

    let migrated = match (universe, raw.is_array()) {
        (false, true) => serde_json::to_string_pretty(&migrate_story_list(&raw, ids)),
        (false, false) => serde_json::to_string_pretty(&migrate_story(&raw, ids)),
        (true, true) => serde_json::to_string_pretty(&migrate_universe_list(&raw, ids)),
        (true, false) => serde_json::to_string_pretty(&migrate_universe(&raw, ids)),
    };

    match migrated {
        Ok(json) => CliResult::success(json),
        Err(e) => CliResult::error(format!("Failed to serialize result: {}", e)),
    }
}

/// Execute list command.
async fn execute_list<S: DocumentStore>(store: &S, ids: &dyn IdGenerator) -> CliResult {
    let stories = match store.load_stories(ids).await {
        Ok(stories) => stories,
        Err(e) => return CliResult::error(format!("Failed to load stories: {}", e)),
    };

    let mut output = String::new();
    output.push_str(&format!("\nStories ({})\n", stories.len()));
    output.push_str(RULE);

    if stories.is_empty() {
        output.push_str("No stories yet. Create one with `new --title <TITLE>`.\n");
    }
    for story in &stories {
        let title = if story.title.is_empty() {
            "(untitled)"
        } else {
            story.title.as_str()
        };
        output.push_str(&format!(
            "  {}  {} [{}] {} chapter(s), {}\n",
            story.id,
            title,
            story.language,
            story.chapters.len(),
            story.universe_name
        ));
    }

    CliResult::success(output)
}

/// Execute universes command.
async fn execute_universes<S: DocumentStore>(store: &S, ids: &dyn IdGenerator) -> CliResult {
    let mut universes = match store.load_universes(ids).await {
        Ok(universes) => universes,
        Err(e) => return CliResult::error(format!("Failed to load universes: {}", e)),
    };
    // Favorites first, then by name
    universes.sort_by(|a, b| {
        b.is_favorite
            .unwrap_or(false)
            .cmp(&a.is_favorite.unwrap_or(false))
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut output = String::new();
    output.push_str(&format!("\nUniverses ({})\n", universes.len()));
    output.push_str(RULE);

    for universe in &universes {
        let star = if universe.is_favorite.unwrap_or(false) {
            "★"
        } else {
            " "
        };
        output.push_str(&format!(
            "{} {}  {} [{}] {} location(s), {} faction(s), {} lore\n",
            star,
            universe.id,
            universe.name,
            universe.language,
            universe.locations.len(),
            universe.factions.len(),
            universe.lore.len()
        ));
    }

    CliResult::success(output)
}

/// Execute new command.
async fn execute_new<S: DocumentStore>(
    store: &S,
    title: &str,
    language: &str,
    universe_id: Option<&str>,
    ids: &dyn IdGenerator,
) -> CliResult {
    let language: Language = match language.parse() {
        Ok(language) => language,
        Err(e) => return CliResult::error(e),
    };

    let mut story = StoryDocument::blank(language, ids);
    story.title = title.to_string();

    if let Some(universe_id) = universe_id {
        match store.find_universe(universe_id, ids).await {
            Ok(Some(universe)) => story.attach_universe(&universe, ids),
            Ok(None) => return CliResult::error(format!("Universe not found: {}", universe_id)),
            Err(e) => return CliResult::error(format!("Failed to load universes: {}", e)),
        }
    }

    if let Err(e) = store.upsert_story(&story, ids).await {
        return CliResult::error(format!("Failed to save story: {}", e));
    }

    info!(story_id = %story.id, language = %language, "Story created");
    CliResult::success(format!("Created story {} ({})", story.id, story.title))
}

/// Execute import command.
async fn execute_import<S: DocumentStore>(
    store: &S,
    file: &Path,
    universe: bool,
    ids: &dyn IdGenerator,
) -> CliResult {
    let text = match read_file(file) {
        Ok(text) => text,
        Err(result) => return result,
    };

    if universe {
        let universe = match import_universe(&text, ids) {
            Ok(universe) => universe,
            Err(e) => return CliResult::error(format!("Import failed: {}", e)),
        };
        if let Err(e) = store.upsert_universe(&universe, ids).await {
            return CliResult::error(format!("Failed to save universe: {}", e));
        }
        CliResult::success(format!("Imported universe {} ({})", universe.id, universe.name))
    } else {
        let story = match import_story(&text, ids) {
            Ok(story) => story,
            Err(e) => return CliResult::error(format!("Import failed: {}", e)),
        };
        if let Err(e) = store.upsert_story(&story, ids).await {
            return CliResult::error(format!("Failed to save story: {}", e));
        }
        CliResult::success(format!("Imported story {} ({})", story.id, story.title))
    }
}

/// Execute export command.
async fn execute_export<S: DocumentStore>(
    store: &S,
    id: &str,
    universe: bool,
    out: Option<&Path>,
    ids: &dyn IdGenerator,
) -> CliResult {
    let exported = if universe {
        match store.find_universe(id, ids).await {
            Ok(Some(universe)) => export_universe(&universe),
            Ok(None) => return CliResult::error(format!("Universe not found: {}", id)),
            Err(e) => return CliResult::error(format!("Failed to load universes: {}", e)),
        }
    } else {
        match load_story(store, id, ids).await {
            Ok(story) => export_story(&story),
            Err(result) => return result,
        }
    };

    let text = match exported {
        Ok(text) => text,
        Err(e) => return CliResult::error(format!("Export failed: {}", e)),
    };

    match out {
        Some(path) => match std::fs::write(path, &text) {
            Ok(()) => CliResult::success(format!("Exported {} to {}", id, path.display())),
            Err(e) => CliResult::error(format!("Failed to write {}: {}", path.display(), e)),
        },
        None => CliResult::success(text),
    }
}

/// Execute generate command.
#[allow(clippy::too_many_arguments)]
pub async fn execute_generate<S: DocumentStore, B: GenerativeBackend>(
    store: &S,
    generator: &EncyclopediaGenerator<B>,
    id: &str,
    section: &str,
    index: Option<usize>,
    idea: Option<String>,
    style: Option<String>,
    ids: &dyn IdGenerator,
) -> CliResult {
    let section: Section = match section.parse() {
        Ok(section) => section,
        Err(e) => return CliResult::error(e.to_string()),
    };
    let story = match load_story(store, id, ids).await {
        Ok(story) => story,
        Err(result) => return result,
    };

    let mut request = SectionRequest::new(section, story.language);
    request.index = index;
    request.idea = idea;
    request.style = style.or_else(|| {
        (section == Section::StyleExample && !story.prose_style.is_empty())
            .then(|| story.prose_style.clone())
    });

    let generated = match generator.generate(&request, &story, ids).await {
        Ok(generated) => generated,
        Err(e) => return CliResult::error(e.to_string()),
    };

    if section == Section::StyleExample {
        return CliResult::success(generated.example().unwrap_or_default().to_string());
    }

    let merged = match generated.merge_into(&story, index.unwrap_or(0), ids) {
        Ok(merged) => merged,
        Err(e) => return CliResult::error(e.to_string()),
    };
    if let Err(e) = store.upsert_story(&merged, ids).await {
        return CliResult::error(format!("Failed to save story: {}", e));
    }

    let fields: Vec<&str> = generated.data.keys().map(String::as_str).collect();
    CliResult::success(format!(
        "Generated {} for {}: {}",
        section,
        merged.id,
        fields.join(", ")
    ))
}

/// Execute chat command.
pub async fn execute_chat<S: DocumentStore, B: GenerativeBackend + ?Sized>(
    store: &S,
    backend: &B,
    id: &str,
    message: &str,
    thinking: bool,
    ids: &dyn IdGenerator,
) -> CliResult {
    let story = match load_story(store, id, ids).await {
        Ok(story) => story,
        Err(result) => return result,
    };
    let history = match store.load_chat(id).await {
        Ok(history) => history,
        Err(e) => return CliResult::error(format!("Failed to load chat: {}", e)),
    };

    let mut session = ChatSession::new(&story, thinking).with_history(history);
    let reply = match session.send(backend, message, ids).await {
        Ok(reply) => reply.text.clone(),
        Err(e) => return CliResult::error(e.to_string()),
    };

    if let Err(e) = store.save_chat(id, session.messages()).await {
        // The reply was produced; losing the transcript is not fatal.
        warn!(story_id = %id, error = %e, "Failed to save chat history");
    }

    CliResult::success(reply)
}

/// Execute history command.
async fn execute_history<S: DocumentStore>(store: &S, id: &str, ids: &dyn IdGenerator) -> CliResult {
    let story = match load_story(store, id, ids).await {
        Ok(story) => story,
        Err(result) => return result,
    };
    let mut messages = match store.load_chat(id).await {
        Ok(messages) => messages,
        Err(e) => return CliResult::error(format!("Failed to load chat: {}", e)),
    };
    if messages.is_empty() {
        messages.push(ChatSession::greeting(&story));
    }

    let mut output = String::new();
    for message in &messages {
        let who = match message.author {
            MessageAuthor::User => "You",
            MessageAuthor::Ai => "AI",
        };
        output.push_str(&format!("[{}] {}\n\n", who, message.text));
    }
    CliResult::success(output)
}

/// Execute save-universe command.
async fn execute_save_universe<S: DocumentStore>(
    store: &S,
    id: &str,
    name: &str,
    ids: &dyn IdGenerator,
) -> CliResult {
    let story = match load_story(store, id, ids).await {
        Ok(story) => story,
        Err(result) => return result,
    };
    let Some(universe) = story.to_universe(name, ids) else {
        return CliResult::error("This story has no world-building data to save.");
    };

    match store.upsert_universe(&universe, ids).await {
        Ok(()) => CliResult::success(format!("Saved universe {} ({})", universe.id, universe.name)),
        Err(e) => CliResult::error(format!("Failed to save universe: {}", e)),
    }
}

/// Execute favorite command.
async fn execute_favorite<S: DocumentStore>(store: &S, id: &str, ids: &dyn IdGenerator) -> CliResult {
    let mut universe = match store.find_universe(id, ids).await {
        Ok(Some(universe)) => universe,
        Ok(None) => return CliResult::error(format!("Universe not found: {}", id)),
        Err(e) => return CliResult::error(format!("Failed to load universes: {}", e)),
    };
    let favorite = !universe.is_favorite.unwrap_or(false);
    universe.is_favorite = Some(favorite);

    match store.upsert_universe(&universe, ids).await {
        Ok(()) if favorite => CliResult::success(format!("★ {} is now a favorite", universe.name)),
        Ok(()) => CliResult::success(format!("{} is no longer a favorite", universe.name)),
        Err(e) => CliResult::error(format!("Failed to save universe: {}", e)),
    }
}

/// Execute delete command.
async fn execute_delete<S: DocumentStore>(
    store: &S,
    id: &str,
    universe: bool,
    ids: &dyn IdGenerator,
) -> CliResult {
    let (kind, result) = if universe {
        ("Universe", store.delete_universe(id, ids).await)
    } else {
        ("Story", store.delete_story(id, ids).await)
    };

    match result {
        Ok(true) => CliResult::success(format!("{} {} deleted", kind, id)),
        Ok(false) => CliResult::error(format!("{} not found: {}", kind, id)),
        Err(e) => CliResult::error(format!("Delete failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::storage::SqliteStore;
    use clap::CommandFactory;

    fn config() -> Config {
        Config {
            gemini: crate::config::GeminiConfig {
                api_key: None,
                base_url: "http://localhost:1".to_string(),
                generation_model: "gemini-2.5-flash".to_string(),
            },
            database: crate::config::DatabaseConfig {
                path: PathBuf::from(":memory:"),
                max_connections: 1,
            },
            logging: crate::config::LoggingConfig {
                level: "info".to_string(),
                format: crate::config::LogFormat::Pretty,
            },
            request: crate::config::RequestConfig::default(),
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_command() {
        let cli = Cli::try_parse_from([
            "story-encyclopedia",
            "generate",
            "s1",
            "singleArcAct",
            "--index",
            "2",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Generate { index: Some(2), .. }
        ));
    }

    #[test]
    fn test_cli_result_success() {
        let result = CliResult::success("test message");
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.message, "test message");
    }

    #[test]
    fn test_cli_result_error() {
        let result = CliResult::error("error message");
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.message, "error message");
    }

    #[tokio::test]
    async fn test_new_then_list() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        let ids = SequentialIds::new("c");
        let new = Commands::New {
            title: "Ashfall".to_string(),
            language: "id".to_string(),
            universe: None,
        };
        let result = execute_command(new, &store, &config(), &ids).await;
        assert_eq!(result.exit_code, 0, "{}", result.message);

        let result = execute_command(Commands::List, &store, &config(), &ids).await;
        assert!(result.message.contains("Ashfall [id]"));
    }

    #[tokio::test]
    async fn test_new_rejects_unknown_language() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        let ids = SequentialIds::new("c");
        let new = Commands::New {
            title: "x".to_string(),
            language: "fr".to_string(),
            universe: None,
        };
        let result = execute_command(new, &store, &config(), &ids).await;
        assert_eq!(result.exit_code, 1);
    }

    #[tokio::test]
    async fn test_ai_commands_require_api_key() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        let ids = SequentialIds::new("c");
        let chat = Commands::Chat {
            id: "s1".to_string(),
            message: "hi".to_string(),
            thinking: false,
        };
        let result = execute_command(chat, &store, &config(), &ids).await;
        assert_eq!(result.exit_code, 1);
        assert!(result.message.contains("GEMINI_API_KEY"));
    }

    #[tokio::test]
    async fn test_history_shows_greeting_when_empty() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        let ids = SequentialIds::new("c");
        let mut story = StoryDocument::blank(Language::En, &ids);
        story.title = "Ashfall".to_string();
        store.upsert_story(&story, &ids).await.unwrap();

        let result = execute_command(
            Commands::History {
                id: story.id.clone(),
            },
            &store,
            &config(),
            &ids,
        )
        .await;
        assert!(result.message.starts_with("[AI] Okay, I've loaded"));
    }

    #[tokio::test]
    async fn test_save_universe_and_favorite() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        let ids = SequentialIds::new("c");
        let mut story = StoryDocument::blank(Language::En, &ids);
        store.upsert_story(&story, &ids).await.unwrap();

        let save = || Commands::SaveUniverse {
            id: story.id.clone(),
            name: "Aetheria".to_string(),
        };
        let result = execute_command(save(), &store, &config(), &ids).await;
        assert_eq!(result.exit_code, 1);

        story.magic_system = "Runes".to_string();
        store.upsert_story(&story, &ids).await.unwrap();
        let result = execute_command(save(), &store, &config(), &ids).await;
        assert_eq!(result.exit_code, 0, "{}", result.message);

        let universe = store.load_universes(&ids).await.unwrap().remove(0);
        let result = execute_command(
            Commands::Favorite {
                id: universe.id.clone(),
            },
            &store,
            &config(),
            &ids,
        )
        .await;
        assert!(result.message.starts_with("★ Aetheria"));
        let universe = store.find_universe(&universe.id, &ids).await.unwrap().unwrap();
        assert_eq!(universe.is_favorite, Some(true));
    }

    #[tokio::test]
    async fn test_delete_story() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        let ids = SequentialIds::new("c");
        let story = StoryDocument::blank(Language::En, &ids);
        store.upsert_story(&story, &ids).await.unwrap();

        let delete = || Commands::Delete {
            id: story.id.clone(),
            universe: false,
        };
        assert_eq!(execute_command(delete(), &store, &config(), &ids).await.exit_code, 0);
        assert_eq!(execute_command(delete(), &store, &config(), &ids).await.exit_code, 1);
    }
}
