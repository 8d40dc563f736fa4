//! Schema-constrained drafting of encyclopedia sections.
//!
//! Each [`Section`] has a prompt template, a response schema and a
//! post-processing step. [`EncyclopediaGenerator`] runs all three against a
//! [`GenerativeBackend`]; merging the result back into a story always ends in
//! [`crate::migrate::migrate_story`], so a draft can never break the document
//! invariants.

mod response;
mod schema;
mod templates;

#[cfg(test)]
#[path = "generation_tests.rs"]
mod generation_tests;

pub use response::{post_process, GeneratedSection};
pub use schema::response_schema;
pub use templates::{build_prompt, json_language_instruction};

use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::{error, info};

use crate::encyclopedia::{Language, StoryDocument};
use crate::error::{AppResult, GenerationError};
use crate::gemini::{GenerateContentRequest, GenerativeBackend};
use crate::ids::IdGenerator;

/// A draftable part of the encyclopedia
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Basic,
    Core,
    WorldLore,
    MainPlot,
    Character,
    Relationships,
    WorldBuilding,
    MagicSystem,
    SingleArcAct,
    Arc,
    Tone,
    StyleExample,
}

impl Section {
    /// Every section, in setup-screen order.
    pub const ALL: [Section; 12] = [
        Section::Basic,
        Section::Core,
        Section::WorldLore,
        Section::MainPlot,
        Section::Character,
        Section::Relationships,
        Section::WorldBuilding,
        Section::MagicSystem,
        Section::SingleArcAct,
        Section::Arc,
        Section::Tone,
        Section::StyleExample,
    ];

    /// Wire name of the section.
    pub fn name(self) -> &'static str {
        match self {
            Section::Basic => "basic",
            Section::Core => "core",
            Section::WorldLore => "worldLore",
            Section::MainPlot => "mainPlot",
            Section::Character => "character",
            Section::Relationships => "relationships",
            Section::WorldBuilding => "worldBuilding",
            Section::MagicSystem => "magicSystem",
            Section::SingleArcAct => "singleArcAct",
            Section::Arc => "arc",
            Section::Tone => "tone",
            Section::StyleExample => "styleExample",
        }
    }

    /// Whether the section targets one element of a list.
    pub fn is_indexed(self) -> bool {
        matches!(self, Section::Character | Section::SingleArcAct)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Section {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.name() == s)
            .ok_or_else(|| GenerationError::UnknownSection {
                section: s.to_string(),
            })
    }
}

/// What to draft and with which inputs
#[derive(Debug, Clone, PartialEq)]
pub struct SectionRequest {
    pub section: Section,
    pub language: Language,
    /// Core idea; required for [`Section::Basic`].
    pub idea: Option<String>,
    /// Character or act index; defaults to 0.
    pub index: Option<usize>,
    /// Prose style; required for [`Section::StyleExample`].
    pub style: Option<String>,
}

impl SectionRequest {
    /// Create a request with no optional inputs
    pub fn new(section: Section, language: Language) -> Self {
        Self {
            section,
            language,
            idea: None,
            index: None,
            style: None,
        }
    }

    /// Set the core idea
    pub fn with_idea(mut self, idea: impl Into<String>) -> Self {
        self.idea = Some(idea.into());
        self
    }

    /// Set the target index
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the prose style
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}

/// Drafts sections through a generative backend
pub struct EncyclopediaGenerator<B: GenerativeBackend> {
    backend: B,
    model: String,
}

impl<B: GenerativeBackend> EncyclopediaGenerator<B> {
    /// Create a generator that drafts with `model`
    pub fn new(backend: B, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    /// Model used for drafting
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Draft one section of `story`
    pub async fn generate(
        &self,
        request: &SectionRequest,
        story: &StoryDocument,
        ids: &dyn IdGenerator,
    ) -> AppResult<GeneratedSection> {
        let start = Instant::now();
        let prompt = build_prompt(request, story)?;

        let api_request = GenerateContentRequest::prompt(prompt)
            .with_json_schema(response_schema(request.section));

        let response = match self.backend.generate_content(&self.model, api_request).await {
            Ok(resp) => resp,
            Err(e) => {
                error!(
                    section = %request.section,
                    story_id = %story.id,
                    error = %e,
                    "Section drafting failed"
                );
                return Err(e.into());
            }
        };

        let text = response.text().ok_or_else(|| GenerationError::InvalidResponse {
            section: request.section.to_string(),
            message: format!(
                "No content returned (finish reason: {})",
                response.finish_reason().unwrap_or("unknown")
            ),
        })?;

        let generated = post_process(request.section, &text, ids)?;

        info!(
            section = %request.section,
            story_id = %story.id,
            model = %self.model,
            latency_ms = start.elapsed().as_millis(),
            "Section drafted"
        );

        Ok(generated)
    }
}
