//! Conversation with the writing assistant about one story.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error, info};

use crate::encyclopedia::{Language, StoryDocument};
use crate::error::{AppResult, GenerationError};
use crate::gemini::{Content, GenerateContentRequest, GenerativeBackend, ModelType};
use crate::ids::IdGenerator;
use crate::prompts::system_instruction;

/// Id of the greeting shown before the first exchange; never persisted.
pub const GREETING_ID: &str = "initial-ai-message";

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageAuthor {
    User,
    Ai,
}

/// One chat message as stored under `webnovel_chat_{storyId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub author: MessageAuthor,
    pub text: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: i64,
}

impl ChatMessage {
    fn new(author: MessageAuthor, text: impl Into<String>, ids: &dyn IdGenerator) -> Self {
        Self {
            id: ids.next_id(),
            author,
            text: text.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Whether this is the unsaved greeting
    pub fn is_greeting(&self) -> bool {
        self.id == GREETING_ID
    }

    fn to_content(&self) -> Content {
        match self.author {
            MessageAuthor::User => Content::user(self.text.clone()),
            MessageAuthor::Ai => Content::model(self.text.clone()),
        }
    }
}

/// A chat bound to one story's encyclopedia
#[derive(Debug, Clone)]
pub struct ChatSession {
    model: ModelType,
    thinking: bool,
    system_instruction: String,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// Start a session; thinking mode runs on Pro with the maximum budget.
    pub fn new(story: &StoryDocument, thinking: bool) -> Self {
        Self {
            model: ModelType::for_chat(thinking),
            thinking,
            system_instruction: system_instruction(story),
            messages: Vec::new(),
        }
    }

    /// Resume from stored messages
    pub fn with_history(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = messages.into_iter().filter(|m| !m.is_greeting()).collect();
        self
    }

    /// Localized greeting shown while a story has no saved chat.
    pub fn greeting(story: &StoryDocument) -> ChatMessage {
        let text = match story.language {
            Language::Id => format!(
                "Oke, aku sudah memuat Ensiklopedia Cerita untuk **\"{}\"**. Panggung sudah siap! Bagian mana dari dunia ini yang akan kita jelajahi pertama?",
                story.title
            ),
            Language::En => format!(
                "Okay, I've loaded the Story Encyclopedia for **\"{}\"**. The stage is set! What part of this world should we explore first?",
                story.title
            ),
        };
        ChatMessage {
            id: GREETING_ID.to_string(),
            author: MessageAuthor::Ai,
            text,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn model(&self) -> ModelType {
        self.model
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Request carrying the whole history plus `text` as the newest turn
    pub fn build_request(&self, text: &str) -> GenerateContentRequest {
        let mut contents: Vec<Content> = self.messages.iter().map(ChatMessage::to_content).collect();
        contents.push(Content::user(text));

        let request = GenerateContentRequest::new(contents)
            .with_system_instruction(self.system_instruction.clone());
        if self.thinking && self.model.supports_thinking() {
            request.with_thinking()
        } else {
            request
        }
    }

    /// Send `text` and record both sides of the exchange.
    ///
    /// History is left untouched when the backend fails.
    pub async fn send<B: GenerativeBackend + ?Sized>(
        &mut self,
        backend: &B,
        text: &str,
        ids: &dyn IdGenerator,
    ) -> AppResult<&ChatMessage> {
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyMessage.into());
        }

        let start = Instant::now();
        let request = self.build_request(text);
        debug!(
            model = %self.model,
            history = self.messages.len(),
            thinking = self.thinking,
            "Sending chat message"
        );

        let response = match backend.generate_content(self.model.as_str(), request).await {
            Ok(resp) => resp,
            Err(e) => {
                error!(model = %self.model, error = %e, "Chat message failed");
                return Err(e.into());
            }
        };

        let reply = response.text().ok_or_else(|| GenerationError::InvalidResponse {
            section: "chat".to_string(),
            message: format!(
                "No content returned (finish reason: {})",
                response.finish_reason().unwrap_or("unknown")
            ),
        })?;

        self.messages
            .push(ChatMessage::new(MessageAuthor::User, text, ids));
        self.messages
            .push(ChatMessage::new(MessageAuthor::Ai, reply, ids));

        info!(
            model = %self.model,
            latency_ms = start.elapsed().as_millis(),
            messages = self.messages.len(),
            "Chat reply received"
        );

        let last = self.messages.len() - 1;
        Ok(&self.messages[last])
    }
}
