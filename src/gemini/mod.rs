//! Generative-language API client and request/response types.

mod client;
mod types;


pub use client::GeminiClient;
pub use types::*;

use async_trait::async_trait;

use crate::error::GeminiResult;

/// Anything that can answer a `generateContent` request.
///
/// [`GeminiClient`] is the production implementation; drafting and chat
/// depend only on this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Run `request` against `model`.
    async fn generate_content(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> GeminiResult<GenerateContentResponse>;
}
