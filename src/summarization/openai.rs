//! OpenAI chat-completion summarization implementation.

use super::{build_summary_prompt, Summarizer, SummaryLevel, SummaryResult};
use crate::config::SummarizationSettings;
use crate::error::{OppsumError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{info, instrument};

/// OpenAI-backed summarizer.
///
/// Sends the shared directive as a single user message per call; no
/// conversation history is kept. OpenAI never returns inline binary
/// parts, so `files` is always empty.
pub struct OpenAiSummarizer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiSummarizer {
    /// Create a summarizer from settings. The API key is read from
    /// `OPENAI_API_KEY` by the client itself.
    pub fn new(settings: &SummarizationSettings) -> Self {
        Self {
            client: create_client(),
            model: settings.openai_model.clone(),
            temperature: settings.temperature,
        }
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    #[instrument(skip(self, text), fields(level = ?level, chars = text.len()))]
    async fn summarize(&self, text: &str, level: SummaryLevel) -> Result<SummaryResult> {
        let prompt = build_summary_prompt(text, level);

        let messages: Vec<ChatCompletionRequestMessage> =
            vec![ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| OppsumError::Summarization(e.to_string()))?
                .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| OppsumError::Summarization(e.to_string()))?;

        info!("Requesting summary from {}", self.model);

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| OppsumError::Summarization(format!("OpenAI API error: {e}")))?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| OppsumError::Summarization("empty response from OpenAI".to_string()))?
            .clone();

        Ok(SummaryResult {
            text,
            files: Vec::new(),
        })
    }
}
