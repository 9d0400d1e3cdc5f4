use anyhow::{anyhow, Context};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::text::TextAssistant;

const CLEANING_PROMPT: &str = "You prepare documents for paragraph-by-paragraph audio narration. \
Keep the original wording exactly: do not summarize, rewrite, shorten or reorder anything. \
Merge lines that were only broken visually (for example by PDF layout) into full paragraphs, \
keep headings with the paragraph they introduce, and remove author/year citations such as \
(Nguyen, 2020). Return plain text with paragraphs separated by a blank line.";

const TITLE_PROMPT: &str = "Extract the title of the document. Return ONLY the most likely \
document title as a single line, without author names, introductions or explanations.";

/// Head of the document sent for title extraction
pub const TITLE_HEAD_CHARS: usize = 2000;

/// Chat-completion backed cleaner and title extractor
pub struct OpenAiTextAssistant {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiTextAssistant {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String) -> Self {
        Self { client, model }
    }

    async fn complete(&self, system_prompt: &str, text: &str) -> anyhow::Result<String> {
        let start_time = std::time::Instant::now();
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(0.2)
            .max_tokens(1500u32)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(text)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .context("OpenAI chat completion failed")?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| anyhow!("OpenAI returned an empty completion"))?;

        tracing::info!(
            model = %self.model,
            latency_ms = start_time.elapsed().as_millis(),
            input_length = text.len(),
            output_length = content.len(),
            "LLM completion received"
        );
        Ok(content)
    }
}

#[async_trait]
impl TextAssistant for OpenAiTextAssistant {
    async fn clean(&self, flattened: &str) -> anyhow::Result<String> {
        self.complete(CLEANING_PROMPT, flattened).await
    }

    async fn extract_title(&self, raw: &str) -> anyhow::Result<String> {
        let head: String = raw.chars().take(TITLE_HEAD_CHARS).collect();
        self.complete(TITLE_PROMPT, &head).await
    }
}
