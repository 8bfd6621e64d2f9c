//! services/cli/src/adapters/vision.rs
//!
//! This module contains the adapter for the vision-capable analysis LLM.
//! It implements the `AnalysisService` port from the `core` crate.

const SYSTEM_INSTRUCTIONS: &str = r#"You are an expert in universal accessibility auditing architectural spaces from photographs.

Evaluate the pictured space and categorize your findings.

Required categories:
1. Mobility Accessibility: ramps, steps, door widths, floor surfaces, turning space.
2. Visual Accessibility and Signage: contrast, braille, tactile paving, signage clarity, lighting.
3. General Accessibility and Comfort: furniture, safety, ergonomics, temporary obstacles.

For each category, determine a status: "positive" (good), "warning" (needs improvement / caution), or "negative" (barrier detected / bad).

Also produce "fullReportMarkdown": a detailed, professional report in Markdown format, suitable for printing.

Respond with a single JSON object and nothing else, using exactly this shape:
{
  "verdict": "short final verdict, e.g. 'Accesible' or 'No Accesible'",
  "summary": "2-3 sentence executive summary",
  "categories": [
    {"title": "...", "status": "positive" | "warning" | "negative", "details": ["...", "..."]}
  ],
  "fullReportMarkdown": "the full detailed report in Markdown"
}"#;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrlArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use kivo_core::{
    domain::AnalysisReport,
    ports::{AnalysisService, PortError, PortResult},
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `AnalysisService` using an OpenAI-compatible
/// vision model.
#[derive(Clone)]
pub struct OpenAiVisionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiVisionAdapter {
    /// Creates a new `OpenAiVisionAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Models occasionally wrap JSON output in a Markdown code fence despite
    /// the JSON response format; strip it before parsing.
    fn strip_code_fence(text: &str) -> &str {
        let trimmed = text.trim();
        trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .and_then(|rest| rest.strip_suffix("```"))
            .map(str::trim)
            .unwrap_or(trimmed)
    }
}

//=========================================================================================
// `AnalysisService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AnalysisService for OpenAiVisionAdapter {
    /// Analyzes an encoded image of a physical space for accessibility findings.
    async fn analyze(&self, image: &[u8]) -> PortResult<AnalysisReport> {
        let data_url = format!("data:image/jpeg;base64,{}", BASE64.encode(image));

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(vec![
                    ChatCompletionRequestMessageContentPartTextArgs::default()
                        .text("Analyze this image of an architectural space.")
                        .build()
                        .map_err(|e| PortError::Unexpected(e.to_string()))?
                        .into(),
                    ChatCompletionRequestMessageContentPartImageArgs::default()
                        .image_url(
                            ImageUrlArgs::default()
                                .url(data_url)
                                .detail(ImageDetail::Auto)
                                .build()
                                .map_err(|e| PortError::Unexpected(e.to_string()))?,
                        )
                        .build()
                        .map_err(|e| PortError::Unexpected(e.to_string()))?
                        .into(),
                ])
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonObject)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Service(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Service("Vision model response contained no text content.".to_string())
            })?;

        serde_json::from_str::<AnalysisReport>(Self::strip_code_fence(&content)).map_err(|e| {
            PortError::Service(format!("Vision model returned malformed JSON: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_code_fence_handles_fenced_and_bare_json() {
        assert_eq!(
            OpenAiVisionAdapter::strip_code_fence("```json\n{\"a\":1}\n```"),
            "{\"a\":1}"
        );
        assert_eq!(
            OpenAiVisionAdapter::strip_code_fence("```\n{\"a\":1}\n```"),
            "{\"a\":1}"
        );
        assert_eq!(OpenAiVisionAdapter::strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }
}
