//! Gemini Provider - AIProvider over the Gemini `generateContent` API.
//!
//! Gemini has no system role inside `contents` and expects user/model turns
//! to alternate, so the conversation is reshaped before sending: system
//! messages join the `systemInstruction`, consecutive same-role messages are
//! merged and a conversation that opens with a model turn gets a short user
//! turn in front of it.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::transport;
use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, MessageRole,
    ProviderInfo, TokenUsage,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const CONVERSATION_START: &str = "(The patient has opened the questionnaire.)";

/// Configuration for the Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    api_key: Secret<String>,
    /// Model to use (e.g., "gemini-2.5-flash").
    pub model: String,
    pub base_url: String,
    /// Transport-level request timeout.
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gemini-2.5-flash".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Gemini API provider implementation.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, AIError> {
        let client = transport::build_client(config.timeout)?;
        Ok(Self { config, client })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    fn to_gemini_request(request: &CompletionRequest) -> GenerateContentRequest {
        let mut system_parts: Vec<Part> = request
            .system_prompt
            .iter()
            .map(|text| Part { text: text.clone() })
            .collect();

        let mut contents: Vec<Content> = Vec::new();
        for message in &request.messages {
            let role = match message.role {
                MessageRole::System => {
                    system_parts.push(Part {
                        text: message.content.clone(),
                    });
                    continue;
                }
                MessageRole::User => "user",
                MessageRole::Assistant => "model",
            };

            match contents.last_mut() {
                Some(last) if last.role == role => last.parts.push(Part {
                    text: message.content.clone(),
                }),
                _ => contents.push(Content {
                    role: role.to_string(),
                    parts: vec![Part {
                        text: message.content.clone(),
                    }],
                }),
            }
        }

        if contents.first().map_or(true, |c| c.role != "user") {
            contents.insert(
                0,
                Content {
                    role: "user".to_string(),
                    parts: vec![Part {
                        text: CONVERSATION_START.to_string(),
                    }],
                },
            );
        }

        let system_instruction = (!system_parts.is_empty()).then(|| SystemInstruction {
            parts: system_parts,
        });

        let generation_config = (request.temperature.is_some() || request.max_tokens.is_some())
            .then(|| GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            });

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config,
        }
    }

    fn into_completion(
        response: GenerateContentResponse,
        model: &str,
    ) -> Result<CompletionResponse, AIError> {
        let candidate = response
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .ok_or_else(|| AIError::parse("Gemini returned no candidates"))?;

        let finish_reason = match candidate.finish_reason.as_deref() {
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST") => {
                FinishReason::ContentFilter
            }
            _ => FinishReason::Stop,
        };

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(match finish_reason {
                FinishReason::ContentFilter => AIError::content_filtered("response blocked by safety filter"),
                _ => AIError::parse("Gemini returned no text in the response candidates"),
            });
        }

        let usage = response
            .usage_metadata
            .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: text,
            usage,
            model: response.model_version.unwrap_or_else(|| model.to_string()),
            finish_reason,
        })
    }
}

#[async_trait]
impl AIProvider for GeminiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let body = Self::to_gemini_request(&request);

        tracing::debug!(
            provider = "gemini",
            model = %self.config.model,
            session_id = %request.metadata.session_id,
            purpose = %request.metadata.purpose,
            contents = body.contents.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| transport::send_error(e, self.config.timeout))?;

        let response = transport::check_status(response).await?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("failed to parse Gemini response: {e}")))?;

        Self::into_completion(parsed, &self.config.model)
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("gemini", &self.config.model, 1_048_576)
    }
}

// ----- Gemini API Types -----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ContentResponse>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::IntakeSessionId;
    use crate::ports::{RequestMetadata, RequestPurpose};

    fn base_request() -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(
            IntakeSessionId::new("s-1").unwrap(),
            RequestPurpose::Steering,
            "trace",
        ))
    }

    mod request_shaping {
        use super::*;

        #[test]
        fn system_prompt_becomes_system_instruction() {
            let request = base_request()
                .with_system_prompt("framing")
                .with_message(MessageRole::User, "Begin");
            let body = GeminiProvider::to_gemini_request(&request);
            let json = serde_json::to_value(&body).unwrap();

            assert_eq!(json["systemInstruction"]["parts"][0]["text"], "framing");
            assert_eq!(json["contents"][0]["role"], "user");
            assert!(json.get("generationConfig").is_none());
        }

        #[test]
        fn consecutive_user_messages_are_merged() {
            let request = base_request()
                .with_message(MessageRole::User, "start")
                .with_message(MessageRole::Assistant, "What brings you in?")
                .with_message(MessageRole::User, "Headache")
                .with_message(MessageRole::User, "steering");
            let body = GeminiProvider::to_gemini_request(&request);

            let roles: Vec<_> = body.contents.iter().map(|c| c.role.as_str()).collect();
            assert_eq!(roles, vec!["user", "model", "user"]);
            assert_eq!(body.contents[2].parts.len(), 2);
        }

        #[test]
        fn conversation_opening_with_model_gets_user_turn() {
            let request = base_request()
                .with_message(MessageRole::Assistant, "What brings you in?")
                .with_message(MessageRole::User, "Headache");
            let body = GeminiProvider::to_gemini_request(&request);

            assert_eq!(body.contents[0].role, "user");
            assert_eq!(body.contents[0].parts[0].text, CONVERSATION_START);
            assert_eq!(body.contents[1].role, "model");
        }

        #[test]
        fn system_messages_join_instruction() {
            let request = base_request()
                .with_system_prompt("first")
                .with_message(MessageRole::System, "second")
                .with_message(MessageRole::User, "hi");
            let body = GeminiProvider::to_gemini_request(&request);

            let parts = &body.system_instruction.as_ref().unwrap().parts;
            assert_eq!(parts.len(), 2);
            assert_eq!(body.contents.len(), 1);
        }

        #[test]
        fn generation_config_carries_temperature() {
            let request = base_request()
                .with_message(MessageRole::User, "hi")
                .with_temperature(0.2)
                .with_max_tokens(512);
            let json = serde_json::to_value(GeminiProvider::to_gemini_request(&request)).unwrap();

            assert_eq!(json["generationConfig"]["maxOutputTokens"], 512);
            assert!(json["generationConfig"]["temperature"].is_number());
        }
    }

    mod response_parsing {
        use super::*;

        fn parse(raw: &str) -> Result<CompletionResponse, AIError> {
            let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
            GeminiProvider::into_completion(response, "gemini-2.5-flash")
        }

        #[test]
        fn text_parts_are_joined() {
            let completion = parse(
                r#"{
                    "candidates": [{
                        "content": {"role": "model", "parts": [{"text": "How long "}, {"text": "has it hurt?"}]},
                        "finishReason": "STOP"
                    }],
                    "usageMetadata": {"promptTokenCount": 40, "candidatesTokenCount": 6, "totalTokenCount": 46},
                    "modelVersion": "gemini-2.5-flash-001"
                }"#,
            )
            .unwrap();

            assert_eq!(completion.content, "How long has it hurt?");
            assert_eq!(completion.usage.total_tokens, 46);
            assert_eq!(completion.model, "gemini-2.5-flash-001");
        }

        #[test]
        fn missing_candidates_is_parse_error() {
            assert!(matches!(parse(r#"{}"#), Err(AIError::Parse(_))));
        }

        #[test]
        fn safety_block_is_content_filtered() {
            let result = parse(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#);
            assert!(matches!(result, Err(AIError::ContentFiltered { .. })));
        }

        #[test]
        fn max_tokens_maps_to_length() {
            let completion = parse(
                r#"{"candidates": [{"content": {"parts": [{"text": "partial"}]}, "finishReason": "MAX_TOKENS"}]}"#,
            )
            .unwrap();
            assert_eq!(completion.finish_reason, FinishReason::Length);
            assert_eq!(completion.model, "gemini-2.5-flash");
        }
    }
}
