use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::types::{
    ChatMessage, ChatRequest, ChatResponse, ContentPart, EmbeddingRequest, EmbeddingResponse,
    ErrorEnvelope, ImageUrl, MessageContent,
};
use super::{AiError, CompletionRequest, CompletionService, EmbeddingService};
use crate::config::{self, ApiKey};

const API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_COMPLETION_MODEL: &str = "gpt-4.1-mini-2025-04-14";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Substrings that mark a 400 as a moderation / jailbreak rejection rather
/// than a malformed request.
const MODERATION_MARKERS: &[&str] = &[
    "jailbreak",
    "content filter",
    "content_filter",
    "content_policy",
    "moderation",
];

/// OpenAI-compatible REST client serving completions, vision and embeddings.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: ApiKey,
    base_url: String,
    completion_model: String,
    embedding_model: String,
}

impl OpenAiClient {
    /// Reads `OPENAI_API_KEY`, plus optional `OPENAI_BASE_URL`,
    /// `PLACEWISE_COMPLETION_MODEL` and `PLACEWISE_EMBEDDING_MODEL`.
    pub fn from_env(http: Client) -> Result<Self, AiError> {
        let api_key = config::read_key("OPENAI_API_KEY").ok_or(AiError::ApiKeyNotSet)?;
        Ok(Self {
            http,
            api_key,
            base_url: config::read_setting("OPENAI_BASE_URL", API_BASE),
            completion_model: config::read_setting(
                "PLACEWISE_COMPLETION_MODEL",
                DEFAULT_COMPLETION_MODEL,
            ),
            embedding_model: config::read_setting(
                "PLACEWISE_EMBEDDING_MODEL",
                DEFAULT_EMBEDDING_MODEL,
            ),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey::new("test-key"),
            base_url: base_url.to_string(),
            completion_model: DEFAULT_COMPLETION_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }

    async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, AiError> {
        let url = format!("{}{path}", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let classified = classify_status(status.as_u16(), &text);
            warn!(status = %status, error = %classified, "OpenAI API error");
            return Err(classified);
        }

        serde_json::from_str(&text).map_err(|e| AiError::Malformed(e.to_string()))
    }
}

impl CompletionService for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AiError> {
        let user = match &request.image_base64 {
            None => MessageContent::Text(&request.user),
            Some(image) => MessageContent::Parts(vec![
                ContentPart::Text {
                    text: &request.user,
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:image/jpeg;base64,{image}"),
                    },
                },
            ]),
        };

        let body = ChatRequest {
            model: &self.completion_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(&request.system),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response: ChatResponse = self.post_json("/chat/completions", &body).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AiError::Malformed("no response content".into()))?;

        debug!(
            model = %self.completion_model,
            vision = request.image_base64.is_some(),
            "completion received"
        );
        Ok(content)
    }
}

impl EmbeddingService for OpenAiClient {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiError> {
        let body = EmbeddingRequest {
            model: &self.embedding_model,
            input: inputs,
        };
        let response: EmbeddingResponse = self.post_json("/embeddings", &body).await?;

        let mut data = response.data;
        if data.len() != inputs.len() {
            return Err(AiError::Malformed(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                data.len()
            )));
        }
        data.sort_by_key(|d| d.index);

        debug!(model = %self.embedding_model, count = data.len(), "embeddings received");
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

fn classify_status(code: u16, body: &str) -> AiError {
    let message = error_message(body);
    match code {
        429 => AiError::RateLimited,
        401 | 403 => AiError::Unauthorized(message),
        400 if is_moderation_block(body) => AiError::ContentBlocked(message),
        _ => AiError::Api { code, message },
    }
}

fn is_moderation_block(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    MODERATION_MARKERS.iter().any(|m| lower.contains(m))
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| {
            let end = body.floor_char_boundary(200);
            body[..end].to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_429_as_rate_limited() {
        assert!(matches!(classify_status(429, ""), AiError::RateLimited));
    }

    #[test]
    fn classify_401_as_unauthorized_with_message() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "code": "invalid_api_key"}}"#;
        match classify_status(401, body) {
            AiError::Unauthorized(message) => assert_eq!(message, "Incorrect API key provided"),
            other => panic!("expected Unauthorized, got: {other:?}"),
        }
    }

    #[test]
    fn classify_400_jailbreak_as_blocked() {
        let body = r#"{"error": {"message": "The response was filtered due to the prompt triggering the content management policy", "code": "content_filter", "innererror": {"content_filter_result": {"jailbreak": {"filtered": true, "detected": true}}}}}"#;
        assert!(matches!(classify_status(400, body), AiError::ContentBlocked(_)));
    }

    #[test]
    fn classify_plain_400_as_api_error() {
        let body = r#"{"error": {"message": "max_tokens is too large"}}"#;
        match classify_status(400, body) {
            AiError::Api { code, message } => {
                assert_eq!(code, 400);
                assert_eq!(message, "max_tokens is too large");
            }
            other => panic!("expected Api error, got: {other:?}"),
        }
    }

    #[test]
    fn error_message_falls_back_to_body_snippet() {
        let long = "x".repeat(500);
        assert_eq!(error_message(&long).len(), 200);
        assert_eq!(error_message("bad gateway"), "bad gateway");
    }
}
