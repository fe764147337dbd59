//! Generative-AI services behind one async abstraction: text completion,
//! vision completion (a completion carrying an image) and embeddings.

pub mod openai;
pub mod retry;
mod types;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("OPENAI_API_KEY not set")]
    ApiKeyNotSet,

    #[error("Authentication failed: check your API key ({0})")]
    Unauthorized(String),

    #[error("API rate limit exceeded")]
    RateLimited,

    #[error("Content blocked by moderation: {0}")]
    ContentBlocked(String),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("enricher stopped after an earlier fatal error")]
    LimiterClosed,
}

impl AiError {
    /// Account-level failures that must stop the whole batch.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AiError::ApiKeyNotSet | AiError::Unauthorized(_) | AiError::LimiterClosed
        )
    }
}

/// One chat-style completion. `image_base64` turns it into a vision call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub image_base64: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            image_base64: None,
            max_tokens: 256,
            temperature: 0.0,
        }
    }

    pub fn image(mut self, base64_jpeg: String) -> Self {
        self.image_base64 = Some(base64_jpeg);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Implemented by `OpenAiClient` for production; mock implementations used in tests.
pub trait CompletionService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AiError>;
}

/// Returns one vector per input, in input order.
pub trait EmbeddingService {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiError>;
}
