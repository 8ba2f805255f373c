pub mod error;
pub mod json;
pub mod openai;

/// One chat exchange: a system/user prompt pair plus the sampling contract
/// the call site needs.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    /// Ask the provider to emit a single JSON object.
    pub json_response: bool,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn json(system: impl Into<String>, user: impl Into<String>, temperature: f32) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature,
            json_response: true,
            max_tokens: None,
        }
    }

    pub fn text(
        system: impl Into<String>,
        user: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature,
            json_response: false,
            max_tokens: Some(max_tokens),
        }
    }
}

/// The seam between the analysis generators and the hosted model, so every
/// generator is testable against a stub.
#[async_trait::async_trait]
pub trait ChatClient: Send + Sync {
    /// Returns the assistant message content for one request.
    async fn chat(&self, request: ChatRequest) -> anyhow::Result<String>;
}
