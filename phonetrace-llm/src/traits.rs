use async_trait::async_trait;
use phonetrace_common::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One generation call, provider-agnostic.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    /// When set, the provider is asked for JSON output matching this schema.
    pub response_schema: Option<JsonValue>,
    /// Let the model ground its answer with a web search tool.
    pub search_grounding: bool,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_response_schema(mut self, schema: JsonValue) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_search_grounding(mut self) -> Self {
        self.search_grounding = true;
        self
    }
}

/// A web citation surfaced by search grounding. Both fields are whatever the
/// provider sent; nothing here is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub uri: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
    pub finish_reason: Option<String>,
    /// Grounding citations in the order the provider listed them.
    pub citations: Vec<Citation>,
    /// Search queries the model issued while grounding.
    pub search_queries: Vec<String>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run a single generation request.
    async fn generate(&self, request: &GenerateRequest) -> Result<LlmResponse>;

    /// Check if the LLM service is available
    async fn health_check(&self) -> Result<bool>;

    /// Get the model name being used
    fn model_name(&self) -> &str;
}
