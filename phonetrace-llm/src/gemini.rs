use crate::traits::{Citation, GenerateRequest, LlmClient, LlmResponse};
use async_trait::async_trait;
use phonetrace_common::{PhonetraceError, Result};
use phonetrace_http::{Auth, HttpClient, HttpError, RequestOpts};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::time::{Duration, Instant};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    response_mime_type: &'static str,
    response_schema: JsonValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
    model_version: Option<String>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
    grounding_metadata: Option<GeminiGroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GeminiGroundingChunk>,
    #[serde(default)]
    web_search_queries: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiGroundingChunk {
    web: Option<GeminiWebChunk>,
}

#[derive(Debug, Deserialize)]
struct GeminiWebChunk {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    total_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

/// Google Gemini `generateContent` client.
///
/// Requires a valid API key and internet access. The key travels as the `key`
/// query parameter and is redacted from every log line.
pub struct GeminiClient {
    http: HttpClient,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Create a new client using the provided API key and model.
    ///
    /// A blank key is rejected here so that no request is ever attempted
    /// without a credential.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(PhonetraceError::Config(
                "Gemini API key is missing. Set API_KEY or llm.api_key in the config file."
                    .to_string(),
            ));
        }
        let http = HttpClient::new(GEMINI_BASE_URL).map_err(map_http_error)?;

        Ok(Self {
            http,
            api_key: api_key.trim().to_string(),
            model,
        })
    }

    /// Point the client at a different API root (proxies, tests).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let timeout = self.http.default_timeout;
        self.http = HttpClient::new(base_url)
            .map_err(map_http_error)?
            .with_timeout(timeout);
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    fn key_opts(&self) -> RequestOpts<'_> {
        RequestOpts {
            auth: Some(Auth::Query {
                name: "key",
                value: Cow::Borrowed(self.api_key.as_str()),
            }),
            ..Default::default()
        }
    }

    fn build_request(request: &GenerateRequest) -> GeminiRequest {
        let generation_config = request
            .response_schema
            .as_ref()
            .map(|schema| GeminiGenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema.clone(),
            });

        let system_instruction = request
            .system_prompt
            .as_ref()
            .map(|sys_prompt| GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: sys_prompt.clone(),
                }],
            });

        let tools = if request.search_grounding {
            vec![GeminiTool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        };

        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart {
                    text: request.prompt.clone(),
                }],
            }],
            system_instruction,
            tools,
            generation_config,
        }
    }

    fn into_llm_response(&self, response: GeminiResponse) -> Result<LlmResponse> {
        let tokens_used = response
            .usage_metadata
            .as_ref()
            .and_then(|u| u.total_token_count);
        let model = response.model_version.or_else(|| Some(self.model.clone()));

        let Some(candidate) = response.candidates.into_iter().next() else {
            if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
                return Err(PhonetraceError::Service(format!(
                    "Prompt blocked by Gemini ({reason})"
                )));
            }
            return Err(PhonetraceError::Malformed(
                "No candidates returned from Gemini".to_string(),
            ));
        };

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(PhonetraceError::Service(
                "Content blocked by Gemini safety filters".to_string(),
            ));
        }

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter(|part| !part.thought)
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        let (citations, search_queries) = match candidate.grounding_metadata {
            Some(meta) => (
                meta.grounding_chunks
                    .into_iter()
                    .filter_map(|chunk| chunk.web)
                    .map(|web| Citation {
                        uri: web.uri,
                        title: web.title,
                    })
                    .collect(),
                meta.web_search_queries,
            ),
            None => (Vec::new(), Vec::new()),
        };

        Ok(LlmResponse {
            text,
            model,
            tokens_used,
            finish_reason: candidate.finish_reason,
            citations,
            search_queries,
        })
    }
}

fn map_http_error(err: HttpError) -> PhonetraceError {
    match err {
        HttpError::Api {
            status, message, ..
        } => PhonetraceError::Service(match status.as_u16() {
            429 => format!("Rate limit exceeded: {message}"),
            401 => format!("Invalid API key: {message}"),
            403 => format!("API access forbidden: {message}"),
            _ => format!("Gemini API error ({status}): {message}"),
        }),
        HttpError::Network(message) => {
            PhonetraceError::Service(format!("Gemini request failed: {message}"))
        }
        HttpError::Decode(message, _) => {
            PhonetraceError::Malformed(format!("Failed to parse Gemini response: {message}"))
        }
        HttpError::Url(message) => {
            PhonetraceError::Config(format!("Invalid Gemini endpoint: {message}"))
        }
        HttpError::Build(message) => {
            PhonetraceError::Service(format!("Failed to build Gemini request: {message}"))
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<LlmResponse> {
        let path = format!("models/{}:generateContent", self.model);
        let body = Self::build_request(request);

        tracing::debug!(
            model = %self.model,
            grounding = request.search_grounding,
            json_schema = request.response_schema.is_some(),
            "gemini.generate.start"
        );

        let started = Instant::now();
        let response: GeminiResponse = self
            .http
            .post_json_opts(&path, &body, self.key_opts())
            .await
            .map_err(map_http_error)?;

        let out = self.into_llm_response(response)?;
        tracing::debug!(
            model = %self.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            tokens_used = ?out.tokens_used,
            finish_reason = ?out.finish_reason,
            citations = out.citations.len(),
            search_queries = ?out.search_queries,
            "gemini.generate.done"
        );
        Ok(out)
    }

    /// Fetch the model's metadata; `false` when the model does not exist.
    async fn health_check(&self) -> Result<bool> {
        let path = format!("models/{}", self.model);
        let metadata = self
            .http
            .get_json::<JsonValue>(&path, self.key_opts())
            .await;

        match metadata {
            Ok(_) => Ok(true),
            Err(HttpError::Api { status, .. }) if status.as_u16() == 404 => {
                tracing::warn!(model = %self.model, "gemini.health.unknown_model");
                Ok(false)
            }
            Err(e) => {
                tracing::warn!(model = %self.model, error = %e, "gemini.health.failed");
                Err(map_http_error(e))
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_key_is_a_config_error() {
        let err = GeminiClient::new("   ".into(), "gemini-test".into())
            .err()
            .expect("blank key must fail");
        assert!(err.is_config());
    }

    #[test]
    fn grounded_schema_request_serializes_camel_case() {
        let req = GenerateRequest::new("find +8801712345678")
            .with_system_prompt("be terse")
            .with_response_schema(json!({ "type": "OBJECT" }))
            .with_search_grounding();
        let wire = serde_json::to_value(GeminiClient::build_request(&req)).unwrap();

        assert_eq!(wire["tools"], json!([{ "googleSearch": {} }]));
        assert_eq!(
            wire["generationConfig"]["responseMimeType"],
            json!("application/json")
        );
        assert_eq!(
            wire["generationConfig"]["responseSchema"],
            json!({ "type": "OBJECT" })
        );
        assert_eq!(wire["systemInstruction"]["parts"][0]["text"], json!("be terse"));
        assert_eq!(wire["contents"][0]["role"], json!("user"));
        assert_eq!(
            wire["generationConfig"]
                .as_object()
                .map(|config| config.len()),
            Some(2)
        );
        assert!(wire.get("safetySettings").is_none());
    }

    #[test]
    fn plain_request_has_no_tools_or_config() {
        let wire = serde_json::to_value(GeminiClient::build_request(&GenerateRequest::new("hi")))
            .unwrap();
        assert!(wire.get("tools").is_none());
        assert!(wire.get("generationConfig").is_none());
        assert!(wire.get("systemInstruction").is_none());
        assert!(wire.get("safetySettings").is_none());
    }

    #[test]
    fn thought_parts_are_skipped_and_text_is_joined() {
        let client = GeminiClient::new("k".into(), "gemini-test".into()).unwrap();
        let raw: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "thinking...", "thought": true },
                    { "text": "{\"a\":" },
                    { "text": "1}" }
                ]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        let out = client.into_llm_response(raw).unwrap();
        assert_eq!(out.text, "{\"a\":1}");
        assert!(out.citations.is_empty());
        assert_eq!(out.model.as_deref(), Some("gemini-test"));
    }

    #[test]
    fn prompt_block_without_candidates_is_a_service_error() {
        let client = GeminiClient::new("k".into(), "gemini-test".into()).unwrap();
        let raw: GeminiResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();
        let err = client.into_llm_response(raw).unwrap_err();
        assert!(matches!(err, PhonetraceError::Service(ref m) if m.contains("SAFETY")));
    }
}
