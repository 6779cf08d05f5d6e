//! Phone number lookups delegated to a search-grounded LLM.
//!
//! [`PhoneLookup::perform_lookup`] is the whole adapter: it embeds the number
//! in a fixed prompt, asks the model for JSON matching
//! [`prompt::lookup_response_schema`] with web search grounding enabled,
//! validates what comes back, and attaches the grounding citations as
//! [`Source`]s. Nothing is cached and nothing is retried.
//!
//! [`session::SearchSession`] wraps the adapter in the idle, loading, and
//! success-or-error flow a front end drives.
//!
//! ```no_run
//! use phonetrace_config::PhonetraceConfigLoader;
//! use phonetrace_lookup::PhoneLookup;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PhonetraceConfigLoader::new().load()?;
//! let lookup = PhoneLookup::from_config(&config)?;
//! let result = lookup.perform_lookup("+8801712345678").await?;
//! println!("{} ({})", result.name, result.carrier);
//! # Ok(()) }
//! ```
pub mod parse;
pub mod prompt;
pub mod session;
pub mod sources;
pub mod types;

pub use types::{ChannelPresence, Confidence, LookupResult, SocialPresence, Source};

use phonetrace_common::{PhonetraceError, Result};
use phonetrace_config::{
    LookupSettings, PhonetraceConfig, DEFAULT_MAX_SOURCES, DEFAULT_SOURCE_TITLE,
};
use phonetrace_llm::traits::{GenerateRequest, LlmClient};
use std::sync::Arc;
use std::time::Instant;

/// What to do with grounding citations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupPolicy {
    /// Keep at most this many sources; `None` keeps all.
    pub max_sources: Option<usize>,
    /// Title used for citations that arrive without one.
    pub fallback_source_title: String,
}

impl Default for LookupPolicy {
    fn default() -> Self {
        Self {
            max_sources: Some(DEFAULT_MAX_SOURCES),
            fallback_source_title: DEFAULT_SOURCE_TITLE.to_string(),
        }
    }
}

impl From<&LookupSettings> for LookupPolicy {
    fn from(settings: &LookupSettings) -> Self {
        Self {
            max_sources: settings.source_cap(),
            fallback_source_title: settings.fallback_source_title.clone(),
        }
    }
}

pub struct PhoneLookup {
    llm: Arc<dyn LlmClient + Send + Sync>,
    policy: LookupPolicy,
}

impl PhoneLookup {
    pub fn new(llm: Arc<dyn LlmClient + Send + Sync>, policy: LookupPolicy) -> Self {
        Self { llm, policy }
    }

    /// Build the adapter from loaded configuration.
    ///
    /// A missing credential fails here, before any client exists.
    pub fn from_config(config: &PhonetraceConfig) -> Result<Self> {
        let llm = phonetrace_llm::ensure_llm_ready(&config.llm)?;
        Ok(Self::new(llm, LookupPolicy::from(&config.lookup)))
    }

    pub fn policy(&self) -> &LookupPolicy {
        &self.policy
    }

    /// Ask the model about `phone_number` and return the validated result.
    ///
    /// The returned `phone_number` is the trimmed input, never the model's
    /// echo of it.
    pub async fn perform_lookup(&self, phone_number: &str) -> Result<LookupResult> {
        let phone_number = phone_number.trim();
        if phone_number.is_empty() {
            return Err(PhonetraceError::InvalidInput(
                "Enter a phone number to look up.".to_string(),
            ));
        }

        let request = GenerateRequest::new(prompt::build_lookup_prompt(phone_number))
            .with_system_prompt(prompt::INVESTIGATOR_SYSTEM_PROMPT)
            .with_response_schema(prompt::lookup_response_schema())
            .with_search_grounding();

        tracing::info!(
            target: "lookup",
            phone_number,
            model = self.llm.model_name(),
            "lookup.start"
        );
        let started = Instant::now();

        let outcome = self.run(phone_number, &request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(result) => tracing::info!(
                target: "lookup",
                phone_number,
                elapsed_ms,
                confidence = %result.confidence,
                sources = result.sources.len(),
                "lookup.success"
            ),
            Err(e) => tracing::warn!(
                target: "lookup",
                phone_number,
                elapsed_ms,
                error = %e,
                "lookup.failed"
            ),
        }
        outcome
    }

    async fn run(&self, phone_number: &str, request: &GenerateRequest) -> Result<LookupResult> {
        let response = self.llm.generate(request).await?;
        tracing::debug!(
            target: "lookup",
            search_queries = ?response.search_queries,
            citations = response.citations.len(),
            "lookup.grounding"
        );

        let payload = parse::parse_lookup_payload(&response.text)?;
        let sources = sources::collect_sources(
            &response.citations,
            &self.policy.fallback_source_title,
            self.policy.max_sources,
        );

        Ok(LookupResult {
            phone_number: phone_number.to_string(),
            name: payload.name,
            admin_name: payload.admin_name,
            city: payload.city,
            location: payload.location,
            carrier: payload.carrier,
            line_type: payload.line_type,
            summary: payload.summary,
            confidence: payload.confidence,
            social_presence: payload.social_presence,
            sources,
        })
    }
}

/// One-shot lookup straight from configuration.
pub async fn perform_lookup(config: &PhonetraceConfig, phone_number: &str) -> Result<LookupResult> {
    PhoneLookup::from_config(config)?
        .perform_lookup(phone_number)
        .await
}
