//! Provider‑agnostic LLM integration for phonetrace.
//!
//! This crate exposes a common [`traits::LlmClient`] interface and the Gemini
//! implementation used for search-grounded structured generation. It also
//! provides a convenience function to initialize a client from
//! [`phonetrace_config::LlmSettings`].
//!
//! # Examples
//! ```no_run
//! use phonetrace_common::Result;
//! use phonetrace_config::LlmSettings;
//! use phonetrace_llm::ensure_llm_ready;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let settings = LlmSettings {
//!     api_key: Some("AIza...".into()),
//!     ..LlmSettings::default()
//! };
//! let client = ensure_llm_ready(&settings)?;
//! assert!(!client.model_name().is_empty());
//! # Ok(())
//! # }
//! ```
pub mod gemini;
pub mod traits;

use gemini::GeminiClient;
use phonetrace_common::{PhonetraceError, Result};
use phonetrace_config::{LlmProvider, LlmSettings};
use std::sync::Arc;
use std::time::Duration;
use traits::LlmClient;

/// Default model used when the configuration does not name one.
pub const DEFAULT_GEMINI_MODEL: &str = phonetrace_config::DEFAULT_GEMINI_MODEL;

/// Build an LLM client from settings.
///
/// Fails with [`PhonetraceError::Config`] before any network activity when no
/// usable credential is configured.
pub fn ensure_llm_ready(
    settings: &LlmSettings,
) -> Result<Arc<dyn LlmClient + Send + Sync + 'static>> {
    let api_key = settings.resolved_api_key().ok_or_else(|| {
        PhonetraceError::Config(
            "API_KEY not found. Set the API_KEY environment variable or llm.api_key in phonetrace.yaml."
                .to_string(),
        )
    })?;

    match settings.provider {
        LlmProvider::Gemini => {
            let client = GeminiClient::new(api_key.to_string(), settings.model.clone())?
                .with_base_url(&settings.endpoint)?
                .with_timeout(Duration::from_secs(settings.timeout_secs));
            Ok(Arc::new(client))
        }
    }
}
