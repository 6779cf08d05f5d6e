//! Loader for phonetrace configuration with YAML + environment overlays.
//!
//! Precedence, lowest first: built-in defaults, YAML files added through the
//! loader, then `PHONETRACE__SECTION__KEY` environment variables. String
//! values have `${VAR}` placeholders expanded after merging. The Gemini key
//! finally falls back to the `API_KEY` environment variable when the merged
//! configuration does not carry a usable one.
//!
//! ```yaml
//! version: "1"
//! llm:
//!   provider: gemini
//!   api_key: "${API_KEY}"
//!   model: gemini-3-flash-preview
//! lookup:
//!   max_sources: 5   # ~ or 0 keeps every source
//! logging:
//!   format: json
//! ```
use config::{Config, ConfigError, Environment, File};
use phonetrace_common::observability::{LogConfig, LogFormat};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Environment variable consulted when no key is configured.
pub const API_KEY_ENV: &str = "API_KEY";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_SOURCES: usize = 5;
pub const DEFAULT_SOURCE_TITLE: &str = "Public Record Source";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhonetraceConfig {
    pub version: Option<String>,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub lookup: LookupSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Gemini,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    #[serde(default)]
    pub provider: LlmProvider,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            api_key: None,
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmSettings {
    /// The configured key, unless it is blank or an unexpanded `${VAR}`.
    ///
    /// ```
    /// use phonetrace_config::LlmSettings;
    ///
    /// let mut s = LlmSettings::default();
    /// s.api_key = Some("${API_KEY}".into());
    /// assert_eq!(s.resolved_api_key(), None);
    /// s.api_key = Some("  AIza-123 ".into());
    /// assert_eq!(s.resolved_api_key(), Some("AIza-123"));
    /// ```
    pub fn resolved_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && !k.starts_with('$'))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LookupSettings {
    /// How many grounding sources to keep; `null` or `0` keeps all of them.
    #[serde(default = "default_max_sources")]
    pub max_sources: Option<usize>,
    #[serde(default = "default_source_title")]
    pub fallback_source_title: String,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            max_sources: default_max_sources(),
            fallback_source_title: default_source_title(),
        }
    }
}

impl LookupSettings {
    pub fn source_cap(&self) -> Option<usize> {
        self.max_sources.filter(|&n| n > 0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub stderr: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: default_filter(),
            dir: None,
            stderr: false,
        }
    }
}

impl LoggingSettings {
    pub fn to_log_config(&self, app_name: &'static str) -> LogConfig {
        LogConfig {
            app_name,
            log_dir: self.dir.clone(),
            emit_stderr: self.stderr,
            format: self.format,
            default_filter: self.filter.clone(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_GEMINI_MODEL.into()
}
fn default_endpoint() -> String {
    DEFAULT_GEMINI_ENDPOINT.into()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_max_sources() -> Option<usize> {
    Some(DEFAULT_MAX_SOURCES)
}
fn default_source_title() -> String {
    DEFAULT_SOURCE_TITLE.into()
}
fn default_filter() -> String {
    "info".into()
}

/// `$XDG_CONFIG_HOME/phonetrace/phonetrace.yaml` or the platform equivalent.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("phonetrace").join("phonetrace.yaml"))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct PhonetraceConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for PhonetraceConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PhonetraceConfigLoader {
    /// Start with defaults only; `PHONETRACE__` env overrides are always applied last.
    ///
    /// ```
    /// use phonetrace_config::PhonetraceConfigLoader;
    ///
    /// let config = PhonetraceConfigLoader::new()
    ///     .with_yaml_str("version: '1'\nlookup:\n  max_sources: 3")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.lookup.source_cap(), Some(3));
    /// assert_eq!(config.llm.model, "gemini-3-flash-preview");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; the format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is merged only when present.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// ```
    /// use phonetrace_config::PhonetraceConfigLoader;
    ///
    /// unsafe { std::env::set_var("PT_DOC_KEY", "injected-from-env"); }
    ///
    /// let config = PhonetraceConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// llm:
    ///   provider: gemini
    ///   api_key: "${PT_DOC_KEY}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.llm.resolved_api_key(), Some("injected-from-env"));
    ///
    /// unsafe { std::env::remove_var("PT_DOC_KEY"); }
    /// ```
    pub fn load(self) -> Result<PhonetraceConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("PHONETRACE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        // an empty source set deserializes to null
        if v.is_null() {
            v = Value::Object(Default::default());
        }

        let mut typed: PhonetraceConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        if typed.llm.resolved_api_key().is_none() {
            typed.llm.api_key = std::env::var(API_KEY_ENV).ok();
        }

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("CITY", Some("Dhaka")), ("REGION", Some("BD"))], || {
            let mut v = json!([
                "hello-$CITY",
                { "loc": "${CITY}-${REGION}" },
                42,
                true,
                null
            ]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Dhaka", { "loc": "Dhaka-BD" }, 42, true, null])
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!("X=${FOO}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST_PHONETRACE}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST_PHONETRACE}"));
    }

    #[test]
    fn zero_sources_means_unbounded() {
        let lookup = LookupSettings {
            max_sources: Some(0),
            ..LookupSettings::default()
        };
        assert_eq!(lookup.source_cap(), None);
        let unset = LookupSettings {
            max_sources: None,
            ..LookupSettings::default()
        };
        assert_eq!(unset.source_cap(), None);
        assert_eq!(LookupSettings::default().source_cap(), Some(5));
    }

    #[test]
    fn blank_keys_do_not_resolve() {
        let settings = LlmSettings {
            api_key: Some("   ".into()),
            ..LlmSettings::default()
        };
        assert_eq!(settings.resolved_api_key(), None);
    }
}
