use clap::{Parser, Subcommand, ValueEnum};
use phonetrace_config::PhonetraceConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "phonetrace")]
#[command(version, about = "Look up public information about a phone number", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "PHONETRACE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// Keep at most N sources
    #[arg(long, value_name = "N", global = true, conflicts_with = "all_sources")]
    pub max_sources: Option<usize>,

    /// Keep every grounding source
    #[arg(long, global = true)]
    pub all_sources: bool,

    /// Gemini model to use
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Look up a single number and exit
    Lookup {
        /// The phone number, ideally with country code
        number: String,
    },

    /// Read numbers from stdin one per line (default)
    Interactive,

    /// Check that the model service is reachable with the configured key
    Check,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Interactive)
    }

    /// Flags win over file and environment settings.
    pub fn apply_overrides(&self, config: &mut PhonetraceConfig) {
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if self.all_sources {
            config.lookup.max_sources = None;
        } else if let Some(n) = self.max_sources {
            config.lookup.max_sources = Some(n);
        }
    }
}
