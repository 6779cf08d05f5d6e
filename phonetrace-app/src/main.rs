use anyhow::Result;
use cli::{Cli, Commands, OutputFormat};
use command::Input;
use crossterm::tty::IsTty;
use phonetrace_common::observability::init_logging;
use phonetrace_config::{PhonetraceConfig, PhonetraceConfigLoader, default_config_path};
use phonetrace_lookup::PhoneLookup;
use phonetrace_lookup::session::{SearchSession, SearchState};
use render::Painter;
use std::io::Write;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};

mod cli;
mod command;
mod render;
mod styles;
mod ticker;

const APP_NAME: &str = "phonetrace";

fn load_config(cli: &Cli) -> Result<PhonetraceConfig> {
    let mut loader = PhonetraceConfigLoader::new();
    match &cli.config {
        Some(path) => loader = loader.with_file(path),
        None => {
            if let Some(path) = default_config_path() {
                loader = loader.with_optional_file(path);
            }
            loader = loader.with_optional_file("phonetrace.yaml");
        }
    }
    let mut config = loader.load()?;
    cli.apply_overrides(&mut config);
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse_args();

    // 1) Config: defaults < files < env < flags
    let config = load_config(&cli)?;

    // 2) Logging from the `logging` section
    let log_path = init_logging(config.logging.to_log_config(APP_NAME))?;
    tracing::info!(
        log = %log_path.display(),
        model = %config.llm.model,
        max_sources = ?config.lookup.source_cap(),
        "phonetrace.start"
    );

    let painter = Painter::new(std::io::stdout().is_tty());
    let err_painter = Painter::new(std::io::stderr().is_tty());

    match cli.command() {
        Commands::Check => run_check(&config, painter, err_painter).await,
        Commands::Lookup { number } => match build_lookup(&config, err_painter) {
            Some(lookup) => run_once(lookup, &number, cli.format, painter, err_painter).await,
            None => Ok(ExitCode::FAILURE),
        },
        Commands::Interactive => match build_lookup(&config, err_painter) {
            Some(lookup) => run_interactive(lookup, cli.format, painter, err_painter).await,
            None => Ok(ExitCode::FAILURE),
        },
    }
}

/// A missing key is reported to the user here, before any request.
fn build_lookup(config: &PhonetraceConfig, err_painter: Painter) -> Option<PhoneLookup> {
    match PhoneLookup::from_config(config) {
        Ok(lookup) => Some(lookup),
        Err(e) => {
            tracing::error!(error = %e, "phonetrace.not_configured");
            eprintln!("{}", render::render_error(&e.user_message(), err_painter));
            None
        }
    }
}

fn print_state(
    state: &SearchState,
    format: OutputFormat,
    painter: Painter,
    err_painter: Painter,
) -> Result<bool> {
    match state {
        SearchState::Success(result) => {
            match format {
                OutputFormat::Text => print!("{}", render::render_card(result, painter)),
                OutputFormat::Json => println!("{}", render::render_json(result)?),
            }
            Ok(true)
        }
        SearchState::Failed(message) => {
            eprintln!("{}", render::render_error(message, err_painter));
            Ok(false)
        }
        SearchState::Idle | SearchState::Loading => Ok(false),
    }
}

/// Submit with the loading ticker running on a terminal stderr.
async fn submit(session: &mut SearchSession, number: &str) -> SearchState {
    let ticker = std::io::stderr()
        .is_tty()
        .then(|| ticker::spawn_loading_ticker(session.subscribe()));
    let state = session.submit(number).await;
    if let Some(ticker) = ticker {
        if state == SearchState::Idle {
            ticker.abort();
        } else if let Err(e) = ticker.await {
            tracing::debug!(error = %e, "ticker.join_failed");
        }
    }
    state
}

async fn run_once(
    lookup: PhoneLookup,
    number: &str,
    format: OutputFormat,
    painter: Painter,
    err_painter: Painter,
) -> Result<ExitCode> {
    let mut session = SearchSession::new(lookup);
    let state = submit(&mut session, number).await;
    if state == SearchState::Idle {
        let message = render::render_error("Enter a phone number to look up.", err_painter);
        eprintln!("{message}");
        return Ok(ExitCode::FAILURE);
    }
    let ok = print_state(&state, format, painter, err_painter)?;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn run_interactive(
    lookup: PhoneLookup,
    format: OutputFormat,
    painter: Painter,
    err_painter: Painter,
) -> Result<ExitCode> {
    let mut session = SearchSession::new(lookup);
    let prompt_user = std::io::stdin().is_tty();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if prompt_user {
        println!("{}", command::HELP);
    }
    loop {
        if prompt_user {
            print!("number> ");
            std::io::stdout().flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match command::parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Help => println!("{}", command::HELP),
            Input::Lookup(number) => {
                let state = submit(&mut session, &number).await;
                print_state(&state, format, painter, err_painter)?;
                if format == OutputFormat::Text {
                    println!();
                }
            }
        }
    }
    tracing::info!("phonetrace.exit");
    Ok(ExitCode::SUCCESS)
}

async fn run_check(
    config: &PhonetraceConfig,
    painter: Painter,
    err_painter: Painter,
) -> Result<ExitCode> {
    let client = match phonetrace_llm::ensure_llm_ready(&config.llm) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{}", render::render_error(&e.user_message(), err_painter));
            return Ok(ExitCode::FAILURE);
        }
    };
    match client.health_check().await {
        Ok(true) => {
            println!(
                "{} {}",
                painter.paint(styles::available(), "ok"),
                client.model_name()
            );
            Ok(ExitCode::SUCCESS)
        }
        Ok(false) => {
            let message = format!("model {} is not available", client.model_name());
            eprintln!("{}", render::render_error(&message, err_painter));
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            eprintln!("{}", render::render_error(&e.user_message(), err_painter));
            Ok(ExitCode::FAILURE)
        }
    }
}
