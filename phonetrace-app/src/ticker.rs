use crate::styles;
use crossterm::{
    cursor, queue,
    style::PrintStyledContent,
    terminal::{Clear, ClearType},
};
use phonetrace_lookup::session::SearchState;
use std::io::{self, Write};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const LOADING_MESSAGES: [&str; 5] = [
    "Syncing with Global Directories...",
    "Identifying City & Town...",
    "Extracting Truecaller Identity...",
    "Fetching Carrier Records...",
    "Checking WhatsApp & Telegram...",
];

pub const TICK: Duration = Duration::from_millis(1500);

pub fn loading_message(tick: usize) -> &'static str {
    LOADING_MESSAGES[tick % LOADING_MESSAGES.len()]
}

fn draw(line: Option<&str>) -> io::Result<()> {
    let mut err = io::stderr();
    queue!(err, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    if let Some(line) = line {
        queue!(err, PrintStyledContent(styles::ticker().apply(line)))?;
    }
    err.flush()
}

/// Rotate status lines on stderr through one loading phase.
///
/// Subscribe before submitting: the task waits for the first state change,
/// draws while that state is `Loading`, and clears its line before it ends.
/// The task returns without drawing when the lookup already settled.
pub fn spawn_loading_ticker(mut rx: watch::Receiver<SearchState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if rx.changed().await.is_err() || !rx.borrow_and_update().is_loading() {
            return;
        }

        let mut interval = tokio::time::interval(TICK);
        let mut tick = 0usize;
        loop {
            tokio::select! {
                biased;
                changed = rx.changed() => {
                    if changed.is_err() || !rx.borrow_and_update().is_loading() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    if let Err(e) = draw(Some(loading_message(tick))) {
                        tracing::debug!(error = %e, "ticker.draw_failed");
                    }
                    tick += 1;
                }
            }
        }
        if let Err(e) = draw(None) {
            tracing::debug!(error = %e, "ticker.clear_failed");
        }
    })
}
