//! The search form's state machine.
//!
//! A [`SearchSession`] moves `Idle -> Loading -> Success | Failed` for each
//! submitted number and publishes every transition on a watch channel so a
//! front end can render progress without polling.

use crate::{LookupResult, PhoneLookup};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Loading,
    Success(LookupResult),
    /// Carries the user-facing message, not the raw error.
    Failed(String),
}

impl SearchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SearchState::Loading)
    }
}

pub struct SearchSession {
    lookup: PhoneLookup,
    tx: watch::Sender<SearchState>,
}

impl SearchSession {
    pub fn new(lookup: PhoneLookup) -> Self {
        let (tx, _) = watch::channel(SearchState::Idle);
        Self { lookup, tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.tx.subscribe()
    }

    pub fn state(&self) -> SearchState {
        self.tx.borrow().clone()
    }

    /// Run one lookup for `raw` and return the state it settled in.
    ///
    /// Blank input leaves the state untouched and never reaches the adapter.
    pub async fn submit(&mut self, raw: &str) -> SearchState {
        let phone_number = raw.trim();
        if phone_number.is_empty() {
            tracing::debug!(target: "lookup", "session.ignored_blank");
            return self.state();
        }

        self.tx.send_replace(SearchState::Loading);
        let next = match self.lookup.perform_lookup(phone_number).await {
            Ok(result) => SearchState::Success(result),
            Err(e) => SearchState::Failed(e.user_message()),
        };
        self.tx.send_replace(next.clone());
        next
    }

    /// Back to `Idle`, dropping the last result.
    pub fn reset(&mut self) {
        self.tx.send_replace(SearchState::Idle);
    }
}
