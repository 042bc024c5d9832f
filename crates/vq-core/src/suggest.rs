//! Debounced suggest client.
//!
//! Turns raw input events into fan-out queries. Every keystroke bumps a
//! sequence number and (re)schedules a timer; when the timer fires, or when
//! the user presses Enter or focuses the input, the query runs on a spawned
//! task. Results come back as [`SuggestMessage`]s on the channel returned by
//! [`SuggestClient::new`] and are applied with [`SuggestClient::apply`].
//!
//! # Staleness
//!
//! A completed query is applied only if its sequence number is still the
//! latest one issued. Older responses are dropped on arrival; their network
//! calls are never aborted, just ignored.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::fanout::{FanOut, FanOutOutcome};
use crate::types::Suggestion;

pub const NO_RESULTS_TEXT: &str = "No results";
pub const UNAVAILABLE_TEXT: &str =
    "Cannot load answer suggestions for this question. Please inform your administrator.";

/// Delay between the last keystroke and the query.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Messages produced by the client's timer and query tasks.
#[derive(Debug)]
pub enum SuggestMessage {
    DebounceElapsed { seq: u64, text: String },
    Completed { seq: u64, outcome: FanOutOutcome },
}

/// One row of the suggestion list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionRow {
    Term(Suggestion),
    /// Disabled placeholder shown when every source came back empty.
    NoResults,
}

impl SuggestionRow {
    pub fn label(&self) -> &str {
        match self {
            SuggestionRow::Term(s) => &s.name,
            SuggestionRow::NoResults => NO_RESULTS_TEXT,
        }
    }
}

/// Everything the suggestion panel renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestState {
    pub rows: Vec<SuggestionRow>,
    pub visible: bool,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct SuggestClient {
    fan_out: Arc<FanOut>,
    sources: Vec<String>,
    debounce: Duration,
    /// Sequence number of the most recently initiated request.
    latest: u64,
    timer: Option<JoinHandle<()>>,
    in_flight: usize,
    tx: mpsc::UnboundedSender<SuggestMessage>,
    state: SuggestState,
}

impl SuggestClient {
    /// Create a client querying `sources` (in configuration order) through
    /// `fan_out`. The receiver yields the messages to feed back into
    /// [`apply`](Self::apply).
    pub fn new(
        fan_out: FanOut,
        sources: Vec<String>,
        debounce: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SuggestMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = Self {
            fan_out: Arc::new(fan_out),
            sources,
            debounce,
            latest: 0,
            timer: None,
            in_flight: 0,
            tx,
            state: SuggestState::default(),
        };
        (client, rx)
    }

    pub fn state(&self) -> &SuggestState {
        &self.state
    }

    pub fn latest_sequence(&self) -> u64 {
        self.latest
    }

    /// No timer pending and no query outstanding.
    pub fn is_idle(&self) -> bool {
        self.timer.is_none() && self.in_flight == 0
    }

    /// The input text changed: clear shown suggestions and schedule a query
    /// after the debounce delay, replacing any pending one.
    ///
    /// Blank input schedules nothing and closes the panel.
    pub fn on_input_changed(&mut self, text: &str) {
        if text.trim().is_empty() {
            tracing::debug!("suggest: blank input");
            self.close();
            return;
        }
        self.cancel_timer();
        let seq = self.next_sequence();
        self.state.visible = true;
        self.state.rows.clear();
        self.state.error = None;

        let tx = self.tx.clone();
        let delay = self.debounce;
        let text = text.to_string();
        tracing::debug!(seq, delay_ms = delay.as_millis() as u64, "suggest: scheduled");
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(SuggestMessage::DebounceElapsed { seq, text });
        }));
    }

    /// Enter pressed: query now, skipping the debounce delay.
    pub fn on_enter(&mut self, text: &str) {
        self.query_now(text);
    }

    /// Input focused: query now, skipping the debounce delay.
    pub fn on_focus(&mut self, text: &str) {
        self.query_now(text);
    }

    /// Hide the panel and forget pending work (click-away). Responses still
    /// in flight will be discarded when they land.
    pub fn close(&mut self) {
        self.cancel_timer();
        self.next_sequence();
        self.state = SuggestState::default();
    }

    /// Pick the row at `index`. Returns the suggestion and hides the panel;
    /// the "No results" row is not selectable.
    pub fn select(&mut self, index: usize) -> Option<Suggestion> {
        let picked = match self.state.rows.get(index)? {
            SuggestionRow::Term(s) => s.clone(),
            SuggestionRow::NoResults => return None,
        };
        tracing::debug!(path = %picked.path, "suggest: selected");
        self.state.visible = false;
        Some(picked)
    }

    /// Apply a message from the timer or a query task.
    pub fn apply(&mut self, msg: SuggestMessage) {
        match msg {
            SuggestMessage::DebounceElapsed { seq, text } => {
                if seq != self.latest {
                    tracing::debug!(seq, latest = self.latest, "suggest: stale timer ignored");
                    return;
                }
                self.timer = None;
                self.query(seq, &text);
            }
            SuggestMessage::Completed { seq, outcome } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                if seq != self.latest {
                    tracing::debug!(seq, latest = self.latest, "suggest: stale response dropped");
                    return;
                }
                self.show(outcome);
            }
        }
    }

    /// Receive and apply messages until no timer or query is outstanding.
    pub async fn settle(&mut self, rx: &mut mpsc::UnboundedReceiver<SuggestMessage>) {
        while !self.is_idle() {
            match rx.recv().await {
                Some(msg) => self.apply(msg),
                None => break,
            }
        }
    }

    fn query_now(&mut self, text: &str) {
        self.cancel_timer();
        let seq = self.next_sequence();
        self.state.visible = true;
        self.state.error = None;
        self.query(seq, text);
    }

    fn query(&mut self, seq: u64, text: &str) {
        if text.trim().is_empty() {
            self.state.loading = false;
            return;
        }
        self.state.loading = true;
        self.in_flight += 1;

        let fan_out = Arc::clone(&self.fan_out);
        let queue = self.sources.clone();
        let tx = self.tx.clone();
        let text = text.to_string();
        tracing::debug!(seq, sources = queue.len(), "suggest: query issued");
        tokio::spawn(async move {
            let outcome = fan_out.run(queue, &text).await;
            let _ = tx.send(SuggestMessage::Completed { seq, outcome });
        });
    }

    fn show(&mut self, outcome: FanOutOutcome) {
        self.state.loading = false;
        if outcome.is_unavailable() {
            self.state.rows.clear();
            self.state.error = Some(UNAVAILABLE_TEXT.to_string());
            return;
        }
        self.state.rows = if outcome.rows.is_empty() {
            vec![SuggestionRow::NoResults]
        } else {
            outcome.rows.into_iter().map(SuggestionRow::Term).collect()
        };
        self.state.visible = true;
    }

    fn next_sequence(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for SuggestClient {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
