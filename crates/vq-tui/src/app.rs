//! Top-level application state and the main event loop.
//!
//! [`App::run`] sets up the terminal, drives a `tokio::select!` loop over
//! terminal input and the result channels of the suggest client, the
//! hierarchy tree and the info box, and tears everything down cleanly on
//! exit or panic.

use crate::{
    event::{self, AppEvent, Direction},
    theme::Theme,
    widgets::{
        help::HelpPopup,
        info_box::{InfoBox, InfoBoxState, InfoMessage},
        search_bar::{SearchBar, SearchBarState},
        suggestion_list::{SuggestionList, SuggestionListState},
        term_tree::{TermTree, TermTreeState, TreeAction},
    },
};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction as LayoutDir, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::{collections::HashMap, io, sync::Arc};
use tokio::sync::mpsc;
use vq_core::{
    config::Config, types::vocabulary_path_of, AnchorRegistry, FanOut, SelectedTerm,
    SelectionDiff, SelectionMode, SelectionTracker, SharedSource, SuggestClient,
    SuggestMessage, SuggestionRow, TermInfoResolver, TreeMessage, TreeOptions, Vocabulary,
    VocabularyTree,
};

// ---------------------------------------------------------------------------
// Focus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    Suggestions,
    /// The hierarchy dialog.
    Tree,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub focus: Focus,
    pub theme: Theme,
    pub config: Config,
    pub show_help: bool,
    pub quit: bool,
    pub search: SearchBarState,
    pub suggest: SuggestClient,
    pub suggestions: SuggestionListState,
    /// Answers picked so far, from suggestions or the hierarchy.
    pub answers: SelectionTracker,
    /// Answers the last closed hierarchy dialog deselected.
    pub removed_answers: Vec<SelectedTerm>,
    pub tree: Option<TermTreeState>,
    pub info: InfoBoxState,
    /// Screen position of every row that can open an info box, by term id.
    pub anchors: AnchorRegistry<Rect>,
    /// Last error reported by a lookup, shown in the status line.
    pub notice: Option<String>,
    source: SharedSource,
    resolver: TermInfoResolver,
    /// Vocabularies by repository path; clones share their roots cache.
    vocabularies: HashMap<String, Vocabulary>,
    info_tx: mpsc::UnboundedSender<InfoMessage>,
    notice_tx: mpsc::UnboundedSender<String>,
    /// Receiver of a tree opened during the last event, waiting to be
    /// picked up by the event loop.
    pending_tree_rx: Option<mpsc::UnboundedReceiver<TreeMessage>>,
}

/// Receivers the event loop selects over, next to [`AppState`].
pub struct Channels {
    pub suggest: mpsc::UnboundedReceiver<SuggestMessage>,
    pub tree: Option<mpsc::UnboundedReceiver<TreeMessage>>,
    pub info: mpsc::UnboundedReceiver<InfoMessage>,
    pub notice: mpsc::UnboundedReceiver<String>,
}

impl AppState {
    pub fn new(config: Config, theme: Theme, source: SharedSource) -> (Self, Channels) {
        let fan_out = FanOut::new(Arc::clone(&source))
            .with_filters(config.search.filters.clone())
            .with_max_results(config.search.max_results);
        let (suggest, suggest_rx) = SuggestClient::new(
            fan_out,
            config.search.sources.clone(),
            config.search.debounce(),
        );
        let (info_tx, info_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let answer_mode = SelectionMode::for_question(true, Some(config.browse.max_answers));

        let state = Self {
            focus: Focus::Search,
            theme,
            show_help: false,
            quit: false,
            search: SearchBarState::default(),
            suggest,
            suggestions: SuggestionListState::default(),
            answers: SelectionTracker::new(answer_mode, Vec::new()),
            removed_answers: Vec::new(),
            tree: None,
            info: InfoBoxState::default(),
            anchors: AnchorRegistry::new(),
            notice: None,
            resolver: TermInfoResolver::new(Arc::clone(&source)),
            source,
            vocabularies: HashMap::new(),
            info_tx,
            notice_tx,
            pending_tree_rx: None,
            config,
        };
        let channels = Channels {
            suggest: suggest_rx,
            tree: None,
            info: info_rx,
            notice: notice_rx,
        };
        (state, channels)
    }

    /// Receiver of the most recently opened tree, if one was opened since
    /// the last call.
    pub fn take_tree_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<TreeMessage>> {
        self.pending_tree_rx.take()
    }

    pub fn handle(&mut self, event: AppEvent) {
        // Help popup intercepts all events; only close keys pass through.
        if self.show_help {
            if matches!(event, AppEvent::Char('?') | AppEvent::Escape | AppEvent::Quit) {
                tracing::debug!("help popup closed");
                self.show_help = false;
            }
            return;
        }

        // So does an open info box.
        if self.info.is_open() {
            match event {
                AppEvent::Char('b') => self.learn_more(),
                AppEvent::Escape | AppEvent::Quit => {
                    tracing::debug!("info box closed");
                    self.info.close();
                }
                _ => {}
            }
            return;
        }

        if let AppEvent::Resize(_, _) = event {
            return;
        }

        match self.focus {
            Focus::Search => self.handle_search(event),
            Focus::Suggestions => self.handle_suggestions(event),
            Focus::Tree => self.handle_tree(event),
        }
    }

    fn handle_search(&mut self, event: AppEvent) {
        match event {
            AppEvent::Quit => self.quit = true,
            AppEvent::Enter => self.suggest.on_enter(&self.search.text),
            AppEvent::Nav(Direction::Down) | AppEvent::FocusNext => {
                tracing::debug!("focus: Search -> Suggestions");
                self.focus = Focus::Suggestions;
            }
            AppEvent::Escape => {
                self.dismiss_suggestions();
                self.focus = Focus::Suggestions;
            }
            other => {
                if self.search.handle(&other) {
                    self.suggestions.cursor = 0;
                    self.suggest.on_input_changed(&self.search.text);
                }
            }
        }
    }

    fn handle_suggestions(&mut self, event: AppEvent) {
        match event {
            AppEvent::Quit => self.quit = true,
            AppEvent::Char('?') => {
                tracing::debug!("help popup opened");
                self.show_help = true;
            }
            AppEvent::SearchFocus => self.focus_search(),
            AppEvent::FocusNext => {
                if self.tree.is_some() {
                    self.focus = Focus::Tree;
                } else {
                    self.focus_search();
                }
            }
            AppEvent::Escape => self.dismiss_suggestions(),
            AppEvent::Enter => self.pick(self.suggestions.cursor),
            AppEvent::Char('i') => {
                if let Some(SuggestionRow::Term(s)) = self.cursor_row().cloned() {
                    self.info.request(&self.resolver, &s.id, &s.path, &self.info_tx);
                }
            }
            AppEvent::Char('b') => {
                if let Some(SuggestionRow::Term(s)) = self.cursor_row().cloned() {
                    self.browse_term(&s.path);
                }
            }
            AppEvent::Char('r') => self.browse_roots(),
            other => {
                let rows = self.suggest.state().rows.len();
                self.suggestions.handle(&other, rows);
            }
        }
    }

    fn handle_tree(&mut self, event: AppEvent) {
        match event {
            AppEvent::Quit | AppEvent::Escape => {
                self.close_tree();
            }
            AppEvent::Char('?') => self.show_help = true,
            AppEvent::SearchFocus | AppEvent::FocusNext => self.focus_search(),
            other => {
                let Some(state) = self.tree.as_mut() else {
                    self.focus = Focus::Suggestions;
                    return;
                };
                if let Some(TreeAction::ShowInfo { id, path }) = state.handle(&other) {
                    self.info.request(&self.resolver, &id, &path, &self.info_tx);
                }
            }
        }
    }

    fn focus_search(&mut self) {
        tracing::debug!("focus -> Search");
        self.focus = Focus::Search;
        self.suggest.on_focus(&self.search.text);
    }

    /// Click-away: hide the panel and drop the typed text.
    fn dismiss_suggestions(&mut self) {
        self.suggest.close();
        self.search.clear();
        self.suggestions.cursor = 0;
    }

    fn cursor_row(&self) -> Option<&SuggestionRow> {
        self.suggest.state().rows.get(self.suggestions.cursor)
    }

    /// Take the suggestion at `index` as an answer.
    pub fn pick(&mut self, index: usize) {
        let Some(picked) = self.suggest.select(index) else {
            return;
        };
        self.answers.select(&picked.name, &picked.path);
        if self.config.search.clear_on_select {
            self.search.clear();
        } else {
            self.search.set_text(&picked.name);
        }
    }

    // -----------------------------------------------------------------------
    // Hierarchy dialog
    // -----------------------------------------------------------------------

    fn vocabulary_at(&mut self, vocab_path: &str, acronym: &str) -> Vocabulary {
        self.vocabularies
            .entry(vocab_path.to_string())
            .or_insert_with(|| Vocabulary::new(acronym, vocab_path))
            .clone()
    }

    /// Show the hierarchy around the term at `path`. An open dialog on the
    /// same vocabulary is re-rooted; one on another vocabulary is replaced.
    pub fn browse_term(&mut self, path: &str) {
        let vocab_path = vocabulary_path_of(path).unwrap_or_default().to_string();
        if let Some(state) = self.tree.as_mut() {
            if state.tree.vocabulary().path == vocab_path {
                state.tree.set_path(path);
                state.cursor = 0;
                self.focus = Focus::Tree;
                return;
            }
            tracing::debug!(from = %state.tree.vocabulary().path, to = %vocab_path, "hierarchy switches vocabulary");
            self.close_tree();
        }
        let acronym = vocab_path.rsplit('/').next().unwrap_or_default().to_string();
        let vocabulary = self.vocabulary_at(&vocab_path, &acronym);
        self.open_tree(vocabulary, path, false);
    }

    /// Open the hierarchy at the roots of the vocabulary under the cursor,
    /// or of the first configured source.
    pub fn browse_roots(&mut self) {
        let acronym = match self.cursor_row() {
            Some(SuggestionRow::Term(s)) => Some(s.vocabulary.clone()),
            _ => self.config.search.sources.first().cloned(),
        };
        let Some(acronym) = acronym else {
            self.notice = Some("No vocabulary configured".to_string());
            return;
        };
        let vocab_path = self.config.server.vocabulary_path(&acronym);
        let vocabulary = self.vocabulary_at(&vocab_path, &acronym);
        self.close_tree();
        self.open_tree(vocabulary, "", true);
    }

    fn learn_more(&mut self) {
        let Some(detail) = self.info.detail().cloned() else {
            return;
        };
        if let Some(vocabulary) = detail.vocabulary {
            self.vocabularies
                .entry(vocabulary.path.clone())
                .or_insert(vocabulary);
        }
        self.info.close();
        self.browse_term(&detail.term.path);
    }

    fn open_tree(&mut self, vocabulary: Vocabulary, path: &str, browse_roots: bool) {
        let options = TreeOptions {
            browse_roots,
            selection: self.config.browse.selection_mode(),
            initial_selection: self.answers.selected().to_vec(),
        };
        let (tree, rx) = VocabularyTree::new(Arc::clone(&self.source), vocabulary, options);
        let notices = self.notice_tx.clone();
        let mut tree = tree.with_error_sink(move |msg| {
            let _ = notices.send(msg.to_string());
        });
        tracing::debug!(path, browse_roots, "hierarchy opened");
        tree.set_path(path);
        self.tree = Some(TermTreeState::new(tree));
        self.pending_tree_rx = Some(rx);
        self.focus = Focus::Tree;
    }

    /// Close the dialog and fold its selection back into the answers.
    ///
    /// Returns the dialog's `(selected, removed)` diff when term selection
    /// is enabled. Removed terms are dropped from the answers and kept in
    /// [`removed_answers`](Self::removed_answers) until the next close.
    pub fn close_tree(&mut self) -> Option<SelectionDiff> {
        let mut state = self.tree.take()?;
        if self.focus == Focus::Tree {
            self.focus = Focus::Suggestions;
        }
        let diff = state.tree.close();
        if !state.tree.selection_mode().is_enabled() {
            tracing::debug!("hierarchy closed");
            return None;
        }
        tracing::debug!(
            selected = diff.selected.len(),
            removed = diff.removed.len(),
            "hierarchy closed"
        );
        self.answers = SelectionTracker::new(self.answers.mode(), diff.selected.clone());
        self.removed_answers = diff.removed.clone();
        Some(diff)
    }

    // -----------------------------------------------------------------------
    // Channel messages
    // -----------------------------------------------------------------------

    pub fn apply_suggest(&mut self, msg: SuggestMessage) {
        self.suggest.apply(msg);
        self.suggestions.clamp(self.suggest.state().rows.len());
    }

    pub fn apply_tree(&mut self, msg: TreeMessage) {
        if let Some(state) = self.tree.as_mut() {
            state.tree.apply(msg);
            state.clamp_cursor();
        }
    }

    pub fn apply_info(&mut self, msg: InfoMessage) {
        if let Some(error) = self.info.apply(msg) {
            self.notice = Some(error);
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    state: AppState,
    channels: Channels,
}

impl App {
    pub fn new(config: Config, theme: Theme, source: SharedSource) -> Self {
        let (state, channels) = AppState::new(config, theme, source);
        App { state, channels }
    }

    /// Open the hierarchy before the first frame: at `term` if given, else
    /// at the vocabulary roots when `[browse] roots` is set.
    pub fn with_initial_term(mut self, term: Option<&str>) -> Self {
        match term {
            Some(path) => self.state.browse_term(path),
            None if self.state.config.browse.roots => self.state.browse_roots(),
            None => {}
        }
        self.channels.tree = self.state.take_tree_receiver();
        self
    }

    /// Set up the terminal, run the event loop, and restore the terminal on exit.
    pub async fn run(mut self) -> anyhow::Result<()> {
        install_panic_hook();

        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal).await;

        // Always restore terminal, even if the loop returned an error
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let mut events = EventStream::new();
        loop {
            terminal.draw(|frame| draw(frame, &mut self.state))?;

            if self.state.quit {
                break;
            }

            tokio::select! {
                maybe = events.next() => match maybe {
                    Some(Ok(raw)) => self.on_terminal_event(raw),
                    Some(Err(err)) => return Err(err.into()),
                    None => break,
                },
                Some(msg) = self.channels.suggest.recv() => self.state.apply_suggest(msg),
                Some(msg) = recv_tree(&mut self.channels.tree) => self.state.apply_tree(msg),
                Some(msg) = self.channels.info.recv() => self.state.apply_info(msg),
                Some(notice) = self.channels.notice.recv() => {
                    tracing::debug!(%notice, "notice");
                    self.state.notice = Some(notice);
                }
            }

            if let Some(rx) = self.state.take_tree_receiver() {
                self.channels.tree = Some(rx);
            } else if self.state.tree.is_none() {
                self.channels.tree = None;
            }
        }
        Ok(())
    }

    fn on_terminal_event(&mut self, raw: Event) {
        if let Event::Key(key) = &raw {
            if key.kind != KeyEventKind::Press {
                return;
            }
        }
        let app_event = if self.state.focus == Focus::Search {
            event::to_app_event_insert(raw)
        } else {
            event::to_app_event(raw)
        };
        if let Some(ev) = app_event {
            tracing::debug!(focus = ?self.state.focus, event = ?ev, "key event");
            self.state.handle(ev);
        }
    }
}

async fn recv_tree(rx: &mut Option<mpsc::UnboundedReceiver<TreeMessage>>) -> Option<TreeMessage> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn draw(frame: &mut Frame, state: &mut AppState) {
    let area = frame.area();

    // Vertical: 3-line search bar | body | 1-line status
    let vert = Layout::default()
        .direction(LayoutDir::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .split(area);

    let body = if state.tree.is_some() {
        let pct = state.config.ui.tree_pane_width_pct.min(90);
        Layout::default()
            .direction(LayoutDir::Horizontal)
            .constraints([Constraint::Fill(1), Constraint::Percentage(pct)])
            .split(vert[1])
            .to_vec()
    } else {
        vec![vert[1]]
    };

    frame.render_widget(
        SearchBar::new(
            &state.search,
            state.answers.selected(),
            state.focus == Focus::Search,
            &state.theme,
        ),
        vert[0],
    );
    frame.render_widget(
        SuggestionList::new(
            state.suggest.state(),
            &state.suggestions,
            &mut state.anchors,
            state.focus == Focus::Suggestions,
            &state.theme,
        ),
        body[0],
    );
    if let (Some(tree), Some(pane)) = (&state.tree, body.get(1)) {
        frame.render_widget(
            TermTree::new(tree, &mut state.anchors, state.focus == Focus::Tree, &state.theme),
            *pane,
        );
    }

    let status = match &state.notice {
        Some(notice) => Line::from(Span::styled(notice.as_str(), state.theme.status_notice)),
        None => Line::from(" ? help · / search · r roots · q quit"),
    };
    frame.render_widget(Paragraph::new(status), vert[2]);

    let anchor = state.info.anchor().and_then(|id| state.anchors.get(id)).copied();
    frame.render_widget(InfoBox::new(&state.info, anchor, &state.theme), area);

    if state.show_help {
        frame.render_widget(HelpPopup::new(&state.theme), area);
    }

    if state.focus == Focus::Search && !state.show_help && !state.info.is_open() {
        let bar = SearchBar::new(&state.search, &[], true, &state.theme);
        frame.set_cursor_position(bar.cursor_position(vert[0]));
    }
}

// ---------------------------------------------------------------------------
// Terminal helpers
// ---------------------------------------------------------------------------

fn install_panic_hook() {
    let original = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original(info);
    }));
}
