#![allow(unused)]
//! TUI shell integration harness.
//!
//! # What this covers
//!
//! - **Search flow**: typed characters reach the suggest client, the
//!   debounced rows render in the suggestion pane, and Enter on a row adds
//!   it to the answers.
//! - **Hierarchy dialog**: `b` on a suggestion opens the tree around that
//!   term; the rendered outline matches the fetched hierarchy.
//! - **Error surfacing**: a failed initial term lookup lands in the status
//!   line through the notice channel.
//! - **Info box**: `i` in the tree resolves the card for the term under the
//!   cursor; "Learn more" (`b`) on a card from the suggestion list opens the
//!   tree rooted at exactly that term and closes the card.
//! - **Dialog lifecycle**: browsing a term from another vocabulary replaces
//!   the open dialog; closing hands back the deselected answers.
//!
//! Rendering goes through ratatui's `TestBackend`; nothing touches a real
//! terminal.
//!
//! # Running
//!
//! ```sh
//! cargo test --test tui_harness
//! ```

mod common;
use common::*;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use ratatui::{backend::TestBackend, Terminal};
use vq::core::config::Config;
use vq::core::LookupError;
use vq::tui::app::{draw, AppState, Channels, Focus};
use vq::tui::event::{AppEvent, Direction};
use vq::tui::theme::Theme;

fn app_over(source: &Arc<ScriptedSource>) -> (AppState, Channels) {
    let mut config = Config::defaults();
    config.search.sources = vec!["HP".to_string()];
    AppState::new(config, Theme::load_default(), as_shared(source))
}

fn type_text(state: &mut AppState, text: &str) {
    for c in text.chars() {
        state.handle(AppEvent::Char(c));
    }
}

fn render(state: &mut AppState) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
    terminal.draw(|frame| draw(frame, state)).unwrap();
    let buffer = terminal.backend().buffer();
    let area = buffer.area;
    (area.top()..area.bottom())
        .map(|y| {
            (area.left()..area.right())
                .map(|x| buffer[(x, y)].symbol())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn seizure_source() -> Arc<ScriptedSource> {
    hp_source()
        .suggest("HP", vec![suggestion("HP", "HP:0001250", "Seizure")])
        .shared()
}

/// Type a query and wait for the suggestion rows.
async fn search(state: &mut AppState, channels: &mut Channels, text: &str) {
    type_text(state, text);
    state.suggest.settle(&mut channels.suggest).await;
}

/// Open the tree for the suggestion under the cursor and wait for it.
async fn browse_first_row(state: &mut AppState) {
    state.handle(AppEvent::FocusNext);
    state.handle(AppEvent::Char('b'));
    let mut rx = state.take_tree_receiver().expect("tree opened");
    state.tree.as_mut().unwrap().tree.settle(&mut rx).await;
}

#[tokio::test(start_paused = true)]
async fn typed_query_renders_suggestions() {
    let source = seizure_source();
    let (mut state, mut channels) = app_over(&source);

    search(&mut state, &mut channels, "seiz").await;
    let screen = render(&mut state);

    assert_eq!(source.suggest_queries()[0].text, "seiz");
    assert!(screen.contains("Seizure"), "{screen}");
}

#[tokio::test(start_paused = true)]
async fn enter_on_a_suggestion_adds_an_answer() {
    let source = seizure_source();
    let (mut state, mut channels) = app_over(&source);
    search(&mut state, &mut channels, "seiz").await;

    state.handle(AppEvent::Nav(Direction::Down));
    assert_eq!(state.focus, Focus::Suggestions);
    state.handle(AppEvent::Enter);

    assert!(state.answers.is_selected(&seizure().path));
    assert_eq!(state.search.text, "");
}

#[tokio::test(start_paused = true)]
async fn browse_opens_tree_around_the_suggestion() {
    let source = seizure_source();
    let (mut state, mut channels) = app_over(&source);
    search(&mut state, &mut channels, "seiz").await;

    browse_first_row(&mut state).await;
    assert_eq!(state.focus, Focus::Tree);

    let tree = &state.tree.as_ref().unwrap().tree;
    let outline = tree
        .visible()
        .into_iter()
        .map(|(depth, node)| format!("{}{}", "  ".repeat(depth), node.label()))
        .collect::<Vec<_>>()
        .join("\n");
    insta::assert_snapshot!(outline, @r"
    Abnormality of the nervous system
      Seizure
        Focal-onset seizure
        Generalized-onset seizure
    ");

    let screen = render(&mut state);
    assert!(screen.contains("Focal-onset seizure"), "{screen}");
}

#[tokio::test(start_paused = true)]
async fn failed_term_lookup_reaches_the_status_line() {
    let source = ScriptedSource::new()
        .suggest("HP", vec![suggestion("HP", "HP:9999999", "Missing")])
        .fail_term(&term_path("HP", "HP:9999999"), LookupError::Status(404))
        .shared();
    let (mut state, mut channels) = app_over(&source);
    search(&mut state, &mut channels, "miss").await;

    browse_first_row(&mut state).await;
    state.notice = channels.notice.try_recv().ok();

    assert_eq!(
        state.notice.as_deref(),
        Some("Error: initial term lookup failed with code 404")
    );
    let screen = render(&mut state);
    assert!(screen.contains("initial term lookup failed"), "{screen}");
}

#[tokio::test(start_paused = true)]
async fn info_key_in_tree_resolves_the_card() {
    let source = seizure_source();
    let (mut state, mut channels) = app_over(&source);
    search(&mut state, &mut channels, "seiz").await;
    browse_first_row(&mut state).await;

    // Cursor starts on the parent row; move to the current term.
    state.handle(AppEvent::Nav(Direction::Down));
    state.handle(AppEvent::Char('i'));
    assert!(state.info.is_open());

    let msg = channels.info.recv().await.unwrap();
    state.apply_info(msg);

    let detail = state.info.detail().expect("card resolved");
    assert_eq!(detail.term.id, "HP:0001250");
    assert_eq!(
        detail.vocabulary.as_ref().map(|v| v.acronym.as_str()),
        Some("HP")
    );
    let screen = render(&mut state);
    assert!(screen.contains("Human Phenotype Ontology"), "{screen}");
}

#[tokio::test(start_paused = true)]
async fn escape_closes_the_tree() {
    let source = seizure_source();
    let (mut state, mut channels) = app_over(&source);
    search(&mut state, &mut channels, "seiz").await;
    browse_first_row(&mut state).await;

    state.handle(AppEvent::Escape);

    assert!(state.tree.is_none());
    assert_eq!(state.focus, Focus::Suggestions);
}

#[tokio::test(start_paused = true)]
async fn learn_more_roots_the_tree_at_the_suggested_term() {
    let source = seizure_source();
    let (mut state, mut channels) = app_over(&source);
    search(&mut state, &mut channels, "seiz").await;
    let picked = match &state.suggest.state().rows[0] {
        vq::core::SuggestionRow::Term(s) => s.clone(),
        other => panic!("expected a term row, got {other:?}"),
    };

    state.handle(AppEvent::FocusNext);
    state.handle(AppEvent::Char('i'));
    let msg = channels.info.recv().await.unwrap();
    state.apply_info(msg);
    assert!(state.info.detail().is_some());

    state.handle(AppEvent::Char('b'));
    assert!(!state.info.is_open());
    let mut rx = state.take_tree_receiver().expect("tree opened");
    state.tree.as_mut().unwrap().tree.settle(&mut rx).await;

    let tree = &state.tree.as_ref().unwrap().tree;
    assert_eq!(tree.current().unwrap().path(), picked.path);
    assert_eq!(tree.vocabulary().acronym, "HP");
    assert_eq!(state.focus, Focus::Tree);
}

#[tokio::test(start_paused = true)]
async fn browsing_another_vocabulary_replaces_the_dialog() {
    let source = hp_source()
        .suggest("HP", vec![suggestion("HP", "HP:0001250", "Seizure")])
        .term(marfan_syndrome())
        .shared();
    let (mut state, mut channels) = app_over(&source);
    search(&mut state, &mut channels, "seiz").await;
    browse_first_row(&mut state).await;
    assert_eq!(state.tree.as_ref().unwrap().tree.vocabulary().path, HP_PATH);

    state.browse_term(&marfan_syndrome().path);
    let mut rx = state.take_tree_receiver().expect("new tree opened");
    state.tree.as_mut().unwrap().tree.settle(&mut rx).await;

    let tree = &state.tree.as_ref().unwrap().tree;
    assert_eq!(tree.vocabulary().path, ORDO_PATH);
    assert_eq!(tree.vocabulary().acronym, "ORDO");
    assert_eq!(tree.current().unwrap().label(), "Marfan syndrome");
}

#[tokio::test(start_paused = true)]
async fn closing_the_dialog_reports_deselected_answers() {
    let source = seizure_source();
    let mut config = Config::defaults();
    config.search.sources = vec!["HP".to_string()];
    config.browse.allow_term_selection = true;
    config.browse.max_answers = 0;
    let (mut state, mut channels) =
        AppState::new(config, Theme::load_default(), as_shared(&source));

    search(&mut state, &mut channels, "seiz").await;
    state.handle(AppEvent::FocusNext);
    state.handle(AppEvent::Enter);
    assert!(state.answers.is_selected(&seizure().path));

    state.handle(AppEvent::SearchFocus);
    search(&mut state, &mut channels, "seiz").await;
    browse_first_row(&mut state).await;
    // Cursor starts on the parent row; move to the current term and untick it.
    state.handle(AppEvent::Nav(Direction::Down));
    state.handle(AppEvent::Char(' '));

    let diff = state.close_tree().expect("selection enabled");

    assert!(diff.selected.is_empty());
    assert_eq!(diff.removed.len(), 1);
    assert_eq!(diff.removed[0].path, seizure().path);
    assert!(!state.answers.is_selected(&seizure().path));
    assert_eq!(state.removed_answers, diff.removed);
}
