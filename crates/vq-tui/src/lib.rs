//! vq TUI — ratatui application shell.

pub mod app;
pub mod event;
pub mod theme;
pub mod widgets;

use std::sync::Arc;

pub use app::App;
use vq_client::RestSource;
use vq_core::config::Config;

/// Start the TUI against the REST API named in `config`, optionally opening
/// the hierarchy at `term` first.
pub async fn run(config: Config, term: Option<&str>) -> anyhow::Result<()> {
    let source = RestSource::from_config(&config.server)?;
    tracing::info!(base_url = %source.base_url(), sources = ?config.search.sources, "starting vq");
    let theme = theme::Theme::by_name(&config.ui.theme);
    App::new(config, theme, Arc::new(source))
        .with_initial_term(term)
        .run()
        .await
}
