//! Configuration types for vq.
//!
//! [`Config::load`] reads `~/.config/vq/config.toml`, creating it with
//! hardcoded defaults if it does not yet exist. [`Config::defaults`] returns
//! the same defaults without touching the filesystem (useful in tests).

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::selection::SelectionMode;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[server]
base_url        = "http://localhost:8080"
vocabulary_base = "/Vocabularies/"
timeout_ms      = 10000

[search]
debounce_ms     = 500
max_results     = 10
clear_on_select = true
sources         = []

[search.filters]

[browse]
roots                = false
allow_term_selection = false
max_answers          = 0

[ui]
theme               = "default"
tree_pane_width_pct = 50
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level application configuration, loaded from `~/.config/vq/config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub browse: BrowseConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// `[server]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Repository path under which vocabularies live.
    #[serde(default = "default_vocabulary_base")]
    pub vocabulary_base: String,
    /// Upper bound on every REST request. There is no automatic retry.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String { "http://localhost:8080".to_string() }
fn default_vocabulary_base() -> String { "/Vocabularies/".to_string() }
fn default_timeout_ms() -> u64 { 10_000 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            vocabulary_base: default_vocabulary_base(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Repository path of the vocabulary with the given acronym.
    pub fn vocabulary_path(&self, acronym: &str) -> String {
        format!("{}/{}", self.vocabulary_base.trim_end_matches('/'), acronym)
    }
}

/// `[search]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_clear_on_select")]
    pub clear_on_select: bool,
    /// Vocabulary acronyms in configuration order. The last one is queried
    /// first.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Per-vocabulary category filters.
    #[serde(default)]
    pub filters: HashMap<String, Vec<String>>,
}

fn default_debounce_ms() -> u64 { 500 }
fn default_max_results() -> usize { 10 }
fn default_clear_on_select() -> bool { true }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            max_results: default_max_results(),
            clear_on_select: default_clear_on_select(),
            sources: Vec::new(),
            filters: HashMap::new(),
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// `[browse]` section of `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowseConfig {
    /// Start the hierarchy at the vocabulary roots instead of a term.
    #[serde(default)]
    pub roots: bool,
    #[serde(default)]
    pub allow_term_selection: bool,
    /// Maximum number of answers; 0 means unlimited.
    #[serde(default)]
    pub max_answers: u32,
}

impl BrowseConfig {
    pub fn selection_mode(&self) -> SelectionMode {
        SelectionMode::for_question(self.allow_term_selection, Some(self.max_answers))
    }
}

/// `[ui]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_tree_pane_width_pct")]
    pub tree_pane_width_pct: u16,
}

fn default_theme() -> String { "default".to_string() }
fn default_tree_pane_width_pct() -> u16 { 50 }

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            tree_pane_width_pct: default_tree_pane_width_pct(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load from `~/.config/vq/config.toml`, layered on top of the built-in
    /// defaults. Creates the file with defaults if it does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, DEFAULT_CONFIG.trim_start())?;
        }

        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path.as_path()).required(false))
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Parse a TOML document layered on top of the built-in defaults.
    pub fn from_toml_str(src: &str) -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from_str(src, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("vq")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
