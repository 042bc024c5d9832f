//! Colour theme for the vq TUI.
//!
//! Themes are defined as TOML files. Both built-in themes are embedded in the
//! binary via [`include_str!`] so the application works without any files on
//! disk. Select one by name with [`Theme::by_name`] at startup and pass the
//! result through the application as a shared reference.
//!
//! # Colour assignment for vocabularies
//!
//! Vocabulary acronyms are hashed to a stable index into the palette so a
//! vocabulary keeps its tag colour no matter which source answered first.

use config::{Config, File, FileFormat};
use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;

const DEFAULT_THEME_SRC: &str = include_str!("themes/default.toml");
const GRUVBOX_DARK_THEME_SRC: &str = include_str!("themes/gruvbox_dark.toml");

// ---------------------------------------------------------------------------
// Raw (serde) types, mirroring the TOML structure
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawStyle {
    fg: Option<String>,
    bg: Option<String>,
    #[serde(default)]
    bold: bool,
    #[serde(default)]
    dim: bool,
    #[serde(default)]
    italic: bool,
    #[serde(default)]
    underlined: bool,
}

impl RawStyle {
    fn into_style(self) -> Style {
        let mut style = Style::default();
        if let Some(c) = self.fg.as_deref().and_then(parse_color) {
            style = style.fg(c);
        }
        if let Some(c) = self.bg.as_deref().and_then(parse_color) {
            style = style.bg(c);
        }
        if self.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.dim {
            style = style.add_modifier(Modifier::DIM);
        }
        if self.italic {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.underlined {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        style
    }
}

#[derive(Debug, Deserialize)]
struct RawBorders {
    focused: RawStyle,
    unfocused: RawStyle,
}

#[derive(Debug, Deserialize)]
struct RawTree {
    head: RawStyle,
    current: RawStyle,
    loading: RawStyle,
    failure: RawStyle,
}

#[derive(Debug, Deserialize)]
struct RawSuggestions {
    disabled: RawStyle,
    error: RawStyle,
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    heading: RawStyle,
    vocabulary: RawStyle,
    link: RawStyle,
}

#[derive(Debug, Deserialize)]
struct RawSelection {
    marker: RawStyle,
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    notice: RawStyle,
}

#[derive(Debug, Deserialize)]
struct RawVocabularies {
    palette: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawTheme {
    borders: RawBorders,
    tree: RawTree,
    suggestions: RawSuggestions,
    info: RawInfo,
    selection: RawSelection,
    status: RawStatus,
    vocabularies: RawVocabularies,
}

// ---------------------------------------------------------------------------
// Public Theme type
// ---------------------------------------------------------------------------

/// Application colour theme. All styles are pre-resolved ratatui [`Style`]
/// values.
#[derive(Debug, Clone)]
pub struct Theme {
    pub border_focused: Style,
    pub border_unfocused: Style,

    /// Parent rows above the current term.
    pub tree_head: Style,
    /// The current term.
    pub tree_current: Style,
    pub tree_loading: Style,
    pub tree_failure: Style,

    /// The disabled "No results" row.
    pub suggestion_disabled: Style,
    pub suggestion_error: Style,

    pub info_heading: Style,
    /// Acronym badge in the info box header.
    pub info_vocabulary: Style,
    pub info_link: Style,

    pub selection_marker: Style,
    pub status_notice: Style,

    vocabulary_palette: Vec<Color>,
}

impl Theme {
    /// Load and parse the embedded default theme.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed.
    pub fn load_default() -> Self {
        Self::from_toml_str(DEFAULT_THEME_SRC).expect("embedded default theme must be valid TOML")
    }

    /// Load and parse the embedded Gruvbox Dark theme.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed.
    pub fn load_gruvbox_dark() -> Self {
        Self::from_toml_str(GRUVBOX_DARK_THEME_SRC)
            .expect("embedded gruvbox dark theme must be valid TOML")
    }

    /// Resolve the `[ui] theme` setting; unknown names fall back to the
    /// default theme.
    pub fn by_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "gruvbox" | "gruvbox_dark" | "gruvbox-dark" => Self::load_gruvbox_dark(),
            "default" => Self::load_default(),
            other => {
                tracing::warn!(theme = other, "unknown theme, using default");
                Self::load_default()
            }
        }
    }

    /// Parse a theme from a TOML string. Unknown keys are ignored.
    pub fn from_toml_str(src: &str) -> anyhow::Result<Self> {
        let raw: RawTheme = Config::builder()
            .add_source(File::from_str(src, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        Ok(Self {
            border_focused: raw.borders.focused.into_style(),
            border_unfocused: raw.borders.unfocused.into_style(),
            tree_head: raw.tree.head.into_style(),
            tree_current: raw.tree.current.into_style(),
            tree_loading: raw.tree.loading.into_style(),
            tree_failure: raw.tree.failure.into_style(),
            suggestion_disabled: raw.suggestions.disabled.into_style(),
            suggestion_error: raw.suggestions.error.into_style(),
            info_heading: raw.info.heading.into_style(),
            info_vocabulary: raw.info.vocabulary.into_style(),
            info_link: raw.info.link.into_style(),
            selection_marker: raw.selection.marker.into_style(),
            status_notice: raw.status.notice.into_style(),
            vocabulary_palette: raw
                .vocabularies
                .palette
                .iter()
                .filter_map(|s| parse_color(s))
                .collect(),
        })
    }

    /// Stable tag colour for a vocabulary acronym.
    pub fn vocabulary_style(&self, acronym: &str) -> Style {
        if self.vocabulary_palette.is_empty() {
            return Style::default();
        }
        let idx = stable_hash(acronym) % self.vocabulary_palette.len();
        Style::default().fg(self.vocabulary_palette[idx])
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// djb2-style hash, stable across Rust versions and process restarts.
fn stable_hash(s: &str) -> usize {
    s.bytes().fold(5381usize, |acc, b| {
        acc.wrapping_mul(31).wrapping_add(b as usize)
    })
}

/// Parse a colour name into a ratatui [`Color`].
///
/// Accepts:
/// - Named terminal colours (case-insensitive): `red`, `dark_gray`, etc.
/// - Hex RGB: `#rrggbb`
/// - 256-colour indexed: `indexed:N`
fn parse_color(s: &str) -> Option<Color> {
    match s.to_ascii_lowercase().as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "gray" | "grey" => Some(Color::Gray),
        "dark_gray" | "darkgray" | "dark_grey" | "darkgrey" => Some(Color::DarkGray),
        "light_red" => Some(Color::LightRed),
        "light_green" => Some(Color::LightGreen),
        "light_yellow" => Some(Color::LightYellow),
        "light_blue" => Some(Color::LightBlue),
        "light_magenta" => Some(Color::LightMagenta),
        "light_cyan" => Some(Color::LightCyan),
        "white" => Some(Color::White),
        s if s.starts_with('#') && s.len() == 7 => {
            let r = u8::from_str_radix(&s[1..3], 16).ok()?;
            let g = u8::from_str_radix(&s[3..5], 16).ok()?;
            let b = u8::from_str_radix(&s[5..7], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        s if s.starts_with("indexed:") => {
            let n: u8 = s["indexed:".len()..].parse().ok()?;
            Some(Color::Indexed(n))
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
