//! Semantic application events: crossterm key events mapped to a
//! widget-agnostic vocabulary so widgets never touch crossterm directly.
//!
//! # Keybindings
//!
//! | Key(s)                  | Event              |
//! |-------------------------|--------------------|
//! | `q`, `Ctrl+c`           | `Quit`             |
//! | `Tab`                   | `FocusNext`        |
//! | `/`                     | `SearchFocus`      |
//! | `↑` / `k`               | `Nav(Up)`          |
//! | `↓` / `j`               | `Nav(Down)`        |
//! | `←` / `h`               | `Nav(Left)`        |
//! | `→` / `l`               | `Nav(Right)`       |
//! | printable char          | `Char(c)`          |
//! | `Backspace`             | `Backspace`        |
//! | `Enter`                 | `Enter`            |
//! | `Esc`                   | `Escape`           |
//! | terminal resize         | `Resize(w, h)`     |
//!
//! Letters with a widget-specific meaning (`i` for term info, `b` to browse,
//! `r` for roots, `Space` to pick) arrive as `Char` and are interpreted by
//! the focused widget.
//!
//! ## Insert mode
//!
//! While the search bar is focused the event loop calls
//! [`to_app_event_insert`] instead: every printable key types itself, and
//! only `Ctrl+c`, `Esc`, `Enter`, `Tab`, `Backspace` and the arrow keys keep
//! their special meaning.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Exit the application, or close the open dialog.
    Quit,
    /// Move keyboard focus to the next pane.
    FocusNext,
    /// Focus the search bar.
    SearchFocus,
    /// Move within a list or tree; Left/Right move the text cursor while
    /// typing.
    Nav(Direction),
    Char(char),
    Backspace,
    Enter,
    Resize(u16, u16),
    /// Dismiss the topmost overlay.
    Escape,
}

/// Map a raw crossterm [`Event`] in navigation mode.
///
/// Returns `None` for events with no meaning to the application (mouse
/// events, unbound keys).
pub fn to_app_event(event: Event) -> Option<AppEvent> {
    match event {
        Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
        Event::Key(key) => map_key(key),
        _ => None,
    }
}

/// Map a raw crossterm [`Event`] while a text input has focus.
pub fn to_app_event_insert(event: Event) -> Option<AppEvent> {
    match event {
        Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
        Event::Key(key) => map_key_insert(key),
        _ => None,
    }
}

fn map_key(key: KeyEvent) -> Option<AppEvent> {
    use KeyCode::*;
    use KeyModifiers as Mod;

    match key.code {
        Char('q') if key.modifiers == Mod::NONE => Some(AppEvent::Quit),
        Char('c') if key.modifiers == Mod::CONTROL => Some(AppEvent::Quit),

        Tab if key.modifiers == Mod::NONE => Some(AppEvent::FocusNext),
        Char('/') if key.modifiers == Mod::NONE => Some(AppEvent::SearchFocus),

        Up | Char('k') if key.modifiers == Mod::NONE => Some(AppEvent::Nav(Direction::Up)),
        Down | Char('j') if key.modifiers == Mod::NONE => Some(AppEvent::Nav(Direction::Down)),
        Left | Char('h') if key.modifiers == Mod::NONE => Some(AppEvent::Nav(Direction::Left)),
        Right | Char('l') if key.modifiers == Mod::NONE => {
            Some(AppEvent::Nav(Direction::Right))
        }

        Char(c) if key.modifiers == Mod::NONE || key.modifiers == Mod::SHIFT => {
            Some(AppEvent::Char(c))
        }

        Backspace if key.modifiers == Mod::NONE => Some(AppEvent::Backspace),
        Enter if key.modifiers == Mod::NONE => Some(AppEvent::Enter),
        Esc => Some(AppEvent::Escape),

        _ => None,
    }
}

fn map_key_insert(key: KeyEvent) -> Option<AppEvent> {
    use KeyCode::*;
    use KeyModifiers as Mod;

    match key.code {
        Char('c') if key.modifiers == Mod::CONTROL => Some(AppEvent::Quit),

        Up => Some(AppEvent::Nav(Direction::Up)),
        Down => Some(AppEvent::Nav(Direction::Down)),
        Left => Some(AppEvent::Nav(Direction::Left)),
        Right => Some(AppEvent::Nav(Direction::Right)),

        Tab if key.modifiers == Mod::NONE => Some(AppEvent::FocusNext),

        Char(c) if key.modifiers == Mod::NONE || key.modifiers == Mod::SHIFT => {
            Some(AppEvent::Char(c))
        }

        Backspace if key.modifiers == Mod::NONE => Some(AppEvent::Backspace),
        Enter if key.modifiers == Mod::NONE => Some(AppEvent::Enter),
        Esc => Some(AppEvent::Escape),

        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
