//! Term tree widget: the hierarchy dialog around one term.
//!
//! # Navigation
//! - `↑`/`k` and `↓`/`j` move the cursor up and down the visible rows.
//! - `→`/`l` expands the branch under the cursor; `←`/`h` collapses it.
//! - `Enter` on a parent row re-roots the tree there; on any other row it
//!   toggles expansion.
//! - `Space` picks or unpicks the term when selection is enabled.
//! - `i` opens the info box for the term under the cursor.

use crate::event::{AppEvent, Direction};
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, List, ListItem, ListState, StatefulWidget, Widget},
};
use vq_core::{
    AnchorRegistry, BranchNode, BranchRole, BranchState, NodeKey, SelectionMode, VocabularyTree,
};

/// Something the tree asks the app shell to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeAction {
    /// Open the info box for the term at `path`, anchored at `id`.
    ShowInfo { id: String, path: String },
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

pub struct TermTreeState {
    pub tree: VocabularyTree,
    /// Index into the visible (flattened) rows.
    pub cursor: usize,
}

impl TermTreeState {
    pub fn new(tree: VocabularyTree) -> Self {
        Self { tree, cursor: 0 }
    }

    fn cursor_node(&self) -> Option<&BranchNode> {
        self.tree.visible().into_iter().nth(self.cursor).map(|(_, n)| n)
    }

    fn cursor_key(&self) -> Option<NodeKey> {
        self.cursor_node().map(BranchNode::key)
    }

    pub fn handle(&mut self, event: &AppEvent) -> Option<TreeAction> {
        match event {
            AppEvent::Nav(Direction::Up) => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            AppEvent::Nav(Direction::Down) => {
                let max = self.tree.visible().len().saturating_sub(1);
                if self.cursor < max {
                    self.cursor += 1;
                }
            }
            AppEvent::Nav(Direction::Right) => {
                if let Some(key) = self.cursor_key() {
                    self.tree.expand(key);
                }
            }
            AppEvent::Nav(Direction::Left) => {
                if let Some(key) = self.cursor_key() {
                    self.tree.collapse(key);
                    self.clamp_cursor();
                }
            }
            AppEvent::Enter => {
                let (key, role) = self.cursor_node().map(|n| (n.key(), n.role()))?;
                match role {
                    BranchRole::Head => {
                        if self.tree.navigate(key).is_some() {
                            self.cursor = 0;
                        }
                    }
                    BranchRole::Child => {
                        self.tree.toggle(key);
                        self.clamp_cursor();
                    }
                }
            }
            AppEvent::Char(' ') => {
                if let Some(key) = self.cursor_key() {
                    self.tree.toggle_selection(key);
                }
            }
            AppEvent::Char('i') => {
                let node = self.cursor_node()?;
                return Some(TreeAction::ShowInfo {
                    id: node.id().to_string(),
                    path: node.path().to_string(),
                });
            }
            _ => {}
        }
        None
    }

    /// Keep the cursor on a real row after the tree shrank.
    pub fn clamp_cursor(&mut self) {
        let max = self.tree.visible().len().saturating_sub(1);
        if self.cursor > max {
            self.cursor = max;
        }
    }
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

pub struct TermTree<'a> {
    state: &'a TermTreeState,
    anchors: &'a mut AnchorRegistry<Rect>,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> TermTree<'a> {
    pub fn new(
        state: &'a TermTreeState,
        anchors: &'a mut AnchorRegistry<Rect>,
        focused: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            state,
            anchors,
            focused,
            theme,
        }
    }

    fn row(&self, depth: usize, node: &BranchNode) -> ListItem<'static> {
        let tree = &self.state.tree;
        let glyph = match (node.role(), node.state()) {
            (BranchRole::Head, _) => "↑ ",
            (_, BranchState::Loading) => "… ",
            (_, BranchState::Expanded) => "▼ ",
            (_, BranchState::Collapsed) if node.can_expand() => "▶ ",
            _ => "  ",
        };
        let mut spans = vec![Span::raw("  ".repeat(depth)), Span::raw(glyph)];

        let picked = tree.is_selected(node.key());
        let marker = match tree.selection_mode() {
            SelectionMode::Disabled => None,
            SelectionMode::Single => Some(if picked { "(•) " } else { "( ) " }),
            SelectionMode::Multiple => Some(if picked { "[x] " } else { "[ ] " }),
        };
        if let Some(marker) = marker {
            let style = if picked {
                self.theme.selection_marker
            } else {
                Style::default()
            };
            spans.push(Span::styled(marker, style));
        }

        let label_style = if node.is_focused() {
            self.theme.tree_current
        } else if node.role() == BranchRole::Head {
            self.theme.tree_head
        } else if node.state() == BranchState::Loading {
            self.theme.tree_loading
        } else {
            Style::default()
        };
        spans.push(Span::styled(node.label().to_string(), label_style));
        if let Some(failure) = node.failure() {
            spans.push(Span::styled(format!("  {failure}"), self.theme.tree_failure));
        }
        ListItem::new(Line::from(spans))
    }
}

impl Widget for TermTree<'_> {
    fn render(mut self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            self.theme.border_focused
        } else {
            self.theme.border_unfocused
        };
        let block = Block::bordered()
            .title(self.state.tree.vocabulary().title())
            .border_style(border_style);
        let inner = block.inner(area);
        block.render(area, buf);

        let visible = self.state.tree.visible();
        let items: Vec<ListItem> = visible.iter().map(|(d, n)| self.row(*d, n)).collect();

        let mut list_state = ListState::default().with_selected(Some(self.state.cursor));
        let list = List::new(items).highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        StatefulWidget::render(list, inner, buf, &mut list_state);

        let offset = list_state.offset();
        for (i, (_, node)) in visible.iter().enumerate().skip(offset) {
            let y = inner.y + (i - offset) as u16;
            if y >= inner.bottom() {
                break;
            }
            self.anchors
                .register(node.id(), Some(Rect { y, height: 1, ..inner }));
        }
    }
}
