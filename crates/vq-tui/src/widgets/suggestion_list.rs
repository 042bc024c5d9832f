//! Suggestion list widget: the dropdown of search results under the bar.
//!
//! Each rendered row registers its area in the anchor registry under the
//! term id so the info box can open next to it.

use crate::event::{AppEvent, Direction};
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, List, ListItem, ListState, Paragraph, StatefulWidget, Widget, Wrap},
};
use vq_core::{AnchorRegistry, SuggestState, SuggestionRow};

#[derive(Debug, Default)]
pub struct SuggestionListState {
    pub cursor: usize,
}

impl SuggestionListState {
    pub fn handle(&mut self, event: &AppEvent, rows: usize) {
        match event {
            AppEvent::Nav(Direction::Up) => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            AppEvent::Nav(Direction::Down) => {
                if self.cursor + 1 < rows {
                    self.cursor += 1;
                }
            }
            _ => {}
        }
    }

    pub fn clamp(&mut self, rows: usize) {
        self.cursor = self.cursor.min(rows.saturating_sub(1));
    }
}

pub struct SuggestionList<'a> {
    suggest: &'a SuggestState,
    list: &'a SuggestionListState,
    anchors: &'a mut AnchorRegistry<Rect>,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> SuggestionList<'a> {
    pub fn new(
        suggest: &'a SuggestState,
        list: &'a SuggestionListState,
        anchors: &'a mut AnchorRegistry<Rect>,
        focused: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            suggest,
            list,
            anchors,
            focused,
            theme,
        }
    }
}

impl Widget for SuggestionList<'_> {
    fn render(mut self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            self.theme.border_focused
        } else {
            self.theme.border_unfocused
        };
        let title = if self.suggest.loading {
            "Suggestions (loading…)"
        } else {
            "Suggestions"
        };
        let block = Block::bordered().title(title).border_style(border_style);
        let inner = block.inner(area);
        block.render(area, buf);

        if let Some(error) = &self.suggest.error {
            Paragraph::new(Line::from(Span::styled(error.as_str(), self.theme.suggestion_error)))
                .wrap(Wrap { trim: true })
                .render(inner, buf);
            return;
        }
        if !self.suggest.visible {
            return;
        }

        let items: Vec<ListItem> = self
            .suggest
            .rows
            .iter()
            .map(|row| match row {
                SuggestionRow::Term(s) => ListItem::new(Line::from(vec![
                    Span::raw(s.name.as_str()),
                    Span::raw("  "),
                    Span::styled(format!("[{}]", s.vocabulary), self.theme.vocabulary_style(&s.vocabulary)),
                    Span::styled("  ⓘ", Style::default().add_modifier(Modifier::DIM)),
                ])),
                SuggestionRow::NoResults => ListItem::new(Line::from(Span::styled(
                    row.label(),
                    self.theme.suggestion_disabled,
                ))),
            })
            .collect();

        let mut list_state = ListState::default().with_selected(Some(self.list.cursor));
        let list = List::new(items).highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        StatefulWidget::render(list, inner, buf, &mut list_state);

        // Rows past the viewport are scrolled; anchor the ones on screen.
        let offset = list_state.offset();
        for (i, row) in self.suggest.rows.iter().enumerate().skip(offset) {
            let y = inner.y + (i - offset) as u16;
            if y >= inner.bottom() {
                break;
            }
            if let SuggestionRow::Term(s) = row {
                self.anchors
                    .register(&s.id, Some(Rect { y, height: 1, ..inner }));
            }
        }
    }
}
