//! Info box: a floating card with the detail of one term.
//!
//! The card opens next to the row it was requested from, looked up in the
//! anchor registry by term id. Resolution runs on a spawned task; a response
//! is shown only if it answers the most recent request.

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Widget, Wrap},
};
use tokio::sync::mpsc;
use vq_core::{BrowseError, TermDetail, TermInfoResolver};

const WIDTH: u16 = 56;
const HEIGHT: u16 = 16;

#[derive(Debug)]
pub struct InfoMessage {
    seq: u64,
    result: Result<TermDetail, BrowseError>,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InfoBoxState {
    seq: u64,
    /// Term id the box is anchored to.
    anchor: Option<String>,
    loading: bool,
    detail: Option<TermDetail>,
}

impl InfoBoxState {
    pub fn is_open(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn detail(&self) -> Option<&TermDetail> {
        self.detail.as_ref()
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    /// Resolve the term at `path` and open the box next to `anchor_id`.
    pub fn request(
        &mut self,
        resolver: &TermInfoResolver,
        anchor_id: &str,
        path: &str,
        tx: &mpsc::UnboundedSender<InfoMessage>,
    ) {
        self.seq += 1;
        self.anchor = Some(anchor_id.to_string());
        self.loading = true;
        self.detail = None;

        let seq = self.seq;
        let resolver = resolver.clone();
        let path = path.to_string();
        let tx = tx.clone();
        tracing::debug!(seq, %path, "info: requested");
        tokio::spawn(async move {
            let result = resolver.resolve(&path).await;
            let _ = tx.send(InfoMessage { seq, result });
        });
    }

    /// Apply a resolved card. Returns the user-facing error message when the
    /// current request failed.
    pub fn apply(&mut self, msg: InfoMessage) -> Option<String> {
        if msg.seq != self.seq || !self.is_open() {
            tracing::debug!(seq = msg.seq, latest = self.seq, "info: stale response dropped");
            return None;
        }
        self.loading = false;
        match msg.result {
            Ok(detail) => {
                self.detail = Some(detail);
                None
            }
            Err(err) => {
                self.anchor = None;
                Some(err.to_string())
            }
        }
    }

    pub fn close(&mut self) {
        self.anchor = None;
        self.detail = None;
        self.loading = false;
    }
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

pub struct InfoBox<'a> {
    state: &'a InfoBoxState,
    /// Where the requesting row was drawn.
    anchor: Option<Rect>,
    theme: &'a Theme,
}

impl<'a> InfoBox<'a> {
    pub fn new(state: &'a InfoBoxState, anchor: Option<Rect>, theme: &'a Theme) -> Self {
        Self {
            state,
            anchor,
            theme,
        }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let Some(detail) = self.state.detail() else {
            return vec![Line::from(Span::styled(
                "Loading…",
                Style::default().add_modifier(Modifier::DIM),
            ))];
        };
        let term = &detail.term;
        let mut lines = Vec::new();

        let mut header = Vec::new();
        if let Some(vocab) = &detail.vocabulary {
            header.push(Span::styled(format!(" {} ", vocab.acronym), self.theme.info_vocabulary));
            header.push(Span::raw(" "));
        }
        header.push(Span::styled(
            term.label.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        lines.push(Line::from(header));
        lines.push(Line::from(Span::styled(
            term.id.clone(),
            Style::default().add_modifier(Modifier::DIM),
        )));
        if let Some(description) = detail.vocabulary.as_ref().and_then(|v| v.description.clone()) {
            lines.push(Line::from(Span::styled(
                description,
                Style::default().add_modifier(Modifier::ITALIC),
            )));
        }
        lines.push(Line::default());

        if let Some(definition) = &term.definition {
            lines.push(Line::from(definition.clone()));
            lines.push(Line::default());
        }
        if !term.synonyms.is_empty() {
            lines.push(Line::from(Span::styled("Also known as", self.theme.info_heading)));
            lines.push(Line::from(term.synonyms.join(", ")));
        }
        let type_of = term.type_of();
        if !type_of.is_empty() {
            lines.push(Line::from(Span::styled("Is a type of", self.theme.info_heading)));
            lines.push(Line::from(type_of.join(", ")));
        }
        lines.push(Line::default());

        let mut footer = vec![Span::styled("b", self.theme.info_link), Span::raw(" learn more")];
        if let Some(url) = detail.vocabulary.as_ref().and_then(|v| v.url.clone()) {
            footer.push(Span::raw("  ·  "));
            footer.push(Span::styled(url, self.theme.info_link));
        }
        lines.push(Line::from(footer));
        lines
    }
}

impl Widget for InfoBox<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !self.state.is_open() {
            return;
        }
        let popup = place(self.anchor, area);
        Clear.render(popup, buf);
        let block = Block::bordered()
            .title(" Term info (Esc to close) ")
            .border_style(self.theme.border_focused);
        let inner = block.inner(popup);
        block.render(popup, buf);
        Paragraph::new(self.lines())
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }
}

/// Start the card halfway along the anchor row, sliding it left when it
/// would overflow. Without an anchor the card is centred. The card never
/// leaves `area`.
pub fn place(anchor: Option<Rect>, area: Rect) -> Rect {
    let width = WIDTH.min(area.width);
    let height = HEIGHT.min(area.height);
    let Some(anchor) = anchor else {
        return Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + (area.height - height) / 2,
            width,
            height,
        };
    };
    let label_end = anchor.x + anchor.width / 2;
    let x = if label_end + width <= area.right() {
        label_end
    } else {
        area.right().saturating_sub(width).max(area.x)
    };
    let y = anchor.y.min(area.bottom().saturating_sub(height)).max(area.y);
    Rect {
        x,
        y,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn card_sits_beside_anchor() {
        let area = Rect::new(0, 0, 120, 40);
        let anchor = Rect::new(2, 5, 40, 1);
        assert_eq!(place(Some(anchor), area), Rect::new(22, 5, WIDTH, HEIGHT));
    }

    #[test]
    fn card_is_kept_on_screen() {
        let area = Rect::new(0, 0, 80, 20);
        let anchor = Rect::new(40, 18, 40, 1);
        let card = place(Some(anchor), area);
        assert!(card.right() <= area.right());
        assert!(card.bottom() <= area.bottom());
    }

    #[test]
    fn card_without_anchor_is_centred() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(place(None, area), Rect::new(22, 12, WIDTH, HEIGHT));
    }
}
