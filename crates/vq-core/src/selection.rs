//! Term selection made from inside the hierarchy dialog.
//!
//! The tracker keeps the answer list being edited plus a separate list of
//! terms that were part of the *initial* answers and have since been
//! deselected, so the caller can diff additions against removals when the
//! dialog closes.

/// How terms may be picked from the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Browsing only; branches carry no checkbox or radio.
    Disabled,
    /// Radio buttons: picking a term replaces the previous pick.
    Single,
    /// Checkboxes.
    Multiple,
}

impl SelectionMode {
    /// Derive the mode from a question's settings. `max_answers == Some(1)`
    /// gives radios, any other count gives checkboxes, and no count at all
    /// disables selection.
    pub fn for_question(allow_term_selection: bool, max_answers: Option<u32>) -> Self {
        match (allow_term_selection, max_answers) {
            (false, _) | (true, None) => SelectionMode::Disabled,
            (true, Some(1)) => SelectionMode::Single,
            (true, Some(_)) => SelectionMode::Multiple,
        }
    }

    pub fn is_enabled(self) -> bool {
        self != SelectionMode::Disabled
    }
}

/// A selected answer: display label plus term path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedTerm {
    pub label: String,
    pub path: String,
}

impl SelectedTerm {
    pub fn new(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }
}

/// What the caller gets back when the dialog closes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionDiff {
    pub selected: Vec<SelectedTerm>,
    /// Initially-selected terms the user deselected.
    pub removed: Vec<SelectedTerm>,
}

#[derive(Debug, Clone)]
pub struct SelectionTracker {
    mode: SelectionMode,
    initial: Vec<SelectedTerm>,
    selected: Vec<SelectedTerm>,
    removed: Vec<SelectedTerm>,
}

impl SelectionTracker {
    pub fn new(mode: SelectionMode, initial: Vec<SelectedTerm>) -> Self {
        Self {
            mode,
            selected: initial.clone(),
            initial,
            removed: Vec::new(),
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn selected(&self) -> &[SelectedTerm] {
        &self.selected
    }

    pub fn removed(&self) -> &[SelectedTerm] {
        &self.removed
    }

    pub fn is_selected(&self, path: &str) -> bool {
        self.selected.iter().any(|t| t.path == path)
    }

    /// Add a term. In single mode the previous pick is deselected first.
    pub fn select(&mut self, label: &str, path: &str) {
        if !self.mode.is_enabled() || self.is_selected(path) {
            return;
        }
        if self.mode == SelectionMode::Single {
            let previous: Vec<SelectedTerm> = self.selected.drain(..).collect();
            for term in previous {
                self.record_removal(term);
            }
        }
        tracing::debug!(path, "selection: add");
        self.selected.push(SelectedTerm::new(label, path));
        self.removed.retain(|t| t.path != path);
    }

    pub fn deselect(&mut self, label: &str, path: &str) {
        if !self.mode.is_enabled() {
            return;
        }
        let before = self.selected.len();
        self.selected.retain(|t| t.path != path);
        if self.selected.len() != before {
            tracing::debug!(path, "selection: remove");
        }
        self.record_removal(SelectedTerm::new(label, path));
    }

    pub fn toggle(&mut self, label: &str, path: &str) {
        if self.is_selected(path) {
            self.deselect(label, path);
        } else {
            self.select(label, path);
        }
    }

    /// Hand back the current answers and removals, resetting the removal
    /// list for the next time the dialog opens.
    pub fn close(&mut self) -> SelectionDiff {
        SelectionDiff {
            selected: self.selected.clone(),
            removed: std::mem::take(&mut self.removed),
        }
    }

    fn record_removal(&mut self, term: SelectedTerm) {
        let was_initial = self.initial.iter().any(|t| t.path == term.path);
        let already = self.removed.iter().any(|t| t.path == term.path);
        if was_initial && !already {
            self.removed.push(term);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(false, Some(3), SelectionMode::Disabled)]
    #[case(true, None, SelectionMode::Disabled)]
    #[case(true, Some(1), SelectionMode::Single)]
    #[case(true, Some(0), SelectionMode::Multiple)]
    #[case(true, Some(5), SelectionMode::Multiple)]
    fn mode_from_question(
        #[case] allow: bool,
        #[case] max: Option<u32>,
        #[case] expected: SelectionMode,
    ) {
        assert_eq!(SelectionMode::for_question(allow, max), expected);
    }

    #[test]
    fn deselecting_initial_term_records_removal() {
        let mut t = SelectionTracker::new(
            SelectionMode::Multiple,
            vec![SelectedTerm::new("Seizure", "/V/HP/HP0001250")],
        );
        t.select("Ataxia", "/V/HP/HP0001251");
        t.deselect("Seizure", "/V/HP/HP0001250");
        let diff = t.close();
        assert_eq!(diff.selected, vec![SelectedTerm::new("Ataxia", "/V/HP/HP0001251")]);
        assert_eq!(diff.removed, vec![SelectedTerm::new("Seizure", "/V/HP/HP0001250")]);
    }

    #[test]
    fn deselecting_new_term_is_not_a_removal() {
        let mut t = SelectionTracker::new(SelectionMode::Multiple, vec![]);
        t.select("Ataxia", "/V/HP/HP0001251");
        t.deselect("Ataxia", "/V/HP/HP0001251");
        assert!(t.selected().is_empty());
        assert!(t.removed().is_empty());
    }

    #[test]
    fn reselecting_clears_removal() {
        let mut t = SelectionTracker::new(
            SelectionMode::Multiple,
            vec![SelectedTerm::new("Seizure", "/V/HP/HP0001250")],
        );
        t.toggle("Seizure", "/V/HP/HP0001250");
        assert_eq!(t.removed().len(), 1);
        t.toggle("Seizure", "/V/HP/HP0001250");
        assert!(t.removed().is_empty());
        assert!(t.is_selected("/V/HP/HP0001250"));
    }

    #[test]
    fn single_mode_replaces_previous_pick() {
        let mut t = SelectionTracker::new(
            SelectionMode::Single,
            vec![SelectedTerm::new("Seizure", "/V/HP/HP0001250")],
        );
        t.select("Ataxia", "/V/HP/HP0001251");
        assert_eq!(t.selected(), &[SelectedTerm::new("Ataxia", "/V/HP/HP0001251")]);
        assert_eq!(t.removed(), &[SelectedTerm::new("Seizure", "/V/HP/HP0001250")]);
    }

    #[test]
    fn close_resets_removed_list() {
        let mut t = SelectionTracker::new(
            SelectionMode::Multiple,
            vec![SelectedTerm::new("Seizure", "/V/HP/HP0001250")],
        );
        t.deselect("Seizure", "/V/HP/HP0001250");
        assert_eq!(t.close().removed.len(), 1);
        assert!(t.close().removed.is_empty());
    }

    #[test]
    fn disabled_mode_ignores_changes() {
        let mut t = SelectionTracker::new(SelectionMode::Disabled, vec![]);
        t.select("Ataxia", "/V/HP/HP0001251");
        assert!(t.selected().is_empty());
    }
}
