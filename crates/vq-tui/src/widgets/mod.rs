//! Ratatui widgets for the vq TUI.

pub mod help;
pub mod info_box;
pub mod search_bar;
pub mod suggestion_list;
pub mod term_tree;
