//! Lazy hierarchy tree.
//!
//! A [`VocabularyTree`] shows one term (the *current* node) below the list of
//! its parents, or the roots of a vocabulary when browsing from the top.
//! Each [`BranchNode`] fetches its own children only when first expanded.
//!
//! # Branch states
//!
//! ```text
//! Collapsed ──expand──► Loading ──response──► Expanded
//!     ▲                    │                     │
//!     └──────failure───────┘◄──────collapse──────┘
//! ```
//!
//! Expanding an already-loaded branch goes straight to `Expanded` without a
//! request. Expand requests while `Loading` are coalesced into the
//! outstanding fetch.
//!
//! # Responses
//!
//! Fetches run on spawned tasks and come back as [`TreeMessage`]s. A children
//! response is applied only if the node with that key still exists, still
//! shows the same term id, and is still loading. A term response is applied
//! only if no newer re-root was issued after it.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::{BrowseError, LookupError};
use crate::selection::{SelectedTerm, SelectionDiff, SelectionMode, SelectionTracker};
use crate::source::SharedSource;
use crate::types::{Term, TermSummary, Vocabulary};

/// Tree-unique handle for a branch; stays stable when the branch is
/// retargeted to a different term.
pub type NodeKey = u64;

/// Callback receiving user-facing error messages.
pub type ErrorSink = Box<dyn FnMut(&str) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchRole {
    /// An ancestor of the current term. Never expands; activating it
    /// re-roots the tree at that term.
    Head,
    /// An expandable branch: the current term, a descendant, or a root.
    Child,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchState {
    Collapsed,
    Loading,
    Expanded,
}

// ---------------------------------------------------------------------------
// Branch node
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BranchNode {
    key: NodeKey,
    id: String,
    path: String,
    label: String,
    role: BranchRole,
    focused: bool,
    state: BranchState,
    children_loaded: bool,
    has_children: Option<bool>,
    children: Vec<BranchNode>,
    failure: Option<String>,
}

impl BranchNode {
    fn new(key: NodeKey, summary: &TermSummary, role: BranchRole) -> Self {
        Self {
            key,
            id: summary.id.clone(),
            path: summary.path.clone(),
            label: summary.label.trim().to_string(),
            role,
            focused: false,
            state: BranchState::Collapsed,
            children_loaded: false,
            has_children: summary.has_children,
            children: Vec::new(),
            failure: None,
        }
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn role(&self) -> BranchRole {
        self.role
    }

    /// True for the current term, which is shown emphasised and cannot be
    /// navigated to again.
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn state(&self) -> BranchState {
        self.state
    }

    pub fn is_expanded(&self) -> bool {
        self.state == BranchState::Expanded
    }

    pub fn children_loaded(&self) -> bool {
        self.children_loaded
    }

    /// `None` until known.
    pub fn has_children(&self) -> Option<bool> {
        self.has_children
    }

    /// Materialised children; empty until [`children_loaded`](Self::children_loaded).
    pub fn children(&self) -> &[BranchNode] {
        &self.children
    }

    /// Message of the last failed children lookup, kept until the next
    /// expand attempt.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn can_expand(&self) -> bool {
        self.role == BranchRole::Child && self.has_children != Some(false)
    }

    /// Point this branch at a different term. When the id changes, loaded
    /// children are discarded and the branch collapses, so nothing fetched
    /// for the old term can be mistaken for the new one.
    pub fn retarget(&mut self, summary: &TermSummary) {
        if summary.id != self.id {
            tracing::debug!(key = self.key, from = %self.id, to = %summary.id, "tree: branch retargeted");
            self.children_loaded = false;
            self.children.clear();
            self.state = BranchState::Collapsed;
            self.failure = None;
        }
        self.id = summary.id.clone();
        self.path = summary.path.clone();
        self.label = summary.label.trim().to_string();
        self.has_children = summary.has_children;
    }

    fn find(&self, key: NodeKey) -> Option<&BranchNode> {
        if self.key == key {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(key))
    }

    fn find_mut(&mut self, key: NodeKey) -> Option<&mut BranchNode> {
        if self.key == key {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(key))
    }

    fn begin_loading(&mut self) {
        self.state = BranchState::Loading;
        self.failure = None;
    }

    fn finish_loading(&mut self, children: Vec<BranchNode>) {
        self.has_children = Some(!children.is_empty());
        self.children = children;
        self.children_loaded = true;
        self.state = BranchState::Expanded;
    }

    fn fail(&mut self, message: String) {
        self.state = BranchState::Collapsed;
        self.children_loaded = false;
        self.children.clear();
        self.failure = Some(message);
    }
}

fn flatten_into<'a>(node: &'a BranchNode, depth: usize, out: &mut Vec<(usize, &'a BranchNode)>) {
    out.push((depth, node));
    if node.is_expanded() {
        for child in &node.children {
            flatten_into(child, depth + 1, out);
        }
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// Messages produced by the tree's fetch tasks.
#[derive(Debug)]
pub enum TreeMessage {
    RootsLoaded {
        result: Result<Vec<TermSummary>, LookupError>,
    },
    TermLoaded {
        generation: u64,
        path: String,
        result: Result<Term, LookupError>,
    },
    ChildrenLoaded {
        key: NodeKey,
        id: String,
        result: Result<Vec<TermSummary>, LookupError>,
    },
}

#[derive(Debug, Clone)]
pub struct TreeOptions {
    /// Start from the vocabulary's roots rather than a term.
    pub browse_roots: bool,
    pub selection: SelectionMode,
    pub initial_selection: Vec<SelectedTerm>,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            browse_roots: false,
            selection: SelectionMode::Disabled,
            initial_selection: Vec::new(),
        }
    }
}

pub struct VocabularyTree {
    source: SharedSource,
    vocabulary: Vocabulary,
    browse_roots: bool,
    tx: mpsc::UnboundedSender<TreeMessage>,
    /// Path most recently requested by the embedding UI.
    path: String,
    /// Path the tree was last built (or is being built) for.
    last_known_path: String,
    /// Bumped on every re-root; term responses from older generations are
    /// dropped.
    generation: u64,
    next_key: NodeKey,
    parents: Option<Vec<BranchNode>>,
    current: Option<BranchNode>,
    selection: SelectionTracker,
    in_flight: usize,
    roots_pending: bool,
    on_error: ErrorSink,
}

impl VocabularyTree {
    pub fn new(
        source: SharedSource,
        vocabulary: Vocabulary,
        options: TreeOptions,
    ) -> (Self, mpsc::UnboundedReceiver<TreeMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let tree = Self {
            source,
            vocabulary,
            browse_roots: options.browse_roots,
            tx,
            path: String::new(),
            last_known_path: String::new(),
            generation: 0,
            next_key: 0,
            parents: None,
            current: None,
            selection: SelectionTracker::new(options.selection, options.initial_selection),
            in_flight: 0,
            roots_pending: false,
            on_error: Box::new(|msg| tracing::warn!("{msg}")),
        };
        (tree, rx)
    }

    /// Route user-facing error messages to `sink`.
    pub fn with_error_sink(mut self, sink: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_error = Box::new(sink);
        self
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Head branches above the current term, or the roots.
    pub fn parents(&self) -> &[BranchNode] {
        self.parents.as_deref().unwrap_or(&[])
    }

    pub fn current(&self) -> Option<&BranchNode> {
        self.current.as_ref()
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    /// No fetch outstanding.
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    pub fn node(&self, key: NodeKey) -> Option<&BranchNode> {
        self.parents
            .iter()
            .flatten()
            .chain(self.current.iter())
            .find_map(|n| n.find(key))
    }

    fn node_mut(&mut self, key: NodeKey) -> Option<&mut BranchNode> {
        if let Some(parents) = self.parents.as_mut() {
            for parent in parents.iter_mut() {
                if let Some(node) = parent.find_mut(key) {
                    return Some(node);
                }
            }
        }
        self.current.as_mut().and_then(|c| c.find_mut(key))
    }

    /// Flatten the tree into `(depth, &node)` rows, respecting expansion.
    /// The current term sits one level below its parents.
    pub fn visible(&self) -> Vec<(usize, &BranchNode)> {
        let mut out = Vec::new();
        let parents = self.parents();
        for parent in parents {
            flatten_into(parent, 0, &mut out);
        }
        if let Some(current) = &self.current {
            let depth = usize::from(!parents.is_empty());
            flatten_into(current, depth, &mut out);
        }
        out
    }

    // -----------------------------------------------------------------------
    // Re-rooting
    // -----------------------------------------------------------------------

    /// Show the term at `path`. Repeating the last path is a no-op; an empty
    /// path clears the tree.
    pub fn set_path(&mut self, path: &str) {
        self.path = path.to_string();
        if self.browse_roots && self.vocabulary.roots().is_none() {
            self.request_roots();
        } else {
            self.rebuild();
        }
    }

    /// Re-root at the term shown by branch `key`. Returns the new path, or
    /// `None` when the branch is already the current term.
    pub fn navigate(&mut self, key: NodeKey) -> Option<String> {
        let node = self.node(key)?;
        if node.focused {
            return None;
        }
        let path = node.path.clone();
        tracing::debug!(%path, "tree: navigate");
        self.set_path(&path);
        Some(path)
    }

    fn rebuild(&mut self) {
        if self.browse_roots && self.parents.is_none() {
            if let Some(roots) = self.vocabulary.roots() {
                let roots = roots.to_vec();
                self.plant_roots(&roots);
                return;
            }
        }

        if self.path == self.last_known_path {
            tracing::debug!(path = %self.path, "tree: re-root skipped, path unchanged");
            return;
        }

        if self.path.is_empty() {
            tracing::debug!("tree: cleared");
            self.generation += 1;
            self.parents = None;
            self.current = None;
            self.last_known_path.clear();
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        let path = self.path.clone();
        self.last_known_path = path.clone();
        self.in_flight += 1;

        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        tracing::debug!(%path, generation, "tree: fetching term");
        tokio::spawn(async move {
            let result = source.term_info(&path).await;
            let _ = tx.send(TreeMessage::TermLoaded {
                generation,
                path,
                result,
            });
        });
    }

    fn request_roots(&mut self) {
        if self.roots_pending {
            return;
        }
        self.roots_pending = true;
        self.in_flight += 1;

        let source = Arc::clone(&self.source);
        let vocabulary = self.vocabulary.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = vocabulary.ensure_roots(source.as_ref()).await;
            let _ = tx.send(TreeMessage::RootsLoaded { result });
        });
    }

    fn plant_roots(&mut self, roots: &[TermSummary]) {
        let mut nodes = self.branches(roots, BranchRole::Child);
        tracing::debug!(roots = nodes.len(), "tree: planted roots");
        let mut pending = None;
        if let [only] = nodes.as_mut_slice() {
            if only.can_expand() {
                only.begin_loading();
                pending = Some((only.key, only.id.clone(), only.path.clone()));
            }
        }
        self.parents = Some(nodes);
        if let Some((key, id, path)) = pending {
            self.fetch_children(key, id, path);
        }
    }

    fn plant_term(&mut self, term: Term) {
        let mut old = self.parents.take().unwrap_or_default();
        let mut parents = Vec::with_capacity(term.parents.len());
        for summary in term.parents.iter().filter(|p| !p.id.is_empty()) {
            let reused = old
                .iter()
                .position(|o| o.role == BranchRole::Head && o.id == summary.id)
                .map(|pos| old.swap_remove(pos));
            let node = match reused {
                Some(mut node) => {
                    node.retarget(summary);
                    node
                }
                None => self.branch(summary, BranchRole::Head),
            };
            parents.push(node);
        }
        self.parents = Some(parents);

        let summary = term.summary();
        let mut current = match self.current.take() {
            Some(mut node) => {
                node.retarget(&summary);
                node
            }
            None => self.branch(&summary, BranchRole::Child),
        };
        current.focused = true;

        let mut pending = None;
        if current.children_loaded {
            current.state = BranchState::Expanded;
        } else if let Some(children) = term.children.as_deref() {
            let nodes = self.branches(children, BranchRole::Child);
            current.finish_loading(nodes);
        } else if current.can_expand() && current.state == BranchState::Collapsed {
            current.begin_loading();
            pending = Some((current.key, current.id.clone(), current.path.clone()));
        }
        tracing::debug!(path = %current.path, parents = self.parents().len(), "tree: planted term");
        self.current = Some(current);

        if let Some((key, id, path)) = pending {
            self.fetch_children(key, id, path);
        }
    }

    // -----------------------------------------------------------------------
    // Expansion
    // -----------------------------------------------------------------------

    /// Expand branch `key`, fetching its children the first time. Returns
    /// `true` if the branch changed state.
    pub fn expand(&mut self, key: NodeKey) -> bool {
        let Some(node) = self.node_mut(key) else {
            return false;
        };
        if node.state != BranchState::Collapsed {
            tracing::debug!(key, state = ?node.state, "tree: expand coalesced");
            return false;
        }
        if node.children_loaded {
            tracing::debug!(key, "tree: expand from cache");
            node.state = BranchState::Expanded;
            return true;
        }
        if !node.can_expand() {
            return false;
        }
        node.begin_loading();
        let (id, path) = (node.id.clone(), node.path.clone());
        self.fetch_children(key, id, path);
        true
    }

    pub fn collapse(&mut self, key: NodeKey) -> bool {
        match self.node_mut(key) {
            Some(node) if node.state == BranchState::Expanded => {
                tracing::debug!(key, "tree: collapse");
                node.state = BranchState::Collapsed;
                true
            }
            _ => false,
        }
    }

    pub fn toggle(&mut self, key: NodeKey) -> bool {
        match self.node(key).map(BranchNode::state) {
            Some(BranchState::Expanded) => self.collapse(key),
            Some(BranchState::Collapsed) => self.expand(key),
            Some(BranchState::Loading) | None => false,
        }
    }

    fn fetch_children(&mut self, key: NodeKey, id: String, path: String) {
        self.in_flight += 1;
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        tracing::debug!(key, %id, "tree: fetching children");
        tokio::spawn(async move {
            let result = source
                .term_info(&path)
                .await
                .map(|term| term.children.unwrap_or_default());
            let _ = tx.send(TreeMessage::ChildrenLoaded { key, id, result });
        });
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    pub fn selection_mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    pub fn is_selected(&self, key: NodeKey) -> bool {
        self.node(key)
            .is_some_and(|n| self.selection.is_selected(&n.path))
    }

    /// Flip the checkbox/radio of branch `key`.
    pub fn toggle_selection(&mut self, key: NodeKey) -> bool {
        if !self.selection.mode().is_enabled() {
            return false;
        }
        let Some(node) = self.node(key) else {
            return false;
        };
        let (label, path) = (node.label.clone(), node.path.clone());
        self.selection.toggle(&label, &path);
        true
    }

    /// Close the dialog, handing back the answers and the removals.
    pub fn close(&mut self) -> SelectionDiff {
        self.selection.close()
    }

    // -----------------------------------------------------------------------
    // Responses
    // -----------------------------------------------------------------------

    pub fn apply(&mut self, msg: TreeMessage) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match msg {
            TreeMessage::RootsLoaded { result } => {
                self.roots_pending = false;
                match result {
                    Ok(_) => self.rebuild(),
                    Err(err) => self.report(BrowseError::RootsLookupFailed(err)),
                }
            }
            TreeMessage::TermLoaded {
                generation,
                path,
                result,
            } => {
                if generation != self.generation {
                    tracing::debug!(%path, generation, "tree: stale term response dropped");
                    return;
                }
                match result {
                    Ok(term) => self.plant_term(term),
                    Err(err) => {
                        // Let the user retry the same path.
                        self.last_known_path.clear();
                        self.report(BrowseError::InitialTermLookupFailed(err));
                    }
                }
            }
            TreeMessage::ChildrenLoaded { key, id, result } => {
                let live = self
                    .node(key)
                    .is_some_and(|n| n.id == id && n.state == BranchState::Loading);
                if !live {
                    tracing::debug!(key, %id, "tree: stale children response dropped");
                    return;
                }
                match result {
                    Ok(children) => {
                        let nodes = self.branches(&children, BranchRole::Child);
                        tracing::debug!(key, children = nodes.len(), "tree: children loaded");
                        if let Some(node) = self.node_mut(key) {
                            node.finish_loading(nodes);
                        }
                    }
                    Err(err) => {
                        let err = BrowseError::ChildrenLookupFailed(err);
                        if let Some(node) = self.node_mut(key) {
                            node.fail(err.to_string());
                        }
                        self.report(err);
                    }
                }
            }
        }
    }

    /// Receive and apply messages until no fetch is outstanding.
    pub async fn settle(&mut self, rx: &mut mpsc::UnboundedReceiver<TreeMessage>) {
        while !self.is_idle() {
            match rx.recv().await {
                Some(msg) => self.apply(msg),
                None => break,
            }
        }
    }

    fn report(&mut self, err: BrowseError) {
        tracing::warn!(error = %err.lookup(), "tree: lookup failed");
        (self.on_error)(&err.to_string());
    }

    fn branch(&mut self, summary: &TermSummary, role: BranchRole) -> BranchNode {
        self.next_key += 1;
        BranchNode::new(self.next_key, summary, role)
    }

    fn branches(&mut self, summaries: &[TermSummary], role: BranchRole) -> Vec<BranchNode> {
        summaries
            .iter()
            .filter(|s| !s.id.is_empty())
            .map(|s| self.branch(s, role))
            .collect()
    }
}
