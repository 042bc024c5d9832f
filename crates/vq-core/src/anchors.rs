//! Registry of on-screen anchors keyed by term id.
//!
//! Suggestion rows and tree branches register where their info affordance was
//! drawn so the info box can align itself next to it. Registration is
//! additive only: deregistration events (a `None` anchor) are ignored,
//! because a row being torn down can report after its replacement has
//! already registered under the same id.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct AnchorRegistry<A> {
    anchors: HashMap<String, A>,
}

impl<A> Default for AnchorRegistry<A> {
    fn default() -> Self {
        Self {
            anchors: HashMap::new(),
        }
    }
}

impl<A> AnchorRegistry<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or overwrite) the anchor for `id`. `None` is a no-op.
    pub fn register(&mut self, id: &str, anchor: Option<A>) {
        if let Some(anchor) = anchor {
            self.anchors.insert(id.to_string(), anchor);
        }
    }

    pub fn get(&self, id: &str) -> Option<&A> {
        self.anchors.get(id)
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deregistration_is_ignored() {
        let mut reg = AnchorRegistry::new();
        reg.register("HP:0001250", Some(4u16));
        reg.register("HP:0001250", None);
        assert_eq!(reg.get("HP:0001250"), Some(&4));
    }

    #[test]
    fn re_registration_overwrites() {
        let mut reg = AnchorRegistry::new();
        reg.register("HP:0001250", Some(4u16));
        reg.register("HP:0001250", Some(9u16));
        assert_eq!(reg.get("HP:0001250"), Some(&9));
        assert_eq!(reg.len(), 1);
    }
}
