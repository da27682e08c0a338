use std::collections::HashSet;

use crate::model::GraphSnapshot;

/// Node ids targeted by bulk operations
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    ids: HashSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Selection::default()
    }

    /// Flip membership, returns whether the id is now selected
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn select(&mut self, id: impl Into<String>) {
        self.ids.insert(id.into());
    }

    pub fn deselect(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    /// Replace the set with exactly the given ids
    pub fn select_all<I, T>(&mut self, ids: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.ids = ids.into_iter().map(Into::into).collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn has_selection(&self) -> bool {
        !self.ids.is_empty()
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Sorted copy, for stable output across the JS boundary
    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut v: Vec<String> = self.ids.iter().cloned().collect();
        v.sort();
        v
    }

    /// Drop ids that no longer name a node in `graph`
    pub fn retain_existing(&mut self, graph: &GraphSnapshot) {
        let live = graph.node_ids();
        self.ids.retain(|id| live.contains(id.as_str()));
    }
}

impl<T: Into<String>> FromIterator<T> for Selection {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Selection {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GraphNode, NodeData, NodeKind, Position};

    #[test]
    fn test_toggle_flips_membership() {
        let mut s = Selection::new();
        assert!(s.toggle("a"));
        assert!(s.contains("a"));
        assert!(s.has_selection());
        assert!(!s.toggle("a"));
        assert!(!s.has_selection());
        assert_eq!(s.count(), 0);
    }

    #[test]
    fn test_select_all_replaces() {
        let mut s: Selection = ["x"].into_iter().collect();
        s.select_all(["a", "b", "a"]);
        assert_eq!(s.count(), 2);
        assert!(!s.contains("x"));
        assert_eq!(s.to_sorted_vec(), vec!["a", "b"]);
    }

    #[test]
    fn test_retain_existing() {
        let g = GraphSnapshot::new(
            vec![GraphNode::new("a", NodeKind::Note, Position::default(), NodeData::titled("a"))],
            vec![],
        );
        let mut s: Selection = ["a", "gone"].into_iter().collect();
        s.retain_existing(&g);
        assert_eq!(s.to_sorted_vec(), vec!["a"]);
    }
}
