use super::{HierarchyRecord, TreeNode};
use std::collections::HashSet;
use std::hash::Hash;

/// Set of expanded node keys for the tree view.
///
/// Owned by the screen that renders the tree; call [`ExpandState::reset`] whenever
/// the forest is rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandState<K: Eq + Hash> {
    expanded: HashSet<K>,
}

impl<K: Eq + Hash> Default for ExpandState<K> {
    fn default() -> Self {
        Self {
            expanded: HashSet::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> ExpandState<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, key: &K) -> bool {
        self.expanded.contains(key)
    }

    /// Returns the new state of the node
    pub fn toggle(&mut self, key: K) -> bool {
        if self.expanded.remove(&key) {
            false
        } else {
            self.expanded.insert(key);
            true
        }
    }

    pub fn expand(&mut self, key: K) {
        self.expanded.insert(key);
    }

    pub fn collapse(&mut self, key: &K) {
        self.expanded.remove(key);
    }

    /// Expands every node that has subordinates
    pub fn expand_all<T>(&mut self, roots: &[TreeNode<T>])
    where
        T: HierarchyRecord<Key = K>,
    {
        self.expand_to_depth(roots, usize::MAX);
    }

    /// Expands nodes whose depth is below `depth`; 1 opens only the roots
    pub fn expand_to_depth<T>(&mut self, roots: &[TreeNode<T>], depth: usize)
    where
        T: HierarchyRecord<Key = K>,
    {
        let mut stack: Vec<(&TreeNode<T>, usize)> = roots.iter().map(|n| (n, 0)).collect();
        while let Some((node, level)) = stack.pop() {
            if level >= depth || !node.has_children() {
                continue;
            }
            self.expanded.insert(node.item.key());
            stack.extend(node.children.iter().map(|c| (c, level + 1)));
        }
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Same as [`ExpandState::collapse_all`]; called after the tree is rebuilt
    pub fn reset(&mut self) {
        self.collapse_all();
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}
