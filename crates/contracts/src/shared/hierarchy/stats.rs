use super::TreeNode;
use serde::{Deserialize, Serialize};

/// Summary shown above the org chart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyStats {
    pub total: usize,
    pub roots: usize,
    pub leaves: usize,
    /// Number of levels; 0 for an empty forest
    #[serde(rename = "maxDepth")]
    pub max_depth: usize,
}

impl HierarchyStats {
    pub fn collect<T>(roots: &[TreeNode<T>]) -> Self {
        let mut stats = HierarchyStats {
            roots: roots.len(),
            ..Default::default()
        };
        let mut stack: Vec<(&TreeNode<T>, usize)> = roots.iter().map(|n| (n, 1)).collect();
        while let Some((node, level)) = stack.pop() {
            stats.total += 1;
            stats.max_depth = stats.max_depth.max(level);
            if node.has_children() {
                stack.extend(node.children.iter().map(|c| (c, level + 1)));
            } else {
                stats.leaves += 1;
            }
        }
        stats
    }
}
