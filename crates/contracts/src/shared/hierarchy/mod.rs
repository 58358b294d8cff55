//! Hierarchy tree builder
//!
//! Turns a flat list of records that point at their parent into a forest of
//! [`TreeNode`]s, plus the derived views the org chart screens need:
//! pre-order flattening with depth, expand/collapse state and statistics.
//!
//! All traversals use explicit stacks, so very deep reporting chains do not
//! grow the call stack.

mod builder;
mod error;
mod expand;
mod filter;
mod flatten;
mod node;
mod stats;

pub use builder::{build_tree, Anomaly, HierarchyBuilder};
pub use error::HierarchyError;
pub use expand::ExpandState;
pub use filter::HierarchyFilter;
pub use flatten::{find_node, flatten_visible, flatten_with_depth, FlatNode};
pub use node::TreeNode;
pub use stats::HierarchyStats;

use std::fmt::Display;
use std::hash::Hash;

/// A record that can be placed into a hierarchy by its parent reference
pub trait HierarchyRecord {
    type Key: Clone + Eq + Hash + Display;

    fn key(&self) -> Self::Key;

    /// `None` marks a root
    fn parent_key(&self) -> Option<Self::Key>;

    fn is_active(&self) -> bool {
        true
    }

    /// `needle` is already trimmed and lowercased
    fn matches_search(&self, needle: &str) -> bool;
}
