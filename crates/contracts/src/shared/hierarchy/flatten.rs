use super::{ExpandState, HierarchyRecord, TreeNode};

/// One row of a flattened forest
#[derive(Debug)]
pub struct FlatNode<'a, T> {
    pub node: &'a TreeNode<T>,
    /// 0 for roots
    pub depth: usize,
}

fn walk<'a, T>(
    roots: &'a [TreeNode<T>],
    mut descend: impl FnMut(&TreeNode<T>) -> bool,
) -> Vec<FlatNode<'a, T>> {
    let mut rows = Vec::new();
    let mut stack: Vec<(&'a TreeNode<T>, usize)> = roots.iter().rev().map(|n| (n, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        rows.push(FlatNode { node, depth });
        if descend(node) {
            stack.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
        }
    }
    rows
}

/// Pre-order traversal of the whole forest (compact list and table views)
pub fn flatten_with_depth<T>(roots: &[TreeNode<T>]) -> Vec<FlatNode<'_, T>> {
    walk(roots, |_| true)
}

/// Pre-order traversal that only descends into expanded nodes (tree view)
pub fn flatten_visible<'a, T: HierarchyRecord>(
    roots: &'a [TreeNode<T>],
    state: &ExpandState<T::Key>,
) -> Vec<FlatNode<'a, T>> {
    walk(roots, |node| state.is_expanded(&node.item.key()))
}

/// Subtree rooted at `key`, if it is part of the forest
pub fn find_node<'a, T: HierarchyRecord>(
    roots: &'a [TreeNode<T>],
    key: &T::Key,
) -> Option<&'a TreeNode<T>> {
    let mut stack: Vec<&'a TreeNode<T>> = roots.iter().collect();
    while let Some(node) = stack.pop() {
        if node.item.key() == *key {
            return Some(node);
        }
        stack.extend(node.children.iter());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_cargo::{Cargo, CargoId};
    use crate::shared::hierarchy::{build_tree, HierarchyFilter};

    fn cargo(id: i64, parent: Option<i64>) -> Cargo {
        Cargo::new(CargoId(id), format!("C{}", id), format!("Cargo {}", id), 1, parent.map(CargoId))
    }

    fn rows(flat: &[FlatNode<'_, Cargo>]) -> Vec<(i64, usize)> {
        flat.iter().map(|r| (r.node.item.id.value(), r.depth)).collect()
    }

    fn sample() -> Vec<TreeNode<Cargo>> {
        // 1 -> (2 -> 4), 3 ; 5 is a second root
        build_tree(
            vec![
                cargo(1, None),
                cargo(2, Some(1)),
                cargo(3, Some(1)),
                cargo(4, Some(2)),
                cargo(5, None),
            ],
            &HierarchyFilter::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_chain_depths() {
        let roots = build_tree(
            vec![cargo(3, Some(2)), cargo(2, Some(1)), cargo(1, None)],
            &HierarchyFilter::new(),
        )
        .unwrap();
        assert_eq!(rows(&flatten_with_depth(&roots)), vec![(1, 0), (2, 1), (3, 2)]);
    }

    #[test]
    fn test_preorder_across_roots() {
        let roots = sample();
        assert_eq!(
            rows(&flatten_with_depth(&roots)),
            vec![(1, 0), (2, 1), (4, 2), (3, 1), (5, 0)]
        );
    }

    #[test]
    fn test_visible_respects_collapsed_nodes() {
        let roots = sample();
        let mut state = ExpandState::new();
        assert_eq!(rows(&flatten_visible(&roots, &state)), vec![(1, 0), (5, 0)]);

        state.toggle(CargoId(1));
        assert_eq!(
            rows(&flatten_visible(&roots, &state)),
            vec![(1, 0), (2, 1), (3, 1), (5, 0)]
        );

        // Expanded child under a collapsed parent stays hidden
        state.toggle(CargoId(1));
        state.expand(CargoId(2));
        assert_eq!(rows(&flatten_visible(&roots, &state)), vec![(1, 0), (5, 0)]);
    }

    #[test]
    fn test_find_node() {
        let roots = sample();
        let node = find_node(&roots, &CargoId(2)).unwrap();
        assert_eq!(node.children.len(), 1);
        assert!(find_node(&roots, &CargoId(99)).is_none());
    }

    #[test]
    fn test_flatten_deep_chain() {
        let depth = 50_000;
        let roots = build_tree(
            (1..=depth).map(|i| cargo(i, if i == 1 { None } else { Some(i - 1) })),
            &HierarchyFilter::new(),
        )
        .unwrap();
        let flat = flatten_with_depth(&roots);
        assert_eq!(flat.len(), depth as usize);
        assert_eq!(flat.last().map(|r| r.depth), Some(depth as usize - 1));
    }
}
