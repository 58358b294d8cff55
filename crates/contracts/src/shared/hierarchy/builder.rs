use super::{HierarchyError, HierarchyFilter, HierarchyRecord, TreeNode};
use std::collections::{HashMap, HashSet};

/// Parent reference that could not be resolved inside the working set.
/// The record is promoted to a root either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly<K> {
    /// The parent exists in the input but was removed by the filter
    ParentFilteredOut { key: K, parent: K },
    /// The parent is not present in the input at all
    DanglingParent { key: K, parent: K },
}

/// Builds a forest from records with parent pointers.
///
/// ```rust,ignore
/// let roots = HierarchyBuilder::<Cargo>::new(HierarchyFilter::new().with_show_inactive(false))
///     .on_anomaly(|a| tracing::warn!("{:?}", a))
///     .build(cargos)?;
/// ```
pub struct HierarchyBuilder<'a, T: HierarchyRecord> {
    filter: HierarchyFilter,
    on_anomaly: Option<Box<dyn FnMut(&Anomaly<T::Key>) + 'a>>,
}

impl<'a, T: HierarchyRecord> HierarchyBuilder<'a, T> {
    pub fn new(filter: HierarchyFilter) -> Self {
        Self {
            filter,
            on_anomaly: None,
        }
    }

    pub fn on_anomaly(mut self, callback: impl FnMut(&Anomaly<T::Key>) + 'a) -> Self {
        self.on_anomaly = Some(Box::new(callback));
        self
    }

    pub fn filter(&self) -> &HierarchyFilter {
        &self.filter
    }

    fn report(&mut self, anomaly: Anomaly<T::Key>) {
        if let Some(callback) = self.on_anomaly.as_mut() {
            callback(&anomaly);
        }
    }

    pub fn build<I>(&mut self, records: I) -> Result<Vec<TreeNode<T>>, HierarchyError>
    where
        I: IntoIterator<Item = T>,
    {
        // 1. Фильтрация: рабочее множество S в исходном порядке
        let needle = self.filter.needle();
        let mut items: Vec<T> = Vec::new();
        let mut excluded: HashSet<T::Key> = HashSet::new();
        for record in records {
            if self.filter.accepts_with(&record, needle.as_deref()) {
                items.push(record);
            } else {
                excluded.insert(record.key());
            }
        }

        if items.is_empty() {
            return Ok(Vec::new());
        }

        // 2. key -> index
        let mut index: HashMap<T::Key, usize> = HashMap::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let key = item.key();
            if index.contains_key(&key) {
                return Err(HierarchyError::DuplicateKey {
                    key: key.to_string(),
                });
            }
            index.insert(key, i);
        }

        // 3. Linking; children keep input order
        let mut parents: Vec<Option<usize>> = Vec::with_capacity(items.len());
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); items.len()];
        let mut roots: Vec<usize> = Vec::new();

        for (i, item) in items.iter().enumerate() {
            let parent = match item.parent_key() {
                None => None,
                Some(parent_key) => match index.get(&parent_key) {
                    Some(&p) => Some(p),
                    None => {
                        let anomaly = if excluded.contains(&parent_key) {
                            Anomaly::ParentFilteredOut {
                                key: item.key(),
                                parent: parent_key,
                            }
                        } else {
                            Anomaly::DanglingParent {
                                key: item.key(),
                                parent: parent_key,
                            }
                        };
                        self.report(anomaly);
                        None
                    }
                },
            };
            match parent {
                Some(p) => children[p].push(i),
                None => roots.push(i),
            }
            parents.push(parent);
        }

        // Pre-order from the roots. A node that is never reached sits on or below a cycle.
        let mut order: Vec<usize> = Vec::with_capacity(items.len());
        let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
        while let Some(i) = stack.pop() {
            order.push(i);
            stack.extend(children[i].iter().rev().copied());
        }

        if order.len() < items.len() {
            return Err(cycle_error(&items, &parents, &order));
        }

        // 4. Assemble bottom-up: reverse pre-order sees every child before its parent
        let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
        let mut built: Vec<Option<TreeNode<T>>> = (0..slots.len()).map(|_| None).collect();
        for &i in order.iter().rev() {
            let kids: Vec<TreeNode<T>> = children[i]
                .iter()
                .filter_map(|&c| built[c].take())
                .collect();
            if let Some(item) = slots[i].take() {
                built[i] = Some(TreeNode {
                    item,
                    children: kids,
                });
            }
        }

        Ok(roots.iter().filter_map(|&r| built[r].take()).collect())
    }
}

fn cycle_error<T: HierarchyRecord>(
    items: &[T],
    parents: &[Option<usize>],
    order: &[usize],
) -> HierarchyError {
    let mut reached = vec![false; items.len()];
    for &i in order {
        reached[i] = true;
    }

    // Unreached nodes always have a parent, so following parents must revisit a node
    let mut cursor = reached.iter().position(|r| !r).unwrap_or_default();
    let mut seen = vec![false; items.len()];
    while !seen[cursor] {
        seen[cursor] = true;
        match parents[cursor] {
            Some(p) => cursor = p,
            None => break,
        }
    }

    HierarchyError::CycleDetected {
        key: items[cursor].key().to_string(),
    }
}

/// Builds the forest for `records` after applying `filter`
pub fn build_tree<T, I>(records: I, filter: &HierarchyFilter) -> Result<Vec<TreeNode<T>>, HierarchyError>
where
    T: HierarchyRecord,
    I: IntoIterator<Item = T>,
{
    HierarchyBuilder::new(filter.clone()).build(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_cargo::{Cargo, CargoId};
    use serde_json::json;

    fn cargo(id: i64, name: &str, parent: Option<i64>) -> Cargo {
        Cargo::new(CargoId(id), format!("C{}", id), name, 1, parent.map(CargoId))
    }

    fn ids(nodes: &[TreeNode<Cargo>]) -> Vec<i64> {
        nodes.iter().map(|n| n.item.id.value()).collect()
    }

    fn count(nodes: &[TreeNode<Cargo>]) -> usize {
        nodes.iter().map(|n| n.size()).sum()
    }

    #[test]
    fn test_empty_input() {
        let roots = build_tree(Vec::<Cargo>::new(), &HierarchyFilter::new()).unwrap();
        assert!(roots.is_empty());
    }

    #[test]
    fn test_root_promotion_for_missing_parent() {
        let records = vec![
            cargo(1, "Gerente", None),
            cargo(2, "Jefe", Some(1)),
            cargo(3, "Huerfano", Some(999)),
        ];
        let roots = build_tree(records, &HierarchyFilter::new()).unwrap();

        assert_eq!(ids(&roots), vec![1, 3]);
        assert_eq!(ids(&roots[0].children), vec![2]);
        assert!(roots[1].children.is_empty());
    }

    #[test]
    fn test_sibling_order_follows_input() {
        let records = vec![
            cargo(1, "Root", None),
            cargo(30, "C", Some(1)),
            cargo(10, "A", Some(1)),
            cargo(20, "B", Some(1)),
        ];
        let roots = build_tree(records, &HierarchyFilter::new()).unwrap();
        assert_eq!(ids(&roots[0].children), vec![30, 10, 20]);
    }

    #[test]
    fn test_child_listed_before_parent() {
        let records = vec![cargo(2, "Jefe", Some(1)), cargo(1, "Gerente", None)];
        let roots = build_tree(records, &HierarchyFilter::new()).unwrap();
        assert_eq!(ids(&roots), vec![1]);
        assert_eq!(ids(&roots[0].children), vec![2]);
    }

    #[test]
    fn test_conservation() {
        let records: Vec<Cargo> = (1..=200)
            .map(|i| {
                let parent = if i % 7 == 0 { Some(10_000 + i) } else if i > 1 { Some(i / 2) } else { None };
                cargo(i, "X", parent)
            })
            .collect();
        let roots = build_tree(records, &HierarchyFilter::new()).unwrap();
        assert_eq!(count(&roots), 200);
    }

    #[test]
    fn test_filter_composition_never_reintroduces_descendants() {
        let records = vec![
            cargo(1, "Foo director", None),
            cargo(2, "Bar manager", Some(1)),
            cargo(3, "foo analyst", Some(2)),
            cargo(4, "FOO intern", Some(3)).inactive(),
            cargo(5, "foo lead", Some(1)).inactive(),
        ];
        let filter = HierarchyFilter::new()
            .with_search("foo")
            .with_show_inactive(false);
        let roots = build_tree(records, &filter).unwrap();

        // 2 fails the search, so 3 is promoted; 4 and 5 are inactive
        assert_eq!(ids(&roots), vec![1, 3]);
        assert!(roots[0].children.is_empty());
        assert!(roots[1].children.is_empty());
        assert_eq!(count(&roots), 2);
    }

    #[test]
    fn test_idempotent() {
        let records = vec![
            cargo(1, "A", None),
            cargo(2, "B", Some(1)),
            cargo(3, "C", Some(1)),
            cargo(4, "D", Some(3)),
        ];
        let filter = HierarchyFilter::new();
        let first = build_tree(records.clone(), &filter).unwrap();
        let second = build_tree(records, &filter).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_end_to_end_inactive_intern() {
        let records: Vec<Cargo> = serde_json::from_value(json!([
            {"id": 10, "nombre": "CEO", "codigo": "CEO", "cargo_superior": null, "activo": true},
            {"id": 20, "nombre": "CTO", "codigo": "CTO", "cargo_superior": 10, "activo": true},
            {"id": 30, "nombre": "Intern", "codigo": "INT", "cargo_superior": 20, "activo": false}
        ]))
        .unwrap();

        let roots = build_tree(records, &HierarchyFilter::new().with_show_inactive(false)).unwrap();

        assert_eq!(ids(&roots), vec![10]);
        assert_eq!(ids(&roots[0].children), vec![20]);
        assert!(roots[0].children[0].children.is_empty());
    }

    #[test]
    fn test_self_parent_is_cycle() {
        let records = vec![cargo(1, "Root", None), cargo(2, "Loop", Some(2))];
        let err = build_tree(records, &HierarchyFilter::new()).unwrap_err();
        assert_eq!(err, HierarchyError::CycleDetected { key: "2".into() });
    }

    #[test]
    fn test_two_node_cycle_with_hanging_child() {
        let records = vec![
            cargo(1, "A", Some(2)),
            cargo(2, "B", Some(1)),
            cargo(3, "C", Some(1)),
        ];
        let err = build_tree(records, &HierarchyFilter::new()).unwrap_err();
        match err {
            HierarchyError::CycleDetected { key } => assert!(key == "1" || key == "2"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let records = vec![cargo(1, "A", None), cargo(1, "B", None)];
        let err = build_tree(records, &HierarchyFilter::new()).unwrap_err();
        assert_eq!(err, HierarchyError::DuplicateKey { key: "1".into() });
    }

    #[test]
    fn test_anomalies_reported() {
        let records = vec![
            cargo(1, "Root", None).inactive(),
            cargo(2, "Child", Some(1)),
            cargo(3, "Stale", Some(77)),
        ];
        let mut seen = Vec::new();
        let roots = HierarchyBuilder::<Cargo>::new(HierarchyFilter::new().with_show_inactive(false))
            .on_anomaly(|a: &Anomaly<CargoId>| seen.push(a.clone()))
            .build(records)
            .unwrap();

        assert_eq!(ids(&roots), vec![2, 3]);
        assert_eq!(
            seen,
            vec![
                Anomaly::ParentFilteredOut { key: CargoId(2), parent: CargoId(1) },
                Anomaly::DanglingParent { key: CargoId(3), parent: CargoId(77) },
            ]
        );
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let depth = 100_000;
        let records: Vec<Cargo> = (1..=depth)
            .map(|i| cargo(i, "L", if i == 1 { None } else { Some(i - 1) }))
            .collect();
        let roots = build_tree(records, &HierarchyFilter::new()).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].size(), depth as usize);
    }

    #[test]
    fn test_serialized_node_nests_subordinados() {
        let roots = build_tree(
            vec![cargo(1, "Root", None), cargo(2, "Child", Some(1))],
            &HierarchyFilter::new(),
        )
        .unwrap();
        let value = serde_json::to_value(&roots).unwrap();
        assert_eq!(value[0]["nombre"], "Root");
        assert_eq!(value[0]["subordinados"][0]["id"], 2);
        assert_eq!(value[0]["subordinados"][0]["subordinados"], json!([]));
    }

    #[test]
    fn test_served_forest_reads_back() {
        let roots = build_tree(
            vec![
                cargo(1, "Root", None),
                cargo(2, "Child", Some(1)),
                cargo(3, "Grandchild", Some(2)),
                cargo(4, "Other root", None),
            ],
            &HierarchyFilter::new(),
        )
        .unwrap();
        let text = serde_json::to_string(&roots).unwrap();

        let back: Vec<TreeNode<Cargo>> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, roots);
    }

    #[test]
    fn test_missing_subordinados_reads_as_leaf() {
        let back: TreeNode<Cargo> =
            serde_json::from_value(json!({"id": 9, "nombre": "Solo", "codigo": "S"})).unwrap();
        assert_eq!(back.item.id, CargoId(9));
        assert!(back.children.is_empty());
    }
}
