use super::repository;
use contracts::domain::a001_cargo::{Cargo, CargoDto, CargoId};
use contracts::shared::hierarchy::{
    find_node, flatten_with_depth, Anomaly, HierarchyBuilder, HierarchyError, HierarchyFilter,
    HierarchyStats, TreeNode,
};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CargoServiceError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Cargo {0} not found")]
    NotFound(CargoId),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CargoServiceError>;

/// Response of `GET /api/cargo/tree`
#[derive(Debug, Serialize)]
pub struct HierarchyView {
    pub roots: Vec<TreeNode<Cargo>>,
    pub stats: HierarchyStats,
}

/// One row of `GET /api/cargo/tree/flat`
#[derive(Debug, Serialize)]
pub struct FlatCargoRow {
    pub depth: usize,
    pub cargo: Cargo,
}

pub async fn create(dto: CargoDto) -> Result<CargoId> {
    let mut aggregate = Cargo::new_for_insert(&dto);
    if aggregate.code.trim().is_empty() {
        aggregate.code = generate_code(&aggregate.name);
    }

    aggregate.validate().map_err(CargoServiceError::Validation)?;
    ensure_parent_exists(aggregate.parent_id).await?;
    aggregate.before_write();

    let id = repository::insert(&aggregate).await?;
    tracing::info!("Created cargo {} ({})", id, aggregate.name);
    Ok(id)
}

pub async fn update(dto: CargoDto) -> Result<()> {
    let id = dto
        .id
        .map(CargoId)
        .ok_or_else(|| CargoServiceError::Validation("Invalid ID".into()))?;

    let mut aggregate = repository::get_by_id(id)
        .await?
        .ok_or(CargoServiceError::NotFound(id))?;

    aggregate.update(&dto);
    aggregate.validate().map_err(CargoServiceError::Validation)?;
    ensure_parent_exists(aggregate.parent_id).await?;
    ensure_no_cycle(&aggregate).await?;
    aggregate.before_write();

    repository::update(&aggregate).await?;
    Ok(())
}

pub async fn delete(id: CargoId) -> Result<bool> {
    Ok(repository::soft_delete(id).await?)
}

pub async fn get_by_id(id: CargoId) -> Result<Option<Cargo>> {
    let Some(mut cargo) = repository::get_by_id(id).await? else {
        return Ok(None);
    };
    let children = repository::count_children(id).await?;
    cargo.subordinates_count = Some(u32::try_from(children).unwrap_or(u32::MAX));
    Ok(Some(cargo))
}

pub async fn list_all() -> Result<Vec<Cargo>> {
    let mut records = repository::list_all().await?;
    fill_subordinate_counts(&mut records);
    Ok(records)
}

/// Sets `subordinates_count` to the number of direct children among `records`.
/// Counted before any filtering, so hidden subordinates still count.
pub fn fill_subordinate_counts(records: &mut [Cargo]) {
    let mut counts: HashMap<CargoId, u32> = HashMap::new();
    for cargo in records.iter() {
        if let Some(parent) = cargo.parent_id {
            *counts.entry(parent).or_insert(0) += 1;
        }
    }
    for cargo in records.iter_mut() {
        cargo.subordinates_count = Some(counts.get(&cargo.id).copied().unwrap_or(0));
    }
}

/// Promotions seen while building one forest
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OrphanReport {
    /// Parent id not stored at all: a stale reference
    pub dangling: Vec<(CargoId, CargoId)>,
    /// Parent hidden by the current filter
    pub filtered_out: Vec<(CargoId, CargoId)>,
}

impl OrphanReport {
    pub fn total(&self) -> usize {
        self.dangling.len() + self.filtered_out.len()
    }
}

/// Builds the forest from already loaded positions
pub fn build_forest(
    records: Vec<Cargo>,
    filter: HierarchyFilter,
) -> Result<(Vec<TreeNode<Cargo>>, OrphanReport)> {
    let mut report = OrphanReport::default();
    let roots = HierarchyBuilder::<Cargo>::new(filter)
        .on_anomaly(|anomaly| match anomaly {
            Anomaly::DanglingParent { key, parent } => {
                tracing::warn!("Cargo {} references missing parent {}", key, parent);
                report.dangling.push((*key, *parent));
            }
            Anomaly::ParentFilteredOut { key, parent } => {
                tracing::debug!("Cargo {} promoted to root, parent {} filtered out", key, parent);
                report.filtered_out.push((*key, *parent));
            }
        })
        .build(records)
        .map_err(|e| {
            tracing::error!("Failed to build cargo hierarchy: {}", e);
            e
        })?;
    Ok((roots, report))
}

/// Loads every position and builds the forest for `filter`.
/// Orphan promotions are logged, never treated as errors.
pub async fn build_hierarchy(filter: HierarchyFilter) -> Result<Vec<TreeNode<Cargo>>> {
    let records = list_all().await?;
    let total = records.len();

    let (roots, report) = build_forest(records, filter)?;

    tracing::debug!(
        "build_hierarchy: {} records, {} roots, {} promoted orphans",
        total,
        roots.len(),
        report.total()
    );
    Ok(roots)
}

pub async fn hierarchy_view(filter: HierarchyFilter) -> Result<HierarchyView> {
    let roots = build_hierarchy(filter).await?;
    let stats = HierarchyStats::collect(&roots);
    Ok(HierarchyView { roots, stats })
}

pub async fn flat_hierarchy(filter: HierarchyFilter) -> Result<Vec<FlatCargoRow>> {
    let roots = build_hierarchy(filter).await?;
    Ok(flatten_with_depth(&roots)
        .into_iter()
        .map(|row| FlatCargoRow {
            depth: row.depth,
            cargo: row.node.item.clone(),
        })
        .collect())
}

pub async fn subtree(id: CargoId, filter: HierarchyFilter) -> Result<TreeNode<Cargo>> {
    let roots = build_hierarchy(filter).await?;
    find_node(&roots, &id)
        .cloned()
        .ok_or(CargoServiceError::NotFound(id))
}

/// Sample organization for a fresh database
pub async fn insert_test_data() -> Result<usize> {
    // (code, name, level, parent code, active, employees)
    let rows: [(&str, &str, i32, Option<&str>, bool, u32); 8] = [
        ("GG", "Gerente General", 1, None, true, 1),
        ("DF", "Director Financiero", 2, Some("GG"), true, 1),
        ("DRH", "Director de Recursos Humanos", 2, Some("GG"), true, 1),
        ("CONT", "Contador", 3, Some("DF"), true, 3),
        ("JN", "Jefe de Nomina", 3, Some("DRH"), true, 1),
        ("ANN", "Analista de Nomina", 4, Some("JN"), true, 4),
        ("AUX", "Auxiliar Contable", 4, Some("CONT"), false, 0),
        ("PAS", "Pasante", 5, Some("ANN"), false, 2),
    ];

    let mut ids: HashMap<&str, CargoId> = HashMap::new();
    for (code, name, level, parent, active, employees) in rows {
        let dto = CargoDto {
            id: None,
            code: Some(code.to_string()),
            name: name.to_string(),
            description: None,
            hierarchy_level: Some(level),
            parent_id: parent.and_then(|p| ids.get(p)).map(|id| id.value()),
            is_active: Some(active),
            employees_count: Some(employees),
        };
        let id = create(dto).await?;
        ids.insert(code, id);
    }

    tracing::info!("Inserted {} test cargos", ids.len());
    Ok(ids.len())
}

async fn ensure_parent_exists(parent_id: Option<CargoId>) -> Result<()> {
    if let Some(parent) = parent_id {
        if repository::get_by_id(parent).await?.is_none() {
            return Err(CargoServiceError::Validation(format!(
                "Parent cargo {} does not exist",
                parent
            )));
        }
    }
    Ok(())
}

/// Rejects an update that would make the position report to one of its own subordinates
async fn ensure_no_cycle(aggregate: &Cargo) -> Result<()> {
    let Some(parent) = aggregate.parent_id else {
        return Ok(());
    };

    let records = repository::list_all().await?;
    let parents: HashMap<CargoId, Option<CargoId>> = records
        .iter()
        .map(|c| (c.id, c.parent_id))
        .collect();

    if creates_cycle(&parents, aggregate.id, parent) {
        return Err(CargoServiceError::Validation(format!(
            "Cargo {} cannot report to {}: it is one of its subordinates",
            aggregate.id, parent
        )));
    }
    Ok(())
}

/// Walks up from `new_parent`; reaching `id` means the new edge closes a loop
fn creates_cycle(
    parents: &HashMap<CargoId, Option<CargoId>>,
    id: CargoId,
    new_parent: CargoId,
) -> bool {
    let mut cursor = Some(new_parent);
    let mut steps = 0usize;
    while let Some(current) = cursor {
        if current == id {
            return true;
        }
        // Stored data may already contain a loop that does not involve `id`
        steps += 1;
        if steps > parents.len() {
            return false;
        }
        cursor = parents.get(&current).copied().flatten();
    }
    false
}

fn generate_code(name: &str) -> String {
    let initials: String = name
        .split_whitespace()
        .filter_map(|w| w.chars().next())
        .flat_map(char::to_uppercase)
        .take(6)
        .collect();
    if initials.is_empty() {
        "CARGO".to_string()
    } else {
        initials
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cargo(id: i64, name: &str, parent: Option<i64>) -> Cargo {
        Cargo::new(CargoId(id), format!("C{}", id), name, 1, parent.map(CargoId))
    }

    #[test]
    fn test_fill_subordinate_counts() {
        let mut records = vec![
            cargo(1, "Gerente", None),
            cargo(2, "Director", Some(1)),
            cargo(3, "Jefe", Some(1)),
            cargo(4, "Analista", Some(3)).inactive(),
            cargo(5, "Stale", Some(99)),
        ];
        fill_subordinate_counts(&mut records);

        let counts: Vec<(i64, Option<u32>)> = records
            .iter()
            .map(|c| (c.id.value(), c.subordinates_count))
            .collect();
        assert_eq!(
            counts,
            vec![(1, Some(2)), (2, Some(0)), (3, Some(1)), (4, Some(0)), (5, Some(0))]
        );
    }

    #[test]
    fn test_counts_survive_filtering_into_the_tree() {
        let mut records = vec![
            cargo(1, "Gerente", None),
            cargo(2, "Pasante", Some(1)).inactive(),
        ];
        fill_subordinate_counts(&mut records);
        let (roots, _) =
            build_forest(records, HierarchyFilter::new().with_show_inactive(false)).unwrap();

        assert!(roots[0].children.is_empty());
        assert_eq!(roots[0].item.subordinates_count, Some(1));
        let value = serde_json::to_value(&roots).unwrap();
        assert_eq!(value[0]["subordinados_count"], 1);
    }

    #[test]
    fn test_build_forest_separates_orphan_kinds() {
        let records = vec![
            cargo(1, "Gerente", None).inactive(),
            cargo(2, "Director", Some(1)),
            cargo(3, "Stale", Some(77)),
        ];
        let (roots, report) =
            build_forest(records, HierarchyFilter::new().with_show_inactive(false)).unwrap();

        assert_eq!(roots.len(), 2);
        assert_eq!(report.filtered_out, vec![(CargoId(2), CargoId(1))]);
        assert_eq!(report.dangling, vec![(CargoId(3), CargoId(77))]);
        assert_eq!(report.total(), 2);
    }

    #[test]
    fn test_build_forest_stored_cycle_is_hierarchy_error() {
        let records = vec![
            cargo(1, "Gerente", None),
            cargo(2, "A", Some(3)),
            cargo(3, "B", Some(2)),
        ];
        let err = build_forest(records, HierarchyFilter::new()).unwrap_err();
        assert!(matches!(
            err,
            CargoServiceError::Hierarchy(HierarchyError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_creates_cycle() {
        // 1 <- 2 <- 3
        let parents: HashMap<CargoId, Option<CargoId>> = HashMap::from([
            (CargoId(1), None),
            (CargoId(2), Some(CargoId(1))),
            (CargoId(3), Some(CargoId(2))),
        ]);
        assert!(creates_cycle(&parents, CargoId(1), CargoId(3)));
        assert!(creates_cycle(&parents, CargoId(2), CargoId(2)));
        assert!(!creates_cycle(&parents, CargoId(3), CargoId(1)));
    }

    #[test]
    fn test_creates_cycle_terminates_on_existing_loop() {
        let parents: HashMap<CargoId, Option<CargoId>> = HashMap::from([
            (CargoId(1), Some(CargoId(2))),
            (CargoId(2), Some(CargoId(1))),
            (CargoId(3), None),
        ]);
        assert!(!creates_cycle(&parents, CargoId(3), CargoId(1)));
    }

    #[test]
    fn test_generate_code() {
        assert_eq!(generate_code("jefe de nomina"), "JDN");
        assert_eq!(generate_code("   "), "CARGO");
    }

    #[test]
    fn test_hierarchy_error_is_wrapped() {
        let err: CargoServiceError = HierarchyError::CycleDetected { key: "4".into() }.into();
        assert!(matches!(err, CargoServiceError::Hierarchy(_)));
        assert_eq!(err.to_string(), "cycle detected in parent references at key 4");
    }
}
