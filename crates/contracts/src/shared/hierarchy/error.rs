use thiserror::Error;

/// Ошибки построения иерархии
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("cycle detected in parent references at key {key}")]
    CycleDetected { key: String },

    #[error("duplicate key {key} in hierarchy input")]
    DuplicateKey { key: String },
}
