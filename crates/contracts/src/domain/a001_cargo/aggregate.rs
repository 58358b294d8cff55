use crate::domain::common::{AggregateId, EntityMetadata};
use crate::shared::hierarchy::HierarchyRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ID Type
// ============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CargoId(pub i64);

impl CargoId {
    /// Placeholder for records that have not been stored yet; SQLite assigns the real id
    pub const UNASSIGNED: CargoId = CargoId(0);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_assigned(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for CargoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AggregateId for CargoId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        <i64 as AggregateId>::from_string(s).map(CargoId::new)
    }
}

fn default_active() -> bool {
    true
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Должность (cargo): one position in the organizational structure.
///
/// Wire names follow the payroll API (`nombre`, `codigo`, `cargo_superior`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cargo {
    pub id: CargoId,

    #[serde(rename = "codigo", default)]
    pub code: String,

    #[serde(rename = "nombre")]
    pub name: String,

    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Smaller value means higher authority
    #[serde(rename = "nivel_jerarquico", default)]
    pub hierarchy_level: i32,

    #[serde(rename = "cargo_superior", default)]
    pub parent_id: Option<CargoId>,

    #[serde(rename = "activo", default = "default_active")]
    pub is_active: bool,

    #[serde(rename = "empleados_count", default, skip_serializing_if = "Option::is_none")]
    pub employees_count: Option<u32>,

    /// Direct subordinates; filled by the backend from stored parent links
    #[serde(rename = "subordinados_count", default, skip_serializing_if = "Option::is_none")]
    pub subordinates_count: Option<u32>,

    #[serde(default)]
    pub metadata: EntityMetadata,
}

impl Cargo {
    pub fn new(
        id: CargoId,
        code: impl Into<String>,
        name: impl Into<String>,
        hierarchy_level: i32,
        parent_id: Option<CargoId>,
    ) -> Self {
        Self {
            id,
            code: code.into(),
            name: name.into(),
            description: None,
            hierarchy_level,
            parent_id,
            is_active: true,
            employees_count: None,
            subordinates_count: None,
            metadata: EntityMetadata::new(),
        }
    }

    pub fn new_for_insert(dto: &CargoDto) -> Self {
        let mut cargo = Self::new(
            CargoId::UNASSIGNED,
            dto.code.clone().unwrap_or_default(),
            dto.name.clone(),
            dto.hierarchy_level.unwrap_or_default(),
            dto.parent_id.map(CargoId::new),
        );
        cargo.description = dto.description.clone();
        cargo.is_active = dto.is_active.unwrap_or(true);
        cargo.employees_count = dto.employees_count;
        cargo
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn update(&mut self, dto: &CargoDto) {
        if let Some(code) = &dto.code {
            self.code = code.clone();
        }
        self.name = dto.name.clone();
        self.description = dto.description.clone();
        if let Some(level) = dto.hierarchy_level {
            self.hierarchy_level = level;
        }
        self.parent_id = dto.parent_id.map(CargoId::new);
        if let Some(is_active) = dto.is_active {
            self.is_active = is_active;
        }
        if dto.employees_count.is_some() {
            self.employees_count = dto.employees_count;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name must not be empty".into());
        }
        if self.code.trim().is_empty() {
            return Err("Code must not be empty".into());
        }
        if self.code.len() > 20 {
            return Err("Code must not exceed 20 characters".into());
        }
        if self.hierarchy_level < 0 {
            return Err("Hierarchy level must not be negative".into());
        }
        if self.id.is_assigned() && self.parent_id == Some(self.id) {
            return Err("A position cannot report to itself".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.metadata.touch();
    }
}

impl HierarchyRecord for Cargo {
    type Key = CargoId;

    fn key(&self) -> CargoId {
        self.id
    }

    fn parent_key(&self) -> Option<CargoId> {
        self.parent_id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn matches_search(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.code.to_lowercase().contains(needle)
    }
}

// ============================================================================
// DTO
// ============================================================================

/// Payload of `POST /api/cargo`; `id` present means update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CargoDto {
    pub id: Option<i64>,
    #[serde(rename = "codigo")]
    pub code: Option<String>,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "nivel_jerarquico")]
    pub hierarchy_level: Option<i32>,
    #[serde(rename = "cargo_superior")]
    pub parent_id: Option<i64>,
    #[serde(rename = "activo")]
    pub is_active: Option<bool>,
    #[serde(rename = "empleados_count")]
    pub employees_count: Option<u32>,
}
