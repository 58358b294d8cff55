use chrono::Utc;
use contracts::domain::a001_cargo::{Cargo, CargoId};
use contracts::domain::common::EntityMetadata;
use serde::{Deserialize, Serialize};

use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a001_cargo")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub hierarchy_level: i32,
    pub parent_id: Option<i64>,
    pub is_active: bool,
    pub employees_count: Option<i32>,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Cargo {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            version: m.version,
        };

        Cargo {
            id: CargoId(m.id),
            code: m.code,
            name: m.name,
            description: m.description,
            hierarchy_level: m.hierarchy_level,
            parent_id: m.parent_id.map(CargoId),
            is_active: m.is_active,
            employees_count: m.employees_count.and_then(|n| u32::try_from(n).ok()),
            // Not stored; computed from parent links by the service
            subordinates_count: None,
            metadata,
        }
    }
}

fn to_active(aggregate: &Cargo) -> ActiveModel {
    ActiveModel {
        id: if aggregate.id.is_assigned() {
            Set(aggregate.id.value())
        } else {
            NotSet
        },
        code: Set(aggregate.code.clone()),
        name: Set(aggregate.name.clone()),
        description: Set(aggregate.description.clone()),
        hierarchy_level: Set(aggregate.hierarchy_level),
        parent_id: Set(aggregate.parent_id.map(|p| p.value())),
        is_active: Set(aggregate.is_active),
        employees_count: Set(aggregate.employees_count.and_then(|n| i32::try_from(n).ok())),
        is_deleted: Set(aggregate.metadata.is_deleted),
        created_at: Set(Some(aggregate.metadata.created_at)),
        updated_at: Set(Some(aggregate.metadata.updated_at)),
        version: Set(aggregate.metadata.version),
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

/// Non-deleted positions ordered by hierarchy level, then name.
/// This is the input order the tree builder keeps for siblings.
pub async fn list_all() -> anyhow::Result<Vec<Cargo>> {
    let items = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .order_by_asc(Column::HierarchyLevel)
        .order_by_asc(Column::Name)
        .order_by_asc(Column::Id)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn get_by_id(id: CargoId) -> anyhow::Result<Option<Cargo>> {
    let result = Entity::find_by_id(id.value())
        .filter(Column::IsDeleted.eq(false))
        .one(conn())
        .await?;
    Ok(result.map(Into::into))
}

pub async fn insert(aggregate: &Cargo) -> anyhow::Result<CargoId> {
    let model = to_active(aggregate).insert(conn()).await?;
    Ok(CargoId(model.id))
}

pub async fn update(aggregate: &Cargo) -> anyhow::Result<()> {
    let mut active = to_active(aggregate);
    active.created_at = NotSet;
    active.update(conn()).await?;
    Ok(())
}

pub async fn soft_delete(id: CargoId) -> anyhow::Result<bool> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::IsDeleted, Expr::value(true))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.value()))
        .filter(Column::IsDeleted.eq(false))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

/// Direct, non-deleted subordinates of `id`
pub async fn count_children(id: CargoId) -> anyhow::Result<u64> {
    use sea_orm::PaginatorTrait;
    let count = Entity::find()
        .filter(Column::ParentId.eq(id.value()))
        .filter(Column::IsDeleted.eq(false))
        .count(conn())
        .await?;
    Ok(count)
}

pub async fn count_active() -> anyhow::Result<u64> {
    use sea_orm::PaginatorTrait;
    let count = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .count(conn())
        .await?;
    Ok(count)
}
