use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use contracts::domain::a001_cargo::{Cargo, CargoDto, CargoId};
use contracts::domain::common::AggregateId;
use contracts::shared::hierarchy::{HierarchyFilter, TreeNode};
use serde::Deserialize;
use serde_json::json;

use crate::domain::a001_cargo::service::{self, CargoServiceError, FlatCargoRow, HierarchyView};
use crate::AppState;

/// Query string of the tree endpoints
#[derive(Debug, Default, Deserialize)]
pub struct HierarchyQuery {
    pub search: Option<String>,
    pub show_inactive: Option<bool>,
}

impl HierarchyQuery {
    pub fn into_filter(self, default_show_inactive: bool) -> HierarchyFilter {
        HierarchyFilter {
            search_term: self.search,
            show_inactive: self.show_inactive.unwrap_or(default_show_inactive),
        }
    }
}

fn status_for(err: &CargoServiceError) -> StatusCode {
    match err {
        CargoServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        CargoServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        CargoServiceError::Hierarchy(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CargoServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn to_status(err: CargoServiceError) -> StatusCode {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!("Cargo request failed: {:#}", err);
    } else {
        tracing::warn!("Cargo request rejected: {}", err);
    }
    status
}

fn parse_id(id: &str) -> Result<CargoId, StatusCode> {
    CargoId::from_string(id).map_err(|_| StatusCode::BAD_REQUEST)
}

/// GET /api/cargo
pub async fn list_all() -> Result<Json<Vec<Cargo>>, StatusCode> {
    service::list_all().await.map(Json).map_err(to_status)
}

/// GET /api/cargo/:id
pub async fn get_by_id(Path(id): Path<String>) -> Result<Json<Cargo>, StatusCode> {
    let id = parse_id(&id)?;
    match service::get_by_id(id).await {
        Ok(Some(v)) => Ok(Json(v)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => Err(to_status(e)),
    }
}

/// POST /api/cargo
pub async fn upsert(Json(dto): Json<CargoDto>) -> Result<Json<serde_json::Value>, StatusCode> {
    let result = match dto.id {
        Some(id) => service::update(dto).await.map(|_| CargoId(id)),
        None => service::create(dto).await,
    };
    match result {
        Ok(id) => Ok(Json(json!({ "id": id }))),
        Err(e) => Err(to_status(e)),
    }
}

/// DELETE /api/cargo/:id
pub async fn delete(Path(id): Path<String>) -> Result<(), StatusCode> {
    let id = parse_id(&id)?;
    match service::delete(id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(e) => Err(to_status(e)),
    }
}

/// GET /api/cargo/tree
pub async fn tree(
    State(state): State<AppState>,
    Query(query): Query<HierarchyQuery>,
) -> Result<Json<HierarchyView>, StatusCode> {
    let filter = query.into_filter(state.config.hierarchy.show_inactive);
    service::hierarchy_view(filter)
        .await
        .map(Json)
        .map_err(to_status)
}

/// GET /api/cargo/tree/flat
pub async fn tree_flat(
    State(state): State<AppState>,
    Query(query): Query<HierarchyQuery>,
) -> Result<Json<Vec<FlatCargoRow>>, StatusCode> {
    let filter = query.into_filter(state.config.hierarchy.show_inactive);
    service::flat_hierarchy(filter)
        .await
        .map(Json)
        .map_err(to_status)
}

/// GET /api/cargo/:id/subtree
pub async fn subtree(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HierarchyQuery>,
) -> Result<Json<TreeNode<Cargo>>, StatusCode> {
    let id = parse_id(&id)?;
    let filter = query.into_filter(state.config.hierarchy.show_inactive);
    service::subtree(id, filter)
        .await
        .map(Json)
        .map_err(to_status)
}

/// POST /api/cargo/testdata
pub async fn insert_test_data() -> Result<Json<serde_json::Value>, StatusCode> {
    match service::insert_test_data().await {
        Ok(count) => Ok(Json(json!({ "inserted": count }))),
        Err(e) => Err(to_status(e)),
    }
}
