use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Конфигурация всех роутов приложения
pub fn configure_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // A001 CARGO (positions and org chart)
        // ========================================
        .route(
            "/api/cargo",
            get(handlers::a001_cargo::list_all).post(handlers::a001_cargo::upsert),
        )
        .route("/api/cargo/tree", get(handlers::a001_cargo::tree))
        .route("/api/cargo/tree/flat", get(handlers::a001_cargo::tree_flat))
        .route(
            "/api/cargo/testdata",
            post(handlers::a001_cargo::insert_test_data),
        )
        .route(
            "/api/cargo/:id",
            get(handlers::a001_cargo::get_by_id).delete(handlers::a001_cargo::delete),
        )
        .route(
            "/api/cargo/:id/subtree",
            get(handlers::a001_cargo::subtree),
        )
}
