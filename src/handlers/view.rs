//! Expansion view handlers
//!
//! A view remembers which departments a client has expanded. Rows are rebuilt
//! from a fresh department list on every call and filtered through the view's
//! expansion set.

use axum::{
    extract::{Query, State},
    response::Json,
    Extension,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, OptionExt};
use crate::handlers::department::{load_forest, render_rows, DepartmentFilter, RowResponse};
use crate::middleware::DbConn;
use crate::routes::ApiResponse;
use crate::state::AppState;
use crate::tree::{flatten, DeptId, ExpansionState, FlatRow};

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub id: String,
    pub dept_id: DeptId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResponse {
    pub id: String,
    /// Expanded department ids, ascending
    pub expanded: Vec<DeptId>,
    /// Rows currently visible
    pub rows: Vec<RowResponse>,
}

async fn current_rows(state: &AppState, db: &DbConn) -> AppResult<Vec<FlatRow>> {
    let forest = load_forest(state, &**db, &DepartmentFilter::default()).await?;
    Ok(flatten(&forest.roots))
}

fn view_response(
    state: &AppState,
    id: String,
    expanded: &ExpansionState,
    rows: &[FlatRow],
) -> ViewResponse {
    ViewResponse {
        id,
        expanded: expanded.ids(),
        rows: render_rows(expanded.visible(rows), state.config.tree.indent_px),
    }
}

/// Apply `change` to a stored view against the current rows
async fn update_view(
    state: &AppState,
    db: &DbConn,
    id: String,
    change: impl FnOnce(&mut ExpansionState, &[FlatRow]),
) -> AppResult<Json<ApiResponse<ViewResponse>>> {
    let rows = current_rows(state, db).await?;
    let expanded = state
        .views
        .with_view(&id, |expanded| {
            expanded.retain_existing(&rows);
            change(expanded, &rows);
            expanded.clone()
        })
        .ok_or_not_found(format!("view {}", id))?;

    Ok(Json(ApiResponse::success(view_response(state, id, &expanded, &rows))))
}

/// POST /api/view/create
pub async fn create_view(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
) -> AppResult<Json<ApiResponse<ViewResponse>>> {
    let rows = current_rows(&state, &db).await?;
    let expanded = ExpansionState::fully_expanded(&rows);
    let id = state.views.create(expanded.clone());
    tracing::debug!(view = %id, rows = rows.len(), "view created");

    Ok(Json(ApiResponse::success(view_response(&state, id, &expanded, &rows))))
}

/// GET /api/view/rows
pub async fn get_rows(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Query(query): Query<ViewQuery>,
) -> AppResult<Json<ApiResponse<ViewResponse>>> {
    update_view(&state, &db, query.id, |_, _| {}).await
}

/// POST /api/view/toggle
pub async fn toggle(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Json(req): Json<ToggleRequest>,
) -> AppResult<Json<ApiResponse<ViewResponse>>> {
    let dept_id = req.dept_id;
    update_view(&state, &db, req.id, move |expanded, _| {
        let now_expanded = expanded.toggle(dept_id);
        tracing::debug!(dept_id, now_expanded, "view toggled");
    })
    .await
}

/// POST /api/view/expand-all
pub async fn expand_all(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Json(query): Json<ViewQuery>,
) -> AppResult<Json<ApiResponse<ViewResponse>>> {
    update_view(&state, &db, query.id, |expanded, rows| expanded.expand_all(rows)).await
}

/// POST /api/view/collapse-all
pub async fn collapse_all(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Json(query): Json<ViewQuery>,
) -> AppResult<Json<ApiResponse<ViewResponse>>> {
    update_view(&state, &db, query.id, |expanded, _| expanded.collapse_all()).await
}

/// POST /api/view/delete
pub async fn delete_view(
    State(state): State<AppState>,
    Json(query): Json<ViewQuery>,
) -> AppResult<Json<ApiResponse<()>>> {
    if !state.views.remove(&query.id) {
        return Err(AppError::NotFound(format!("view {}", query.id)));
    }
    Ok(Json(ApiResponse::success_msg("success")))
}
