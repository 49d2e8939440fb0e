//! Department handlers
//!
//! CRUD on the department table plus the hierarchy views built from it.
//! Every request reads the list fresh and rebuilds the tree; nothing is cached.

use axum::{
    extract::{Query, State},
    response::Json,
    Extension,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, QueryOrder, Select, Set, Statement, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entity::department;
use crate::entity::op_log::{OpResult, OpType};
use crate::error::{AppError, AppResult, OptionExt};
use crate::handlers::audit::service::log_operation;
use crate::middleware::{DbConn, Operator};
use crate::routes::ApiResponse;
use crate::state::AppState;
use crate::tree::{
    self, display_path, flatten, path_options, resolve_display_path, resolve_name, resolve_path,
    DepartmentRecord, DeptId, FlatRow, Forest, PathMatch, PathOption, RawDepartment, TreeNode,
    ROOT_PARENT,
};

const MAX_NAME_CHARS: usize = 32;

/// Add department request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDepartmentRequest {
    pub name: String,
    pub parent_id: Option<DeptId>,
    pub order: Option<i32>,
    pub status: Option<i32>,
}

/// Update department request; omitted fields keep their current value
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDepartmentRequest {
    pub id: DeptId,
    pub name: String,
    pub parent_id: Option<DeptId>,
    pub order: Option<i32>,
    pub status: Option<i32>,
}

/// Department response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentResponse {
    pub id: DeptId,
    pub name: String,
    pub parent_id: DeptId,
    pub parent_name: String,
    pub order: i32,
    pub status: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<department::Model> for DepartmentResponse {
    fn from(m: department::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            parent_id: m.parent_id,
            parent_name: m.parent_name,
            order: m.sort_order,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Optional list filters
#[derive(Debug, Default, Deserialize)]
pub struct DepartmentFilter {
    /// Substring of the department name
    pub name: Option<String>,
    pub status: Option<i32>,
}

impl DepartmentFilter {
    fn is_empty(&self) -> bool {
        self.name.as_deref().map_or(true, |n| n.trim().is_empty()) && self.status.is_none()
    }
}

/// Query parameters carrying a department id
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: DeptId,
}

/// A flattened row plus its rendered indentation
#[derive(Debug, Serialize)]
pub struct RowResponse {
    #[serde(flatten)]
    pub row: FlatRow,
    /// depth * indent unit, in pixels
    pub indent: u32,
}

pub(crate) fn render_rows<'a>(
    rows: impl IntoIterator<Item = &'a FlatRow>,
    indent_px: u32,
) -> Vec<RowResponse> {
    rows.into_iter()
        .map(|row| RowResponse {
            indent: u32::try_from(row.depth)
                .unwrap_or(u32::MAX)
                .saturating_mul(indent_px),
            row: row.clone(),
        })
        .collect()
}

fn filtered_query(filter: &DepartmentFilter) -> Select<department::Entity> {
    let mut query = department::Entity::find();
    if let Some(name) = filter.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        query = query.filter(department::Column::Name.contains(name));
    }
    if let Some(status) = filter.status {
        query = query.filter(department::Column::Status.eq(status));
    }
    query.order_by_asc(department::Column::Id)
}

/// Fetch the department list as tree records
pub(crate) async fn fetch_records<C: ConnectionTrait>(
    db: &C,
    filter: &DepartmentFilter,
) -> AppResult<Vec<DepartmentRecord>> {
    let models = filtered_query(filter).all(db).await?;
    Ok(models.into_iter().map(DepartmentRecord::from).collect())
}

/// Fetch and build the (optionally filtered) forest
pub(crate) async fn load_forest<C: ConnectionTrait>(
    state: &AppState,
    db: &C,
    filter: &DepartmentFilter,
) -> AppResult<Forest> {
    let records = fetch_records(db, filter).await?;
    let filtered = !filter.is_empty();
    if filtered {
        tracing::debug!(matches = records.len(), "filtered department list");
    }
    Ok(state
        .tree_builder()
        .orphans_expected(filtered)
        .build(records)?)
}

/// Open a transaction that holds off other department mutations until it ends
///
/// The tree checks and the write then see the same rows. Plain reads are not
/// blocked.
async fn begin_mutation(db: &DatabaseConnection) -> Result<DatabaseTransaction, DbErr> {
    let txn = db.begin().await?;
    // PostgreSQL specific
    txn.execute(Statement::from_string(
        txn.get_database_backend(),
        "LOCK TABLE org_department IN SHARE ROW EXCLUSIVE MODE".to_string(),
    ))
    .await?;
    Ok(txn)
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("department name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Validation(format!(
            "department name must not exceed {} characters",
            MAX_NAME_CHARS
        )));
    }
    Ok(name.to_string())
}

fn validate_status(status: i32) -> AppResult<i32> {
    match status {
        department::STATUS_DISABLED | department::STATUS_ENABLED => Ok(status),
        other => Err(AppError::Validation(format!("unknown status: {}", other))),
    }
}

/// Fails with a conflict when another child of `parent_id` already uses `name`
fn check_sibling_name(
    forest: &Forest,
    name: &str,
    parent_id: DeptId,
    exclude: Option<DeptId>,
) -> AppResult<()> {
    let siblings: &[TreeNode] = if parent_id == ROOT_PARENT {
        &forest.roots
    } else {
        tree::find(&forest.roots, parent_id).map_or(&[][..], |parent| parent.children.as_slice())
    };

    let taken = siblings
        .iter()
        .filter(|node| node.record.parent_id == parent_id && Some(node.id()) != exclude)
        .any(|node| node.name() == name);
    if taken {
        return Err(AppError::Conflict(format!(
            "department name already exists: {}",
            name
        )));
    }
    Ok(())
}

/// A department cannot become its own parent or move below one of its descendants
fn check_move(forest: &Forest, id: DeptId, parent_id: DeptId) -> AppResult<()> {
    if parent_id == id {
        return Err(AppError::Validation(
            "a department cannot be its own parent".to_string(),
        ));
    }
    if parent_id != ROOT_PARENT && tree::is_within(&forest.roots, id, parent_id) {
        return Err(AppError::Validation(
            "a department cannot be moved under its own sub-department".to_string(),
        ));
    }
    Ok(())
}

/// Only departments nothing declares as its parent can be deleted
fn check_deletable(forest: &Forest, id: DeptId) -> AppResult<()> {
    tree::find(&forest.roots, id).ok_or_not_found(format!("department {}", id))?;
    let has_children = tree::walk(&forest.roots)
        .any(|node| node.record.parent_id == id && node.id() != id);
    if has_children {
        return Err(AppError::Conflict(
            "department still has sub-departments".to_string(),
        ));
    }
    Ok(())
}

/// Display path stored as `parent_name`; empty for top-level departments
fn parent_path(forest: &Forest, parent_id: DeptId, separator: &str) -> AppResult<String> {
    if parent_id == ROOT_PARENT {
        return Ok(String::new());
    }
    display_path(parent_id, &forest.roots, separator)
        .ok_or_not_found(format!("parent department {}", parent_id))
}

/// Descendants of `id` whose stored `parentName` no longer matches the tree
fn stale_parent_paths(
    forest: &Forest,
    id: DeptId,
    separator: &str,
) -> AppResult<Vec<(DeptId, String)>> {
    let Some(root) = tree::find(&forest.roots, id) else {
        return Ok(Vec::new());
    };

    let mut stale = Vec::new();
    for node in root.iter().skip(1) {
        let expected = parent_path(forest, node.record.parent_id, separator)?;
        let current = node
            .record
            .attrs
            .get("parentName")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if current != expected {
            stale.push((node.id(), expected));
        }
    }
    Ok(stale)
}

fn log_desc(parent_name: &str, name: &str, separator: &str) -> String {
    if parent_name.is_empty() {
        format!("department: {}", name)
    } else {
        format!("department: {}{}{}", parent_name, separator, name)
    }
}

/// Record a refused mutation in the op log and hand the error back
fn log_failure(operator: &Operator, op_type: OpType, target: &str, err: AppError) -> AppError {
    tracing::warn!(op = op_type.as_str(), department = target, error = %err, "department change refused");
    log_operation(
        operator,
        op_type,
        &format!("department: {} ({})", target, err),
        None,
        OpResult::Failed,
    );
    err
}

async fn create_department(
    state: &AppState,
    db: &DatabaseConnection,
    req: AddDepartmentRequest,
) -> AppResult<department::Model> {
    let name = validate_name(&req.name)?;
    let status = validate_status(req.status.unwrap_or(department::STATUS_ENABLED))?;
    let parent_id = req.parent_id.unwrap_or(ROOT_PARENT);
    if parent_id < ROOT_PARENT {
        return Err(AppError::Validation(format!("invalid parent id: {}", parent_id)));
    }

    let txn = begin_mutation(db).await?;
    let forest = load_forest(state, &txn, &DepartmentFilter::default()).await?;
    check_sibling_name(&forest, &name, parent_id, None)?;
    let parent_name = parent_path(&forest, parent_id, state.path_separator())?;

    let now = chrono::Utc::now().timestamp();
    let new_dept = department::ActiveModel {
        name: Set(name),
        parent_id: Set(parent_id),
        parent_name: Set(parent_name),
        sort_order: Set(req.order.unwrap_or(0)),
        status: Set(status),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let dept = new_dept.insert(&txn).await?;
    txn.commit().await?;
    Ok(dept)
}

/// POST /api/department/add
pub async fn add_department(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(operator): Extension<Operator>,
    Json(req): Json<AddDepartmentRequest>,
) -> AppResult<Json<ApiResponse<DepartmentResponse>>> {
    let target = req.name.trim().to_string();
    let dept = create_department(&state, &db, req)
        .await
        .map_err(|err| log_failure(&operator, OpType::CreateDept, &target, err))?;

    tracing::info!(id = dept.id, parent_id = dept.parent_id, "department created");
    log_operation(
        &operator,
        OpType::CreateDept,
        &log_desc(&dept.parent_name, &dept.name, state.path_separator()),
        None,
        OpResult::Success,
    );
    Ok(Json(ApiResponse::success(DepartmentResponse::from(dept))))
}

struct Updated {
    dept: department::Model,
    old_value: String,
    refreshed: usize,
}

async fn modify_department(
    state: &AppState,
    db: &DatabaseConnection,
    req: UpdateDepartmentRequest,
) -> AppResult<Updated> {
    let name = validate_name(&req.name)?;

    let txn = begin_mutation(db).await?;
    let existing = department::Entity::find_by_id(req.id)
        .one(&txn)
        .await?
        .ok_or_not_found(format!("department {}", req.id))?;

    let parent_id = req.parent_id.unwrap_or(existing.parent_id);
    let status = validate_status(req.status.unwrap_or(existing.status))?;

    let forest = load_forest(state, &txn, &DepartmentFilter::default()).await?;
    check_move(&forest, req.id, parent_id)?;
    check_sibling_name(&forest, &name, parent_id, Some(req.id))?;
    let parent_name = parent_path(&forest, parent_id, state.path_separator())?;

    let old_value = existing.describe();
    let order = req.order.unwrap_or(existing.sort_order);

    let mut active: department::ActiveModel = existing.into();
    active.name = Set(name);
    active.parent_id = Set(parent_id);
    active.parent_name = Set(parent_name);
    active.sort_order = Set(order);
    active.status = Set(status);
    active.updated_at = Set(chrono::Utc::now().timestamp());

    let dept = active.update(&txn).await?;
    let refreshed = refresh_descendant_paths(state, &txn, dept.id).await?;
    txn.commit().await?;

    Ok(Updated {
        dept,
        old_value,
        refreshed,
    })
}

/// POST /api/department/update
pub async fn update_department(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(operator): Extension<Operator>,
    Json(req): Json<UpdateDepartmentRequest>,
) -> AppResult<Json<ApiResponse<DepartmentResponse>>> {
    let target = format!("{} (id {})", req.name.trim(), req.id);
    let Updated {
        dept,
        old_value,
        refreshed,
    } = modify_department(&state, &db, req)
        .await
        .map_err(|err| log_failure(&operator, OpType::UpdateDept, &target, err))?;

    tracing::info!(id = dept.id, parent_id = dept.parent_id, refreshed, "department updated");
    log_operation(
        &operator,
        OpType::UpdateDept,
        &log_desc(&dept.parent_name, &dept.name, state.path_separator()),
        Some(old_value),
        OpResult::Success,
    );
    Ok(Json(ApiResponse::success(DepartmentResponse::from(dept))))
}

/// Rewrite stale `parent_name` values below a renamed or moved department
async fn refresh_descendant_paths<C: ConnectionTrait>(
    state: &AppState,
    db: &C,
    id: DeptId,
) -> AppResult<usize> {
    let forest = load_forest(state, db, &DepartmentFilter::default()).await?;
    let stale = stale_parent_paths(&forest, id, state.path_separator())?;

    let now = chrono::Utc::now().timestamp();
    let refreshed = stale.len();
    for (dept_id, parent_name) in stale {
        path_refresh(dept_id, parent_name, now).update(db).await?;
    }
    Ok(refreshed)
}

/// Partial update rewriting one stored parent path
fn path_refresh(id: DeptId, parent_name: String, now: i64) -> department::ActiveModel {
    department::ActiveModel {
        id: Set(id),
        parent_name: Set(parent_name),
        updated_at: Set(now),
        ..Default::default()
    }
}

async fn remove_department(
    state: &AppState,
    db: &DatabaseConnection,
    id: DeptId,
) -> AppResult<department::Model> {
    let txn = begin_mutation(db).await?;
    let forest = load_forest(state, &txn, &DepartmentFilter::default()).await?;
    check_deletable(&forest, id)?;

    let dept = department::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_not_found(format!("department {}", id))?;
    department::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;
    Ok(dept)
}

/// POST /api/department/delete
pub async fn delete_department(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(operator): Extension<Operator>,
    Query(query): Query<IdQuery>,
) -> AppResult<Json<ApiResponse<()>>> {
    let dept = remove_department(&state, &db, query.id)
        .await
        .map_err(|err| {
            log_failure(&operator, OpType::DeleteDept, &format!("id {}", query.id), err)
        })?;

    tracing::info!(id = query.id, "department deleted");
    log_operation(
        &operator,
        OpType::DeleteDept,
        &log_desc(&dept.parent_name, &dept.name, state.path_separator()),
        Some(dept.describe()),
        OpResult::Success,
    );
    Ok(Json(ApiResponse::success_msg("success")))
}

/// GET /api/department/query
pub async fn get_departments(
    Extension(db): Extension<DbConn>,
    Extension(operator): Extension<Operator>,
    Query(filter): Query<DepartmentFilter>,
) -> AppResult<Json<ApiResponse<Vec<DepartmentResponse>>>> {
    let depts = filtered_query(&filter).all(&*db).await?;
    log_operation(&operator, OpType::QueryDept, "", None, OpResult::Success);
    Ok(Json(ApiResponse::success(
        depts.into_iter().map(DepartmentResponse::from).collect(),
    )))
}

/// GET /api/department/tree
pub async fn get_tree(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Query(filter): Query<DepartmentFilter>,
) -> AppResult<Json<ApiResponse<Forest>>> {
    let forest = load_forest(&state, &*db, &filter).await?;
    Ok(Json(ApiResponse::success(forest)))
}

/// GET /api/department/flat
pub async fn get_flat(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Query(filter): Query<DepartmentFilter>,
) -> AppResult<Json<ApiResponse<Vec<RowResponse>>>> {
    let forest = load_forest(&state, &*db, &filter).await?;
    let rows = flatten(&forest.roots);
    Ok(Json(ApiResponse::success(render_rows(
        &rows,
        state.config.tree.indent_px,
    ))))
}

#[derive(Debug, Serialize)]
pub struct PathResponse {
    pub id: DeptId,
    pub names: Vec<String>,
    pub path: String,
}

/// GET /api/department/path
pub async fn get_path(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Query(query): Query<IdQuery>,
) -> AppResult<Json<ApiResponse<PathResponse>>> {
    let forest = load_forest(&state, &*db, &DepartmentFilter::default()).await?;
    let names = resolve_path(query.id, &forest.roots)
        .ok_or_not_found(format!("department {}", query.id))?;
    let path = names.join(state.path_separator());
    Ok(Json(ApiResponse::success(PathResponse {
        id: query.id,
        names,
        path,
    })))
}

/// GET /api/department/options
pub async fn get_options(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
) -> AppResult<Json<ApiResponse<Vec<PathOption>>>> {
    let forest = load_forest(&state, &*db, &DepartmentFilter::default()).await?;
    Ok(Json(ApiResponse::success(path_options(
        &forest.roots,
        state.path_separator(),
    ))))
}

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    /// Full display path, e.g. "HQ / Eng"
    pub path: Option<String>,
    /// Leaf name only
    pub name: Option<String>,
}

/// GET /api/department/resolve
pub async fn resolve(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Query(query): Query<ResolveQuery>,
) -> AppResult<Json<ApiResponse<PathMatch>>> {
    let forest = load_forest(&state, &*db, &DepartmentFilter::default()).await?;
    let found = match (query.path.as_deref(), query.name.as_deref()) {
        (Some(path), _) => resolve_display_path(path, &forest.roots, state.path_separator()),
        (None, Some(name)) => resolve_name(name, &forest.roots),
        (None, None) => {
            return Err(AppError::BadRequest(
                "either path or name is required".to_string(),
            ))
        }
    };
    Ok(Json(ApiResponse::success(found)))
}

#[derive(Debug, Serialize)]
pub struct BuildResponse {
    #[serde(flatten)]
    pub forest: Forest,
    pub rows: Vec<RowResponse>,
}

/// POST /api/department/build
///
/// Builds a tree from a client-supplied flat list without touching the store.
/// Records without a usable id still show up, as roots.
pub async fn build_from_list(
    State(state): State<AppState>,
    Json(records): Json<Vec<RawDepartment>>,
) -> AppResult<Json<ApiResponse<BuildResponse>>> {
    let forest = state.tree_builder().build_raw(records)?;
    let rows = render_rows(&flatten(&forest.roots), state.config.tree.indent_px);
    Ok(Json(ApiResponse::success(BuildResponse { forest, rows })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::IntoResponse};
    use tokio_test::{assert_err, assert_ok};

    fn org() -> Forest {
        tree::TreeBuilder::new()
            .build(vec![
                DepartmentRecord::new(1, 0, "HQ", 1),
                DepartmentRecord::new(2, 1, "Eng", 1).with_attr("parentName", "HQ"),
                DepartmentRecord::new(3, 1, "Sales", 2).with_attr("parentName", "HQ"),
                DepartmentRecord::new(4, 2, "Platform", 1).with_attr("parentName", "HQ / Eng"),
                DepartmentRecord::new(5, 0, "Branch", 2),
            ])
            .unwrap()
    }

    fn status_of<T: std::fmt::Debug>(result: AppResult<T>) -> StatusCode {
        result.unwrap_err().into_response().status()
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Eng ").unwrap(), "Eng");
        assert!(matches!(validate_name("   "), Err(AppError::Validation(_))));
        assert!(validate_name(&"x".repeat(32)).is_ok());
        assert!(validate_name(&"x".repeat(33)).is_err());
        // counted in characters, not bytes
        assert!(validate_name(&"部".repeat(32)).is_ok());
    }

    #[test]
    fn test_validate_status() {
        assert_ok!(validate_status(department::STATUS_ENABLED));
        assert_ok!(validate_status(department::STATUS_DISABLED));
        assert_err!(validate_status(7));
    }

    #[test]
    fn test_parent_path() {
        let forest = tree::TreeBuilder::new()
            .build(vec![
                DepartmentRecord::new(1, 0, "HQ", 1),
                DepartmentRecord::new(2, 1, "Eng", 1),
            ])
            .unwrap();
        assert_eq!(parent_path(&forest, 0, " / ").unwrap(), "");
        assert_eq!(parent_path(&forest, 2, " / ").unwrap(), "HQ / Eng");
        assert!(matches!(
            parent_path(&forest, 9, " / "),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_render_rows_indent() {
        let forest = tree::build_tree(vec![
            DepartmentRecord::new(1, 0, "HQ", 1),
            DepartmentRecord::new(2, 1, "Eng", 1),
        ]);
        let rows = flatten(&forest);
        let rendered = render_rows(&rows, 24);
        assert_eq!(rendered[0].indent, 0);
        assert_eq!(rendered[1].indent, 24);

        let value = serde_json::to_value(&rendered[1]).unwrap();
        assert_eq!(value["depth"], 1);
        assert_eq!(value["parent"], 1);
        assert_eq!(value["name"], "Eng");
    }

    #[test]
    fn test_filter_is_empty() {
        assert!(DepartmentFilter::default().is_empty());
        let filter = DepartmentFilter {
            name: Some(" ".to_string()),
            status: None,
        };
        assert!(filter.is_empty());
        let filter = DepartmentFilter {
            name: None,
            status: Some(1),
        };
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_sibling_name_conflict() {
        let forest = org();
        assert_eq!(
            status_of(check_sibling_name(&forest, "Sales", 1, None)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(check_sibling_name(&forest, "Branch", ROOT_PARENT, None)),
            StatusCode::CONFLICT
        );
        // renaming a department to its own name is fine
        assert_ok!(check_sibling_name(&forest, "Sales", 1, Some(3)));
        // same name under another parent is fine
        assert_ok!(check_sibling_name(&forest, "Platform", 1, None));
        assert_ok!(check_sibling_name(&forest, "Eng", 5, None));
    }

    #[test]
    fn test_orphan_root_does_not_block_top_level_name() {
        let forest = tree::TreeBuilder::new()
            .build(vec![
                DepartmentRecord::new(1, 0, "HQ", 1),
                DepartmentRecord::new(9, 42, "Lost", 2),
            ])
            .unwrap();
        assert_ok!(check_sibling_name(&forest, "Lost", ROOT_PARENT, None));
    }

    #[test]
    fn test_move_rules() {
        let forest = org();
        assert_eq!(status_of(check_move(&forest, 2, 2)), StatusCode::BAD_REQUEST);
        // 4 sits below 2
        assert_eq!(status_of(check_move(&forest, 2, 4)), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(check_move(&forest, 1, 4)), StatusCode::BAD_REQUEST);
        assert_ok!(check_move(&forest, 4, 3));
        assert_ok!(check_move(&forest, 2, 5));
        assert_ok!(check_move(&forest, 4, ROOT_PARENT));
    }

    #[test]
    fn test_delete_rules() {
        let forest = org();
        assert_eq!(status_of(check_deletable(&forest, 2)), StatusCode::CONFLICT);
        assert_eq!(status_of(check_deletable(&forest, 1)), StatusCode::CONFLICT);
        assert_eq!(status_of(check_deletable(&forest, 99)), StatusCode::NOT_FOUND);
        assert_ok!(check_deletable(&forest, 4));
        assert_ok!(check_deletable(&forest, 5));
    }

    #[test]
    fn test_unknown_parent_is_not_found() {
        assert_eq!(
            status_of(parent_path(&org(), 42, " / ")),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_stale_paths_after_rename() {
        // Eng (2) was renamed to Engineering; its child still stores the old path
        let forest = tree::TreeBuilder::new()
            .build(vec![
                DepartmentRecord::new(1, 0, "HQ", 1),
                DepartmentRecord::new(2, 1, "Engineering", 1).with_attr("parentName", "HQ"),
                DepartmentRecord::new(4, 2, "Platform", 1).with_attr("parentName", "HQ / Eng"),
                DepartmentRecord::new(6, 4, "Core", 1)
                    .with_attr("parentName", "HQ / Eng / Platform"),
            ])
            .unwrap();

        let stale = stale_parent_paths(&forest, 2, " / ").unwrap();
        assert_eq!(
            stale,
            vec![
                (4, "HQ / Engineering".to_string()),
                (6, "HQ / Engineering / Platform".to_string()),
            ]
        );
    }

    #[test]
    fn test_stale_paths_after_move() {
        // Eng (2) moved under Branch (5)
        let forest = tree::TreeBuilder::new()
            .build(vec![
                DepartmentRecord::new(1, 0, "HQ", 1),
                DepartmentRecord::new(5, 0, "Branch", 2),
                DepartmentRecord::new(2, 5, "Eng", 1).with_attr("parentName", "Branch"),
                DepartmentRecord::new(4, 2, "Platform", 1).with_attr("parentName", "HQ / Eng"),
            ])
            .unwrap();

        let stale = stale_parent_paths(&forest, 2, " / ").unwrap();
        assert_eq!(stale, vec![(4, "Branch / Eng".to_string())]);
        assert!(stale_parent_paths(&org(), 1, " / ").unwrap().is_empty());
        assert!(stale_parent_paths(&org(), 99, " / ").unwrap().is_empty());
    }

    #[test]
    fn test_path_refresh_touches_updated_at() {
        let active = path_refresh(4, "HQ / Engineering".to_string(), 1_700_000_500);
        assert_eq!(active.id, Set(4));
        assert_eq!(active.parent_name, Set("HQ / Engineering".to_string()));
        assert_eq!(active.updated_at, Set(1_700_000_500));
        assert!(active.name.is_not_set());
        assert!(active.sort_order.is_not_set());
    }

    #[test]
    fn test_failure_passes_error_through() {
        let operator = Operator {
            name: "alice".to_string(),
            ip: None,
        };
        let err = log_failure(
            &operator,
            OpType::DeleteDept,
            "id 2",
            AppError::Conflict("department still has sub-departments".to_string()),
        );
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_log_desc() {
        assert_eq!(log_desc("", "HQ", "/"), "department: HQ");
        assert_eq!(log_desc("HQ", "Eng", "/"), "department: HQ/Eng");
    }
}
