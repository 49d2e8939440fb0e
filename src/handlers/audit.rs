//! Audit log handlers
//!
//! Operation log query, plus the background writer that records mutations

use axum::{extract::Query, response::Json, Extension};
use sea_orm::{EntityTrait, PaginatorTrait, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};

use crate::entity::op_log;
use crate::error::AppResult;
use crate::middleware::DbConn;
use crate::routes::ApiResponse;

/// Query parameters for log pagination
#[derive(Debug, Deserialize)]
pub struct LogQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(rename = "pageSize", default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    10
}

impl LogQuery {
    /// (offset, limit) with page >= 1 and 1 <= page size <= 100
    fn window(&self) -> (u64, u64) {
        let page = self.page.max(1) as u64;
        let page_size = self.page_size.clamp(1, 100) as u64;
        ((page - 1) * page_size, page_size)
    }
}

/// Log response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogResponse {
    pub id: i64,
    pub op_time: i64,
    pub operator: String,
    pub op_type: String,
    pub op_desc: String,
    pub old_value: String,
    pub result: String,
    pub ip: String,
}

impl From<op_log::Model> for LogResponse {
    fn from(m: op_log::Model) -> Self {
        Self {
            id: m.id,
            op_time: m.op_time,
            operator: m.operator,
            op_type: m.op_type,
            op_desc: m.op_desc,
            old_value: m.old_value.unwrap_or_default(),
            result: m.result,
            ip: m.ip.unwrap_or_default(),
        }
    }
}

/// Query response with pagination
#[derive(Debug, Serialize)]
pub struct LogQueryResponse {
    pub logs: Vec<LogResponse>,
    pub total: u64,
}

/// GET /api/oplog/query
pub async fn query_oplog(
    Extension(db): Extension<DbConn>,
    Query(query): Query<LogQuery>,
) -> AppResult<Json<ApiResponse<LogQueryResponse>>> {
    let (offset, limit) = query.window();

    let logs = op_log::Entity::find()
        .order_by_desc(op_log::Column::Id)
        .offset(offset)
        .limit(limit)
        .all(&*db)
        .await?
        .into_iter()
        .map(LogResponse::from)
        .collect();

    let total = op_log::Entity::find().count(&*db).await?;

    Ok(Json(ApiResponse::success(LogQueryResponse { logs, total })))
}

/// Service for adding operation logs
pub mod service {
    use sea_orm::{ActiveModelTrait, Set};
    use tokio::sync::mpsc;

    use crate::entity::op_log::{self, OpResult, OpType};
    use crate::middleware::Operator;

    /// Log entry to be added
    #[derive(Debug, Clone)]
    pub struct LogEntry {
        pub operator: String,
        pub op_type: OpType,
        pub op_desc: String,
        pub old_value: Option<String>,
        pub result: OpResult,
        pub ip: Option<String>,
    }

    /// Global log channel
    static LOG_TX: std::sync::OnceLock<mpsc::Sender<LogEntry>> = std::sync::OnceLock::new();

    /// Initialize the audit log service
    /// This function is idempotent - calling it multiple times is safe
    pub fn init(db: sea_orm::DatabaseConnection) {
        if LOG_TX.get().is_some() {
            tracing::debug!("Audit log service already initialized, skipping");
            return;
        }

        let (tx, mut rx) = mpsc::channel::<LogEntry>(200);
        if LOG_TX.set(tx).is_err() {
            tracing::debug!("Audit log service initialized by another thread");
            return;
        }

        tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                let log = op_log::ActiveModel {
                    op_time: Set(chrono::Utc::now().timestamp()),
                    operator: Set(entry.operator),
                    op_type: Set(entry.op_type.as_str().to_string()),
                    op_desc: Set(entry.op_desc),
                    old_value: Set(entry.old_value),
                    result: Set(entry.result.as_str().to_string()),
                    ip: Set(entry.ip),
                    ..Default::default()
                };

                if let Err(e) = log.insert(&db).await {
                    tracing::error!("Failed to log operation: {}", e);
                }
            }
        });
    }

    /// Add an operation log entry
    pub fn add_log(entry: LogEntry) {
        if let Some(tx) = LOG_TX.get() {
            if tx.try_send(entry).is_err() {
                tracing::warn!("Log channel is full, operation log dropped");
            }
        } else {
            tracing::warn!(
                "Audit log service not initialized, log dropped: {} - {}",
                entry.op_type.as_str(),
                entry.op_desc
            );
        }
    }

    /// Record an operation performed by `operator`
    pub fn log_operation(
        operator: &Operator,
        op_type: OpType,
        op_desc: &str,
        old_value: Option<String>,
        result: OpResult,
    ) {
        add_log(LogEntry {
            operator: operator.name.clone(),
            op_type,
            op_desc: op_desc.to_string(),
            old_value,
            result,
            ip: operator.ip.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_window() {
        let query = LogQuery { page: 3, page_size: 20 };
        assert_eq!(query.window(), (40, 20));

        let query = LogQuery { page: 0, page_size: 1000 };
        assert_eq!(query.window(), (0, 100));
    }

    #[test]
    fn test_log_response_defaults() {
        let model = op_log::Model {
            id: 1,
            op_time: 10,
            operator: "alice".to_string(),
            op_type: "create department".to_string(),
            op_desc: "department: HQ".to_string(),
            old_value: None,
            result: "success".to_string(),
            ip: None,
        };
        let response = LogResponse::from(model);
        assert_eq!(response.old_value, "");
        assert_eq!(response.ip, "");
    }
}
