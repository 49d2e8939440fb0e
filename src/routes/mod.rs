use axum::{
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers;
use crate::middleware::context_layer;
use crate::state::AppState;

pub mod health;

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: true,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: false,
            message: message.into(),
            data: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn success_msg(message: impl Into<String>) -> Self {
        Self {
            code: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Config routes
        .route("/config", get(handlers::config::get_config))
        // Department routes
        .route("/department/add", post(handlers::department::add_department))
        .route("/department/update", post(handlers::department::update_department))
        .route("/department/delete", post(handlers::department::delete_department))
        .route("/department/query", get(handlers::department::get_departments))
        .route("/department/tree", get(handlers::department::get_tree))
        .route("/department/flat", get(handlers::department::get_flat))
        .route("/department/path", get(handlers::department::get_path))
        .route("/department/options", get(handlers::department::get_options))
        .route("/department/resolve", get(handlers::department::resolve))
        .route("/department/build", post(handlers::department::build_from_list))
        // Expansion views
        .route("/view/create", post(handlers::view::create_view))
        .route("/view/rows", get(handlers::view::get_rows))
        .route("/view/toggle", post(handlers::view::toggle))
        .route("/view/expand-all", post(handlers::view::expand_all))
        .route("/view/collapse-all", post(handlers::view::collapse_all))
        .route("/view/delete", post(handlers::view::delete_view))
        // Audit log routes
        .route("/oplog/query", get(handlers::audit::query_oplog));

    Router::new()
        .nest("/api", api_routes)
        .fallback(fallback)
        .layer(middleware::from_fn_with_state(state.clone(), context_layer))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Fallback handler for 404
pub async fn fallback() -> (StatusCode, Json<ApiResponse<()>>) {
    (StatusCode::NOT_FOUND, Json(ApiResponse::error("Not Found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use sea_orm::DatabaseConnection;
    use tower::ServiceExt;

    use crate::config::Config;

    fn app() -> Router {
        create_router(AppState::new(DatabaseConnection::Disconnected, Config::default()))
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::get("/api/health").body(Body::empty()).unwrap();
        let (status, body) = call(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], true);
        assert_eq!(body["data"]["status"], "healthy");
    }

    #[tokio::test]
    async fn test_public_config() {
        let request = Request::get("/api/config").body(Body::empty()).unwrap();
        let (status, body) = call(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pathSeparator"], " / ");
        assert_eq!(body["indentPx"], 20);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let request = Request::get("/api/nope").body(Body::empty()).unwrap();
        let (status, body) = call(app(), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], false);
    }

    #[tokio::test]
    async fn test_build_from_client_list() {
        let payload = serde_json::json!([
            {"id": 1, "parentId": 0, "name": "HQ", "order": 1},
            {"id": "2", "parentId": "1", "name": "Eng", "order": 1},
            {"id": 3, "parentId": 1, "name": "Sales", "order": 2},
            {"id": 4, "parentId": 2, "name": "Platform", "order": 1},
            {"id": 5, "parentId": 77, "name": "Lost", "order": 9}
        ]);
        let request = Request::post("/api/department/build")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let (status, body) = call(app(), request).await;
        assert_eq!(status, StatusCode::OK);

        let data = &body["data"];
        assert_eq!(data["roots"][0]["name"], "HQ");
        assert_eq!(data["roots"][0]["children"][0]["children"][0]["name"], "Platform");
        assert_eq!(data["roots"][1]["name"], "Lost");
        assert_eq!(data["diagnostics"][0]["kind"], "orphan");

        let names: Vec<&str> = data["rows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["HQ", "Eng", "Platform", "Sales", "Lost"]);
        assert_eq!(data["rows"][2]["indent"], 40);
    }

    #[tokio::test]
    async fn test_build_rejects_duplicates_when_configured() {
        let mut config = Config::default();
        config.tree.duplicate_policy = crate::tree::DuplicatePolicy::Reject;
        let app = create_router(AppState::new(DatabaseConnection::Disconnected, config));

        let payload = serde_json::json!([
            {"id": 1, "name": "a"},
            {"id": 1, "name": "b"}
        ]);
        let request = Request::post("/api/department/build")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let (status, body) = call(app, request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"], "Duplicate department id: 1");
    }

    #[tokio::test]
    async fn test_build_keeps_records_without_id() {
        let payload = serde_json::json!([
            {"id": 1, "parentId": 0, "name": "HQ", "order": 1},
            {"parentId": 1, "name": "NoId", "order": 2}
        ]);
        let request = Request::post("/api/department/build")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let (status, body) = call(app(), request).await;
        assert_eq!(status, StatusCode::OK);

        let data = &body["data"];
        assert_eq!(data["roots"][0]["name"], "HQ");
        assert_eq!(data["roots"][1]["name"], "NoId");
        assert_eq!(data["roots"][1]["id"], -1);
        assert_eq!(data["diagnostics"][0]["kind"], "missingId");
        assert_eq!(data["diagnostics"][0]["position"], 1);
        assert_eq!(data["rows"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_delete_unknown_view() {
        let request = Request::post("/api/view/delete")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"id": "missing"}"#))
            .unwrap();
        let (status, _) = call(app(), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
