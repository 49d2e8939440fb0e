//! Request context middleware
//!
//! Makes the database handle and the calling operator available to handlers
//! as request extensions.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use sea_orm::DatabaseConnection;
use std::ops::Deref;

use crate::state::AppState;

/// Header naming the operator for the audit log
pub const OPERATOR_HEADER: &str = "x-operator";

const ANONYMOUS: &str = "anonymous";

/// Database connection wrapper for use in handlers via Extension
#[derive(Clone)]
pub struct DbConn(pub DatabaseConnection);

impl Deref for DbConn {
    type Target = DatabaseConnection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Who is making the request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operator {
    pub name: String,
    pub ip: Option<String>,
}

impl Operator {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let name = headers
            .get(OPERATOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(ANONYMOUS)
            .chars()
            .take(64)
            .collect();

        let ip = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Self { name, ip }
    }
}

pub async fn context_layer(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let operator = Operator::from_headers(request.headers());
    request.extensions_mut().insert(DbConn(state.db.clone()));
    request.extensions_mut().insert(operator);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_operator_defaults_to_anonymous() {
        let operator = Operator::from_headers(&HeaderMap::new());
        assert_eq!(operator.name, "anonymous");
        assert_eq!(operator.ip, None);
    }

    #[test]
    fn test_operator_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(OPERATOR_HEADER, HeaderValue::from_static(" alice "));
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        let operator = Operator::from_headers(&headers);
        assert_eq!(operator.name, "alice");
        assert_eq!(operator.ip.as_deref(), Some("10.0.0.1"));
    }
}
