//! Configuration handlers
//!
//! Returns public configuration settings to the frontend

use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::state::AppState;

/// Public configuration response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    /// Separator used in department display paths
    pub path_separator: String,
    /// Pixels of indentation per tree level
    pub indent_px: u32,
}

/// GET /api/config
pub async fn get_config(State(state): State<AppState>) -> Json<PublicConfig> {
    Json(PublicConfig {
        path_separator: state.config.tree.path_separator.clone(),
        indent_px: state.config.tree.indent_px,
    })
}
