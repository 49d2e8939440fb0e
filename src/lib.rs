//! Orgdesk - department hierarchy administration
//!
//! The [`tree`] module holds the pure hierarchy logic (build, flatten,
//! visibility, path resolution). The remaining modules wrap it in an HTTP
//! service backed by a relational store.

pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod tree;
pub mod view;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
