use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;
use crate::tree::TreeBuilder;
use crate::view::ViewStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
    /// Application configuration
    pub config: Arc<Config>,
    /// Expansion views
    pub views: Arc<ViewStore>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let views = ViewStore::new(config.tree.view_ttl_secs);
        Self {
            db,
            config: Arc::new(config),
            views: Arc::new(views),
        }
    }

    /// Tree builder configured from `[tree]`
    pub fn tree_builder(&self) -> TreeBuilder {
        TreeBuilder::new().duplicate_policy(self.config.tree.duplicate_policy)
    }

    pub fn path_separator(&self) -> &str {
        &self.config.tree.path_separator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{DepartmentRecord, DuplicatePolicy};

    #[test]
    fn test_builder_follows_config() {
        let mut config = Config::default();
        config.tree.duplicate_policy = DuplicatePolicy::Reject;
        let state = AppState::new(DatabaseConnection::Disconnected, config);

        let result = state.tree_builder().build(vec![
            DepartmentRecord::new(1, 0, "a", 1),
            DepartmentRecord::new(1, 0, "b", 1),
        ]);
        assert!(result.is_err());
        assert_eq!(state.path_separator(), " / ");
    }
}
