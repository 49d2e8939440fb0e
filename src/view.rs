//! Server-held expansion views
//!
//! A view is one client's expansion set for the department table, keyed by a
//! UUID. Views live only in memory. A view idle past the configured TTL is
//! gone: lookups treat it as unknown and a background sweep drops it.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::tree::ExpansionState;

#[derive(Debug, Clone)]
struct View {
    expanded: ExpansionState,
    /// Unix seconds of the last read or write
    touched_at: i64,
}

#[derive(Debug, Default)]
pub struct ViewStore {
    views: DashMap<String, View>,
    ttl_secs: i64,
}

impl ViewStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            views: DashMap::new(),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    /// Store a new view and return its id
    pub fn create(&self, expanded: ExpansionState) -> String {
        let now = chrono::Utc::now().timestamp();
        let swept = self.sweep_expired(now);
        if swept > 0 {
            tracing::debug!("Swept {} idle views", swept);
        }

        let id = uuid::Uuid::new_v4().to_string();
        self.views.insert(
            id.clone(),
            View {
                expanded,
                touched_at: now,
            },
        );
        id
    }

    /// Run `f` on a view's expansion set, `None` if the view is unknown or
    /// has expired
    pub fn with_view<R>(&self, id: &str, f: impl FnOnce(&mut ExpansionState) -> R) -> Option<R> {
        let now = chrono::Utc::now().timestamp();
        if self
            .views
            .remove_if(id, |_, view| self.is_expired(view, now))
            .is_some()
        {
            tracing::debug!(view = %id, "view expired");
            return None;
        }

        let mut view = self.views.get_mut(id)?;
        view.touched_at = now;
        Some(f(&mut view.expanded))
    }

    fn is_expired(&self, view: &View, now: i64) -> bool {
        now.saturating_sub(view.touched_at) > self.ttl_secs
    }

    pub fn remove(&self, id: &str) -> bool {
        self.views.remove(id).is_some()
    }

    /// Drop views idle longer than the TTL; returns how many were dropped
    pub fn sweep_expired(&self, now: i64) -> usize {
        let before = self.views.len();
        self.views.retain(|_, view| !self.is_expired(view, now));
        before.saturating_sub(self.views.len())
    }

    /// Sweep period: half the TTL, between one second and one minute
    fn sweep_period(&self) -> Duration {
        let secs = u64::try_from(self.ttl_secs / 2).unwrap_or(0);
        Duration::from_secs(secs.clamp(1, 60))
    }

    /// Sweep expired views in the background for the life of the process
    pub fn start_sweeper(self: Arc<Self>) {
        let period = self.sweep_period();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let swept = self.sweep_expired(chrono::Utc::now().timestamp());
                if swept > 0 {
                    tracing::debug!("Swept {} idle views", swept);
                }
            }
        });
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
