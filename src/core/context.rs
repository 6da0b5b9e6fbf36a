//! Per-request context passed to operation handlers and views

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Who is acting, and when
#[derive(Debug, Clone, Serialize)]
pub struct DashboardContext {
    pub request_date: DateTime<Utc>,
    pub user: Option<String>,
}

impl DashboardContext {
    /// Context stamped with the current time and no user
    pub fn now() -> Self {
        Self {
            request_date: Utc::now(),
            user: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

impl Default for DashboardContext {
    fn default() -> Self {
        Self::now()
    }
}
