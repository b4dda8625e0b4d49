use std::sync::Arc;

use gacha_domain::config::Config;

use crate::runtime::PullPipeline;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Verification, quotas, tier table and ticket pool, built once at
    /// startup.
    pub pipeline: Arc<PullPipeline>,
}
