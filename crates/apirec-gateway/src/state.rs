//! Shared handler state.

use apirec_recommender::RecommendationEngine;
use std::sync::Arc;
use std::time::Instant;

/// State handed to every route.
#[derive(Clone)]
pub struct AppState {
    /// Query engine.
    pub engine: Arc<RecommendationEngine>,

    /// Server start, for uptime reporting.
    pub started: Instant,
}

impl AppState {
    /// Wrap an engine.
    pub fn new(engine: RecommendationEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            started: Instant::now(),
        }
    }

    /// Seconds since start.
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
