//! Shared state for API handlers and constants

use std::{sync::Arc, time::Duration as StdDuration};

use store::Store;

/// Default maximum number of requests a client may make per rate limiting window.
pub const DEFAULT_MAX_REQUESTS: u64 = 50;
/// Default duration of the rate limiting window.
pub const DEFAULT_RATE_PERIOD: StdDuration = StdDuration::from_secs(60);
/// Lock records per listing page.
pub const LISTING_PAGE_SIZE: u64 = 100;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub(crate) store: Arc<dyn Store>,
    max_requests: u64,
    rate_period: StdDuration,
}

impl std::fmt::Debug for ApiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiState")
            .field("max_requests", &self.max_requests)
            .field("rate_period", &self.rate_period)
            .finish_non_exhaustive()
    }
}

impl ApiState {
    /// Create a new [`ApiState`].
    pub fn new(store: Arc<dyn Store>, max_requests: u64, rate_period: StdDuration) -> Self {
        Self { store, max_requests, rate_period }
    }

    /// Maximum number of requests allowed per [`Self::rate_period`].
    pub const fn max_requests(&self) -> u64 {
        self.max_requests
    }

    /// Time window for rate limiting.
    pub const fn rate_period(&self) -> StdDuration {
        self.rate_period
    }
}
