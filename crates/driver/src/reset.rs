//! Daily reset of the pipeline checkpoints.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Days, Utc};
use eyre::Result;
use primitives::CheckpointKey;
use store::Store;
use tracing::{info, warn};

use crate::task::Pipeline;

/// Time left until the next 00:00 UTC after `now`.
pub fn until_next_midnight(now: DateTime<Utc>) -> Duration {
    let next = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc());
    next.and_then(|next| (next - now).to_std().ok()).unwrap_or(Duration::from_secs(24 * 60 * 60))
}

/// Clears the paging checkpoints of every chain once a day so the recorder, valuation and
/// pool pipelines start over from the first page.
#[derive(derive_more::Debug)]
pub struct DailyReset {
    #[debug(skip)]
    store: Arc<dyn Store>,
    chain_ids: Vec<u64>,
    include_listener: bool,
}

impl DailyReset {
    /// Reset the checkpoints of `chain_ids`, including the listener ones if `include_listener`.
    pub fn new(store: Arc<dyn Store>, chain_ids: Vec<u64>, include_listener: bool) -> Self {
        Self { store, chain_ids, include_listener }
    }
}

#[async_trait]
impl Pipeline for DailyReset {
    fn name(&self) -> String {
        "daily-reset".to_owned()
    }

    fn interval(&self) -> Duration {
        until_next_midnight(Utc::now())
    }

    fn initial_delay(&self) -> Duration {
        until_next_midnight(Utc::now())
    }

    async fn run_once(&mut self) -> Result<()> {
        for &chain_id in &self.chain_ids {
            let keys = CheckpointKey::daily_reset(chain_id, self.include_listener);
            match self.store.delete_checkpoints(&keys).await {
                Ok(()) => info!(chain_id, keys = keys.len(), "Reset checkpoints"),
                Err(e) => warn!(chain_id, err = %e, "Failed to reset checkpoints"),
            }
        }
        Ok(())
    }
}
