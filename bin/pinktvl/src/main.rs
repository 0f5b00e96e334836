//! Entrypoint.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use api::ApiState;
use clap::Parser;
use config::Opts;
use dotenvy::dotenv;
use driver::Driver;
use runtime::shutdown::{ShutdownSignal, drain};
use store::{ClickhouseStore, MemoryStore, Store};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::filter::EnvFilter;

/// Time given to the pipelines to wind down after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

async fn open_store(opts: &Opts) -> eyre::Result<Arc<dyn Store>> {
    if !opts.enable_db_writes {
        info!("Database writes disabled, keeping all state in memory (dry run)");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = ClickhouseStore::new(
        opts.clickhouse.url.clone(),
        opts.clickhouse.db.clone(),
        opts.clickhouse.username.clone(),
        opts.clickhouse.password.clone(),
    )?;
    store.init_db(opts.reset_db).await?;
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    if let Ok(custom_env_file) = std::env::var("ENV_FILE") {
        dotenvy::from_filename(custom_env_file)?;
    } else {
        // Try the default .env file, and ignore if it doesn't exist.
        dotenv().ok();
    }

    let opts = Opts::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    info!(chains = ?opts.indexer.chains, "PinkLock TVL indexer starting...");

    let store = open_store(&opts).await?;
    let cancel = CancellationToken::new();
    ShutdownSignal::new()?.cancel_on_signal(cancel.clone());

    let handles = Driver::new(opts.indexer.clone(), Arc::clone(&store)).spawn(&cancel);

    let addr: SocketAddr = format!("{}:{}", opts.api.host, opts.api.port).parse()?;
    let state = ApiState::new(
        store,
        opts.api.rate_limit_max_requests,
        Duration::from_secs(opts.api.rate_limit_period_secs),
    );
    let served = server::run(addr, state, opts.api.origins(), cancel.clone()).await;
    // A server failure takes the pipelines down with it.
    cancel.cancel();

    if !drain(handles, SHUTDOWN_GRACE).await {
        warn!("Some pipelines did not stop in time and were aborted");
    }
    info!("Shutdown complete");
    served
}
