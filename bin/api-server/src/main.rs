//! Read-only API server binary

use std::{net::SocketAddr, sync::Arc, time::Duration};

use api::ApiState;
use clap::Parser;
use config::ApiServerOpts;
use dotenvy::dotenv;
use runtime::shutdown::ShutdownSignal;
use store::ClickhouseStore;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::filter::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenv().ok();
    let opts = ApiServerOpts::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = ClickhouseStore::new(
        opts.clickhouse.url,
        opts.clickhouse.db,
        opts.clickhouse.username,
        opts.clickhouse.password,
    )?;

    let cancel = CancellationToken::new();
    ShutdownSignal::new()?.cancel_on_signal(cancel.clone());

    let addr: SocketAddr = format!("{}:{}", opts.api.host, opts.api.port).parse()?;
    let state = ApiState::new(
        Arc::new(store),
        opts.api.rate_limit_max_requests,
        Duration::from_secs(opts.api.rate_limit_period_secs),
    );
    server::run(addr, state, opts.api.origins(), cancel).await
}
