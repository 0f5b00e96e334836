//! PinkLock TVL indexer configuration
use clap::{ArgAction, Parser};
use url::Url;

pub mod chain;

pub use chain::{Chain, ChainConfig};

/// Origin allowed by CORS when none is configured.
pub const DEFAULT_ALLOWED_ORIGINS: &str = "https://www.pinksale.finance";

/// Clickhouse database configuration options
#[derive(Debug, Clone, Parser)]
pub struct ClickhouseOpts {
    /// Clickhouse URL
    #[clap(
        long = "clickhouse-url",
        env = "CLICKHOUSE_URL",
        default_value = "http://localhost:8123"
    )]
    pub url: Url,
    /// Clickhouse database
    #[clap(long = "clickhouse-db", env = "CLICKHOUSE_DB", default_value = "pinklock")]
    pub db: String,
    /// Clickhouse username
    #[clap(long = "clickhouse-username", env = "CLICKHOUSE_USERNAME", default_value = "default")]
    pub username: String,
    /// Clickhouse password
    #[clap(long = "clickhouse-password", env = "CLICKHOUSE_PASSWORD", default_value = "")]
    pub password: String,
}

/// HTTP API configuration options
#[derive(Debug, Clone, Parser)]
pub struct ApiOpts {
    /// API server host
    #[clap(long = "api-host", env = "API_HOST", default_value = "0.0.0.0")]
    pub host: String,
    /// API server port
    #[clap(long = "api-port", env = "PORT", default_value_t = 3000)]
    pub port: u16,
    /// Comma separated list of origins allowed by CORS
    #[clap(long, env = "ALLOWED_ORIGINS", default_value = DEFAULT_ALLOWED_ORIGINS)]
    pub allowed_origins: String,
    /// Maximum number of requests per client within one rate limit period
    #[clap(long, env = "RATE_LIMIT_MAX_REQUESTS", default_value_t = 50)]
    pub rate_limit_max_requests: u64,
    /// Rate limit period in seconds
    #[clap(long, env = "RATE_LIMIT_PERIOD_SECS", default_value_t = 60)]
    pub rate_limit_period_secs: u64,
}

/// Indexing pipeline configuration options
#[derive(Debug, Clone, Parser)]
pub struct IndexerOpts {
    /// Chains to index
    #[clap(
        long,
        env = "CHAINS",
        value_enum,
        value_delimiter = ',',
        default_values_t = Chain::production()
    )]
    pub chains: Vec<Chain>,
    /// Deadline for a single RPC call in seconds
    #[clap(long, env = "RPC_CALL_TIMEOUT_SECS", default_value_t = 30)]
    pub rpc_call_timeout_secs: u64,
    /// Value LP tokens held by presale pools
    #[clap(long, env = "ENABLE_POOL_TVL")]
    pub enable_pool_tvl: bool,
    /// Also clear listener checkpoints during the daily reset
    #[clap(long, env = "RESET_LISTENER_CHECKPOINTS")]
    pub reset_listener_checkpoints: bool,
}

/// CLI options for the PinkLock TVL indexer
#[derive(Debug, Clone, Parser)]
pub struct Opts {
    /// Clickhouse database configuration
    #[clap(flatten)]
    pub clickhouse: ClickhouseOpts,

    /// HTTP API configuration
    #[clap(flatten)]
    pub api: ApiOpts,

    /// Indexing pipeline configuration
    #[clap(flatten)]
    pub indexer: IndexerOpts,

    /// Persist to Clickhouse. When disabled everything is kept in memory (dry run).
    #[clap(long, env = "ENABLE_DB_WRITES", default_value_t = true, action = ArgAction::Set)]
    pub enable_db_writes: bool,

    /// If set, drop & re-create all tables (local/dev only)
    #[clap(long)]
    pub reset_db: bool,
}

/// CLI options for the standalone API server
#[derive(Debug, Clone, Parser)]
pub struct ApiServerOpts {
    /// Clickhouse database configuration
    #[clap(flatten)]
    pub clickhouse: ClickhouseOpts,

    /// HTTP API configuration
    #[clap(flatten)]
    pub api: ApiOpts,
}

impl ApiOpts {
    /// Split the configured origins into a list.
    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect()
    }
}
