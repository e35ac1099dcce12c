use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::env;

use crate::constants::cache::{DEFAULT_PAGE_SIZE, EXPIRATION_SECS, METADATA_CONCURRENCY};
use crate::constants::endpoints::{AGGREGATOR_GRAPHQL, ANALYTICS_REST, INDEXER_GRAPHQL, IPFS_GATEWAY};
use crate::stats::DistributionMode;

/// Data-layer settings shared by every front-end.
///
/// Configuration priority: CLI args > Environment variables > Defaults
#[derive(Args, Debug, Clone, Default)]
pub struct CliArgs {
    /// Aptos Build API key, sent as `x-api-key` (unauthenticated when absent)
    #[arg(long, env = "APTOS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Indexer GraphQL endpoint (ownership queries)
    #[arg(long, env = "INDEXER_GRAPHQL_URL")]
    pub indexer_graphql_url: Option<String>,

    /// NFT aggregator GraphQL endpoint (listings, marketplaces)
    #[arg(long, env = "AGGREGATOR_GRAPHQL_URL")]
    pub aggregator_graphql_url: Option<String>,

    /// Analytics REST base URL (rankings, sales)
    #[arg(long, env = "ANALYTICS_URL")]
    pub analytics_url: Option<String>,

    /// Host used to rewrite ipfs:// URIs
    #[arg(long, env = "IPFS_GATEWAY")]
    pub ipfs_gateway: Option<String>,

    /// Items per page (1-100)
    #[arg(long, env = "PAGE_SIZE")]
    pub page_size: Option<usize>,

    /// Listing cache lifetime in seconds (1-3600)
    #[arg(long, env = "CACHE_TTL_SECS")]
    pub cache_ttl_secs: Option<u64>,

    /// Per-request timeout in milliseconds (1000-120000); no timeout when unset
    #[arg(long, env = "REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,

    /// Rows whose image metadata is fetched in parallel (1-64)
    #[arg(long, env = "METADATA_CONCURRENCY")]
    pub metadata_concurrency: Option<usize>,

    /// Marketplace share strategy: auto, even, sales
    #[arg(long, env = "DISTRIBUTION", value_parser = clap::value_parser!(DistributionMode))]
    pub distribution: Option<DistributionMode>,

    /// Analytics window for rankings and sales ("1h", "1d", "7d", "30d")
    #[arg(long, env = "TIME_PERIOD")]
    pub time_period: Option<String>,

    /// Address to watch as the connected wallet
    #[arg(long, env = "WALLET_ADDRESS")]
    pub wallet_address: Option<String>,

    /// Network label reported by the wallet connector
    #[arg(long, env = "NETWORK")]
    pub network: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: Option<String>,
    pub indexer_graphql_url: String,
    pub aggregator_graphql_url: String,
    pub analytics_url: String,
    pub ipfs_gateway: String,
    pub page_size: usize,
    pub cache_ttl_secs: u64,
    pub request_timeout_ms: Option<u64>,
    pub metadata_concurrency: usize,
    pub distribution: DistributionMode,
    pub time_period: String,
    pub wallet_address: Option<String>,
    pub network: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            indexer_graphql_url: INDEXER_GRAPHQL.to_string(),
            aggregator_graphql_url: AGGREGATOR_GRAPHQL.to_string(),
            analytics_url: ANALYTICS_REST.to_string(),
            ipfs_gateway: IPFS_GATEWAY.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            cache_ttl_secs: EXPIRATION_SECS,
            request_timeout_ms: None,
            metadata_concurrency: METADATA_CONCURRENCY,
            distribution: DistributionMode::Auto,
            time_period: "1d".to_string(),
            wallet_address: None,
            network: "mainnet".to_string(),
        }
    }
}

pub const TIME_PERIODS: &[&str] = &["1h", "6h", "1d", "7d", "30d"];

/// Validate that a value is within a given range (inclusive)
fn validate_in_range<T>(val: T, min: T, max: T, name: &str) -> Result<T>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if val < min || val > max {
        Err(anyhow!("{name} must be in range [{min}, {max}], got {val}"))
    } else {
        Ok(val)
    }
}

/// Validate URL format (basic check)
fn validate_url(url: &str, name: &str) -> Result<()> {
    if url.is_empty() {
        return Err(anyhow!("{name} cannot be empty"));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow!("{name} must start with http:// or https://"))
    }
}

pub fn validate_time_period(p: &str) -> Result<String> {
    let p = p.trim().to_lowercase();
    if TIME_PERIODS.contains(&p.as_str()) {
        Ok(p)
    } else {
        Err(anyhow!(
            "Invalid time period '{p}'. Valid options: {}",
            TIME_PERIODS.join(", ")
        ))
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env_str(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow!("{key} has an invalid value '{raw}'")),
        None => Ok(None),
    }
}

impl Config {
    /// Resolve settings from parsed args, falling back to the environment
    pub fn from_args(args: CliArgs) -> Result<Config> {
        let d = Config::default();

        let url = |arg: Option<String>, key: &str, default: String| -> Result<String> {
            let url = arg.or_else(|| env_str(key)).unwrap_or(default);
            let url = url.trim().trim_end_matches('/').to_string();
            validate_url(&url, key)?;
            Ok(url)
        };
        let indexer_graphql_url = url(args.indexer_graphql_url, "INDEXER_GRAPHQL_URL", d.indexer_graphql_url)?;
        let aggregator_graphql_url =
            url(args.aggregator_graphql_url, "AGGREGATOR_GRAPHQL_URL", d.aggregator_graphql_url)?;
        let analytics_url = url(args.analytics_url, "ANALYTICS_URL", d.analytics_url)?;

        // Bare host; a scheme or path is stripped
        let ipfs_gateway = args
            .ipfs_gateway
            .or_else(|| env_str("IPFS_GATEWAY"))
            .map(|h| {
                h.trim()
                    .trim_start_matches("https://")
                    .trim_start_matches("http://")
                    .trim_end_matches('/')
                    .to_string()
            })
            .filter(|h| !h.is_empty())
            .unwrap_or(d.ipfs_gateway);

        let page_size = match args.page_size {
            Some(v) => v,
            None => env_parse("PAGE_SIZE")?.unwrap_or(d.page_size),
        };
        let page_size = validate_in_range(page_size, 1, 100, "PAGE_SIZE")?;

        let cache_ttl_secs = match args.cache_ttl_secs {
            Some(v) => v,
            None => env_parse("CACHE_TTL_SECS")?.unwrap_or(d.cache_ttl_secs),
        };
        let cache_ttl_secs = validate_in_range(cache_ttl_secs, 1, 3600, "CACHE_TTL_SECS")?;

        let request_timeout_ms = match args.request_timeout_ms {
            Some(v) => Some(v),
            None => env_parse("REQUEST_TIMEOUT_MS")?,
        };
        let request_timeout_ms = request_timeout_ms
            .map(|v| validate_in_range(v, 1000, 120_000, "REQUEST_TIMEOUT_MS"))
            .transpose()?;

        let metadata_concurrency = match args.metadata_concurrency {
            Some(v) => v,
            None => env_parse("METADATA_CONCURRENCY")?.unwrap_or(d.metadata_concurrency),
        };
        let metadata_concurrency = validate_in_range(metadata_concurrency, 1, 64, "METADATA_CONCURRENCY")?;

        let distribution = match args.distribution {
            Some(m) => m,
            None => env_str("DISTRIBUTION")
                .map(|s| s.parse::<DistributionMode>())
                .transpose()
                .context("DISTRIBUTION")?
                .unwrap_or(d.distribution),
        };

        let time_period = args
            .time_period
            .or_else(|| env_str("TIME_PERIOD"))
            .map(|p| validate_time_period(&p))
            .transpose()?
            .unwrap_or(d.time_period);

        Ok(Config {
            api_key: args
                .api_key
                .or_else(|| env_str("APTOS_API_KEY"))
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            indexer_graphql_url,
            aggregator_graphql_url,
            analytics_url,
            ipfs_gateway,
            page_size,
            cache_ttl_secs,
            request_timeout_ms,
            metadata_concurrency,
            distribution,
            time_period,
            wallet_address: args.wallet_address.or_else(|| env_str("WALLET_ADDRESS")),
            network: args
                .network
                .or_else(|| env_str("NETWORK"))
                .unwrap_or(d.network),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Print current configuration (useful for debugging)
    pub fn print_summary(&self) {
        eprintln!("nftx configuration:");
        eprintln!("  Indexer GraphQL: {}", self.indexer_graphql_url);
        eprintln!("  Aggregator GraphQL: {}", self.aggregator_graphql_url);
        eprintln!("  Analytics: {}", self.analytics_url);
        eprintln!("  IPFS gateway: {}", self.ipfs_gateway);
        eprintln!("  Page size: {}", self.page_size);
        eprintln!("  Cache TTL: {}s", self.cache_ttl_secs);
        match self.request_timeout_ms {
            Some(ms) => eprintln!("  Request timeout: {ms}ms"),
            None => eprintln!("  Request timeout: none"),
        }
        eprintln!("  Metadata concurrency: {}", self.metadata_concurrency);
        eprintln!("  Distribution: {}", self.distribution);
        eprintln!("  Time period: {}", self.time_period);
        eprintln!("  Network: {}", self.network);
        if self.has_api_key() {
            eprintln!("  API key: Configured");
        } else {
            eprintln!("  API key: none (unauthenticated)");
        }
    }
}

/// Settings from the environment only (library and web callers)
pub fn load() -> Result<Config> {
    Config::from_args(CliArgs::default())
}
