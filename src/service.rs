//! Listings service: gateway + normalizer + cache behind one API
//!
//! Every page fetch goes cache → gateway → normalizer → cache. The pagination
//! policy lives here:
//!
//! - no completeness filter: upstream `limit`/`offset` do the paging; one
//!   extra row is requested to learn whether another page exists
//! - `hide_incomplete`: the completeness flag is derived locally, so an
//!   over-fetched batch is pulled from offset 0, filtered, and sliced here

use futures::future::try_join_all;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cache::{CacheStats, Clock, SystemClock, TtlCache};
use crate::config::Config;
use crate::constants::cache::{
    DEFAULT_PAGE_SIZE, EXPIRATION_SECS, MAX_BATCH, METADATA_CONCURRENCY, OVERFETCH_FACTOR,
};
use crate::constants::endpoints::{AGGREGATOR_GRAPHQL, IPFS_GATEWAY, MARKETPLACE_SALES_PATH, RANKINGS_PATH};
use crate::gateway::{DataGateway, GatewayError};
use crate::image::ImageResolver;
use crate::marketplace::{display_name, group_marketplaces, raw_identifiers_for};
use crate::normalize::{parse_octas, Normalizer};
use crate::queries;
use crate::stats::{compute_stats, DistributionMode, MarketplaceCounts};
use crate::types::{AggregatorStats, ListingRecord, MarketplaceConfig, Page};

/// Parameters of one page request. Its serialization is the cache key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    /// 1-based
    pub page: usize,
    pub page_size: usize,
    pub hide_incomplete: bool,
    /// Marketplace display name (or raw identifier)
    pub marketplace: Option<String>,
    /// Case-insensitive collection name fragment
    pub collection: Option<String>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            hide_incomplete: false,
            marketplace: None,
            collection: None,
        }
    }
}

impl PageQuery {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            page,
            page_size,
            ..Default::default()
        }
    }

    fn page(&self) -> usize {
        self.page.max(1)
    }

    fn page_size(&self) -> usize {
        self.page_size.max(1)
    }

    /// Cache key for this query under a view kind ("listings", "owned:0x1")
    pub fn cache_key(&self, kind: &str) -> String {
        let params = serde_json::to_string(self).unwrap_or_default();
        format!("{kind}:{params}")
    }
}

/// Upstream window for a page request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchPlan {
    pub limit: usize,
    pub offset: usize,
    /// Filter and slice locally instead of trusting upstream paging
    pub client_side: bool,
}

impl FetchPlan {
    pub fn for_query(q: &PageQuery) -> Self {
        let page = q.page();
        let size = q.page_size();
        if q.hide_incomplete {
            let needed = page * size;
            Self {
                limit: (needed * OVERFETCH_FACTOR).max(needed + 1).min(MAX_BATCH),
                offset: 0,
                client_side: true,
            }
        } else {
            Self {
                limit: size + 1,
                offset: (page - 1) * size,
                client_side: false,
            }
        }
    }

    /// Rows worth normalizing out of `raw_len` fetched rows
    fn rows_to_normalize(&self, q: &PageQuery, raw_len: usize) -> usize {
        if self.client_side {
            raw_len
        } else {
            raw_len.min(q.page_size())
        }
    }

    /// Build the page from normalized records and the raw upstream row count
    pub fn paginate(&self, q: &PageQuery, records: Vec<ListingRecord>, raw_len: usize) -> Page<ListingRecord> {
        let page = q.page();
        let size = q.page_size();
        if !self.client_side {
            return Page {
                items: records.into_iter().take(size).collect(),
                page,
                page_size: size,
                has_more: raw_len > size,
                total: None,
            };
        }

        let complete: Vec<ListingRecord> =
            records.into_iter().filter(|r| r.has_complete_metadata).collect();
        let start = (page - 1) * size;
        // A full batch below the cap means a later, larger window may hold more
        let has_more =
            complete.len() > start + size || (raw_len >= self.limit && self.limit < MAX_BATCH);
        Page {
            items: complete.into_iter().skip(start).take(size).collect(),
            page,
            page_size: size,
            has_more,
            total: None,
        }
    }
}

/// Knobs taken from `Config`
#[derive(Clone, Debug)]
pub struct ServiceOptions {
    pub aggregator_url: String,
    pub ipfs_gateway: String,
    pub network: String,
    pub cache_ttl: Duration,
    pub distribution: DistributionMode,
    /// Window passed to the analytics sales call
    pub sales_period: String,
    /// Rows whose image metadata is resolved at once
    pub metadata_concurrency: usize,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            aggregator_url: AGGREGATOR_GRAPHQL.to_string(),
            ipfs_gateway: IPFS_GATEWAY.to_string(),
            network: "mainnet".to_string(),
            cache_ttl: Duration::from_secs(EXPIRATION_SECS),
            distribution: DistributionMode::Auto,
            sales_period: "1d".to_string(),
            metadata_concurrency: METADATA_CONCURRENCY,
        }
    }
}

impl ServiceOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            aggregator_url: cfg.aggregator_graphql_url.clone(),
            ipfs_gateway: cfg.ipfs_gateway.clone(),
            network: cfg.network.clone(),
            cache_ttl: Duration::from_secs(cfg.cache_ttl_secs),
            distribution: cfg.distribution,
            sales_period: cfg.time_period.clone(),
            metadata_concurrency: cfg.metadata_concurrency,
        }
    }
}

pub struct ListingsService {
    gateway: Arc<dyn DataGateway>,
    normalizer: Normalizer,
    cache: TtlCache<Page<ListingRecord>>,
    opts: ServiceOptions,
    marketplaces: Mutex<Vec<MarketplaceConfig>>,
}

fn rows_of(data: &Value, field: &str) -> Result<Vec<Value>, GatewayError> {
    data.get(field)
        .and_then(|v| v.as_array())
        .cloned()
        .ok_or_else(|| GatewayError::Malformed(format!("missing {field}")))
}

impl ListingsService {
    pub fn new(gateway: Arc<dyn DataGateway>, opts: ServiceOptions) -> Self {
        Self::with_clock(gateway, opts, Arc::new(SystemClock))
    }

    pub fn with_clock(gateway: Arc<dyn DataGateway>, opts: ServiceOptions, clock: Arc<dyn Clock>) -> Self {
        Self {
            gateway,
            normalizer: Normalizer::new(ImageResolver::new(opts.ipfs_gateway.clone()))
                .with_concurrency(opts.metadata_concurrency),
            cache: TtlCache::with_clock(opts.cache_ttl, clock),
            opts,
            marketplaces: Mutex::new(Vec::new()),
        }
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.opts
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop one cached page, or all of them
    pub fn invalidate(&self, key: Option<&str>) {
        self.cache.invalidate(key);
    }

    /// Marketplace registry from the last successful `marketplaces()` call
    pub fn known_marketplaces(&self) -> Vec<MarketplaceConfig> {
        self.marketplaces
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Marketplaces with active listings, versioned identifiers collapsed
    pub async fn marketplaces(&self) -> Result<Vec<MarketplaceConfig>, GatewayError> {
        let data = self
            .gateway
            .graphql(queries::MARKETPLACES, None, Some(&self.opts.aggregator_url))
            .await?;
        let raw: Vec<String> = rows_of(&data, "current_nft_marketplace_listings")?
            .iter()
            .filter_map(|r| r["marketplace"].as_str().map(str::to_string))
            .collect();
        let configs = group_marketplaces(&raw, &self.opts.network);
        if let Ok(mut m) = self.marketplaces.lock() {
            *m = configs.clone();
        }
        Ok(configs)
    }

    async fn raw_ids_for(&self, display: &str) -> Vec<String> {
        let mut known = self.known_marketplaces();
        if known.is_empty() {
            match self.marketplaces().await {
                Ok(list) => known = list,
                Err(e) => log::warn!("[service] marketplace registry unavailable: {e}"),
            }
        }
        raw_identifiers_for(display, &known)
    }

    async fn listing_filter(&self, q: &PageQuery) -> Value {
        let mut filter = json!({ "is_deleted": { "_eq": false } });
        if let Some(m) = q.marketplace.as_deref().filter(|m| !m.is_empty()) {
            filter["marketplace"] = json!({ "_in": self.raw_ids_for(m).await });
        }
        if let Some(c) = q.collection.as_deref().filter(|c| !c.is_empty()) {
            filter["current_token_data"] = json!({
                "current_collection": { "collection_name": { "_ilike": format!("%{c}%") } }
            });
        }
        filter
    }

    /// Marketplace listings page
    pub async fn listings(&self, q: &PageQuery) -> Result<Page<ListingRecord>, GatewayError> {
        let key = q.cache_key("listings");
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let plan = FetchPlan::for_query(q);
        let filter = self.listing_filter(q).await;
        let vars = json!({ "limit": plan.limit, "offset": plan.offset, "where": filter });
        let data = self
            .gateway
            .graphql(&queries::listings(), Some(vars), Some(&self.opts.aggregator_url))
            .await?;
        let mut rows = rows_of(&data, "current_nft_marketplace_listings")?;
        let raw_len = rows.len();
        rows.truncate(plan.rows_to_normalize(q, raw_len));

        let records = self.normalizer.listings(&rows, self.gateway.as_ref()).await;
        let page = plan.paginate(q, records, raw_len);
        log::debug!(
            "[service] listings page {} -> {} items (raw {raw_len}, more={})",
            page.page,
            page.items.len(),
            page.has_more
        );
        self.cache.put(key, page.clone());
        Ok(page)
    }

    /// Tokens owned by `owner` (the connected wallet address)
    pub async fn owned(&self, owner: &str, q: &PageQuery) -> Result<Page<ListingRecord>, GatewayError> {
        let key = q.cache_key(&format!("owned:{owner}"));
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let plan = FetchPlan::for_query(q);
        let vars = json!({ "owner": owner, "limit": plan.limit, "offset": plan.offset });
        let data = self
            .gateway
            .graphql(&queries::owned_tokens(), Some(vars), None)
            .await?;
        let mut rows = rows_of(&data, "current_token_ownerships_v2")?;
        let raw_len = rows.len();
        rows.truncate(plan.rows_to_normalize(q, raw_len));

        let records = self.normalizer.ownerships(&rows, self.gateway.as_ref()).await;
        let page = plan.paginate(q, records, raw_len);
        self.cache.put(key, page.clone());
        Ok(page)
    }

    /// Collections ranked by volume over `time_period` ("1h", "1d", "7d", ...)
    pub async fn rankings(&self, time_period: &str, q: &PageQuery) -> Result<Page<ListingRecord>, GatewayError> {
        let key = q.cache_key(&format!("rankings:{time_period}"));
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        // Rankings are never completeness-filtered
        let q = PageQuery {
            hide_incomplete: false,
            ..q.clone()
        };
        let plan = FetchPlan::for_query(&q);
        let params = [
            ("time_period", time_period.to_string()),
            ("limit", plan.limit.to_string()),
            ("offset", plan.offset.to_string()),
        ];
        let body = self.gateway.rest_get(RANKINGS_PATH, &params).await?;
        let mut rows = rows_of(&body, "data")?;
        let raw_len = rows.len();
        rows.truncate(plan.rows_to_normalize(&q, raw_len));

        let records = self
            .normalizer
            .rankings(&rows, plan.offset + 1, self.gateway.as_ref())
            .await;
        let page = plan.paginate(&q, records, raw_len);
        self.cache.put(key, page.clone());
        Ok(page)
    }

    async fn listing_count(&self, raw_ids: &[String]) -> Result<u64, GatewayError> {
        let data = self
            .gateway
            .graphql(
                queries::LISTING_COUNT,
                Some(json!({ "marketplaces": raw_ids })),
                Some(&self.opts.aggregator_url),
            )
            .await?;
        data["current_nft_marketplace_listings_aggregate"]["aggregate"]["count"]
            .as_u64()
            .ok_or_else(|| GatewayError::Malformed("missing aggregate count".to_string()))
    }

    /// Sales per display name, or `None` when the analytics call fails
    async fn sales_by_marketplace(&self) -> Option<Vec<(String, u64)>> {
        let params = [("time_period", self.opts.sales_period.clone())];
        let body = match self.gateway.rest_get(MARKETPLACE_SALES_PATH, &params).await {
            Ok(b) => b,
            Err(e) => {
                log::warn!("[service] sales data unavailable, using even split: {e}");
                return None;
            }
        };
        let rows = body["data"].as_array()?;
        let mut out: Vec<(String, u64)> = Vec::new();
        for row in rows {
            let Some(raw) = row["marketplace"].as_str() else {
                continue;
            };
            let sales = parse_octas(&row["total_sales"])
                .or_else(|| parse_octas(&row["sales"]))
                .unwrap_or(0);
            let name = display_name(raw);
            match out.iter_mut().find(|(n, _)| *n == name) {
                Some((_, s)) => *s += sales,
                None => out.push((name, sales)),
            }
        }
        Some(out)
    }

    /// Aggregate marketplace statistics for the analytics tab
    pub async fn stats(&self) -> Result<AggregatorStats, GatewayError> {
        let configs = self.marketplaces().await?;
        let counts = try_join_all(configs.iter().map(|m| self.listing_count(&m.raw_identifiers))).await?;
        let sales = self.sales_by_marketplace().await;

        let inputs: Vec<MarketplaceCounts> = configs
            .iter()
            .zip(counts)
            .map(|(m, active_listings)| MarketplaceCounts {
                name: m.name.clone(),
                active_listings,
                sales: sales.as_ref().map(|s| {
                    s.iter()
                        .find(|(n, _)| *n == m.name)
                        .map(|(_, v)| *v)
                        .unwrap_or(0)
                }),
            })
            .collect();

        Ok(compute_stats(&inputs, self.opts.distribution))
    }
}
