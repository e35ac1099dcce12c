//! Shared fixtures: a scripted in-memory gateway and row builders

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use nftx::gateway::{DataGateway, GatewayError};

/// One recorded GraphQL call
#[derive(Clone, Debug)]
pub struct GraphqlCall {
    pub operation: String,
    pub variables: Value,
    pub endpoint: Option<String>,
}

/// In-memory stand-in for the Aptos APIs.
///
/// Listing and ownership queries honor `limit`/`offset` against the scripted
/// rows so pagination behaves like the real indexer.
#[derive(Default)]
pub struct FakeGateway {
    pub listings: Vec<Value>,
    pub owned: HashMap<String, Vec<Value>>,
    pub counts: HashMap<String, u64>,
    pub rest: HashMap<String, Value>,
    pub documents: HashMap<String, Value>,
    /// Every GraphQL call fails with this error when set
    pub fail_with: Option<GatewayError>,
    pub graphql_calls: Mutex<Vec<GraphqlCall>>,
    pub rest_calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    pub fetches: Mutex<Vec<String>>,
    pub in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

fn operation_name(query: &str) -> String {
    query
        .trim_start()
        .strip_prefix("query ")
        .and_then(|rest| rest.split(|c: char| c == '(' || c.is_whitespace()).next())
        .unwrap_or_default()
        .to_string()
}

fn window(rows: &[Value], vars: &Value) -> Vec<Value> {
    let limit = vars["limit"].as_u64().unwrap_or(u64::MAX) as usize;
    let offset = vars["offset"].as_u64().unwrap_or(0) as usize;
    rows.iter().skip(offset).take(limit).cloned().collect()
}

impl FakeGateway {
    pub fn with_listings(listings: Vec<Value>) -> Self {
        Self {
            listings,
            ..Default::default()
        }
    }

    pub fn calls_named(&self, op: &str) -> Vec<GraphqlCall> {
        self.graphql_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == op)
            .cloned()
            .collect()
    }

    pub fn graphql_count(&self) -> usize {
        self.graphql_calls.lock().unwrap().len()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }

    /// Most `fetch_json` calls ever pending at the same time
    pub fn peak_fetches(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn listing_filter_matches(row: &Value, filter: &Value) -> bool {
        match filter["marketplace"]["_in"].as_array() {
            Some(ids) => ids.iter().any(|id| id == &row["marketplace"]),
            None => true,
        }
    }
}

#[async_trait]
impl DataGateway for FakeGateway {
    async fn graphql(
        &self,
        query: &str,
        variables: Option<Value>,
        endpoint: Option<&str>,
    ) -> Result<Value, GatewayError> {
        let operation = operation_name(query);
        let vars = variables.unwrap_or(Value::Null);
        self.graphql_calls.lock().unwrap().push(GraphqlCall {
            operation: operation.clone(),
            variables: vars.clone(),
            endpoint: endpoint.map(str::to_string),
        });
        if let Some(e) = &self.fail_with {
            return Err(e.clone());
        }

        match operation.as_str() {
            "Listings" => {
                let filtered: Vec<Value> = self
                    .listings
                    .iter()
                    .filter(|r| Self::listing_filter_matches(r, &vars["where"]))
                    .cloned()
                    .collect();
                Ok(json!({ "current_nft_marketplace_listings": window(&filtered, &vars) }))
            }
            "OwnedTokens" => {
                let owner = vars["owner"].as_str().unwrap_or_default();
                let rows = self.owned.get(owner).cloned().unwrap_or_default();
                Ok(json!({ "current_token_ownerships_v2": window(&rows, &vars) }))
            }
            "Marketplaces" => {
                let mut seen: Vec<Value> = Vec::new();
                for r in &self.listings {
                    let m = r["marketplace"].clone();
                    if !seen.contains(&m) {
                        seen.push(m);
                    }
                }
                let rows: Vec<Value> = seen.into_iter().map(|m| json!({ "marketplace": m })).collect();
                Ok(json!({ "current_nft_marketplace_listings": rows }))
            }
            "ListingCount" => {
                let ids = vars["marketplaces"].as_array().cloned().unwrap_or_default();
                let count: u64 = ids
                    .iter()
                    .filter_map(|id| id.as_str())
                    .map(|id| self.counts.get(id).copied().unwrap_or(0))
                    .sum();
                Ok(json!({
                    "current_nft_marketplace_listings_aggregate": { "aggregate": { "count": count } }
                }))
            }
            other => Err(GatewayError::GraphQl(format!("unknown operation {other}"))),
        }
    }

    async fn rest_get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, GatewayError> {
        self.rest_calls.lock().unwrap().push((
            path.to_string(),
            params.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        ));
        let body = self.rest.get(path).cloned().ok_or(GatewayError::Status {
            status: 404,
            body: "not found".into(),
        })?;
        let limit = params
            .iter()
            .find(|(k, _)| *k == "limit")
            .and_then(|(_, v)| v.parse::<usize>().ok());
        let offset = params
            .iter()
            .find(|(k, _)| *k == "offset")
            .and_then(|(_, v)| v.parse::<usize>().ok())
            .unwrap_or(0);
        match (body["data"].as_array(), limit) {
            (Some(rows), Some(limit)) => Ok(json!({
                "data": rows.iter().skip(offset).take(limit).cloned().collect::<Vec<_>>()
            })),
            _ => Ok(body),
        }
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, GatewayError> {
        self.fetches.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        // Stay pending across a few polls so sibling fetches overlap
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| GatewayError::Transport(format!("connection refused: {url}")))
    }
}

/// Listing row with full metadata when `complete`, otherwise no description
/// and no media at all
pub fn listing_row(i: usize, marketplace: &str, complete: bool) -> Value {
    let token = if complete {
        json!({
            "token_name": format!("Token #{i}"),
            "description": format!("Description {i}"),
            "token_uri": format!("https://meta.example/{i}.json"),
            "token_properties": { "Tier": "Gold" },
            "cdn_asset_uris": { "cdn_image_uri": format!("https://cdn.example/{i}.png") },
            "current_collection": { "collection_name": "Aptos Monkeys", "creator_address": "0xc0ffee" }
        })
    } else {
        json!({
            "token_name": format!("Token #{i}"),
            "description": "",
            "token_uri": "",
            "cdn_asset_uris": null,
            "current_collection": { "collection_name": "Aptos Monkeys", "creator_address": "0xc0ffee" }
        })
    };
    json!({
        "token_data_id": format!("0xtoken{i}"),
        "price": format!("{}", (i as u64 + 1) * 50_000_000),
        "marketplace": marketplace,
        "seller": format!("0xseller{i}"),
        "collection_id": "0xcollection",
        "last_transaction_timestamp": "2024-05-01T10:00:00.000000",
        "current_token_data": token
    })
}

/// `n` listings alternating complete/incomplete, starting with complete
pub fn alternating_listings(n: usize, marketplace: &str) -> Vec<Value> {
    (0..n).map(|i| listing_row(i, marketplace, i % 2 == 0)).collect()
}

/// Complete text but the image only reachable through `token_uri` metadata
pub fn metadata_only_row(i: usize) -> Value {
    json!({
        "token_data_id": format!("0xmeta{i}"),
        "price": "100000000",
        "marketplace": "wapal",
        "seller": format!("0xseller{i}"),
        "current_token_data": {
            "token_name": format!("Meta #{i}"),
            "description": "needs metadata",
            "token_uri": format!("https://meta.example/m{i}.json"),
            "current_collection": { "collection_name": "Metadata Only" }
        }
    })
}

pub fn ownership_row(i: usize, owner: &str) -> Value {
    json!({
        "token_data_id": format!("0xowned{i}"),
        "owner_address": owner,
        "amount": 1,
        "last_transaction_timestamp": "2024-05-02T08:30:00",
        "current_token_data": {
            "token_name": format!("Owned #{i}"),
            "description": "held",
            "cdn_asset_uris": { "raw_image_uri": format!("ipfs://QmOwned{i}") },
            "current_collection": { "collection_name": "Holdings", "creator_address": "0xabc" }
        }
    })
}

pub fn ranking_row(i: usize) -> Value {
    json!({
        "collection_id": format!("0xcol{i}"),
        "collection_name": format!("Collection {i}"),
        "description": "ranked",
        "creator_address": "0xcreator",
        "floor_price": 100_000_000u64 * (i as u64 + 1),
        "total_volume": "2500000000",
        "total_sales": 40 - i,
        "cdn_image_uri": format!("https://cdn.example/col{i}.png")
    })
}
