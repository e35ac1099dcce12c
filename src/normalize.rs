//! Response normalizer: upstream rows → `ListingRecord`
//!
//! Three upstream shapes are handled:
//! - aggregator listing rows (`current_nft_marketplace_listings`)
//! - indexer ownership rows (`current_token_ownerships_v2`)
//! - analytics collection-ranking rows (REST `list_by_volume`)
//!
//! Normalization never fails; missing or malformed fields degrade to empty
//! strings, "Unknown" or the placeholder image.

use chrono::{DateTime, NaiveDateTime, Utc};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::constants::cache::METADATA_CONCURRENCY;
use crate::constants::messages::UNKNOWN;
use crate::gateway::DataGateway;
use crate::image::{ImageFields, ImageResolver};
use crate::marketplace::display_name;
use crate::types::{ListingRecord, Price};

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(|x| x.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Octas amounts arrive as JSON numbers or decimal strings
pub fn parse_octas(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f as u64))
        }
        _ => None,
    }
}

/// Indexer timestamps are UTC without an offset ("2024-03-01T12:00:00.123");
/// RFC 3339 is accepted too.
pub fn parse_timestamp(v: &Value) -> Option<DateTime<Utc>> {
    let s = v.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|n| n.and_utc())
}

fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Flatten token properties into a string map.
///
/// Accepts a plain object (`{"Background": "Blue"}`) or the metadata-standard
/// attribute list (`[{"trait_type": "Background", "value": "Blue"}]`).
pub fn parse_traits(v: &Value) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    match v {
        Value::Object(map) => {
            for (k, val) in map {
                out.insert(k.clone(), value_to_string(val));
            }
        }
        Value::Array(items) => {
            for item in items {
                if let Some(k) = str_field(item, "trait_type") {
                    out.insert(k, value_to_string(&item["value"]));
                }
            }
        }
        // Some indexers hand back the property map as a JSON string
        Value::String(s) => {
            if let Ok(inner) = serde_json::from_str::<Value>(s) {
                if !inner.is_string() {
                    return parse_traits(&inner);
                }
            }
        }
        _ => {}
    }
    out
}

/// Fields shared by every record source before image resolution
struct RecordParts {
    token_id: String,
    name: Option<String>,
    description: Option<String>,
    marketplace_raw: String,
    collection: String,
    creator: String,
    owner: String,
    price: Option<Price>,
    traits: BTreeMap<String, String>,
    created_at: Option<DateTime<Utc>>,
    image: ImageFields,
}

/// Token-level fields shared by listing and ownership rows
struct TokenData {
    name: Option<String>,
    description: Option<String>,
    collection: String,
    creator: String,
    traits: BTreeMap<String, String>,
    image: ImageFields,
}

#[derive(Clone, Debug)]
pub struct Normalizer {
    resolver: ImageResolver,
    /// Rows resolved at once by the batch methods
    concurrency: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(ImageResolver::default())
    }
}

impl Normalizer {
    pub fn new(resolver: ImageResolver) -> Self {
        Self {
            resolver,
            concurrency: METADATA_CONCURRENCY,
        }
    }

    /// Bound the per-row metadata fan-out of `listings`/`ownerships`/`rankings`
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn resolver(&self) -> &ImageResolver {
        &self.resolver
    }

    async fn build(&self, p: RecordParts, gateway: &dyn DataGateway) -> ListingRecord {
        let display = p.name.clone().unwrap_or_else(|| UNKNOWN.to_string());
        let image = self.resolver.resolve(&p.image, &display, gateway).await;

        let has_complete_metadata =
            p.name.is_some() && p.description.is_some() && !image.is_placeholder();

        let marketplace = if p.marketplace_raw.is_empty() {
            String::new()
        } else {
            display_name(&p.marketplace_raw)
        };

        ListingRecord {
            token_id: p.token_id,
            name: display,
            description: p.description.unwrap_or_default(),
            image_url: image.url,
            media_kind: image.media_kind,
            image_source: image.source,
            marketplace,
            marketplace_raw: p.marketplace_raw,
            collection: if p.collection.is_empty() {
                UNKNOWN.to_string()
            } else {
                p.collection
            },
            creator: p.creator,
            owner: p.owner,
            price: p.price,
            traits: p.traits,
            created_at: p.created_at,
            has_complete_metadata,
        }
    }

    fn token_data(token: &Value) -> TokenData {
        let collection = &token["current_collection"];
        TokenData {
            name: str_field(token, "token_name"),
            description: str_field(token, "description"),
            collection: str_field(collection, "collection_name").unwrap_or_default(),
            creator: str_field(collection, "creator_address").unwrap_or_default(),
            traits: parse_traits(&token["token_properties"]),
            image: ImageFields::from_token_data(token),
        }
    }

    /// Aggregator listing row
    pub async fn listing(&self, row: &Value, gateway: &dyn DataGateway) -> ListingRecord {
        let t = Self::token_data(&row["current_token_data"]);
        let parts = RecordParts {
            token_id: str_field(row, "token_data_id").unwrap_or_default(),
            name: t.name,
            description: t.description,
            marketplace_raw: str_field(row, "marketplace").unwrap_or_default(),
            collection: t.collection,
            creator: t.creator,
            owner: str_field(row, "seller").unwrap_or_default(),
            price: parse_octas(&row["price"]).map(Price::from_octas),
            traits: t.traits,
            created_at: parse_timestamp(&row["last_transaction_timestamp"]),
            image: t.image,
        };
        self.build(parts, gateway).await
    }

    /// Indexer ownership row
    pub async fn ownership(&self, row: &Value, gateway: &dyn DataGateway) -> ListingRecord {
        let t = Self::token_data(&row["current_token_data"]);
        let parts = RecordParts {
            token_id: str_field(row, "token_data_id").unwrap_or_default(),
            name: t.name,
            description: t.description,
            marketplace_raw: String::new(),
            collection: t.collection,
            creator: t.creator,
            owner: str_field(row, "owner_address").unwrap_or_default(),
            price: None,
            traits: t.traits,
            created_at: parse_timestamp(&row["last_transaction_timestamp"]),
            image: t.image,
        };
        self.build(parts, gateway).await
    }

    /// Analytics collection-ranking row. The record stands for the whole
    /// collection: price is the floor, volume/sales/rank go in `traits`.
    pub async fn ranking(&self, row: &Value, rank: usize, gateway: &dyn DataGateway) -> ListingRecord {
        let mut traits = BTreeMap::new();
        traits.insert("rank".to_string(), rank.to_string());
        if let Some(vol) = parse_octas(&row["total_volume"]) {
            traits.insert("volume".to_string(), Price::from_octas(vol).display());
        }
        if let Some(sales) = row.get("total_sales").filter(|v| !v.is_null()) {
            traits.insert("sales".to_string(), value_to_string(sales));
        }

        let name = str_field(row, "collection_name");
        let image = ImageFields {
            cdn_image_uri: str_field(row, "cdn_image_uri"),
            raw_image_uri: str_field(row, "image_uri"),
            token_uri: str_field(row, "collection_uri"),
            ..Default::default()
        };
        let parts = RecordParts {
            token_id: str_field(row, "collection_id").unwrap_or_default(),
            collection: name.clone().unwrap_or_default(),
            name,
            description: str_field(row, "description"),
            marketplace_raw: String::new(),
            creator: str_field(row, "creator_address").unwrap_or_default(),
            owner: String::new(),
            price: parse_octas(&row["floor_price"]).map(Price::from_octas),
            traits,
            created_at: None,
            image,
        };
        self.build(parts, gateway).await
    }

    // `buffered` keeps row order while capping in-flight rows
    pub async fn listings(&self, rows: &[Value], gateway: &dyn DataGateway) -> Vec<ListingRecord> {
        stream::iter(rows.iter().map(|r| self.listing(r, gateway)))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    pub async fn ownerships(&self, rows: &[Value], gateway: &dyn DataGateway) -> Vec<ListingRecord> {
        stream::iter(rows.iter().map(|r| self.ownership(r, gateway)))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// `first_rank` is the 1-based rank of `rows[0]`
    pub async fn rankings(
        &self,
        rows: &[Value],
        first_rank: usize,
        gateway: &dyn DataGateway,
    ) -> Vec<ListingRecord> {
        stream::iter(
            rows.iter()
                .enumerate()
                .map(|(i, r)| self.ranking(r, first_rank + i, gateway)),
        )
        .buffered(self.concurrency)
        .collect()
        .await
    }
}
