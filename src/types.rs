use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::units::CURRENCY;
use crate::util_text::{format_apt, octas_to_apt};

/// Price of a listing, kept in octas with the derived display amount
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Price {
    #[serde(serialize_with = "serialize_u64_as_string")]
    pub octas: u64,
    pub amount: f64,
    pub currency: String,
}

impl Price {
    pub fn from_octas(octas: u64) -> Self {
        Self {
            octas,
            amount: octas_to_apt(octas),
            currency: CURRENCY.to_string(),
        }
    }

    pub fn display(&self) -> String {
        format_apt(self.octas)
    }
}

/// Kind of media behind a resolved URL (decides `<img>` vs `<video>`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Unknown,
}

/// Which step of the image fallback chain produced `image_url`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    CdnImage,
    RawImage,
    CdnAnimation,
    RawAnimation,
    AssetUri,
    MetadataJson,
    Placeholder,
}

/// Uniform display record for listings, owned tokens and collection rankings
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ListingRecord {
    pub token_id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub media_kind: MediaKind,
    pub image_source: ImageSource,
    /// Display label ("Tradeport", "BlueMove (Deprecated)")
    pub marketplace: String,
    /// Raw upstream identifier ("tradeport_v2"); empty for non-listing records
    pub marketplace_raw: String,
    pub collection: String,
    pub creator: String,
    pub owner: String,
    pub price: Option<Price>,
    pub traits: BTreeMap<String, String>,
    pub created_at: Option<DateTime<Utc>>,
    pub has_complete_metadata: bool,
}

/// One page of results.
///
/// `total` is only set when the upstream can report a true count; pagination
/// is driven by `has_more` otherwise.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub has_more: bool,
    pub total: Option<u64>,
}

impl<T> Page<T> {
    pub fn empty(page: usize, page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            page,
            page_size,
            has_more: false,
            total: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Marketplace entry shown in filters and stats
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    pub id: String,
    pub name: String,
    pub website: String,
    pub logo_url: String,
    pub connected: bool,
    pub networks: Vec<String>,
    /// Raw upstream identifiers that collapse to this entry (e.g. v1 + v2)
    pub raw_identifiers: Vec<String>,
}

/// How marketplace percentages were derived
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionStrategy {
    /// floor(100/N) each, last absorbs the remainder
    EvenSplit,
    /// Proportional to recent sales counts, last absorbs the remainder
    SalesWeighted,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceShare {
    pub name: String,
    pub active_listings: u64,
    pub percentage: u32,
}

/// Aggregate marketplace statistics for the analytics tab
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregatorStats {
    pub total_listings: u64,
    pub total_marketplaces: usize,
    pub distribution: Vec<MarketplaceShare>,
    pub strategy: DistributionStrategy,
}

impl AggregatorStats {
    pub fn empty() -> Self {
        Self {
            total_listings: 0,
            total_marketplaces: 0,
            distribution: Vec::new(),
            strategy: DistributionStrategy::EvenSplit,
        }
    }
}

/// Serialize u64 as string for JavaScript compatibility (avoids precision loss)
pub fn serialize_u64_as_string<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&value.to_string())
}
