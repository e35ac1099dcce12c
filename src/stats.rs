//! Marketplace share computation for the analytics tab
//!
//! Two strategies exist and both are kept: an even split used when no sales
//! data is available, and a sales-weighted split. In both, every entry gets a
//! floored integer percentage and the last entry absorbs the remainder so the
//! column sums to exactly 100.

use serde::{Deserialize, Serialize};

use crate::types::{AggregatorStats, DistributionStrategy, MarketplaceShare};

/// Which strategy the service should use
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMode {
    /// Sales-weighted when sales data is present and non-zero, even otherwise
    #[default]
    Auto,
    Even,
    Sales,
}

impl std::str::FromStr for DistributionMode {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "even" => Ok(Self::Even),
            "sales" | "sales-weighted" => Ok(Self::Sales),
            _ => Err(anyhow::anyhow!(
                "Invalid distribution '{s}'. Valid options: auto, even, sales"
            )),
        }
    }
}

impl std::fmt::Display for DistributionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Even => write!(f, "even"),
            Self::Sales => write!(f, "sales"),
        }
    }
}

/// floor(100/n) for each of `n` entries, last takes the remainder
pub fn even_split(n: usize) -> Vec<u32> {
    if n == 0 {
        return Vec::new();
    }
    let each = 100 / n as u32;
    let mut out = vec![each; n];
    if let Some(last) = out.last_mut() {
        *last = 100 - each * (n as u32 - 1);
    }
    out
}

/// floor(w * 100 / total) per weight, last takes the remainder.
/// Falls back to an even split when the weights sum to zero.
pub fn weighted_split(weights: &[u64]) -> Vec<u32> {
    let total: u128 = weights.iter().map(|w| *w as u128).sum();
    if total == 0 {
        return even_split(weights.len());
    }
    let mut out: Vec<u32> = weights
        .iter()
        .map(|w| ((*w as u128 * 100) / total) as u32)
        .collect();
    let head: u32 = out.iter().rev().skip(1).sum();
    if let Some(last) = out.last_mut() {
        *last = 100 - head;
    }
    out
}

/// One marketplace's inputs to the stats computation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarketplaceCounts {
    pub name: String,
    pub active_listings: u64,
    /// Recent sales count, if the sales call succeeded
    pub sales: Option<u64>,
}

/// Build aggregate stats with the requested mode.
///
/// `Auto` and `Sales` use sales weighting only when at least one marketplace
/// has a non-zero sales count; otherwise the even split is used and reported.
pub fn compute_stats(counts: &[MarketplaceCounts], mode: DistributionMode) -> AggregatorStats {
    let sales: Vec<u64> = counts.iter().map(|c| c.sales.unwrap_or(0)).collect();
    let has_sales = sales.iter().any(|s| *s > 0);

    let (strategy, percentages) = match mode {
        DistributionMode::Even => (DistributionStrategy::EvenSplit, even_split(counts.len())),
        DistributionMode::Auto | DistributionMode::Sales if has_sales => {
            (DistributionStrategy::SalesWeighted, weighted_split(&sales))
        }
        _ => (DistributionStrategy::EvenSplit, even_split(counts.len())),
    };

    let distribution = counts
        .iter()
        .zip(percentages)
        .map(|(c, percentage)| MarketplaceShare {
            name: c.name.clone(),
            active_listings: c.active_listings,
            percentage,
        })
        .collect();

    AggregatorStats {
        total_listings: counts.iter().map(|c| c.active_listings).sum(),
        total_marketplaces: counts.len(),
        distribution,
        strategy,
    }
}
