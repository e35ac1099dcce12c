//! Headless dashboard view model
//!
//! Owns tab selection, filters, pagination and per-tab load state, and turns
//! service results into something a renderer can draw without further logic.
//! Service errors stop here: the view gets an empty result plus a message.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::constants::messages::{CONNECT_WALLET, NO_RESULTS};
use crate::debug::{self, cat};
use crate::gateway::GatewayError;
use crate::service::{ListingsService, PageQuery};
use crate::types::{AggregatorStats, ListingRecord, Page};
use crate::wallet::{WalletConnector, WalletError, WalletState};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    Listings,
    MyNfts,
    Analytics,
    Rankings,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Listings, Tab::MyNfts, Tab::Analytics, Tab::Rankings];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Listings => "Listings",
            Tab::MyNfts => "My NFTs",
            Tab::Analytics => "Analytics",
            Tab::Rankings => "Rankings",
        }
    }
}

impl std::str::FromStr for Tab {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "listings" => Ok(Tab::Listings),
            "mynfts" | "owned" => Ok(Tab::MyNfts),
            "analytics" | "stats" => Ok(Tab::Analytics),
            "rankings" => Ok(Tab::Rankings),
            _ => Err(anyhow::anyhow!(
                "Invalid tab '{s}'. Valid options: listings, my-nfts, analytics, rankings"
            )),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Failed(String),
    Empty,
    Ready,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Filters {
    pub marketplace: Option<String>,
    pub collection: Option<String>,
    pub hide_incomplete: bool,
}

/// A result paired with the message to show when it stands in for a failure
#[derive(Clone, Debug, PartialEq)]
pub struct FetchOutcome<T> {
    pub value: T,
    pub error: Option<String>,
}

impl<T> FetchOutcome<T> {
    /// Keep `Ok` values, replace errors with `empty` and a readable message
    pub fn settle(res: Result<T, GatewayError>, empty: impl FnOnce() -> T) -> Self {
        match res {
            Ok(value) => Self { value, error: None },
            Err(e) => {
                log::warn!("[dashboard] fetch failed: {e}");
                Self {
                    value: empty(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// List-style tab (listings, owned, rankings)
#[derive(Clone, Debug)]
struct ListTab {
    page: usize,
    state: LoadState,
    data: Page<ListingRecord>,
    notice: Option<String>,
}

impl ListTab {
    fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            state: LoadState::Idle,
            data: Page::empty(1, page_size),
            notice: None,
        }
    }

    fn apply(&mut self, outcome: FetchOutcome<Page<ListingRecord>>) {
        self.state = match (&outcome.error, outcome.value.is_empty()) {
            (Some(msg), _) => LoadState::Failed(msg.clone()),
            (None, true) => LoadState::Empty,
            (None, false) => LoadState::Ready,
        };
        self.notice = match &self.state {
            LoadState::Empty => Some(NO_RESULTS.to_string()),
            _ => None,
        };
        self.data = outcome.value;
    }
}

/// Serializable view handed to renderers
#[derive(Clone, Debug, Serialize)]
pub struct DashboardSnapshot {
    pub tab: Tab,
    pub tab_label: &'static str,
    pub load_state: LoadState,
    pub notice: Option<String>,
    pub page: usize,
    pub page_size: usize,
    pub has_more: bool,
    pub filters: Filters,
    pub time_period: String,
    pub items: Vec<ListingRecord>,
    pub stats: Option<AggregatorStats>,
    pub marketplaces: Vec<String>,
    pub wallet: WalletState,
}

pub struct Dashboard {
    service: Arc<ListingsService>,
    wallet: Arc<WalletConnector>,
    tab: Tab,
    page_size: usize,
    filters: Filters,
    time_period: String,
    listings: ListTab,
    owned: ListTab,
    rankings: ListTab,
    stats_state: LoadState,
    stats: Option<AggregatorStats>,
    marketplace_names: Vec<String>,
}

impl Dashboard {
    pub fn new(service: Arc<ListingsService>, wallet: Arc<WalletConnector>, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let time_period = service.options().sales_period.clone();
        Self {
            service,
            wallet,
            tab: Tab::Listings,
            page_size,
            filters: Filters::default(),
            time_period,
            listings: ListTab::new(page_size),
            owned: ListTab::new(page_size),
            rankings: ListTab::new(page_size),
            stats_state: LoadState::Idle,
            stats: None,
            marketplace_names: Vec::new(),
        }
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn wallet(&self) -> &WalletConnector {
        &self.wallet
    }

    fn list_tab(&self, tab: Tab) -> Option<&ListTab> {
        match tab {
            Tab::Listings => Some(&self.listings),
            Tab::MyNfts => Some(&self.owned),
            Tab::Rankings => Some(&self.rankings),
            Tab::Analytics => None,
        }
    }

    fn list_tab_mut(&mut self, tab: Tab) -> Option<&mut ListTab> {
        match tab {
            Tab::Listings => Some(&mut self.listings),
            Tab::MyNfts => Some(&mut self.owned),
            Tab::Rankings => Some(&mut self.rankings),
            Tab::Analytics => None,
        }
    }

    pub fn load_state(&self) -> &LoadState {
        match self.list_tab(self.tab) {
            Some(t) => &t.state,
            None => &self.stats_state,
        }
    }

    pub fn page(&self) -> usize {
        self.list_tab(self.tab).map(|t| t.page).unwrap_or(1)
    }

    pub fn select_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            debug::log(cat::VIEW, format!("tab -> {}", tab.label()));
            self.tab = tab;
        }
    }

    fn reset_filtered_pages(&mut self) {
        self.listings.page = 1;
        self.owned.page = 1;
    }

    /// Flip the completeness filter; listing and owned views restart at page 1
    pub fn toggle_hide_incomplete(&mut self) -> bool {
        self.filters.hide_incomplete = !self.filters.hide_incomplete;
        self.reset_filtered_pages();
        debug::log(cat::VIEW, format!("hide_incomplete={}", self.filters.hide_incomplete));
        self.filters.hide_incomplete
    }

    /// Filter listings by marketplace display name; `None` or "All" clears it
    pub fn set_marketplace(&mut self, name: Option<&str>) {
        self.filters.marketplace = name
            .map(str::trim)
            .filter(|n| !n.is_empty() && !n.eq_ignore_ascii_case("all"))
            .map(str::to_string);
        self.listings.page = 1;
    }

    pub fn set_collection(&mut self, fragment: Option<&str>) {
        self.filters.collection = fragment
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        self.listings.page = 1;
    }

    pub fn set_time_period(&mut self, period: &str) -> anyhow::Result<()> {
        self.time_period = crate::config::validate_time_period(period)?;
        self.rankings.page = 1;
        Ok(())
    }

    /// Advance when the current page reported more rows
    pub fn next_page(&mut self) -> bool {
        match self.list_tab_mut(self.tab) {
            Some(t) if t.data.has_more => {
                t.page += 1;
                true
            }
            _ => false,
        }
    }

    pub fn prev_page(&mut self) -> bool {
        match self.list_tab_mut(self.tab) {
            Some(t) if t.page > 1 => {
                t.page -= 1;
                true
            }
            _ => false,
        }
    }

    fn query(&self, page: usize) -> PageQuery {
        PageQuery {
            page,
            page_size: self.page_size,
            hide_incomplete: self.filters.hide_incomplete,
            marketplace: self.filters.marketplace.clone(),
            collection: self.filters.collection.clone(),
        }
    }

    /// Load the current tab
    pub async fn refresh(&mut self) -> &LoadState {
        let tab = self.tab;
        debug::log(cat::VIEW, format!("refresh {}", tab.label()));
        match tab {
            Tab::Listings => self.load_listings().await,
            Tab::MyNfts => self.load_owned().await,
            Tab::Rankings => self.load_rankings().await,
            Tab::Analytics => self.load_stats().await,
        }
        self.load_state()
    }

    /// Drop cached pages, then reload the current tab
    pub async fn force_refresh(&mut self) -> &LoadState {
        self.service.invalidate(None);
        self.refresh().await
    }

    async fn load_listings(&mut self) {
        if self.marketplace_names.is_empty() {
            match self.service.marketplaces().await {
                Ok(list) => self.marketplace_names = list.into_iter().map(|m| m.name).collect(),
                Err(e) => log::warn!("[dashboard] marketplace filter list unavailable: {e}"),
            }
        }
        self.listings.state = LoadState::Loading;
        let q = self.query(self.listings.page);
        let res = self.service.listings(&q).await;
        self.listings
            .apply(FetchOutcome::settle(res, || Page::empty(q.page, q.page_size)));
    }

    async fn load_owned(&mut self) {
        let Some(owner) = self.wallet.address() else {
            self.owned.state = LoadState::Idle;
            self.owned.data = Page::empty(1, self.page_size);
            self.owned.notice = Some(CONNECT_WALLET.to_string());
            return;
        };
        self.owned.state = LoadState::Loading;
        let mut q = self.query(self.owned.page);
        q.marketplace = None;
        q.collection = None;
        let res = self.service.owned(&owner, &q).await;
        self.owned
            .apply(FetchOutcome::settle(res, || Page::empty(q.page, q.page_size)));
    }

    async fn load_rankings(&mut self) {
        self.rankings.state = LoadState::Loading;
        let q = PageQuery::new(self.rankings.page, self.page_size);
        let res = self.service.rankings(&self.time_period, &q).await;
        self.rankings
            .apply(FetchOutcome::settle(res, || Page::empty(q.page, q.page_size)));
    }

    async fn load_stats(&mut self) {
        self.stats_state = LoadState::Loading;
        let outcome = FetchOutcome::settle(self.service.stats().await, AggregatorStats::empty);
        self.stats_state = match (&outcome.error, outcome.value.total_marketplaces) {
            (Some(msg), _) => LoadState::Failed(msg.clone()),
            (None, 0) => LoadState::Empty,
            (None, _) => LoadState::Ready,
        };
        self.stats = Some(outcome.value);
    }

    /// Connect a detected wallet; the owned view restarts at page 1
    pub async fn connect_wallet(&mut self, name: &str) -> Result<(), WalletError> {
        self.wallet.connect(name).await?;
        self.owned = ListTab::new(self.page_size);
        Ok(())
    }

    pub async fn disconnect_wallet(&mut self) -> Result<(), WalletError> {
        self.wallet.disconnect().await?;
        self.owned = ListTab::new(self.page_size);
        Ok(())
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let (items, has_more, notice) = match self.list_tab(self.tab) {
            Some(t) => (t.data.items.clone(), t.data.has_more, t.notice.clone()),
            None => (Vec::new(), false, None),
        };
        DashboardSnapshot {
            tab: self.tab,
            tab_label: self.tab.label(),
            load_state: self.load_state().clone(),
            notice,
            page: self.page(),
            page_size: self.page_size,
            has_more,
            filters: self.filters.clone(),
            time_period: self.time_period.clone(),
            items,
            stats: match self.tab {
                Tab::Analytics => self.stats.clone(),
                _ => None,
            },
            marketplaces: self.marketplace_names.clone(),
            wallet: self.wallet.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tab_names() {
        assert_eq!("my-nfts".parse::<Tab>().unwrap(), Tab::MyNfts);
        assert_eq!("Rankings".parse::<Tab>().unwrap(), Tab::Rankings);
        assert_eq!("stats".parse::<Tab>().unwrap(), Tab::Analytics);
        assert!("home".parse::<Tab>().is_err());
    }

    #[test]
    fn settle_replaces_errors_with_empty_value() {
        let ok: FetchOutcome<Vec<u8>> = FetchOutcome::settle(Ok(vec![1]), Vec::new);
        assert_eq!(ok.value, vec![1]);
        assert!(ok.error.is_none());

        let failed: FetchOutcome<Vec<u8>> =
            FetchOutcome::settle(Err(GatewayError::Transport("connection reset".into())), Vec::new);
        assert!(failed.value.is_empty());
        assert!(failed.error.unwrap().contains("connection reset"));
    }

    #[test]
    fn load_state_serializes_with_message() {
        let v = serde_json::to_value(LoadState::Failed("boom".into())).unwrap();
        assert_eq!(v, serde_json::json!({"state": "failed", "message": "boom"}));
        let v = serde_json::to_value(LoadState::Ready).unwrap();
        assert_eq!(v, serde_json::json!({"state": "ready"}));
    }
}
