//! Dashboard view model: tabs, load states, pagination and the wallet

mod common;

use std::sync::Arc;

use common::{alternating_listings, listing_row, ownership_row, FakeGateway};
use nftx::cache::ManualClock;
use nftx::constants::messages::{CONNECT_WALLET, NO_RESULTS};
use nftx::dashboard::{Dashboard, LoadState, Tab};
use nftx::gateway::GatewayError;
use nftx::service::{ListingsService, ServiceOptions};
use nftx::wallet::{WalletConnector, WalletError, WalletProvider, WatchOnlyWallet};

const OWNER: &str = "0xabc";

fn dashboard(gw: FakeGateway, wallets: Vec<Arc<dyn WalletProvider>>) -> (Dashboard, Arc<FakeGateway>) {
    let gw = Arc::new(gw);
    let service = Arc::new(ListingsService::with_clock(
        gw.clone(),
        ServiceOptions::default(),
        Arc::new(ManualClock::new(0)),
    ));
    let wallet = Arc::new(WalletConnector::new(wallets));
    (Dashboard::new(service, wallet, 8), gw)
}

fn watch_only() -> Vec<Arc<dyn WalletProvider>> {
    vec![Arc::new(WatchOnlyWallet::new(OWNER, "mainnet"))]
}

#[tokio::test]
async fn listings_tab_pages_forward_and_back() {
    let rows = (0..20).map(|i| listing_row(i, "tradeport_v2", true)).collect();
    let (mut dash, _gw) = dashboard(FakeGateway::with_listings(rows), Vec::new());

    assert_eq!(dash.load_state(), &LoadState::Idle);
    assert_eq!(dash.refresh().await, &LoadState::Ready);
    let snap = dash.snapshot();
    assert_eq!(snap.items.len(), 8);
    assert!(snap.has_more);
    assert_eq!(snap.marketplaces, ["Tradeport"]);

    assert!(!dash.prev_page());
    assert!(dash.next_page());
    dash.refresh().await;
    assert!(dash.next_page());
    dash.refresh().await;

    let snap = dash.snapshot();
    assert_eq!(snap.page, 3);
    assert_eq!(snap.items.len(), 4);
    assert!(!snap.has_more);
    assert!(!dash.next_page());
    assert!(dash.prev_page());
    assert_eq!(dash.page(), 2);
}

#[tokio::test]
async fn toggling_the_filter_restarts_at_page_one() {
    let (mut dash, gw) = dashboard(FakeGateway::with_listings(alternating_listings(40, "wapal")), Vec::new());
    dash.refresh().await;
    dash.next_page();
    dash.refresh().await;
    assert_eq!(dash.page(), 2);

    assert!(dash.toggle_hide_incomplete());
    assert_eq!(dash.page(), 1);
    dash.refresh().await;

    let snap = dash.snapshot();
    assert!(snap.filters.hide_incomplete);
    assert!(snap.items.iter().all(|r| r.has_complete_metadata));
    let last = gw.calls_named("Listings").pop().unwrap();
    assert_eq!(last.variables["offset"], 0);
    assert_eq!(last.variables["limit"], 32);
}

#[tokio::test]
async fn failures_become_empty_results_with_a_message() {
    let gw = FakeGateway {
        fail_with: Some(GatewayError::Transport("dns lookup failed".into())),
        ..Default::default()
    };
    let (mut dash, _gw) = dashboard(gw, Vec::new());

    let state = dash.refresh().await.clone();
    match state {
        LoadState::Failed(msg) => assert!(msg.contains("dns lookup failed")),
        other => panic!("expected failure, got {other:?}"),
    }
    let snap = dash.snapshot();
    assert!(snap.items.is_empty());
    assert!(!snap.has_more);

    dash.select_tab(Tab::Analytics);
    assert!(matches!(dash.refresh().await, LoadState::Failed(_)));
    let stats = dash.snapshot().stats.unwrap();
    assert_eq!(stats.total_marketplaces, 0);
}

#[tokio::test]
async fn empty_upstream_is_distinct_from_failure() {
    let (mut dash, _gw) = dashboard(FakeGateway::default(), Vec::new());
    assert_eq!(dash.refresh().await, &LoadState::Empty);
    assert_eq!(dash.snapshot().notice.as_deref(), Some(NO_RESULTS));
}

#[tokio::test]
async fn my_nfts_requires_a_wallet() {
    let mut gw = FakeGateway::default();
    gw.owned.insert(OWNER.into(), (0..2).map(|i| ownership_row(i, OWNER)).collect());
    let (mut dash, gw) = dashboard(gw, watch_only());

    dash.select_tab(Tab::MyNfts);
    assert_eq!(dash.refresh().await, &LoadState::Idle);
    assert_eq!(dash.snapshot().notice.as_deref(), Some(CONNECT_WALLET));
    assert!(gw.calls_named("OwnedTokens").is_empty());

    let err = dash.connect_wallet("Petra").await.unwrap_err();
    assert_eq!(err, WalletError::NotDetected("Petra".into()));
    assert!(!dash.wallet().is_connected());

    dash.connect_wallet("Watch-only").await.unwrap();
    assert_eq!(dash.refresh().await, &LoadState::Ready);
    let snap = dash.snapshot();
    assert_eq!(snap.items.len(), 2);
    assert_eq!(snap.wallet.account.unwrap().address, OWNER);
    assert_eq!(gw.calls_named("OwnedTokens")[0].variables["owner"], OWNER);

    dash.disconnect_wallet().await.unwrap();
    assert_eq!(dash.refresh().await, &LoadState::Idle);
}

#[tokio::test]
async fn snapshot_serializes_for_renderers() {
    let rows = (0..3).map(|i| listing_row(i, "topaz", true)).collect();
    let (mut dash, _gw) = dashboard(FakeGateway::with_listings(rows), Vec::new());
    dash.set_marketplace(Some("Topaz"));
    dash.refresh().await;

    let v = serde_json::to_value(dash.snapshot()).unwrap();
    assert_eq!(v["tab"], "listings");
    assert_eq!(v["load_state"]["state"], "ready");
    assert_eq!(v["filters"]["marketplace"], "Topaz");
    assert_eq!(v["items"][0]["price"]["octas"], "50000000");
    assert_eq!(v["items"][0]["price"]["currency"], "APT");
    assert_eq!(v["items"][0]["image_source"], "cdn_image");
}

#[tokio::test]
async fn time_period_is_validated() {
    let (mut dash, _gw) = dashboard(FakeGateway::default(), Vec::new());
    assert!(dash.set_time_period("7d").is_ok());
    assert!(dash.set_time_period("forever").is_err());
    assert_eq!(dash.snapshot().time_period, "7d");
}
