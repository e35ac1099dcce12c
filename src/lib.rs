//! nftx - Aptos NFT marketplace dashboard data layer
//!
//! Fetches marketplace listings, wallet-owned tokens, collection rankings and
//! marketplace statistics from the Aptos indexer, NFT aggregator and analytics
//! APIs, normalizes them into uniform display records, and caches pages for a
//! short window.
//!
//! ## Layout
//!
//! - `gateway`: GraphQL / REST / metadata calls behind the `DataGateway` trait
//! - `normalize`, `image`, `marketplace`: upstream rows → `ListingRecord`
//! - `cache`: time-expiring page cache with an injectable clock
//! - `service`: pagination policy and cache-through fetches
//! - `stats`: marketplace share computation
//! - `wallet`: wallet connector (read-only)
//! - `dashboard`: headless view model for the four tabs
//!
//! For native builds:
//! ```bash
//! cargo build --features native
//! ```
//!
//! For web builds:
//! ```bash
//! cargo build --target wasm32-unknown-unknown --no-default-features --features web
//! ```

// Core modules (available on all platforms)
pub mod cache;
pub mod config;
pub mod constants;
pub mod types;
pub mod util_text;

// Debug logging system (available on all platforms)
pub mod debug;

// Upstream access and normalization
pub mod gateway;
pub mod image;
pub mod marketplace;
pub mod normalize;
pub mod queries;

pub mod dashboard;
pub mod service;
pub mod stats;
pub mod wallet;

// WASM exports (web only)
#[cfg(target_arch = "wasm32")]
pub mod wasm_api;

pub use cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use config::Config;
pub use dashboard::{Dashboard, DashboardSnapshot, LoadState, Tab};
pub use gateway::{DataGateway, GatewayError, HttpGateway};
pub use service::{ListingsService, PageQuery, ServiceOptions};
pub use types::{AggregatorStats, ListingRecord, MarketplaceConfig, Page, Price};
pub use wallet::{WalletConnector, WalletError, WalletProvider, WatchOnlyWallet};
