//! Application constants
//!
//! Centralized endpoints, unit conversions, caching windows and pagination
//! knobs used throughout the crate.

/// Upstream service endpoints
pub mod endpoints {
    /// Aptos indexer GraphQL (token data, ownerships)
    pub const INDEXER_GRAPHQL: &str = "https://api.mainnet.aptoslabs.com/v1/graphql";

    /// NFT aggregator GraphQL (marketplace listings across vendors)
    pub const AGGREGATOR_GRAPHQL: &str =
        "https://api.mainnet.aptoslabs.com/nft-aggregator/v1/graphql";

    /// Analytics REST base (collection rankings, marketplace sales)
    pub const ANALYTICS_REST: &str = "https://api.mainnet.aptoslabs.com/v1/analytics";

    /// HTTP gateway used to rewrite `ipfs://` URIs
    pub const IPFS_GATEWAY: &str = "ipfs.io";

    /// Placeholder image service (display name goes in `text=`)
    pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/400x400";

    /// Analytics path for collection rankings
    pub const RANKINGS_PATH: &str = "nft/collection/list_by_volume";

    /// Analytics path for per-marketplace sales counts
    pub const MARKETPLACE_SALES_PATH: &str = "nft/marketplace/sales";
}

/// Currency units
pub mod units {
    /// Octas per APT (display amount = octas / 10^8)
    pub const OCTAS_PER_APT: u64 = 100_000_000;

    /// Display unit for converted prices
    pub const CURRENCY: &str = "APT";
}

/// Cache and pagination behavior
pub mod cache {
    /// Listings cache expiration (5 minutes)
    pub const EXPIRATION_SECS: u64 = 300;

    /// Default number of cards per page
    pub const DEFAULT_PAGE_SIZE: usize = 8;

    /// Over-fetch multiplier when a client-side completeness filter is active
    ///
    /// The upstream indexer cannot filter on derived fields, so we pull a
    /// larger batch and paginate over the filtered result locally.
    pub const OVERFETCH_FACTOR: usize = 4;

    /// Hard cap on the over-fetched batch. Filtered pages past this window
    /// come back empty.
    pub const MAX_BATCH: usize = 400;

    /// Rows whose image metadata is fetched at the same time
    pub const METADATA_CONCURRENCY: usize = 8;
}

/// User-facing message strings
pub mod messages {
    /// Placeholder text when a record has no name
    pub const UNKNOWN: &str = "Unknown";

    /// Shown when the owned tab is opened without a connected wallet
    pub const CONNECT_WALLET: &str = "Connect a wallet to view your NFTs";

    /// Empty-state panel text
    pub const NO_RESULTS: &str = "No NFTs found";
}
