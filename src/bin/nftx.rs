// Native binary for nftx - terminal front-end over the dashboard view model

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use nftx::{
    config::{CliArgs, Config},
    dashboard::{Dashboard, DashboardSnapshot, LoadState, Tab},
    debug,
    marketplace::display_name,
    service::{ListingsService, ServiceOptions},
    util_text::{short_address, truncate},
    wallet::{WalletConnector, WalletProvider, WatchOnlyWallet},
    HttpGateway,
};

/// nftx - Aptos NFT marketplace dashboard
///
/// Configuration priority: CLI args > Environment variables > Defaults
#[derive(Parser, Debug)]
#[command(name = "nftx")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Aptos NFT marketplace listings, holdings and analytics", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: CliArgs,

    /// Print the dashboard snapshot as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    /// Print the resolved configuration to stderr before running
    #[arg(long, global = true)]
    show_config: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Active marketplace listings
    Listings {
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Marketplace display name ("Tradeport", "Wapal", ...)
        #[arg(long)]
        marketplace: Option<String>,
        /// Collection name fragment
        #[arg(long)]
        collection: Option<String>,
        /// Only show records with name, description and a real image
        #[arg(long)]
        hide_incomplete: bool,
    },
    /// Tokens owned by the watched wallet address
    Owned {
        /// Overrides WALLET_ADDRESS
        #[arg(long)]
        address: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        hide_incomplete: bool,
    },
    /// Collections ranked by trading volume
    Rankings {
        /// 1h, 6h, 1d, 7d, 30d (defaults to TIME_PERIOD)
        #[arg(long)]
        period: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Marketplace share of active listings
    Stats,
    /// Resolve raw marketplace identifiers to display names
    MarketplaceName {
        #[arg(required = true)]
        raw: Vec<String>,
    },
}

fn build_dashboard(cfg: &Config, address: Option<String>) -> Dashboard {
    let gateway = Arc::new(HttpGateway::new(cfg));
    let service = Arc::new(ListingsService::new(gateway, ServiceOptions::from_config(cfg)));

    let mut providers: Vec<Arc<dyn WalletProvider>> = Vec::new();
    if let Some(addr) = address.or_else(|| cfg.wallet_address.clone()) {
        providers.push(Arc::new(WatchOnlyWallet::new(addr, cfg.network.clone())));
    }
    let wallet = Arc::new(WalletConnector::new(providers));
    Dashboard::new(service, wallet, cfg.page_size)
}

/// Walk forward from page 1 so `has_more` gates every step like the UI does
async fn go_to_page(dash: &mut Dashboard, page: usize) -> Result<()> {
    dash.refresh().await;
    while dash.page() < page {
        if !dash.next_page() {
            return Err(anyhow!("page {page} is past the last page ({})", dash.page()));
        }
        dash.refresh().await;
    }
    Ok(())
}

fn print_table(snap: &DashboardSnapshot) {
    println!(
        "{} · page {} · {}{}",
        snap.tab_label,
        snap.page,
        snap.items.len(),
        if snap.has_more { " (more)" } else { "" }
    );
    if let Some(note) = &snap.notice {
        println!("{note}");
    }
    for r in &snap.items {
        let price = r.price.as_ref().map(|p| p.display()).unwrap_or_else(|| "-".into());
        let flag = if r.has_complete_metadata { ' ' } else { '*' };
        let rank = r.traits.get("rank").map(|s| format!("#{s} ")).unwrap_or_default();
        println!(
            "{flag} {rank}{:<32} {:<24} {:>16}  {:<14} {}",
            truncate(&r.name, 32),
            truncate(&r.collection, 24),
            price,
            r.marketplace,
            short_address(&r.owner),
        );
    }
    if let Some(stats) = &snap.stats {
        println!(
            "{} listings across {} marketplaces ({:?})",
            stats.total_listings, stats.total_marketplaces, stats.strategy
        );
        for s in &stats.distribution {
            println!("  {:<24} {:>8} {:>4}%", s.name, s.active_listings, s.percentage);
        }
    }
}

fn emit(snap: &DashboardSnapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snap)?);
    } else {
        print_table(snap);
    }
    match &snap.load_state {
        LoadState::Failed(msg) => Err(anyhow!("request failed: {msg}")),
        _ => Ok(()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (safe to ignore if not found)
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    debug::init_from_env_once();

    let cli = Cli::parse();
    let cfg = Config::from_args(cli.config).context("Failed to load configuration")?;
    if cli.show_config {
        cfg.print_summary();
    }

    match cli.command {
        Command::MarketplaceName { raw } => {
            for r in raw {
                println!("{r}\t{}", display_name(&r));
            }
            Ok(())
        }
        Command::Listings {
            page,
            marketplace,
            collection,
            hide_incomplete,
        } => {
            let mut dash = build_dashboard(&cfg, None);
            dash.set_marketplace(marketplace.as_deref());
            dash.set_collection(collection.as_deref());
            if hide_incomplete {
                dash.toggle_hide_incomplete();
            }
            go_to_page(&mut dash, page).await?;
            emit(&dash.snapshot(), cli.json)
        }
        Command::Owned {
            address,
            page,
            hide_incomplete,
        } => {
            let mut dash = build_dashboard(&cfg, address);
            dash.connect_wallet(WatchOnlyWallet::NAME)
                .await
                .context("No wallet address; pass --address or set WALLET_ADDRESS")?;
            dash.select_tab(Tab::MyNfts);
            if hide_incomplete {
                dash.toggle_hide_incomplete();
            }
            go_to_page(&mut dash, page).await?;
            emit(&dash.snapshot(), cli.json)
        }
        Command::Rankings { period, page } => {
            let mut dash = build_dashboard(&cfg, None);
            dash.select_tab(Tab::Rankings);
            if let Some(p) = period {
                dash.set_time_period(&p)?;
            }
            go_to_page(&mut dash, page).await?;
            emit(&dash.snapshot(), cli.json)
        }
        Command::Stats => {
            let mut dash = build_dashboard(&cfg, None);
            dash.select_tab(Tab::Analytics);
            dash.refresh().await;
            emit(&dash.snapshot(), cli.json)
        }
    }
}
