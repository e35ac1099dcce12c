//! Wallet connector
//!
//! Holds the list of detected wallet providers and the current connection.
//! The connector only reads account and network; it never signs.
//! Debug category: WALLET

use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::debug::{self, cat};
use crate::util_text::short_address;

/// Wallet family shown first and marked as recommended
pub const PREFERRED_WALLET: &str = "Petra";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("wallet '{0}' is not installed")]
    NotDetected(String),
    #[error("connection rejected: {0}")]
    Rejected(String),
    #[error("no wallet connected")]
    NotConnected,
    #[error("invalid account address '{0}'")]
    InvalidAddress(String),
}

/// Account exposed by a connected wallet
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WalletAccount {
    pub address: String,
    pub public_key: Option<String>,
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait WalletProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn connect(&self) -> Result<WalletAccount, WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;

    /// Network the wallet is pointed at ("mainnet", "testnet", ...)
    async fn network(&self) -> Result<String, WalletError>;
}

/// Aptos account addresses: `0x` followed by 1-64 hex digits
pub fn is_valid_address(addr: &str) -> bool {
    let Some(hex) = addr.strip_prefix("0x") else {
        return false;
    };
    !hex.is_empty() && hex.len() <= 64 && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Read-only "wallet" for a fixed address (terminal front-end, demos)
#[derive(Clone, Debug)]
pub struct WatchOnlyWallet {
    address: String,
    network: String,
}

impl WatchOnlyWallet {
    pub const NAME: &'static str = "Watch-only";

    pub fn new(address: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            address: address.into().trim().to_lowercase(),
            network: network.into(),
        }
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl WalletProvider for WatchOnlyWallet {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn connect(&self) -> Result<WalletAccount, WalletError> {
        if !is_valid_address(&self.address) {
            return Err(WalletError::InvalidAddress(self.address.clone()));
        }
        Ok(WalletAccount {
            address: self.address.clone(),
            public_key: None,
        })
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        Ok(())
    }

    async fn network(&self) -> Result<String, WalletError> {
        Ok(self.network.clone())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WalletState {
    pub wallet: Option<String>,
    pub account: Option<WalletAccount>,
    pub network: Option<String>,
}

impl WalletState {
    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }
}

/// One entry of the wallet picker
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WalletOption {
    pub name: String,
    pub preferred: bool,
}

pub struct WalletConnector {
    providers: Vec<Arc<dyn WalletProvider>>,
    state: Mutex<WalletState>,
}

impl Default for WalletConnector {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl WalletConnector {
    pub fn new(providers: Vec<Arc<dyn WalletProvider>>) -> Self {
        Self {
            providers,
            state: Mutex::new(WalletState::default()),
        }
    }

    pub fn register(&mut self, provider: Arc<dyn WalletProvider>) {
        self.providers.push(provider);
    }

    /// Detected wallets, preferred family first, otherwise detection order
    pub fn detected(&self) -> Vec<WalletOption> {
        let mut out: Vec<WalletOption> = self
            .providers
            .iter()
            .map(|p| WalletOption {
                name: p.name().to_string(),
                preferred: p.name().eq_ignore_ascii_case(PREFERRED_WALLET),
            })
            .collect();
        out.sort_by_key(|o| !o.preferred);
        out
    }

    pub fn state(&self) -> WalletState {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Address of the connected account, used as the "My NFTs" owner
    pub fn address(&self) -> Option<String> {
        self.state().account.map(|a| a.address)
    }

    fn set_state(&self, next: WalletState) {
        if let Ok(mut s) = self.state.lock() {
            *s = next;
        }
    }

    /// Connect to the wallet named `name` (case-insensitive).
    /// Any previous connection is replaced only on success.
    pub async fn connect(&self, name: &str) -> Result<WalletAccount, WalletError> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| {
                debug::log(cat::WALLET, format!("connect: '{name}' not detected"));
                WalletError::NotDetected(name.to_string())
            })?;

        let account = provider.connect().await?;
        let network = match provider.network().await {
            Ok(n) => Some(n),
            Err(e) => {
                log::warn!("[wallet] network lookup failed: {e}");
                None
            }
        };

        debug::log(
            cat::WALLET,
            format!("connected {} via {}", short_address(&account.address), provider.name()),
        );
        self.set_state(WalletState {
            wallet: Some(provider.name().to_string()),
            account: Some(account.clone()),
            network,
        });
        Ok(account)
    }

    pub async fn disconnect(&self) -> Result<(), WalletError> {
        let current = self.state();
        let Some(name) = current.wallet else {
            return Err(WalletError::NotConnected);
        };
        if let Some(p) = self.providers.iter().find(|p| p.name() == name) {
            if let Err(e) = p.disconnect().await {
                log::warn!("[wallet] provider disconnect failed: {e}");
            }
        }
        self.set_state(WalletState::default());
        debug::log(cat::WALLET, "disconnected");
        Ok(())
    }
}
