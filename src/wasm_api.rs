//! Minimal JS -> Rust surface for the browser front-end.
//!
//! Pure helpers only: the browser renders cards and calls these so display
//! names, IPFS rewriting and price formatting match the native output.

#![cfg(target_arch = "wasm32")]

use wasm_bindgen::prelude::*;

/// Set up panic reporting and console logging; call once on page load.
///
/// # Example
/// ```javascript
/// window.wasm_bindgen.nftx_init();
/// ```
#[wasm_bindgen]
pub fn nftx_init() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
    crate::debug::init_from_env_once();
}

/// "tradeport_v2" -> "Tradeport"
#[wasm_bindgen]
pub fn nftx_marketplace_name(raw: String) -> String {
    crate::marketplace::display_name(&raw)
}

/// Rewrite `ipfs://` URIs to the given HTTP gateway host; other URLs pass through
#[wasm_bindgen]
pub fn nftx_ipfs_to_http(uri: String, gateway_host: Option<String>) -> String {
    let host = gateway_host.unwrap_or_else(|| crate::constants::endpoints::IPFS_GATEWAY.to_string());
    crate::image::ipfs_to_http(&uri, &host)
}

/// Octas (as a decimal string, to dodge JS number precision) -> "1.5 APT"
#[wasm_bindgen]
pub fn nftx_format_apt(octas: String) -> String {
    match octas.trim().parse::<u64>() {
        Ok(v) => crate::util_text::format_apt(v),
        Err(_) => crate::constants::messages::UNKNOWN.to_string(),
    }
}
