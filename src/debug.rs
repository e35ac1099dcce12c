//! Filterable diagnostic channel
//!
//! Categories: GATEWAY, CACHE, IMAGE, WALLET, VIEW
//! Enable via: NFTX_DEBUG=image,cache (native) or ?nftxdebug=all (web)
//!
//! Failures that the data layer swallows on purpose (metadata JSON fetches in
//! the image fallback chain, for instance) are reported here so they stay
//! observable without changing control flow.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, OnceLock};

pub mod cat {
    pub const GATEWAY: u32 = 1 << 0;
    pub const CACHE: u32 = 1 << 1;
    pub const IMAGE: u32 = 1 << 2;
    pub const WALLET: u32 = 1 << 3;
    pub const VIEW: u32 = 1 << 4;
    pub const ALL: u32 = 0xffff_ffff;
}

/// Maximum number of diagnostic lines retained for `recent()`
const MAX_RECENT: usize = 50;

static MASK: AtomicU32 = AtomicU32::new(0);
static RECENT: OnceLock<Mutex<VecDeque<String>>> = OnceLock::new();

fn recent_ref() -> &'static Mutex<VecDeque<String>> {
    RECENT.get_or_init(|| Mutex::new(VecDeque::with_capacity(MAX_RECENT)))
}

#[inline]
pub fn mask() -> u32 {
    MASK.load(Ordering::Relaxed)
}

#[inline]
pub fn set(mask: u32) {
    MASK.store(mask, Ordering::Relaxed)
}

#[inline]
pub fn enable(bits: u32) {
    MASK.fetch_or(bits, Ordering::Relaxed);
}

#[inline]
pub fn disable(bits: u32) {
    MASK.fetch_and(!bits, Ordering::Relaxed);
}

#[inline]
pub fn is(cat: u32) -> bool {
    (MASK.load(Ordering::Relaxed) & cat) != 0
}

#[inline]
pub fn cat_name(cat: u32) -> &'static str {
    match cat {
        c if c == cat::GATEWAY => "gateway",
        c if c == cat::CACHE => "cache",
        c if c == cat::IMAGE => "image",
        c if c == cat::WALLET => "wallet",
        c if c == cat::VIEW => "view",
        _ => "misc",
    }
}

pub fn set_from_list(list: &str) {
    let mut m: u32 = 0;
    for tok in list.split(',').map(|s| s.trim().to_ascii_lowercase()) {
        match tok.as_str() {
            "" | "none" => m = 0,
            "all" => m = cat::ALL,
            "gateway" => m |= cat::GATEWAY,
            "cache" => m |= cat::CACHE,
            "image" => m |= cat::IMAGE,
            "wallet" => m |= cat::WALLET,
            "view" => m |= cat::VIEW,
            _ => {}
        }
    }
    set(m);
}

/// Read `NFTX_DEBUG` once (native builds)
#[cfg(not(target_arch = "wasm32"))]
pub fn init_from_env_once() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        if let Ok(v) = std::env::var("NFTX_DEBUG") {
            set_from_list(&v);
        }
    });
}

/// Read `?nftxdebug=` from the page URL and `nftx.debug` from localStorage
#[cfg(target_arch = "wasm32")]
pub fn init_from_env_once() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        use web_sys::{window, UrlSearchParams};
        if let Some(win) = window() {
            let from_query = win
                .location()
                .search()
                .ok()
                .and_then(|search| UrlSearchParams::new_with_str(&search).ok())
                .and_then(|params| params.get("nftxdebug"));
            if let Some(list) = from_query {
                set_from_list(&list);
            }
            if let Ok(Some(storage)) = win.local_storage() {
                if let Ok(Some(v)) = storage.get_item("nftx.debug") {
                    set_from_list(&v);
                }
            }
        }
    });
}

/// Record a diagnostic line if `cat` is enabled.
///
/// Lines are forwarded to the `log` facade under the `nftx::debug` target
/// and kept in a small ring buffer for on-screen debug panels.
pub fn log(cat: u32, msg: impl AsRef<str>) {
    if !is(cat) {
        return;
    }
    let line = format!("[nftx][{}] {}", cat_name(cat), msg.as_ref());
    log::info!(target: "nftx::debug", "{line}");
    if let Ok(mut buf) = recent_ref().lock() {
        if buf.len() == MAX_RECENT {
            buf.pop_front();
        }
        buf.push_back(line);
    }
}

/// Most recent diagnostic lines, oldest first
pub fn recent() -> Vec<String> {
    recent_ref()
        .lock()
        .map(|buf| buf.iter().cloned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_category_lists() {
        set_from_list("image, cache");
        assert!(is(cat::IMAGE));
        assert!(is(cat::CACHE));
        assert!(!is(cat::WALLET));

        set_from_list("all");
        assert!(is(cat::WALLET));
        log(cat::VIEW, "sample line");
        assert!(recent().iter().any(|l| l == "[nftx][view] sample line"));

        set_from_list("none");
        assert_eq!(mask(), 0);
    }

    #[test]
    fn names_known_categories() {
        assert_eq!(cat_name(cat::GATEWAY), "gateway");
        assert_eq!(cat_name(cat::VIEW), "view");
        assert_eq!(cat_name(cat::ALL), "misc");
    }
}
