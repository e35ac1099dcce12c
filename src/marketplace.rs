//! Marketplace naming and registry
//!
//! The aggregator reports listings under raw, sometimes versioned identifiers
//! (`tradeport_v1`, `tradeport_v2`, `bluemove_v1`). The dashboard shows one
//! logical marketplace per display name and maps filters back to every raw
//! identifier behind it.

use regex::Regex;
use std::sync::OnceLock;

use crate::types::MarketplaceConfig;
use crate::util_text::title_case_words;

/// Identifiers matched whole (lowercased) before the fragment scan.
///
/// The deprecated BlueMove contract keeps its own label. Its formatted form is
/// listed too so that formatting stays idempotent.
const EXACT_NAMES: &[(&str, &str)] = &[
    ("bluemove_v1", "BlueMove (Deprecated)"),
    ("bluemove (deprecated)", "BlueMove (Deprecated)"),
];

/// Known vendor fragments, checked in order against the lowercased input
const VENDOR_NAMES: &[(&str, &str)] = &[
    ("bluemove", "BlueMove"),
    ("tradeport", "Tradeport"),
    ("topaz", "Topaz"),
    ("souffl3", "Souffl3"),
    ("wapal", "Wapal"),
    ("rarible", "Rarible"),
    ("mercato", "Mercato"),
];

/// Display name, website, logo
const REGISTRY: &[(&str, &str, &str)] = &[
    ("Tradeport", "https://www.tradeport.xyz", "https://www.tradeport.xyz/favicon.ico"),
    ("BlueMove", "https://bluemove.net", "https://bluemove.net/favicon.ico"),
    ("BlueMove (Deprecated)", "https://bluemove.net", "https://bluemove.net/favicon.ico"),
    ("Topaz", "https://www.topaz.so", "https://www.topaz.so/favicon.ico"),
    ("Souffl3", "https://souffl3.com", "https://souffl3.com/favicon.ico"),
    ("Wapal", "https://wapal.io", "https://wapal.io/favicon.ico"),
    ("Rarible", "https://rarible.com", "https://rarible.com/favicon.ico"),
    ("Mercato", "https://mercato.xyz", "https://mercato.xyz/favicon.ico"),
];

static VERSION_SUFFIX: OnceLock<Regex> = OnceLock::new();

fn version_suffix() -> &'static Regex {
    VERSION_SUFFIX.get_or_init(|| Regex::new(r"(?i)_v?\d+$").expect("version suffix regex"))
}

/// Derive the display name for a raw marketplace identifier
///
/// Known vendors map to fixed labels; anything else loses its version suffix
/// (`_v2`, `_3`), turns `_`/`-` into spaces and is title-cased.
pub fn display_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return crate::constants::messages::UNKNOWN.to_string();
    }

    let lower = trimmed.to_lowercase();
    if let Some((_, label)) = EXACT_NAMES
        .iter()
        .find(|(id, _)| lower == *id)
        .or_else(|| VENDOR_NAMES.iter().find(|(frag, _)| lower.contains(frag)))
    {
        return (*label).to_string();
    }

    let stripped = version_suffix().replace(trimmed, "");
    let spaced = stripped.replace(['_', '-'], " ");
    let titled = title_case_words(&spaced);
    if titled.is_empty() {
        crate::constants::messages::UNKNOWN.to_string()
    } else {
        titled
    }
}

/// URL-safe id from a display name ("BlueMove (Deprecated)" → "bluemove-deprecated")
pub fn slug(display: &str) -> String {
    display
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn registry_entry(display: &str) -> Option<&'static (&'static str, &'static str, &'static str)> {
    REGISTRY.iter().find(|(name, _, _)| *name == display)
}

/// Collapse raw identifiers into one config per display name, first-seen order
pub fn group_marketplaces<S: AsRef<str>>(raw_ids: &[S], network: &str) -> Vec<MarketplaceConfig> {
    let mut out: Vec<MarketplaceConfig> = Vec::new();
    for raw in raw_ids.iter().map(AsRef::as_ref) {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let name = display_name(raw);
        if let Some(existing) = out.iter_mut().find(|m| m.name == name) {
            if !existing.raw_identifiers.iter().any(|r| r == raw) {
                existing.raw_identifiers.push(raw.to_string());
            }
            continue;
        }
        let (website, logo_url, connected) = match registry_entry(&name) {
            Some((_, site, logo)) => (site.to_string(), logo.to_string(), true),
            None => (String::new(), String::new(), false),
        };
        out.push(MarketplaceConfig {
            id: slug(&name),
            name,
            website,
            logo_url,
            connected,
            networks: vec![network.to_string()],
            raw_identifiers: vec![raw.to_string()],
        });
    }
    out
}

/// Raw identifiers behind a display name. Unknown names are passed through
/// as-is so a raw identifier can be used directly as a filter.
pub fn raw_identifiers_for(display: &str, configs: &[MarketplaceConfig]) -> Vec<String> {
    configs
        .iter()
        .find(|m| m.name.eq_ignore_ascii_case(display) || m.id == display)
        .map(|m| m.raw_identifiers.clone())
        .unwrap_or_else(|| vec![display.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_vendors() {
        assert_eq!(display_name("tradeport_v2"), "Tradeport");
        assert_eq!(display_name("TOPAZ"), "Topaz");
        assert_eq!(display_name("bluemove_v2"), "BlueMove");
        assert_eq!(display_name("bluemove_v1"), "BlueMove (Deprecated)");
        assert_eq!(display_name("BlueMove_V1"), "BlueMove (Deprecated)");
        assert_eq!(display_name("bluemove_v10"), "BlueMove");
        assert_eq!(display_name("bluemove_v12"), "BlueMove");
    }

    #[test]
    fn strips_suffix_and_title_cases() {
        assert_eq!(display_name("cool_market_v3"), "Cool Market");
        assert_eq!(display_name("nft-hub_2"), "Nft Hub");
        assert_eq!(display_name("plain"), "Plain");
        assert_eq!(display_name("  "), "Unknown");
        assert_eq!(display_name("_v1"), "Unknown");
    }

    #[test]
    fn formatting_is_idempotent() {
        for raw in [
            "bluemove_v1",
            "bluemove_v2",
            "tradeport_v1",
            "cool_market_v3",
            "nft-hub_2",
            "mixedCase_market",
            "x",
        ] {
            let once = display_name(raw);
            assert_eq!(display_name(&once), once, "not idempotent for {raw}");
        }
    }

    #[test]
    fn slugs_display_names() {
        assert_eq!(slug("BlueMove (Deprecated)"), "bluemove-deprecated");
        assert_eq!(slug("Cool Market"), "cool-market");
    }

    #[test]
    fn groups_versioned_identifiers() {
        let raw = ["tradeport_v1", "topaz", "tradeport_v2", "tradeport_v1", "new_place_v1"];
        let cfgs = group_marketplaces(&raw, "mainnet");
        assert_eq!(cfgs.len(), 3);
        assert_eq!(cfgs[0].name, "Tradeport");
        assert_eq!(cfgs[0].raw_identifiers, vec!["tradeport_v1", "tradeport_v2"]);
        assert!(cfgs[0].connected);
        assert_eq!(cfgs[2].name, "New Place");
        assert!(!cfgs[2].connected);
        assert_eq!(cfgs[2].networks, vec!["mainnet"]);
    }

    #[test]
    fn maps_display_back_to_raw() {
        let cfgs = group_marketplaces(&["tradeport_v1", "tradeport_v2"], "mainnet");
        assert_eq!(
            raw_identifiers_for("tradeport", &cfgs),
            vec!["tradeport_v1", "tradeport_v2"]
        );
        assert_eq!(raw_identifiers_for("wapal", &cfgs), vec!["wapal"]);
    }
}
