//! Image URL resolution for NFT cards
//!
//! Upstream token records expose up to six optional media fields plus a
//! generic token URI. The resolver walks them in a fixed priority order and
//! falls back to fetching the linked metadata JSON, then to a generated
//! placeholder. Resolution never fails.
//!
//! ## Priority (first match wins)
//!
//! 1. `cdn_image_uri`
//! 2. `raw_image_uri` (ipfs rewrite, no extension required)
//! 3. `cdn_animation_uri`
//! 4. `raw_animation_uri`
//! 5. `asset_uri` when it carries an image extension
//! 6. metadata JSON from `cdn_json_uri`, a `.json` `asset_uri`, or `token_uri`
//! 7. placeholder encoding the display name

use serde_json::Value;

use crate::constants::endpoints::{IPFS_GATEWAY, PLACEHOLDER_IMAGE};
use crate::debug::{self, cat};
use crate::gateway::DataGateway;
use crate::types::{ImageSource, MediaKind};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "avif"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "m4v", "ogv"];

/// Metadata document keys holding media, in priority order
const METADATA_IMAGE_KEYS: &[&str] = &["image", "image_url", "imageUrl", "animation_url", "animationUrl"];

/// Strip query and fragment from a URL
#[inline]
fn strip_query_frag(s: &str) -> &str {
    match s.find(['?', '#']) {
        Some(i) => &s[..i],
        None => s,
    }
}

/// Lowercased extension of the last path segment, if any
pub fn extension(url: &str) -> Option<String> {
    let path = strip_query_frag(url.trim());
    let segment = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

pub fn has_image_extension(url: &str) -> bool {
    extension(url).is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

pub fn has_video_extension(url: &str) -> bool {
    extension(url).is_some_and(|e| VIDEO_EXTENSIONS.contains(&e.as_str()))
}

pub fn is_json_uri(url: &str) -> bool {
    extension(url).is_some_and(|e| e == "json")
}

/// Decide how a resolved URL should be rendered
pub fn media_kind(url: &str) -> MediaKind {
    if has_video_extension(url) {
        MediaKind::Video
    } else if has_image_extension(url) {
        MediaKind::Image
    } else {
        MediaKind::Unknown
    }
}

/// Rewrite `ipfs://<hash>` (and `ipfs://ipfs/<hash>`) to an HTTP gateway URL.
/// Anything else is returned unchanged.
pub fn ipfs_to_http(uri: &str, gateway_host: &str) -> String {
    let trimmed = uri.trim();
    let Some(rest) = trimmed
        .get(..7)
        .filter(|scheme| scheme.eq_ignore_ascii_case("ipfs://"))
        .map(|_| &trimmed[7..])
    else {
        return trimmed.to_string();
    };
    let hash = rest.strip_prefix("ipfs/").unwrap_or(rest);
    format!("https://{}/ipfs/{}", gateway_host.trim_end_matches('/'), hash)
}

/// Placeholder image URL with the display name as caption
pub fn placeholder_url(display_name: &str) -> String {
    format!("{PLACEHOLDER_IMAGE}?text={}", urlencoding::encode(display_name))
}

/// Optional media fields pulled from an upstream token record
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageFields {
    pub cdn_image_uri: Option<String>,
    pub raw_image_uri: Option<String>,
    pub cdn_animation_uri: Option<String>,
    pub raw_animation_uri: Option<String>,
    pub asset_uri: Option<String>,
    pub cdn_json_uri: Option<String>,
    pub token_uri: Option<String>,
}

fn non_empty(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(|x| x.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl ImageFields {
    /// Read fields from a `current_token_data` object: `cdn_asset_uris.*`
    /// plus `token_uri`.
    pub fn from_token_data(token: &Value) -> Self {
        let cdn = &token["cdn_asset_uris"];
        Self {
            cdn_image_uri: non_empty(cdn, "cdn_image_uri"),
            raw_image_uri: non_empty(cdn, "raw_image_uri"),
            cdn_animation_uri: non_empty(cdn, "cdn_animation_uri"),
            raw_animation_uri: non_empty(cdn, "raw_animation_uri"),
            asset_uri: non_empty(cdn, "asset_uri"),
            cdn_json_uri: non_empty(cdn, "cdn_json_uri"),
            token_uri: non_empty(token, "token_uri"),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Outcome of resolution
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedImage {
    pub url: String,
    pub source: ImageSource,
    pub media_kind: MediaKind,
}

impl ResolvedImage {
    fn new(url: String, source: ImageSource) -> Self {
        let media_kind = media_kind(&url);
        Self { url, source, media_kind }
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == ImageSource::Placeholder
    }
}

/// Pick the first media field from a metadata JSON document
pub fn image_from_metadata(doc: &Value) -> Option<String> {
    METADATA_IMAGE_KEYS.iter().find_map(|k| non_empty(doc, k))
}

#[derive(Clone, Debug)]
pub struct ImageResolver {
    gateway_host: String,
}

impl Default for ImageResolver {
    fn default() -> Self {
        Self::new(IPFS_GATEWAY)
    }
}

impl ImageResolver {
    pub fn new(gateway_host: impl Into<String>) -> Self {
        Self {
            gateway_host: gateway_host.into(),
        }
    }

    pub fn rewrite(&self, uri: &str) -> String {
        ipfs_to_http(uri, &self.gateway_host)
    }

    /// Steps 1-5: fields that resolve without a network call
    pub fn resolve_direct(&self, f: &ImageFields) -> Option<ResolvedImage> {
        let direct = [
            (&f.cdn_image_uri, ImageSource::CdnImage),
            (&f.raw_image_uri, ImageSource::RawImage),
            (&f.cdn_animation_uri, ImageSource::CdnAnimation),
            (&f.raw_animation_uri, ImageSource::RawAnimation),
        ];
        for (field, source) in direct {
            if let Some(uri) = field {
                return Some(ResolvedImage::new(self.rewrite(uri), source));
            }
        }

        f.asset_uri
            .as_deref()
            .map(|a| self.rewrite(a))
            .filter(|a| has_image_extension(a))
            .map(|a| ResolvedImage::new(a, ImageSource::AssetUri))
    }

    /// Step 6 candidates in the order they are tried
    pub fn metadata_candidates(&self, f: &ImageFields) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let json_asset = f.asset_uri.as_deref().filter(|a| is_json_uri(a));
        for uri in [f.cdn_json_uri.as_deref(), json_asset, f.token_uri.as_deref()]
            .into_iter()
            .flatten()
        {
            let url = self.rewrite(uri);
            if !out.contains(&url) {
                out.push(url);
            }
        }
        out
    }

    /// Run the full chain. Metadata fetch failures are reported on the debug
    /// channel and skipped.
    pub async fn resolve(
        &self,
        fields: &ImageFields,
        display_name: &str,
        gateway: &dyn DataGateway,
    ) -> ResolvedImage {
        if let Some(found) = self.resolve_direct(fields) {
            return found;
        }

        for url in self.metadata_candidates(fields) {
            match gateway.fetch_json(&url).await {
                Ok(doc) => {
                    if let Some(img) = image_from_metadata(&doc) {
                        return ResolvedImage::new(self.rewrite(&img), ImageSource::MetadataJson);
                    }
                    debug::log(cat::IMAGE, format!("no media field in {url}"));
                }
                Err(e) => {
                    log::debug!("[image] metadata fetch failed for {url}: {e}");
                    debug::log(cat::IMAGE, format!("metadata fetch failed for {url}: {e}"));
                }
            }
        }

        ResolvedImage::new(placeholder_url(display_name), ImageSource::Placeholder)
    }
}
