//! Image fallback chain against a scripted metadata host

mod common;

use serde_json::json;

use common::FakeGateway;
use nftx::image::{ImageFields, ImageResolver};
use nftx::normalize::Normalizer;
use nftx::types::{ImageSource, MediaKind};

fn fields() -> ImageFields {
    ImageFields::default()
}

#[tokio::test]
async fn cdn_image_wins_over_everything_else() {
    let gw = FakeGateway::default();
    let f = ImageFields {
        cdn_image_uri: Some("https://cdn.example/a.png".into()),
        raw_image_uri: Some("ipfs://QmRaw".into()),
        token_uri: Some("https://meta.example/a.json".into()),
        ..fields()
    };
    let img = ImageResolver::default().resolve(&f, "A", &gw).await;
    assert_eq!(img.url, "https://cdn.example/a.png");
    assert_eq!(img.source, ImageSource::CdnImage);
    assert!(gw.fetched().is_empty());
}

#[tokio::test]
async fn asset_with_image_extension_needs_no_fetch() {
    let gw = FakeGateway::default();
    let f = ImageFields {
        asset_uri: Some("ipfs://QmAsset/art.PNG".into()),
        token_uri: Some("https://meta.example/1".into()),
        ..fields()
    };
    let img = ImageResolver::default().resolve(&f, "Art", &gw).await;
    assert_eq!(img.url, "https://ipfs.io/ipfs/QmAsset/art.PNG");
    assert_eq!(img.source, ImageSource::AssetUri);
    assert_eq!(img.media_kind, MediaKind::Image);
    assert!(gw.fetched().is_empty());
}

#[tokio::test]
async fn animation_is_used_before_metadata() {
    let gw = FakeGateway::default();
    let f = ImageFields {
        raw_animation_uri: Some("ipfs://ipfs/QmClip/loop.mp4".into()),
        cdn_json_uri: Some("https://cdn.example/meta.json".into()),
        ..fields()
    };
    let img = ImageResolver::default().resolve(&f, "Clip", &gw).await;
    assert_eq!(img.url, "https://ipfs.io/ipfs/QmClip/loop.mp4");
    assert_eq!(img.source, ImageSource::RawAnimation);
    assert_eq!(img.media_kind, MediaKind::Video);
}

#[tokio::test]
async fn metadata_image_url_key_is_honored() {
    let mut gw = FakeGateway::default();
    gw.documents.insert(
        "https://cdn.example/meta/7.json".into(),
        json!({ "name": "Seven", "image_url": "ipfs://QmSeven" }),
    );
    let f = ImageFields {
        asset_uri: Some("https://assets.example/7".into()),
        cdn_json_uri: Some("https://cdn.example/meta/7.json".into()),
        ..fields()
    };
    let img = ImageResolver::default().resolve(&f, "Seven", &gw).await;
    assert_eq!(img.url, "https://ipfs.io/ipfs/QmSeven");
    assert_eq!(img.source, ImageSource::MetadataJson);
}

#[tokio::test]
async fn failed_metadata_fetch_falls_through_to_next_candidate() {
    let mut gw = FakeGateway::default();
    gw.documents.insert(
        "https://ipfs.io/ipfs/QmToken".into(),
        json!({ "image": "https://img.example/t.webp" }),
    );
    let f = ImageFields {
        cdn_json_uri: Some("https://down.example/meta.json".into()),
        token_uri: Some("ipfs://QmToken".into()),
        ..fields()
    };
    let img = ImageResolver::default().resolve(&f, "T", &gw).await;
    assert_eq!(img.url, "https://img.example/t.webp");
    assert_eq!(img.source, ImageSource::MetadataJson);
    assert_eq!(
        gw.fetched(),
        ["https://down.example/meta.json", "https://ipfs.io/ipfs/QmToken"]
    );
}

#[tokio::test]
async fn placeholder_when_nothing_resolves() {
    let mut gw = FakeGateway::default();
    gw.documents
        .insert("https://meta.example/empty.json".into(), json!({ "name": "no media" }));

    let f = ImageFields {
        token_uri: Some("https://meta.example/empty.json".into()),
        ..fields()
    };
    let img = ImageResolver::default().resolve(&f, "Cool Cat", &gw).await;
    assert_eq!(img.url, "https://placehold.co/400x400?text=Cool%20Cat");
    assert!(img.is_placeholder());

    let img = ImageResolver::default().resolve(&fields(), "Cool Cat", &gw).await;
    assert_eq!(img.source, ImageSource::Placeholder);
}

#[tokio::test]
async fn custom_gateway_host_is_used_for_rewrites() {
    let gw = FakeGateway::default();
    let f = ImageFields {
        raw_image_uri: Some("IPFS://QmCase".into()),
        ..fields()
    };
    let img = ImageResolver::new("cloudflare-ipfs.com").resolve(&f, "x", &gw).await;
    assert_eq!(img.url, "https://cloudflare-ipfs.com/ipfs/QmCase");
}

#[tokio::test]
async fn placeholder_image_makes_a_record_incomplete() {
    let gw = FakeGateway::default();
    let row = json!({
        "token_data_id": "0x1",
        "marketplace": "wapal",
        "price": 1,
        "current_token_data": {
            "token_name": "Named",
            "description": "Described",
            "current_collection": { "collection_name": "C" }
        }
    });
    let rec = Normalizer::default().listing(&row, &gw).await;
    assert_eq!(rec.name, "Named");
    assert_eq!(rec.image_source, ImageSource::Placeholder);
    assert!(!rec.has_complete_metadata);
}

#[tokio::test]
async fn missing_name_defaults_to_unknown() {
    let gw = FakeGateway::default();
    let row = json!({
        "token_data_id": "0x2",
        "current_token_data": {
            "description": "only a description",
            "cdn_asset_uris": { "cdn_image_uri": "https://cdn.example/2.png" }
        }
    });
    let rec = Normalizer::default().listing(&row, &gw).await;
    assert_eq!(rec.name, "Unknown");
    assert_eq!(rec.collection, "Unknown");
    assert_eq!(rec.marketplace, "");
    assert!(rec.price.is_none());
    assert!(!rec.has_complete_metadata);
}
