//! GraphQL documents sent to the indexer and the aggregator

/// Token fields shared by listing and ownership queries
const TOKEN_FIELDS: &str = r#"
      token_name
      description
      token_uri
      token_properties
      cdn_asset_uris {
        cdn_image_uri
        raw_image_uri
        cdn_animation_uri
        raw_animation_uri
        cdn_json_uri
        asset_uri
      }
      current_collection {
        collection_name
        creator_address
      }"#;

/// Active marketplace listings, newest first.
/// Variables: `limit`, `offset`, `where`.
pub fn listings() -> String {
    format!(
        r#"query Listings($limit: Int, $offset: Int, $where: current_nft_marketplace_listings_bool_exp) {{
  current_nft_marketplace_listings(
    limit: $limit
    offset: $offset
    where: $where
    order_by: {{ last_transaction_timestamp: desc }}
  ) {{
    token_data_id
    price
    marketplace
    seller
    collection_id
    last_transaction_timestamp
    current_token_data {{{TOKEN_FIELDS}
    }}
  }}
}}"#
    )
}

/// Tokens held by an address. Variables: `owner`, `limit`, `offset`.
pub fn owned_tokens() -> String {
    format!(
        r#"query OwnedTokens($owner: String!, $limit: Int, $offset: Int) {{
  current_token_ownerships_v2(
    where: {{ owner_address: {{ _eq: $owner }}, amount: {{ _gt: 0 }} }}
    limit: $limit
    offset: $offset
    order_by: {{ last_transaction_timestamp: desc }}
  ) {{
    token_data_id
    owner_address
    amount
    last_transaction_timestamp
    current_token_data {{{TOKEN_FIELDS}
    }}
  }}
}}"#
    )
}

/// Distinct raw marketplace identifiers with active listings
pub const MARKETPLACES: &str = r#"query Marketplaces {
  current_nft_marketplace_listings(
    distinct_on: marketplace
    where: { is_deleted: { _eq: false } }
  ) {
    marketplace
  }
}"#;

/// Active listing count for a set of raw identifiers. Variables: `marketplaces`.
pub const LISTING_COUNT: &str = r#"query ListingCount($marketplaces: [String!]) {
  current_nft_marketplace_listings_aggregate(
    where: { is_deleted: { _eq: false }, marketplace: { _in: $marketplaces } }
  ) {
    aggregate {
      count
    }
  }
}"#;
