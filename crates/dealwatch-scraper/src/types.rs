//! Wire types for the marketplace `entities:search` endpoint.
//!
//! ## Observed response shape
//!
//! ### Numeric fields
//! `price`, `created`, `updated` and `meta.numFound` have all been seen as
//! JSON numbers and as numeric strings (`"15000"`, occasionally `"15000.0"`).
//! They go through [`crate::normalize::lenient_int`] and never fail the
//! response; an unreadable value becomes `0`.
//!
//! ### `created` / `updated`
//! Unix epoch seconds.
//!
//! ### `thumbnails`
//! Array of image URLs, first one is the lead photo. Absent or `null` on
//! some listings.
//!
//! ### `itemBrand`
//! Present only when the seller tagged a brand. `id` arrives as a number.
//!
//! ### `null`
//! Any field may be `null`; it reads as the field's zero value. Identifier
//! and text fields also accept numbers, rendered as their decimal text.

use serde::{Deserialize, Deserializer, Serialize};

use crate::normalize::lenient_int;

/// Top-level response from `POST /v2/entities:search`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchApiResponse {
    #[serde(default, deserialize_with = "null_default")]
    pub items: Vec<SearchApiItem>,
    #[serde(default, deserialize_with = "null_default")]
    pub meta: SearchMeta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchApiItem {
    #[serde(default, deserialize_with = "text")]
    pub id: String,
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub price: i64,
    #[serde(default, deserialize_with = "text")]
    pub status: String,
    #[serde(default, deserialize_with = "thumbnail_urls")]
    pub thumbnails: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub created: i64,
    #[serde(default, deserialize_with = "lenient")]
    pub updated: i64,
    #[serde(default, rename = "itemBrand")]
    pub item_brand: Option<ItemBrand>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemBrand {
    #[serde(default, deserialize_with = "text")]
    pub id: String,
    #[serde(default, deserialize_with = "text")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMeta {
    #[serde(default, deserialize_with = "lenient")]
    pub num_found: i64,
    #[serde(default, deserialize_with = "text")]
    pub next_page_token: String,
    #[serde(default, deserialize_with = "null_default")]
    pub has_next: bool,
}

fn lenient<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(lenient_int(&value))
}

fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Strings as-is, numbers as decimal text, anything else empty.
fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

// Non-string entries are skipped rather than failing the item.
fn thumbnail_urls<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(entries) => Some(
            entries
                .into_iter()
                .filter_map(|entry| match entry {
                    serde_json::Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

/// Request body for `POST /v2/entities:search`.
///
/// Mirrors what the web client sends, including the empty filter arrays.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub page_size: usize,
    pub search_session_id: String,
    pub search_condition: SearchCondition,
    pub service_from: &'static str,
    pub with_item_brand: bool,
    pub with_item_size: bool,
    pub with_item_promotions: bool,
    pub with_item_sizes: bool,
    pub with_shopname: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCondition {
    pub keyword: String,
    pub exclude_keyword: String,
    pub sort: &'static str,
    pub order: &'static str,
    pub status: Vec<&'static str>,
    pub size_id: Vec<i64>,
    pub category_id: Vec<i64>,
    pub brand_id: Vec<String>,
    pub seller_id: Vec<String>,
    pub price_min: i64,
    pub price_max: i64,
    pub item_condition_id: Vec<i64>,
    pub shipping_payer_id: Vec<i64>,
    pub color_id: Vec<i64>,
    pub has_coupon: bool,
    pub attributes: Vec<serde_json::Value>,
    pub item_types: Vec<String>,
    pub sku_ids: Vec<String>,
}
