//! Conversion from search wire types to [`dealwatch_core::Listing`].

use chrono::{DateTime, Utc};
use dealwatch_core::Listing;

use crate::types::{SearchApiItem, SearchApiResponse};

/// Reads an integer out of a JSON value that may be a number or a numeric
/// string.
///
/// Tries an integer, then a float (truncated), then the string as an integer
/// and finally as a float. Anything else yields `0`.
#[must_use]
pub fn lenient_int(value: &serde_json::Value) -> i64 {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(truncate))
            .unwrap_or(0),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(truncate))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn truncate(f: f64) -> i64 {
    if f.is_finite() {
        // `as` saturates at the i64 bounds
        f.trunc() as i64
    } else {
        0
    }
}

fn from_epoch(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Converts one raw search item into a [`Listing`].
#[must_use]
pub fn normalize_item(item: SearchApiItem) -> Listing {
    let item_url = Listing::item_url_for(&item.id);
    Listing {
        title: item.name,
        price: item.price,
        status: item.status,
        image_urls: item
            .thumbnails
            .unwrap_or_default()
            .into_iter()
            .filter(|u| !u.trim().is_empty())
            .collect(),
        created_at: from_epoch(item.created),
        updated_at: from_epoch(item.updated),
        brand_name: item.item_brand.map(|b| b.name).unwrap_or_default(),
        item_url,
        id: item.id,
    }
}

/// Converts a whole response, dropping items that carry no id.
#[must_use]
pub fn normalize_response(response: SearchApiResponse) -> Vec<Listing> {
    response
        .items
        .into_iter()
        .filter(|item| {
            let keep = !item.id.trim().is_empty();
            if !keep {
                tracing::debug!(name = %item.name, "dropping search item without id");
            }
            keep
        })
        .map(normalize_item)
        .collect()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
