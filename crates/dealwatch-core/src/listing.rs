use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public item page prefix; a listing's URL is this plus its id.
pub const ITEM_URL_BASE: &str = "https://jp.mercari.com/item/";

/// A marketplace listing normalized from one search response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Marketplace item id, e.g. `"m12345678901"`.
    pub id: String,
    pub title: String,
    /// Price in yen.
    pub price: i64,
    /// Marketplace status string, e.g. `"ITEM_STATUS_ON_SALE"`.
    pub status: String,
    /// Thumbnail URLs in marketplace order. May be empty.
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Brand as tagged by the seller. Empty when untagged.
    pub brand_name: String,
    pub item_url: String,
}

impl Listing {
    #[must_use]
    pub fn item_url_for(id: &str) -> String {
        format!("{ITEM_URL_BASE}{id}")
    }

    /// Minutes elapsed between creation and `now`. Negative when the
    /// marketplace clock is ahead of ours.
    #[must_use]
    pub fn age_minutes(&self, now: DateTime<Utc>) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let secs = (now - self.created_at).num_seconds() as f64;
        secs / 60.0
    }

    #[must_use]
    pub fn first_image(&self) -> Option<&str> {
        self.image_urls.first().map(String::as_str)
    }
}

/// What the notifier needs to render one alert.
#[derive(Debug, Clone, PartialEq)]
pub struct DealItem {
    pub name: String,
    pub price: i64,
    pub brand_name: String,
    pub image_url: Option<String>,
    pub item_url: String,
    pub age_minutes: f64,
}

impl DealItem {
    /// Build an alert for `listing` under the watched brand name (not the
    /// seller's tag, which is often missing).
    #[must_use]
    pub fn from_listing(listing: &Listing, brand: &str, now: DateTime<Utc>) -> Self {
        Self {
            name: listing.title.clone(),
            price: listing.price,
            brand_name: brand.to_string(),
            image_url: listing.first_image().map(str::to_owned),
            item_url: listing.item_url.clone(),
            age_minutes: listing.age_minutes(now),
        }
    }
}

/// Funnel counters for one keyword or one whole scan cycle.
///
/// Each stage only narrows the previous one, so
/// `found >= fresh >= unseen >= kept >= sent`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanCycleStats {
    pub found: usize,
    pub fresh: usize,
    pub unseen: usize,
    pub kept: usize,
    pub sent: usize,
}

impl ScanCycleStats {
    #[must_use]
    pub fn is_monotonic(&self) -> bool {
        self.found >= self.fresh
            && self.fresh >= self.unseen
            && self.unseen >= self.kept
            && self.kept >= self.sent
    }
}

impl std::ops::AddAssign for ScanCycleStats {
    fn add_assign(&mut self, rhs: Self) {
        self.found += rhs.found;
        self.fresh += rhs.fresh;
        self.unseen += rhs.unseen;
        self.kept += rhs.kept;
        self.sent += rhs.sent;
    }
}
