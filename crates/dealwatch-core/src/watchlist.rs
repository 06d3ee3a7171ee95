//! The brand watchlist: which keywords to search and how to filter results.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const DEFAULT_PRICE_MIN: i64 = 3_000;
const DEFAULT_PRICE_MAX: i64 = 15_000;
const DEFAULT_SCAN_INTERVAL_MINUTES: u64 = 10;
/// One week.
const MAX_SCAN_INTERVAL_MINUTES: u64 = 7 * 24 * 60;
const DEFAULT_MAX_AGE_MINUTES: u64 = 180;
const DEFAULT_MAX_DEALS_PER_KEYWORD: usize = 5;
const DEFAULT_HF_MODEL: &str = "openai/clip-vit-large-patch14";

/// One watched brand and the search keywords that find it.
///
/// `price_min`/`price_max` override the global band when set to a positive
/// value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandWatch {
    pub name: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub price_min: Option<i64>,
    #[serde(default)]
    pub price_max: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    pub brands: Vec<BrandWatch>,
    #[serde(default = "default_price_min")]
    pub price_min: i64,
    #[serde(default = "default_price_max")]
    pub price_max: i64,
    #[serde(default = "default_scan_interval_minutes")]
    pub scan_interval_minutes: u64,
    #[serde(default = "default_max_age_minutes")]
    pub max_age_minutes: u64,
    #[serde(default = "default_max_deals_per_keyword")]
    pub max_deals_per_keyword: usize,
    #[serde(default = "default_categories")]
    pub default_categories: Vec<i64>,
    #[serde(default)]
    pub enable_ai_filter: bool,
    #[serde(default = "default_hf_model")]
    pub hf_model: String,
}

impl WatchConfig {
    /// Effective `(min, max)` price band for `brand`.
    #[must_use]
    pub fn price_range(&self, brand: &BrandWatch) -> (i64, i64) {
        let min = brand.price_min.filter(|p| *p > 0).unwrap_or(self.price_min);
        let max = brand.price_max.filter(|p| *p > 0).unwrap_or(self.price_max);
        (min, max)
    }

    /// Number of results requested per search. Twice the per-keyword cap so
    /// the age and dedup filters still leave enough candidates.
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.max_deals_per_keyword.saturating_mul(2)
    }
}

fn default_price_min() -> i64 {
    DEFAULT_PRICE_MIN
}

fn default_price_max() -> i64 {
    DEFAULT_PRICE_MAX
}

fn default_scan_interval_minutes() -> u64 {
    DEFAULT_SCAN_INTERVAL_MINUTES
}

fn default_max_age_minutes() -> u64 {
    DEFAULT_MAX_AGE_MINUTES
}

fn default_max_deals_per_keyword() -> usize {
    DEFAULT_MAX_DEALS_PER_KEYWORD
}

fn default_categories() -> Vec<i64> {
    // Mercari fashion: men, women
    vec![1, 2]
}

fn default_hf_model() -> String {
    DEFAULT_HF_MODEL.to_string()
}

/// Load and validate the watchlist from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_watchlist(path: &Path) -> Result<WatchConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::WatchlistIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_watchlist(&content)
}

/// Parse and validate watchlist YAML, applying defaults for zero values.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_watchlist(content: &str) -> Result<WatchConfig, ConfigError> {
    let mut config: WatchConfig = serde_yaml::from_str(content)?;
    apply_defaults(&mut config);
    validate_watchlist(&config)?;
    Ok(config)
}

/// Zero or negative values in the file mean "use the default".
fn apply_defaults(config: &mut WatchConfig) {
    if config.price_min <= 0 {
        config.price_min = DEFAULT_PRICE_MIN;
    }
    if config.price_max <= 0 {
        config.price_max = DEFAULT_PRICE_MAX;
    }
    if config.scan_interval_minutes == 0 {
        config.scan_interval_minutes = DEFAULT_SCAN_INTERVAL_MINUTES;
    }
    if config.max_age_minutes == 0 {
        config.max_age_minutes = DEFAULT_MAX_AGE_MINUTES;
    }
    if config.max_deals_per_keyword == 0 {
        config.max_deals_per_keyword = DEFAULT_MAX_DEALS_PER_KEYWORD;
    }
    if config.default_categories.is_empty() {
        config.default_categories = default_categories();
    }
    if config.hf_model.trim().is_empty() {
        config.hf_model = default_hf_model();
    }
}

fn validate_watchlist(config: &WatchConfig) -> Result<(), ConfigError> {
    if config.brands.is_empty() {
        return Err(ConfigError::Validation(
            "at least one brand is required".to_string(),
        ));
    }

    if config.scan_interval_minutes > MAX_SCAN_INTERVAL_MINUTES {
        return Err(ConfigError::Validation(format!(
            "scan_interval_minutes {} exceeds the maximum of {MAX_SCAN_INTERVAL_MINUTES}",
            config.scan_interval_minutes
        )));
    }

    let mut seen_names = HashSet::new();

    for brand in &config.brands {
        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }

        if !seen_names.insert(brand.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand name: '{}'",
                brand.name
            )));
        }

        if brand.keywords.is_empty() || brand.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "brand '{}' needs at least one keyword and no blank keywords",
                brand.name
            )));
        }

        let (min, max) = config.price_range(brand);
        if min > max {
            return Err(ConfigError::Validation(format!(
                "brand '{}' has price_min {min} above price_max {max}",
                brand.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "watchlist_test.rs"]
mod tests;
