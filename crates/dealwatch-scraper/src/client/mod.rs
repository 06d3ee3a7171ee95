//! HTTP client for the marketplace `entities:search` endpoint.

mod user_agent;

use std::time::Duration;

use async_trait::async_trait;
use dealwatch_core::Listing;
use reqwest::{header, Client, Url};
use uuid::Uuid;

use crate::dpop::ProofSigner;
use crate::error::ScraperError;
use crate::normalize::normalize_response;
use crate::types::{SearchApiResponse, SearchCondition, SearchRequest};

pub use user_agent::USER_AGENTS;

const DEFAULT_SEARCH_URL: &str = "https://api.mercari.jp/v2/entities:search";
const WEB_ORIGIN: &str = "https://jp.mercari.com";
const WEB_REFERER: &str = "https://jp.mercari.com/";
const MAX_EXCERPT_CHARS: usize = 300;

/// Parameters for one keyword search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    pub price_min: i64,
    pub price_max: i64,
    pub category_ids: Vec<i64>,
    pub page_size: usize,
}

/// Anything that can turn a [`SearchQuery`] into listings.
///
/// [`MercariClient`] is the production implementation; tests and the retry
/// wrapper work against this trait.
#[async_trait]
pub trait ListingSearch: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Listing>, ScraperError>;
}

/// Authenticated client for the marketplace search API.
///
/// Owns the DPoP signing key for its whole lifetime and picks one browser
/// `User-Agent` at construction.
#[derive(Debug)]
pub struct MercariClient {
    client: Client,
    search_url: Url,
    signer: ProofSigner,
    user_agent: &'static str,
}

impl MercariClient {
    /// Creates a client pointed at the production search endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`ScraperError::Signing`] if key generation fails.
    pub fn new(timeout_secs: u64) -> Result<Self, ScraperError> {
        Self::with_base_url(timeout_secs, DEFAULT_SEARCH_URL)
    }

    /// Creates a client with a custom search URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Same as [`MercariClient::new`], plus [`ScraperError::InvalidBaseUrl`]
    /// when `search_url` does not parse.
    pub fn with_base_url(timeout_secs: u64, search_url: &str) -> Result<Self, ScraperError> {
        let user_agent = user_agent::pick_user_agent();
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()?;

        let search_url = Url::parse(search_url).map_err(|e| ScraperError::InvalidBaseUrl {
            url: search_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            search_url,
            signer: ProofSigner::new()?,
            user_agent,
        })
    }

    #[must_use]
    pub fn user_agent(&self) -> &'static str {
        self.user_agent
    }

    fn build_request(query: &SearchQuery) -> SearchRequest {
        SearchRequest {
            page_size: query.page_size,
            search_session_id: Uuid::new_v4().simple().to_string(),
            search_condition: SearchCondition {
                keyword: query.keyword.clone(),
                exclude_keyword: String::new(),
                sort: "SORT_CREATED_TIME",
                order: "ORDER_DESC",
                status: vec!["STATUS_ON_SALE"],
                size_id: Vec::new(),
                category_id: query.category_ids.clone(),
                brand_id: Vec::new(),
                seller_id: Vec::new(),
                price_min: query.price_min,
                price_max: query.price_max,
                item_condition_id: Vec::new(),
                shipping_payer_id: Vec::new(),
                color_id: Vec::new(),
                has_coupon: false,
                attributes: Vec::new(),
                item_types: Vec::new(),
                sku_ids: Vec::new(),
            },
            service_from: "suruga",
            with_item_brand: true,
            with_item_size: false,
            with_item_promotions: true,
            with_item_sizes: true,
            with_shopname: false,
        }
    }

    /// Runs one search and returns the normalized listings.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Signing`] if the DPoP proof cannot be minted.
    /// - [`ScraperError::Http`] on network failure or timeout.
    /// - [`ScraperError::UnexpectedStatus`] for any non-2xx response, with a
    ///   sanitized excerpt of the body.
    /// - [`ScraperError::Deserialize`] if the body is not JSON of the
    ///   expected overall shape.
    pub async fn search_listings(&self, query: &SearchQuery) -> Result<Vec<Listing>, ScraperError> {
        let proof = self.signer.sign(self.search_url.as_str(), "POST")?;
        let body = Self::build_request(query);

        let response = self
            .client
            .post(self.search_url.clone())
            .header("DPoP", proof)
            .header("X-Platform", "web")
            .header(header::ACCEPT, "application/json, text/plain, */*")
            .header(header::ACCEPT_LANGUAGE, "ja-JP,ja;q=0.9,en;q=0.8")
            .header(header::ORIGIN, WEB_ORIGIN)
            .header(header::REFERER, WEB_REFERER)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                body: body_excerpt(&text),
            });
        }

        let parsed: SearchApiResponse =
            serde_json::from_str(&text).map_err(|e| ScraperError::Deserialize {
                context: format!("search response for '{}'", query.keyword),
                source: e,
            })?;

        tracing::debug!(
            keyword = %query.keyword,
            num_found = parsed.meta.num_found,
            returned = parsed.items.len(),
            has_next = parsed.meta.has_next,
            "search response"
        );

        Ok(normalize_response(parsed))
    }
}

#[async_trait]
impl ListingSearch for MercariClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Listing>, ScraperError> {
        self.search_listings(query).await
    }
}

/// Strips control characters (keeping newlines and tabs) and truncates to
/// 300 characters, appending `...` when cut.
pub(crate) fn body_excerpt(body: &str) -> String {
    let cleaned: String = body
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect();

    if cleaned.chars().count() > MAX_EXCERPT_CHARS {
        let mut cut: String = cleaned.chars().take(MAX_EXCERPT_CHARS).collect();
        cut.push_str("...");
        cut
    } else {
        cleaned
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
