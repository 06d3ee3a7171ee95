//! One scan cycle: search, age filter, dedup, cap, classify, notify, mark seen.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use dealwatch_core::{BrandWatch, DealItem, Listing, ScanCycleStats, WatchConfig};
use dealwatch_db::SeenStore;
use dealwatch_scraper::{search_with_retry, ListingSearch, RetryPolicy, SearchQuery};
use dealwatch_telegram::DealNotifier;
use dealwatch_vision::{ClassificationGate, ImageClassifier};
use rand::Rng;
use tokio_util::sync::CancellationToken;

/// Delays between requests. Tests zero them.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScanTiming {
    pub retry: RetryPolicy,
    pub keyword_delay_min: Duration,
    pub keyword_delay_max: Duration,
    pub send_pacing: Duration,
}

impl ScanTiming {
    pub(crate) fn with_retries(max_retries: u32) -> Self {
        Self {
            retry: RetryPolicy::with_max_retries(max_retries),
            keyword_delay_min: Duration::from_millis(500),
            keyword_delay_max: Duration::from_millis(2_000),
            send_pacing: Duration::from_millis(200),
        }
    }

    fn keyword_delay(&self) -> Duration {
        let min = u64::try_from(self.keyword_delay_min.as_millis()).unwrap_or(u64::MAX);
        let max = u64::try_from(self.keyword_delay_max.as_millis()).unwrap_or(u64::MAX);
        if max <= min {
            return self.keyword_delay_min;
        }
        Duration::from_millis(rand::rng().random_range(min..max))
    }
}

pub(crate) struct ScanPipeline<S, C, N> {
    search: S,
    gate: ClassificationGate<C>,
    notifier: Arc<N>,
    store: SeenStore,
    watch: WatchConfig,
    timing: ScanTiming,
}

impl<S, C, N> ScanPipeline<S, C, N>
where
    S: ListingSearch,
    C: ImageClassifier,
    N: DealNotifier,
{
    pub(crate) fn new(
        search: S,
        gate: ClassificationGate<C>,
        notifier: Arc<N>,
        store: SeenStore,
        watch: WatchConfig,
        timing: ScanTiming,
    ) -> Self {
        Self {
            search,
            gate,
            notifier,
            store,
            watch,
            timing,
        }
    }

    pub(crate) fn notifier(&self) -> &Arc<N> {
        &self.notifier
    }

    pub(crate) fn store(&self) -> &SeenStore {
        &self.store
    }

    pub(crate) fn watch(&self) -> &WatchConfig {
        &self.watch
    }

    /// Scans every brand keyword once. Checks `cancel` between keywords, so a
    /// shutdown never splits a notify from its mark-seen.
    pub(crate) async fn run_cycle(&self, cancel: &CancellationToken) -> ScanCycleStats {
        let started = Instant::now();
        let mut total = ScanCycleStats::default();
        tracing::info!(brands = self.watch.brands.len(), "scan cycle starting");

        let keywords: Vec<(&BrandWatch, &str)> = self
            .watch
            .brands
            .iter()
            .flat_map(|b| b.keywords.iter().map(move |k| (b, k.as_str())))
            .collect();

        for (i, (brand, keyword)) in keywords.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!("shutdown requested, abandoning rest of cycle");
                break;
            }

            total += self.scan_keyword(brand, keyword).await;

            if i + 1 < keywords.len() {
                tokio::select! {
                    () = cancel.cancelled() => {}
                    () = tokio::time::sleep(self.timing.keyword_delay()) => {}
                }
            }
        }

        let elapsed = started.elapsed();
        tracing::info!(
            found = total.found,
            fresh = total.fresh,
            new = total.unseen,
            kept = total.kept,
            sent = total.sent,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "scan cycle complete"
        );

        if total.unseen > 0 {
            if let Err(e) = self.notifier.send_scan_summary(&total, elapsed).await {
                tracing::warn!(error = %e, "failed to send scan summary");
            }
        }

        total
    }

    pub(crate) async fn scan_keyword(&self, brand: &BrandWatch, keyword: &str) -> ScanCycleStats {
        let mut stats = ScanCycleStats::default();
        let (price_min, price_max) = self.watch.price_range(brand);
        let query = SearchQuery {
            keyword: keyword.to_owned(),
            price_min,
            price_max,
            category_ids: self.watch.default_categories.clone(),
            page_size: self.watch.page_size(),
        };

        let listings = match search_with_retry(&self.search, &query, &self.timing.retry).await {
            Ok(listings) => listings,
            Err(e) => {
                tracing::error!(brand = %brand.name, keyword, error = %e, "search failed, skipping keyword");
                return stats;
            }
        };
        stats.found = listings.len();

        let now = Utc::now();
        #[allow(clippy::cast_precision_loss)]
        let max_age = self.watch.max_age_minutes as f64;
        let fresh: Vec<Listing> = listings
            .into_iter()
            .filter(|l| l.age_minutes(now) <= max_age)
            .collect();
        stats.fresh = fresh.len();

        let mut unseen = Vec::with_capacity(fresh.len());
        for listing in fresh {
            match self.store.has_seen(&listing.id).await {
                Ok(true) => {}
                Ok(false) => unseen.push(listing),
                Err(e) => {
                    tracing::warn!(item_id = %listing.id, error = %e, "dedup lookup failed, treating as new");
                    unseen.push(listing);
                }
            }
        }
        stats.unseen = unseen.len();

        if unseen.is_empty() {
            tracing::info!(brand = %brand.name, keyword, found = stats.found, "no new listings");
            return stats;
        }

        unseen.truncate(self.watch.max_deals_per_keyword);
        let kept = self.gate.filter(unseen).await;
        stats.kept = kept.len();

        tracing::info!(
            brand = %brand.name,
            keyword,
            found = stats.found,
            fresh = stats.fresh,
            new = stats.unseen,
            kept = stats.kept,
            "keyword scanned"
        );

        for listing in &kept {
            let deal = DealItem::from_listing(listing, &brand.name, Utc::now());
            match self.notifier.send_deal(&deal).await {
                Ok(()) => stats.sent += 1,
                Err(e) => {
                    tracing::warn!(brand = %brand.name, item_id = %listing.id, error = %e, "failed to send deal");
                }
            }

            // Marked regardless of delivery outcome.
            if let Err(e) = self
                .store
                .mark_seen(&listing.id, &brand.name, &listing.title, listing.price)
                .await
            {
                tracing::warn!(item_id = %listing.id, error = %e, "failed to mark listing seen");
            }

            if !self.timing.send_pacing.is_zero() {
                tokio::time::sleep(self.timing.send_pacing).await;
            }
        }

        stats
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
