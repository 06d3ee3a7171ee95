//! Keep/reject screening of listings by their lead photo.
//!
//! The gate never drops a listing because classification failed: every error
//! path keeps the listing and records a diagnostic label instead.

use std::time::Duration;

use dealwatch_core::Listing;
use futures::stream::{self, StreamExt};

use crate::client::{HuggingFaceClient, ImageClassifier};
use crate::error::VisionError;
use crate::labels::{candidate_labels, is_reject_label, REJECT_THRESHOLD};
use crate::types::LabelScore;

/// Key value shipped in sample configs; treated as "no key".
pub const PLACEHOLDER_API_KEY: &str = "YOUR_HF_API_KEY";

/// Upper bound on classification requests in flight at once.
pub const MAX_IN_FLIGHT: usize = 3;

const DEFAULT_LOADING_RETRY_DELAY: Duration = Duration::from_secs(20);

/// Outcome for one listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub keep: bool,
    /// Top label, or a tag such as `no_image` or `api_error`.
    pub label: String,
    pub score: f64,
}

impl Decision {
    fn keep_with(label: &str) -> Self {
        Self {
            keep: true,
            label: label.to_owned(),
            score: 0.0,
        }
    }
}

/// Applies the reject rule to a ranked label list: reject only when the top
/// label is a reject label scoring above [`REJECT_THRESHOLD`].
#[must_use]
pub fn decide_from_ranked(ranked: &[LabelScore]) -> Decision {
    let Some(top) = ranked.first() else {
        return Decision::keep_with("empty_result");
    };
    let reject = is_reject_label(&top.label) && top.score > REJECT_THRESHOLD;
    Decision {
        keep: !reject,
        label: top.label.clone(),
        score: top.score,
    }
}

/// Filters listings through an [`ImageClassifier`].
///
/// A disabled gate passes everything through untouched.
pub struct ClassificationGate<C> {
    classifier: Option<C>,
    labels: Vec<&'static str>,
    loading_retry_delay: Duration,
}

impl<C: ImageClassifier> ClassificationGate<C> {
    #[must_use]
    pub fn new(classifier: C) -> Self {
        Self {
            classifier: Some(classifier),
            labels: candidate_labels(),
            loading_retry_delay: DEFAULT_LOADING_RETRY_DELAY,
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self {
            classifier: None,
            labels: candidate_labels(),
            loading_retry_delay: DEFAULT_LOADING_RETRY_DELAY,
        }
    }

    /// Wait before the single retry after a "model loading" response.
    #[must_use]
    pub fn with_loading_retry_delay(mut self, delay: Duration) -> Self {
        self.loading_retry_delay = delay;
        self
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.classifier.is_some()
    }

    /// Classifies one listing's first image. Never fails.
    pub async fn decide(&self, listing: &Listing) -> Decision {
        let Some(classifier) = &self.classifier else {
            return Decision::keep_with("disabled");
        };
        let Some(image_url) = listing.first_image() else {
            return Decision::keep_with("no_image");
        };

        match self.classify_with_loading_retry(classifier, image_url).await {
            Ok(ranked) => decide_from_ranked(&ranked),
            Err(e) => {
                tracing::warn!(
                    item_id = %listing.id,
                    error = %e,
                    "classification failed, keeping listing"
                );
                Decision::keep_with(e.fail_open_label())
            }
        }
    }

    async fn classify_with_loading_retry(
        &self,
        classifier: &C,
        image_url: &str,
    ) -> Result<Vec<LabelScore>, VisionError> {
        match classifier.classify(image_url, &self.labels).await {
            Err(VisionError::ModelLoading) => {
                tracing::info!(
                    delay_secs = self.loading_retry_delay.as_secs(),
                    "classifier model loading, retrying once"
                );
                tokio::time::sleep(self.loading_retry_delay).await;
                classifier.classify(image_url, &self.labels).await
            }
            other => other,
        }
    }

    /// Returns the kept subset of `listings` in input order.
    ///
    /// At most [`MAX_IN_FLIGHT`] classifications run concurrently and all of
    /// them finish before this returns.
    pub async fn filter(&self, listings: Vec<Listing>) -> Vec<Listing> {
        if self.classifier.is_none() || listings.is_empty() {
            return listings;
        }

        let total = listings.len();
        tracing::info!(total, "classifying listing photos");

        let decisions: Vec<Decision> = stream::iter(listings.iter().map(|l| self.decide(l)))
            .buffered(MAX_IN_FLIGHT)
            .collect()
            .await;

        let kept: Vec<Listing> = listings
            .into_iter()
            .zip(decisions)
            .filter_map(|(listing, decision)| {
                if decision.keep {
                    tracing::info!(
                        title = %listing.title,
                        label = %decision.label,
                        score = decision.score,
                        "keep"
                    );
                    Some(listing)
                } else {
                    tracing::info!(
                        title = %listing.title,
                        label = %decision.label,
                        score = decision.score,
                        "reject"
                    );
                    None
                }
            })
            .collect();

        tracing::info!(kept = kept.len(), total, "classification done");
        kept
    }
}

impl ClassificationGate<HuggingFaceClient> {
    /// Builds the production gate. Disabled when the feature flag is off or
    /// no usable API key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`VisionError`] if the HTTP client cannot be built.
    pub fn from_settings(
        api_key: Option<&str>,
        enabled: bool,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, VisionError> {
        let key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty() && *k != PLACEHOLDER_API_KEY);

        match (enabled, key) {
            (true, Some(key)) => {
                let client = HuggingFaceClient::new(key, model, timeout_secs)?;
                tracing::info!(model, "photo classification enabled");
                Ok(Self::new(client))
            }
            (true, None) => {
                tracing::warn!("photo classification requested but no API key set; disabled");
                Ok(Self::disabled())
            }
            (false, _) => Ok(Self::disabled()),
        }
    }
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
