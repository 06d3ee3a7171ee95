//! Hugging Face inference client for zero-shot image classification.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use crate::error::VisionError;
use crate::types::{ClassifyInputs, ClassifyRequest, ClassifyResponse, LabelScore};

const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/hf-inference/models";
const MAX_BODY_EXCERPT: usize = 200;

/// Scores an image against a caller-supplied label vocabulary.
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    /// Returns label/score pairs, highest score first.
    async fn classify(
        &self,
        image_url: &str,
        labels: &[&str],
    ) -> Result<Vec<LabelScore>, VisionError>;
}

/// Client for the hosted zero-shot image classification endpoint.
///
/// Use [`HuggingFaceClient::new`] for production or
/// [`HuggingFaceClient::with_base_url`] to point at a mock server in tests.
pub struct HuggingFaceClient {
    client: Client,
    api_key: String,
    endpoint: Url,
}

impl std::fmt::Debug for HuggingFaceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuggingFaceClient")
            .field("api_key", &"[redacted]")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl HuggingFaceClient {
    /// # Errors
    ///
    /// Returns [`VisionError::Http`] if the `reqwest::Client` cannot be
    /// built.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, VisionError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`VisionError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`VisionError::InvalidBaseUrl`] if `base_url` and `model`
    /// do not form a valid URL.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, VisionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        let raw = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            model.trim_start_matches('/')
        );
        let endpoint = Url::parse(&raw).map_err(|e| VisionError::InvalidBaseUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            endpoint,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}

#[async_trait]
impl ImageClassifier for HuggingFaceClient {
    async fn classify(
        &self,
        image_url: &str,
        labels: &[&str],
    ) -> Result<Vec<LabelScore>, VisionError> {
        let request = ClassifyRequest {
            inputs: ClassifyInputs {
                image: image_url,
                candidate_labels: labels,
            },
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(VisionError::ModelLoading);
        }
        if !status.is_success() {
            return Err(VisionError::Api {
                status: status.as_u16(),
                body: body.chars().take(MAX_BODY_EXCERPT).collect(),
            });
        }

        let parsed: ClassifyResponse = serde_json::from_str(&body).map_err(|e| {
            let excerpt: String = body.chars().take(MAX_BODY_EXCERPT).collect();
            VisionError::Parse(format!("{e} (body: {excerpt})"))
        })?;

        let ranked = parsed.into_ranked();
        if ranked.is_empty() {
            return Err(VisionError::EmptyResult);
        }
        Ok(ranked)
    }
}
