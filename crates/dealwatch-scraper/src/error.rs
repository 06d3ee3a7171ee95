use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("marketplace API returned {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("DPoP signing failed: {0}")]
    Signing(String),

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("all {attempts} attempts failed for '{keyword}': {source}")]
    RetriesExhausted {
        keyword: String,
        attempts: u32,
        #[source]
        source: Box<ScraperError>,
    },
}
