use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model is still loading")]
    ModelLoading,

    #[error("classifier returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("classifier response parse error: {0}")]
    Parse(String),

    #[error("classifier returned no labels")]
    EmptyResult,

    #[error("invalid classifier URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl VisionError {
    /// Short tag recorded when a failure is turned into a keep decision.
    #[must_use]
    pub fn fail_open_label(&self) -> &'static str {
        match self {
            Self::Http(_) | Self::InvalidBaseUrl { .. } => "error",
            Self::ModelLoading | Self::Api { .. } => "api_error",
            Self::Parse(_) => "parse_error",
            Self::EmptyResult => "empty_result",
        }
    }
}
