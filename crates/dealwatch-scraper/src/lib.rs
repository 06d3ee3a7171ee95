pub mod client;
pub mod dpop;
pub mod error;
pub mod normalize;
pub mod retry;
pub mod types;

pub use client::{ListingSearch, MercariClient, SearchQuery};
pub use dpop::ProofSigner;
pub use error::ScraperError;
pub use normalize::{lenient_int, normalize_item};
pub use retry::{search_with_retry, RetryPolicy};
pub use types::{SearchApiItem, SearchApiResponse};
