//! Lead-photo screening for marketplace listings.
//!
//! Sends each listing's first image to a zero-shot classifier and drops the
//! ones whose best match is packaging, paperwork or an unusable photo. Any
//! classification failure keeps the listing.

pub mod client;
pub mod error;
pub mod gate;
pub mod labels;
pub mod types;

pub use client::{HuggingFaceClient, ImageClassifier};
pub use error::VisionError;
pub use gate::{decide_from_ranked, ClassificationGate, Decision, MAX_IN_FLIGHT};
pub use labels::{KEEP_LABELS, REJECT_LABELS, REJECT_THRESHOLD};
pub use types::LabelScore;
