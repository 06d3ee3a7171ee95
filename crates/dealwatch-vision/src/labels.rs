//! Zero-shot label vocabulary for lead-photo screening.

/// Apparel and accessory categories. A top match here keeps the listing.
pub const KEEP_LABELS: &[&str] = &[
    "a hat or cap",
    "a beanie",
    "a jacket or coat",
    "a leather jacket",
    "a sweater or knitwear",
    "a shirt or top",
    "pants or trousers",
    "shorts",
    "a designer handbag",
    "a leather bag",
    "a luxury wallet",
    "designer shoes",
    "leather shoes or boots",
    "sunglasses",
    "a watch",
    "jewelry",
    "fashion accessories",
];

/// Packaging, paperwork and unusable photos.
pub const REJECT_LABELS: &[&str] = &[
    "an empty box",
    "a cardboard box",
    "a shopping bag",
    "a paper bag",
    "a receipt",
    "a blurry photo",
    "a logo tag only",
    "a dust bag only",
];

/// A reject label must score strictly above this to drop a listing.
pub const REJECT_THRESHOLD: f64 = 0.3;

/// Keep labels followed by reject labels, as sent to the classifier.
#[must_use]
pub fn candidate_labels() -> Vec<&'static str> {
    KEEP_LABELS.iter().chain(REJECT_LABELS).copied().collect()
}

#[must_use]
pub fn is_reject_label(label: &str) -> bool {
    REJECT_LABELS.contains(&label)
}
