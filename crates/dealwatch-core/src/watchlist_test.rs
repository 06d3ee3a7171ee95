use super::*;

const MINIMAL: &str = r"
brands:
  - name: Chrome Hearts
    keywords: [クロムハーツ, chrome hearts]
";

fn brand(name: &str, keywords: &[&str]) -> BrandWatch {
    BrandWatch {
        name: name.to_string(),
        keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        price_min: None,
        price_max: None,
    }
}

#[test]
fn minimal_watchlist_gets_defaults() {
    let cfg = parse_watchlist(MINIMAL).expect("minimal watchlist should parse");
    assert_eq!(cfg.brands.len(), 1);
    assert_eq!(cfg.brands[0].keywords.len(), 2);
    assert_eq!(cfg.price_min, 3_000);
    assert_eq!(cfg.price_max, 15_000);
    assert_eq!(cfg.scan_interval_minutes, 10);
    assert_eq!(cfg.max_age_minutes, 180);
    assert_eq!(cfg.max_deals_per_keyword, 5);
    assert_eq!(cfg.default_categories, vec![1, 2]);
    assert!(!cfg.enable_ai_filter);
    assert_eq!(cfg.hf_model, "openai/clip-vit-large-patch14");
}

#[test]
fn zero_values_fall_back_to_defaults() {
    let yaml = r"
price_min: 0
price_max: 0
scan_interval_minutes: 0
max_deals_per_keyword: 0
default_categories: []
brands:
  - name: Kapital
    keywords: [kapital]
";
    let cfg = parse_watchlist(yaml).unwrap();
    assert_eq!(cfg.price_min, 3_000);
    assert_eq!(cfg.price_max, 15_000);
    assert_eq!(cfg.scan_interval_minutes, 10);
    assert_eq!(cfg.max_deals_per_keyword, 5);
    assert_eq!(cfg.default_categories, vec![1, 2]);
}

#[test]
fn page_size_is_double_the_keyword_cap() {
    let cfg = parse_watchlist(MINIMAL).unwrap();
    assert_eq!(cfg.page_size(), 10);
}

#[test]
fn brand_price_override_wins_when_positive() {
    let yaml = r"
price_min: 3000
price_max: 15000
brands:
  - name: Number Nine
    keywords: [number nine]
    price_min: 8000
  - name: Undercover
    keywords: [undercover]
    price_max: 0
";
    let cfg = parse_watchlist(yaml).unwrap();
    assert_eq!(cfg.price_range(&cfg.brands[0]), (8_000, 15_000));
    assert_eq!(cfg.price_range(&cfg.brands[1]), (3_000, 15_000));
}

#[test]
fn validate_rejects_empty_brand_list() {
    let result = parse_watchlist("brands: []");
    assert!(matches!(result, Err(ConfigError::Validation(_))));
}

#[test]
fn validate_rejects_blank_brand_name() {
    let mut cfg = parse_watchlist(MINIMAL).unwrap();
    cfg.brands.push(brand("  ", &["x"]));
    assert!(matches!(
        validate_watchlist(&cfg),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn validate_rejects_duplicate_names_case_insensitively() {
    let mut cfg = parse_watchlist(MINIMAL).unwrap();
    cfg.brands.push(brand("chrome HEARTS", &["ch"]));
    let err = validate_watchlist(&cfg).unwrap_err();
    assert!(err.to_string().contains("duplicate brand name"), "{err}");
}

#[test]
fn validate_rejects_brand_without_keywords() {
    let mut cfg = parse_watchlist(MINIMAL).unwrap();
    cfg.brands.push(brand("Visvim", &[]));
    assert!(validate_watchlist(&cfg).is_err());
}

#[test]
fn validate_rejects_blank_keyword() {
    let mut cfg = parse_watchlist(MINIMAL).unwrap();
    cfg.brands.push(brand("Visvim", &["visvim", " "]));
    assert!(validate_watchlist(&cfg).is_err());
}

#[test]
fn validate_rejects_inverted_price_band() {
    let yaml = r"
brands:
  - name: Sacai
    keywords: [sacai]
    price_min: 20000
";
    let result = parse_watchlist(yaml);
    assert!(
        matches!(result, Err(ConfigError::Validation(ref msg)) if msg.contains("price_min")),
        "expected price validation error, got: {result:?}"
    );
}

#[test]
fn validate_rejects_huge_scan_interval() {
    let yaml = r"
scan_interval_minutes: 18446744073709551615
brands:
  - name: Sacai
    keywords: [sacai]
";
    let result = parse_watchlist(yaml);
    assert!(
        matches!(result, Err(ConfigError::Validation(ref msg)) if msg.contains("scan_interval_minutes")),
        "expected interval validation error, got: {result:?}"
    );

    let mut cfg = parse_watchlist(MINIMAL).unwrap();
    cfg.scan_interval_minutes = 7 * 24 * 60;
    assert!(validate_watchlist(&cfg).is_ok());
}

#[test]
fn malformed_yaml_is_a_parse_error() {
    let result = parse_watchlist("brands: [name: ");
    assert!(matches!(result, Err(ConfigError::WatchlistParse(_))));
}

#[test]
fn load_watchlist_reports_missing_file() {
    let result = load_watchlist(Path::new("/definitely/not/here/watchlist.yaml"));
    assert!(matches!(result, Err(ConfigError::WatchlistIo { .. })));
}
