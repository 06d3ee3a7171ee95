use super::*;

fn query() -> SearchQuery {
    SearchQuery {
        keyword: "kapital".to_owned(),
        price_min: 3_000,
        price_max: 15_000,
        category_ids: vec![1, 2],
        page_size: 10,
    }
}

#[test]
fn request_body_selects_on_sale_newest_first() {
    let body = serde_json::to_value(MercariClient::build_request(&query())).unwrap();
    let condition = &body["searchCondition"];

    assert_eq!(body["pageSize"], 10);
    assert_eq!(condition["keyword"], "kapital");
    assert_eq!(condition["status"], serde_json::json!(["STATUS_ON_SALE"]));
    assert_eq!(condition["sort"], "SORT_CREATED_TIME");
    assert_eq!(condition["order"], "ORDER_DESC");
    assert_eq!(condition["categoryId"], serde_json::json!([1, 2]));
    assert_eq!(condition["priceMin"], 3_000);
    assert_eq!(condition["priceMax"], 15_000);
    assert_eq!(body["serviceFrom"], "suruga");
    assert_eq!(body["withItemBrand"], true);
}

#[test]
fn request_body_sends_empty_filter_arrays() {
    let body = serde_json::to_value(MercariClient::build_request(&query())).unwrap();
    let condition = &body["searchCondition"];
    for key in ["sizeId", "brandId", "sellerId", "itemConditionId", "colorId", "skuIds"] {
        assert_eq!(condition[key], serde_json::json!([]), "{key}");
    }
    assert_eq!(condition["excludeKeyword"], "");
}

#[test]
fn every_request_gets_a_new_session_id() {
    let a = MercariClient::build_request(&query());
    let b = MercariClient::build_request(&query());
    assert_ne!(a.search_session_id, b.search_session_id);
    assert!(!a.search_session_id.is_empty());
}

#[test]
fn user_agent_comes_from_pool() {
    let client = MercariClient::with_base_url(5, "http://127.0.0.1:9/search").unwrap();
    assert!(USER_AGENTS.contains(&client.user_agent()));
}

#[test]
fn with_base_url_rejects_garbage() {
    let err = MercariClient::with_base_url(5, "not a url").unwrap_err();
    assert!(
        matches!(err, ScraperError::InvalidBaseUrl { .. }),
        "expected InvalidBaseUrl, got: {err:?}"
    );
}

// -----------------------------------------------------------------------
// body_excerpt
// -----------------------------------------------------------------------

#[test]
fn body_excerpt_keeps_short_bodies() {
    assert_eq!(body_excerpt("{\"error\":\"bad\"}"), "{\"error\":\"bad\"}");
}

#[test]
fn body_excerpt_strips_control_chars_but_keeps_whitespace() {
    assert_eq!(body_excerpt("a\u{0}b\u{7}c\nd\te\r"), "abc\nd\te\r");
}

#[test]
fn body_excerpt_truncates_by_characters() {
    let long = "あ".repeat(400);
    let excerpt = body_excerpt(&long);
    assert!(excerpt.ends_with("..."));
    assert_eq!(excerpt.chars().count(), 303);
}

#[test]
fn body_excerpt_exactly_at_limit_is_not_marked() {
    let exact = "x".repeat(300);
    assert_eq!(body_excerpt(&exact), exact);
}
