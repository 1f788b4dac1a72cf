//! Review submission and browsing integration tests (single store).

mod common;

use common::TestHarness;
use review_service::SESSION_HEADER;
use serde_json::{json, Value};

// ============================================================================
// Submission
// ============================================================================

#[tokio::test]
async fn create_review_success() {
    let harness = TestHarness::single();

    let (body, session) = harness.quick_review(None, 1, "Browns evenly").await;

    assert_eq!(body["review"]["id"], 1);
    assert_eq!(body["review"]["product_id"], 1);
    assert_eq!(body["review"]["rating"], 4);
    assert_eq!(body["review"]["reviewer"], "user 7");
    assert_eq!(body["review"]["text"], "Browns evenly");
    assert!(body.get("partition").is_none());
    assert!(!session.is_empty());
}

#[tokio::test]
async fn anonymous_review_without_rating() {
    let harness = TestHarness::single();

    let (body, _) = harness
        .create_review(None, json!({ "product_id": 2, "text": "Loud" }))
        .await;

    assert_eq!(body["review"]["author"], json!({ "kind": "anonymous" }));
    assert_eq!(body["review"]["reviewer"], "Anonymous");
    assert!(body["review"]["rating"].is_null());
}

#[tokio::test]
async fn create_review_keeps_supplied_session() {
    let harness = TestHarness::single();
    let session = "5f0c6f5e-7a43-4d8b-9a3b-0b7f2f0d2c11";

    let (_, returned) = harness.quick_review(Some(session), 1, "Fine").await;

    assert_eq!(returned, session);
}

#[tokio::test]
async fn create_review_rejects_out_of_range_rating() {
    let harness = TestHarness::single();

    for rating in [0, 6, 300, -1] {
        let response = harness
            .server
            .post("/v1/reviews")
            .json(&json!({ "product_id": 1, "rating": rating, "text": "Hmm" }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "bad_request");
    }
}

#[tokio::test]
async fn create_review_rejects_malformed_body() {
    let harness = TestHarness::single();

    for body in [
        json!({ "product_id": 1, "rating": "5", "text": "Hmm" }),
        json!({ "product_id": 1, "rating": 4 }),
        json!({ "product_id": "toaster", "text": "Hmm" }),
    ] {
        let response = harness.server.post("/v1/reviews").json(&body).await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "bad_request");
    }
}

#[tokio::test]
async fn create_review_rejects_blank_text() {
    let harness = TestHarness::single();

    let response = harness
        .server
        .post("/v1/reviews")
        .json(&json!({ "product_id": 1, "text": "   " }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn create_review_rejects_unknown_product() {
    let harness = TestHarness::single();

    let response = harness
        .server
        .post("/v1/reviews")
        .json(&json!({ "product_id": 99, "text": "Where is it?" }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Unknown product"));
}

// ============================================================================
// Single review
// ============================================================================

#[tokio::test]
async fn get_review_includes_product() {
    let harness = TestHarness::single();
    let (created, session) = harness.quick_review(None, 3, "Boils fast").await;
    let id = created["review"]["id"].as_u64().unwrap();

    let response = harness
        .server
        .get(&format!("/v1/reviews/{id}"))
        .add_header(SESSION_HEADER, session.clone())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["review"]["id"], id);
    assert_eq!(body["product"]["name"], "Kettle");
    assert_eq!(body["read_from"], "default");
    assert_eq!(response.header(SESSION_HEADER).to_str().unwrap(), session);
}

#[tokio::test]
async fn get_missing_review_returns_not_found() {
    let harness = TestHarness::single();

    let response = harness.server.get("/v1/reviews/404").await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn get_review_rejects_bad_id() {
    let harness = TestHarness::single();

    let response = harness.server.get("/v1/reviews/abc").await;

    response.assert_status_bad_request();
}

// ============================================================================
// Listings
// ============================================================================

#[tokio::test]
async fn list_reviews_groups_by_product() {
    let harness = TestHarness::single();
    harness.quick_review(None, 1, "first toaster").await;
    harness.quick_review(None, 3, "kettle").await;
    harness.quick_review(None, 1, "second toaster").await;

    let response = harness.server.get("/v1/reviews").await;

    response.assert_status_ok();
    let body: Value = response.json();
    let products = body["products"].as_array().unwrap();

    let names: Vec<&str> = products.iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Blender", "Kettle", "Toaster"]);

    assert!(products[0]["reviews"].as_array().unwrap().is_empty());
    assert_eq!(products[1]["reviews"].as_array().unwrap().len(), 1);

    let toaster: Vec<&str> = products[2]["reviews"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["text"].as_str().unwrap())
        .collect();
    assert_eq!(toaster, vec!["second toaster", "first toaster"]);
}

#[tokio::test]
async fn list_reviews_for_one_product() {
    let harness = TestHarness::single();
    harness.quick_review(None, 2, "blender one").await;
    harness.quick_review(None, 1, "toaster").await;
    harness.quick_review(None, 2, "blender two").await;

    let response = harness.server.get("/v1/products/2/reviews").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["product"]["name"], "Blender");
    let texts: Vec<&str> = body["reviews"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["blender two", "blender one"]);
}

#[tokio::test]
async fn list_reviews_for_unknown_product_is_not_found() {
    let harness = TestHarness::single();

    let response = harness.server.get("/v1/products/42/reviews").await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn product_choices_sorted_by_name() {
    let harness = TestHarness::single();

    let response = harness.server.get("/v1/products").await;

    response.assert_status_ok();
    let body: Value = response.json();
    let names: Vec<&str> = body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Blender", "Kettle", "Toaster"]);
}
