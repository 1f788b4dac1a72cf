//! Read-your-own-write routing over a master and a lagging default store.

mod common;

use common::TestHarness;
use review_core::ReviewId;
use review_service::SESSION_HEADER;
use review_store::Store;
use serde_json::Value;

#[tokio::test]
async fn writes_land_on_master_only() {
    let harness = TestHarness::replicated(60);

    let (body, _) = harness.quick_review(None, 1, "Crisp").await;
    let id = ReviewId::new(body["review"]["id"].as_u64().unwrap());

    assert!(harness.stores[0].get_review(id).unwrap().is_some());
    assert!(harness.stores[1].get_review(id).unwrap().is_none());
}

#[tokio::test]
async fn writer_reads_own_review_from_master() {
    let harness = TestHarness::replicated(60);
    let (body, session) = harness.quick_review(None, 1, "Crisp").await;
    let id = body["review"]["id"].as_u64().unwrap();

    let response = harness
        .server
        .get(&format!("/v1/reviews/{id}"))
        .add_header(SESSION_HEADER, session)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["read_from"], "reviews");
    assert_eq!(body["review"]["text"], "Crisp");
}

#[tokio::test]
async fn other_sessions_read_from_default() {
    let harness = TestHarness::replicated(60);
    let (body, _) = harness.quick_review(None, 1, "Crisp").await;
    let id = body["review"]["id"].as_u64().unwrap();

    // The default store has not caught up, so a fresh session misses it
    let response = harness.server.get(&format!("/v1/reviews/{id}")).await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn listing_follows_session_binding() {
    let harness = TestHarness::replicated(60);
    let (_, session) = harness.quick_review(None, 2, "Smooth").await;

    let bound: Value = harness
        .server
        .get("/v1/reviews")
        .add_header(SESSION_HEADER, session)
        .await
        .json();
    assert_eq!(bound["read_from"], "reviews");
    let blender = &bound["products"][0];
    assert_eq!(blender["name"], "Blender");
    assert_eq!(blender["reviews"].as_array().unwrap().len(), 1);

    let unbound: Value = harness.server.get("/v1/reviews").await.json();
    assert_eq!(unbound["read_from"], "default");
    assert!(unbound["products"]
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["reviews"].as_array().unwrap().is_empty()));
}

#[tokio::test]
async fn product_listing_follows_session_binding() {
    let harness = TestHarness::replicated(60);
    let (_, session) = harness.quick_review(None, 3, "Whistles").await;

    let response = harness
        .server
        .get("/v1/products/3/reviews")
        .add_header(SESSION_HEADER, session)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["read_from"], "reviews");
    assert_eq!(body["reviews"].as_array().unwrap().len(), 1);
}
