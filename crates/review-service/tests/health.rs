//! Health endpoint integration tests.

mod common;

use common::TestHarness;

#[tokio::test]
async fn health_check_returns_ok() {
    let harness = TestHarness::single();

    let response = harness.server.get("/health").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["topology"], "single");
    assert_eq!(body["partitions"], 0);
}

#[tokio::test]
async fn health_reports_partition_count() {
    let harness = TestHarness::sharded(3);

    let body: serde_json::Value = harness.server.get("/health").await.json();

    assert_eq!(body["topology"], "sharded");
    assert_eq!(body["partitions"], 3);
}
