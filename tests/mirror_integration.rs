//! Integration tests for the full mirror flow.
//!
//! These tests drive crawl and download together against mock HTTP servers,
//! covering resume across runs, cache reuse, and the discovery ordering the
//! crawler guarantees.

use std::sync::Arc;

use h5mirror_core::{
    BatchOutcome, BatchRunner, Downloader, HttpClient, ResponseCache, WorkItem,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn listing_html(hrefs: &[&str]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|href| format!(r#"<a href="{href}">{href}</a>"#))
        .collect();
    format!("<html><body>{anchors}</body></html>")
}

async fn mount_listing(server: &MockServer, at: &str, hrefs: &[&str]) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(hrefs)))
        .mount(server)
        .await;
}

async fn mount_file(server: &MockServer, at: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

fn runner_in(temp: &TempDir) -> BatchRunner {
    let client = HttpClient::new();
    let cache = ResponseCache::new(temp.path().join("url_cache"), Arc::new(client.clone()));
    BatchRunner::new(
        cache,
        client,
        Downloader::new(2).expect("valid worker count"),
        temp.path().join("downloaded_db"),
        temp.path().join("files"),
        false,
    )
}

#[tokio::test]
async fn test_mirror_reproduces_listing_tree_on_disk() {
    let server = MockServer::start().await;
    let temp = TempDir::new().expect("failed to create temp dir");

    mount_listing(
        &server,
        "/files/",
        &["/files/sub/", "/files/a.zip", "/files/b.zip"],
    )
    .await;
    mount_listing(&server, "/files/sub/", &["../", "/files/sub/c.zip"]).await;
    mount_file(&server, "/files/a.zip", b"content a").await;
    mount_file(&server, "/files/b.zip", b"content b").await;
    mount_file(&server, "/files/sub/c.zip", b"content c").await;

    let items = [WorkItem::new(format!("{}/files/", server.uri()), 1)];
    let outcome = runner_in(&temp)
        .run(&items, |_| true)
        .await
        .expect("batch should succeed");

    let BatchOutcome::Completed(report, stats) = outcome else {
        panic!("expected a completed batch");
    };

    // Pre-order discovery: sub/'s leaf lands before the root's later leaves.
    assert_eq!(
        report.items[0].urls,
        vec![
            format!("{}/files/sub/c.zip", server.uri()),
            format!("{}/files/a.zip", server.uri()),
            format!("{}/files/b.zip", server.uri()),
        ]
    );
    assert_eq!(stats.downloaded(), 3);
    assert_eq!(stats.failed(), 0);

    let out = temp.path().join("files");
    assert_eq!(
        std::fs::read(out.join("files/a.zip")).expect("a.zip on disk"),
        b"content a"
    );
    assert_eq!(
        std::fs::read(out.join("files/sub/c.zip")).expect("c.zip on disk"),
        b"content c"
    );
}

#[tokio::test]
async fn test_second_run_touches_neither_listing_nor_files() {
    // Cache idempotence and ledger resume together: across two full runs the
    // listing page and the file are each requested exactly once.
    let server = MockServer::start().await;
    let temp = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/files/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&["/files/a.zip"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/a.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"once"))
        .expect(1)
        .mount(&server)
        .await;

    let items = [WorkItem::new(format!("{}/files/", server.uri()), 1)];

    let first = runner_in(&temp).run(&items, |_| true).await.expect("first run");
    let BatchOutcome::Completed(_, stats) = first else {
        panic!("expected a completed batch");
    };
    assert_eq!(stats.downloaded(), 1);

    // A fresh runner over the same storage directories resumes cleanly.
    let second = runner_in(&temp).run(&items, |_| true).await.expect("second run");
    let BatchOutcome::Completed(_, stats) = second else {
        panic!("expected a completed batch");
    };
    assert_eq!(stats.downloaded(), 0);
    assert_eq!(stats.skipped(), 1);
    // MockServer verifies the expect(1) counts on drop.
}

#[tokio::test]
async fn test_interrupted_run_retries_only_the_missing_file() {
    // First run: one file 500s and stays out of the ledger. Second run: the
    // server recovers; only the failed file is transferred again.
    let server = MockServer::start().await;
    let temp = TempDir::new().expect("failed to create temp dir");

    mount_listing(&server, "/files/", &["/files/good.zip", "/files/flaky.zip"]).await;
    mount_file(&server, "/files/good.zip", b"good").await;

    let flaky = Mock::given(method("GET"))
        .and(path("/files/flaky.zip"))
        .respond_with(ResponseTemplate::new(500))
        .mount_as_scoped(&server)
        .await;

    let items = [WorkItem::new(format!("{}/files/", server.uri()), 1)];

    let first = runner_in(&temp).run(&items, |_| true).await.expect("first run");
    let BatchOutcome::Completed(_, stats) = first else {
        panic!("expected a completed batch");
    };
    assert_eq!(stats.downloaded(), 1);
    assert_eq!(stats.failed(), 1);

    // Server recovers.
    drop(flaky);
    mount_file(&server, "/files/flaky.zip", b"recovered").await;

    let second = runner_in(&temp).run(&items, |_| true).await.expect("second run");
    let BatchOutcome::Completed(_, stats) = second else {
        panic!("expected a completed batch");
    };
    assert_eq!(stats.skipped(), 1, "good.zip is already complete");
    assert_eq!(stats.downloaded(), 1, "flaky.zip is retried");
    assert_eq!(
        std::fs::read(temp.path().join("files/files/flaky.zip")).expect("flaky.zip on disk"),
        b"recovered"
    );
}

#[tokio::test]
async fn test_depth_limited_mirror_leaves_deep_branches_alone() {
    let server = MockServer::start().await;
    let temp = TempDir::new().expect("failed to create temp dir");

    mount_listing(&server, "/files/", &["/files/l1/", "/files/top.zip"]).await;
    mount_listing(&server, "/files/l1/", &["/files/l1/l2/", "/files/l1/mid.zip"]).await;
    mount_file(&server, "/files/top.zip", b"top").await;
    mount_file(&server, "/files/l1/mid.zip", b"mid").await;

    // The depth-2 listing must never be fetched at max_depth 1.
    Mock::given(method("GET"))
        .and(path("/files/l1/l2/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&[])))
        .expect(0)
        .mount(&server)
        .await;

    let items = [WorkItem::new(format!("{}/files/", server.uri()), 1)];
    let outcome = runner_in(&temp)
        .run(&items, |_| true)
        .await
        .expect("batch should succeed");

    let BatchOutcome::Completed(_, stats) = outcome else {
        panic!("expected a completed batch");
    };
    assert_eq!(stats.downloaded(), 2);
}

#[tokio::test]
async fn test_gate_sees_the_full_report_before_any_download() {
    let server = MockServer::start().await;
    let temp = TempDir::new().expect("failed to create temp dir");

    mount_listing(&server, "/a/", &["/a/one.zip"]).await;
    mount_listing(&server, "/b/", &["/b/two.zip"]).await;

    let items = [
        WorkItem::new(format!("{}/a/", server.uri()), 1),
        WorkItem::new(format!("{}/b/", server.uri()), 1),
    ];

    // The gate refuses after inspecting the aggregate; nothing is fetched.
    let outcome = runner_in(&temp)
        .run(&items, |report| {
            assert_eq!(report.total_files(), 2);
            false
        })
        .await
        .expect("batch should succeed");

    assert!(matches!(outcome, BatchOutcome::Aborted(_)));
    assert!(!temp.path().join("files").exists());
}
