//! Integration tests for ranked-fallback artifact retrieval.

mod support;

use support::socket_guard::start_mock_server_or_skip;
use support::{TEST_MIN_BYTES, mount_pdf, pdf_body, test_config};
use tempfile::TempDir;
use textbook_core::download::{ArtifactFetcher, DownloadError, RejectionKind};
use textbook_core::resolver::ArtifactCandidateSet;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher_for(server: &MockServer) -> ArtifactFetcher {
    let config = test_config(server);
    ArtifactFetcher::new(config.timeouts, config.artifact_policy).expect("fetcher should build")
}

fn candidates(server: &MockServer, paths: &[&str]) -> ArtifactCandidateSet {
    ArtifactCandidateSet::from_urls(paths.iter().map(|p| format!("{}{p}", server.uri())))
}

async fn mount_status(server: &MockServer, artifact_path: &str, status: u16, expected: u64) {
    Mock::given(method("GET"))
        .and(path(artifact_path))
        .respond_with(ResponseTemplate::new(status))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_bad_bad_good_stops_at_first_acceptance() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp_dir = TempDir::new().expect("temp dir");
    mount_status(&server, "/r1.pdf", 503, 1).await;
    mount_status(&server, "/r2.pdf", 404, 1).await;
    Mock::given(method("GET"))
        .and(path("/r3.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(pdf_body(), "application/pdf"))
        .expect(1)
        .mount(&server)
        .await;
    mount_status(&server, "/r4.pdf", 200, 0).await;

    let destination = temp_dir.path().join("book.pdf");
    let stored = fetcher_for(&server)
        .fetch(
            &candidates(&server, &["/r1.pdf", "/r2.pdf", "/r3.pdf"]),
            &destination,
        )
        .await
        .expect("third candidate should be accepted");

    assert_eq!(stored.rank, 3);
    assert_eq!(stored.rejections.len(), 2);
    assert_eq!(stored.rejections[0].kind, RejectionKind::HttpStatus(503));
    assert_eq!(stored.rejections[1].kind, RejectionKind::HttpStatus(404));
    assert_eq!(stored.bytes, pdf_body().len() as u64);
    assert_eq!(std::fs::read(&destination).expect("file"), pdf_body());
}

#[tokio::test]
async fn test_small_html_ok_page_is_rejected_and_next_candidate_tried() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp_dir = TempDir::new().expect("temp dir");
    Mock::given(method("GET"))
        .and(path("/error-page.pdf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(vec![b'<'; 500], "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;
    mount_pdf(&server, "/real.pdf").await;

    let stored = fetcher_for(&server)
        .fetch(
            &candidates(&server, &["/error-page.pdf", "/real.pdf"]),
            &temp_dir.path().join("book.pdf"),
        )
        .await
        .expect("second candidate accepted");
    assert_eq!(stored.rank, 2);
    assert!(matches!(
        stored.rejections[0].kind,
        RejectionKind::ContentType(_)
    ));
}

#[tokio::test]
async fn test_pdf_content_type_below_minimum_size_is_rejected() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp_dir = TempDir::new().expect("temp dir");
    Mock::given(method("GET"))
        .and(path("/tiny.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![b'%'; 500], "application/pdf"))
        .mount(&server)
        .await;

    let destination = temp_dir.path().join("book.pdf");
    let err = fetcher_for(&server)
        .fetch(&candidates(&server, &["/tiny.pdf"]), &destination)
        .await
        .unwrap_err();
    match err {
        DownloadError::AllEndpointsFailed { attempts, .. } => {
            assert_eq!(attempts.len(), 1);
            assert_eq!(
                attempts[0].kind,
                RejectionKind::TooSmall {
                    bytes: 500,
                    min_bytes: TEST_MIN_BYTES
                }
            );
        }
        other => panic!("expected AllEndpointsFailed, got {other:?}"),
    }
    assert!(!destination.exists(), "no file may be left behind");
    let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path()).expect("dir").collect();
    assert!(leftovers.is_empty(), "partial file should be removed");
}

#[tokio::test]
async fn test_all_candidates_failing_lists_every_attempt_in_rank_order() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp_dir = TempDir::new().expect("temp dir");
    mount_status(&server, "/a.pdf", 500, 1).await;
    mount_status(&server, "/b.pdf", 403, 1).await;

    let err = fetcher_for(&server)
        .fetch(
            &candidates(&server, &["/a.pdf", "/b.pdf"]),
            &temp_dir.path().join("x.pdf"),
        )
        .await
        .unwrap_err();
    let DownloadError::AllEndpointsFailed { attempts, .. } = err else {
        panic!("expected AllEndpointsFailed");
    };
    let ranks: Vec<usize> = attempts.iter().map(|attempt| attempt.rank).collect();
    assert_eq!(ranks, vec![1, 2]);
}

#[tokio::test]
async fn test_empty_candidate_set_makes_no_request() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp_dir = TempDir::new().expect("temp dir");
    let err = fetcher_for(&server)
        .fetch(&ArtifactCandidateSet::default(), &temp_dir.path().join("x.pdf"))
        .await
        .unwrap_err();
    assert!(matches!(err, DownloadError::NoCandidates { .. }));
    assert!(
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .is_empty()
    );
}
