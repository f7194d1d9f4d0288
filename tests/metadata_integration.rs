//! Integration tests for book detail resolution.

mod support;

use support::socket_guard::start_mock_server_or_skip;
use support::{detail_path, mount_detail, test_config};
use textbook_core::resolver::{MetadataResolver, ResolveError};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resolver_for(server: &MockServer) -> MetadataResolver {
    let config = test_config(server);
    MetadataResolver::with_base_url(config.detail_base_url, config.timeouts)
        .expect("resolver should build")
}

#[tokio::test]
async fn test_resolve_returns_source_storages_in_rank_order() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_detail(
        &server,
        "book-1",
        "数学 一年级上册",
        &["/r1/book-1.pdf", "/r2/book-1.pdf", "/r3/book-1.pdf"],
    )
    .await;

    let metadata = resolver_for(&server).resolve("book-1").await.expect("resolved");
    assert_eq!(metadata.title.as_deref(), Some("数学 一年级上册"));
    let ranked: Vec<(usize, String)> = metadata
        .candidates
        .iter()
        .map(|candidate| (candidate.rank, candidate.url.clone()))
        .collect();
    assert_eq!(
        ranked,
        vec![
            (1, format!("{}/r1/book-1.pdf", server.uri())),
            (2, format!("{}/r2/book-1.pdf", server.uri())),
            (3, format!("{}/r3/book-1.pdf", server.uri())),
        ]
    );
}

#[tokio::test]
async fn test_private_storage_hosts_are_rewritten_to_public_hosts() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path(detail_path("book-2")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ti_items": [{
                "ti_file_flag": "source",
                "ti_storages": [
                    "https://r1-ndr-private.ykt.cbern.com.cn/edu_product/esp/assets/book-2.pkg/pdf.pdf"
                ]
            }]
        })))
        .mount(&server)
        .await;

    let metadata = resolver_for(&server).resolve("book-2").await.expect("resolved");
    assert_eq!(metadata.title, None);
    let first = metadata.candidates.iter().next().expect("one candidate");
    assert_eq!(
        first.url,
        "https://r1-ndr-oversea.ykt.cbern.com.cn/edu_product/esp/assets/book-2.pkg/pdf.pdf"
    );
}

#[tokio::test]
async fn test_detail_without_source_item_is_not_found_and_no_artifact_requested() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path(detail_path("preview-only")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "title": "预览",
            "ti_items": [
                {"ti_file_flag": "thumbnail", "ti_storages": [format!("{}/assets/thumb.jpg", server.uri())]},
                {"ti_file_flag": "href", "ti_storages": [format!("{}/assets/preview.pdf", server.uri())]}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/assets/.*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = resolver_for(&server)
        .resolve("preview-only")
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::NoSourceItem { .. }));
    assert!(err.is_missing_artifact());
}

#[tokio::test]
async fn test_source_item_without_storages_is_reported() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path(detail_path("empty-source")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ti_items": [{"ti_file_flag": "source", "ti_storages": []}]
        })))
        .mount(&server)
        .await;

    let err = resolver_for(&server)
        .resolve("empty-source")
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::NoStorageUrls { .. }));
}

#[tokio::test]
async fn test_detail_http_404_is_status_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path(detail_path("missing")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = resolver_for(&server).resolve("missing").await.unwrap_err();
    assert!(matches!(err, ResolveError::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_detail_garbage_body_is_format_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path(detail_path("garbage")))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = resolver_for(&server).resolve("garbage").await.unwrap_err();
    assert!(matches!(err, ResolveError::Format { .. }));
}
