//! Shared fixtures for integration tests: a wiremock-served catalog, detail
//! documents and PDF artifacts.

#![allow(dead_code)]

pub mod socket_guard;

use std::time::Duration;

use serde_json::{Value, json};
use textbook_core::RetrievalConfig;
use textbook_core::download::ArtifactPolicy;
use textbook_core::http_client::HttpTimeouts;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Minimum artifact size used by the fixtures.
pub const TEST_MIN_BYTES: u64 = 1024;

/// Path of the catalog-version document on the mock server.
pub const VERSION_PATH: &str = "/version/data_version.json";

/// One book listed in a shard.
#[derive(Debug, Clone, Copy)]
pub struct ShardBook<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub publisher: Option<&'a str>,
}

#[must_use]
pub fn book<'a>(id: &'a str, title: &'a str) -> ShardBook<'a> {
    ShardBook {
        id,
        title,
        publisher: None,
    }
}

/// A body that passes validation under [`TEST_MIN_BYTES`].
#[must_use]
pub fn pdf_body() -> Vec<u8> {
    let mut body = b"%PDF-1.7\n".to_vec();
    body.resize(4096, b'x');
    body
}

#[must_use]
pub fn shard_path(index: usize) -> String {
    format!("/shards/part_{index}.json")
}

#[must_use]
pub fn detail_path(book_id: &str) -> String {
    format!("/details/{book_id}.json")
}

/// Library config pointed at the mock server, with no pause and one catalog attempt.
#[must_use]
pub fn test_config(server: &MockServer) -> RetrievalConfig {
    RetrievalConfig {
        catalog_version_url: format!("{}{VERSION_PATH}", server.uri()),
        detail_base_url: format!("{}/details", server.uri()),
        timeouts: HttpTimeouts {
            connect: Duration::from_secs(2),
            request: Duration::from_secs(2),
        },
        artifact_policy: ArtifactPolicy::with_min_bytes(TEST_MIN_BYTES),
        pause: Duration::ZERO,
        catalog_attempts: 1,
        ..RetrievalConfig::default()
    }
}

fn shard_entry(book: &ShardBook<'_>) -> Value {
    let mut tags = vec![json!({"tag_id": "t1", "tag_name": "小学"})];
    if let Some(publisher) = book.publisher {
        tags.push(json!({"tag_id": "t2", "tag_name": publisher}));
    }
    json!({
        "id": book.id,
        "title": book.title,
        "tag_list": tags,
        "resource_type_code": "assets_document",
    })
}

/// Mounts the catalog-version document and one document per shard.
pub async fn mount_catalog(server: &MockServer, shards: &[&[ShardBook<'_>]]) {
    let raw: Vec<Vec<Value>> = shards
        .iter()
        .map(|books| books.iter().map(shard_entry).collect())
        .collect();
    mount_raw_catalog(server, &raw).await;
}

/// Like [`mount_catalog`], but each shard element is served verbatim.
pub async fn mount_raw_catalog(server: &MockServer, shards: &[Vec<Value>]) {
    let urls = (0..shards.len())
        .map(|index| format!("{}{}", server.uri(), shard_path(index)))
        .collect::<Vec<_>>()
        .join(",");
    Mock::given(method("GET"))
        .and(path(VERSION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "module": "tch_material",
            "module_version": 1_700_000_000,
            "urls": urls,
        })))
        .mount(server)
        .await;

    for (index, entries) in shards.iter().enumerate() {
        Mock::given(method("GET"))
            .and(path(shard_path(index)))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(entries.clone())))
            .mount(server)
            .await;
    }
}

/// Mounts a detail document whose source item lists `artifact_paths` on this server.
pub async fn mount_detail(server: &MockServer, book_id: &str, title: &str, artifact_paths: &[&str]) {
    let storages: Vec<String> = artifact_paths
        .iter()
        .map(|artifact| format!("{}{artifact}", server.uri()))
        .collect();
    Mock::given(method("GET"))
        .and(path(detail_path(book_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": book_id,
            "title": title,
            "ti_items": [
                {
                    "ti_file_flag": "thumbnail",
                    "ti_storages": [format!("{}/thumbs/{book_id}.jpg", server.uri())],
                },
                {
                    "ti_file_flag": "source",
                    "ti_format": "pdf",
                    "ti_storages": storages,
                },
            ],
        })))
        .mount(server)
        .await;
}

/// Mounts a valid PDF artifact.
pub async fn mount_pdf(server: &MockServer, artifact_path: &str) {
    Mock::given(method("GET"))
        .and(path(artifact_path))
        .respond_with(ResponseTemplate::new(200).set_body_raw(pdf_body(), "application/pdf"))
        .mount(server)
        .await;
}

/// Mounts a book end to end: detail document plus one valid artifact.
pub async fn mount_downloadable_book(server: &MockServer, book_id: &str, title: &str) {
    let artifact = format!("/assets/{book_id}.pdf");
    mount_detail(server, book_id, title, &[&artifact]).await;
    mount_pdf(server, &artifact).await;
}
