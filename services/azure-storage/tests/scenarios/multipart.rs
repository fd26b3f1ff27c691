use std::collections::HashMap;

use azrest_core::ErrorKind;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::mock_blob_client;

const BLOB: &str = "/c/big.bin";
const KEY: &str = "c/big.bin";
const LEASE: &str = "lease-1";

async fn mount_release(server: &MockServer) {
    Mock::given(method("PUT"))
        .and(path(BLOB))
        .and(query_param("comp", "lease"))
        .and(header("x-ms-lease-action", "release"))
        .and(header("x-ms-lease-id", LEASE))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_multipart_upload() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(BLOB))
        .and(header("x-ms-blob-type", "BlockBlob"))
        .and(header("x-ms-meta-owner", "ops"))
        .and(header("content-length", "0"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(BLOB))
        .and(query_param("comp", "lease"))
        .and(header("x-ms-lease-action", "acquire"))
        .and(header("x-ms-lease-duration", "-1"))
        .respond_with(ResponseTemplate::new(201).insert_header("x-ms-lease-id", LEASE))
        .expect(1)
        .mount(&server)
        .await;
    for (id, data) in [("MA==", "part0"), ("MQ==", "part1")] {
        Mock::given(method("PUT"))
            .and(path(BLOB))
            .and(query_param("comp", "block"))
            .and(query_param("blockid", id))
            .and(header("x-ms-lease-id", LEASE))
            .and(body_string(data))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("PUT"))
        .and(path(BLOB))
        .and(query_param("comp", "blocklist"))
        .and(header("x-ms-lease-id", LEASE))
        .and(body_string(
            r#"<?xml version="1.0" encoding="utf-8"?><BlockList><Latest>MQ==</Latest><Latest>MA==</Latest></BlockList>"#,
        ))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    mount_release(&server).await;

    let client = mock_blob_client(&server);
    let meta = HashMap::from([("owner".to_string(), "ops".to_string())]);
    let upload_id = client.new_multipart_upload(KEY, &meta).await.unwrap();
    assert_eq!(upload_id, LEASE);

    let first = client
        .upload_part(KEY, &upload_id, 0, Bytes::from("part0"))
        .await
        .unwrap();
    let second = client
        .upload_part(KEY, &upload_id, 1, Bytes::from("part1"))
        .await
        .unwrap();
    assert_eq!((first.as_str(), second.as_str()), ("MA==", "MQ=="));

    // Blocks are committed in caller order.
    client
        .complete_multipart_upload(KEY, &upload_id, &[second, first])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_copy_part() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(BLOB))
        .and(query_param("comp", "block"))
        .and(query_param("blockid", "Mw=="))
        .and(header("x-ms-copy-source", "https://src.blob.core.windows.net/c/src.bin"))
        .and(header("x-ms-source-range", "bytes=0-5242879"))
        .and(header("x-ms-lease-id", "L"))
        .and(header("content-length", "0"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let id = mock_blob_client(&server)
        .copy_part(
            KEY,
            "L",
            3,
            "https://src.blob.core.windows.net/c/src.bin",
            0,
            5 * 1024 * 1024,
        )
        .await
        .unwrap();
    assert_eq!(id, "Mw==");

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_abort_multipart_upload() {
    let server = MockServer::start().await;
    mount_release(&server).await;
    Mock::given(method("DELETE"))
        .and(path(BLOB))
        .and(header("x-ms-delete-snapshots", "include"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    mock_blob_client(&server)
        .abort_multipart_upload(KEY, LEASE)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let methods: Vec<_> = requests.iter().map(|r| r.method.to_string()).collect();
    assert_eq!(methods, vec!["PUT", "DELETE"]);
}

#[tokio::test]
async fn test_missing_lease_id() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(BLOB))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let err = mock_blob_client(&server)
        .new_multipart_upload(KEY, &HashMap::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unexpected);
}

#[tokio::test]
async fn test_invalid_key_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let client = mock_blob_client(&server);
    let err = client
        .upload_part("no-blob", LEASE, 0, Bytes::from("x"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = client
        .upload_part(KEY, LEASE, 50000, Bytes::from("x"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}
