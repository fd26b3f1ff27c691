use std::collections::HashMap;

use azrest_azure_storage::{ContainerAccess, CorsRule, ListBlobsOptions, StaticCredentialProvider};
use azrest_core::ErrorKind;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use wiremock::matchers::{
    body_string, body_string_contains, header, header_exists, method, path, query_param,
    query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{mock_blob_client, mock_blob_client_with};

fn xml(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "application/xml")
}

fn storage_error(status: u16, code: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?><Error><Code>{code}</Code><Message>{code} happened</Message></Error>"#
        ),
        "application/xml",
    )
}

#[tokio::test]
async fn test_requests_are_signed() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/images"))
        .and(query_param("restype", "container"))
        .and(header("x-ms-version", "2019-12-12"))
        .and(header_exists("x-ms-date"))
        .and(header_exists("authorization"))
        .and(header("content-length", "0"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    mock_blob_client(&server)
        .create_container("images")
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let auth = requests[0].headers["authorization"].to_str().unwrap();
    assert!(auth.starts_with("SharedKey acct:"));
}

#[tokio::test]
async fn test_sas_token_is_appended() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/c/a.txt"))
        .and(query_param("sv", "2019-12-12"))
        .and(query_param("sig", "abc="))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_blob_client_with(
        &server,
        StaticCredentialProvider::new_sas_token("?sv=2019-12-12&sig=abc%3D"),
    );
    let data = client.get_blob("c", "a.txt", None).await.unwrap();
    assert_eq!(data, Bytes::from("hello"));

    let requests = server.received_requests().await.unwrap();
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_invalid_container_name_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let err = mock_blob_client(&server)
        .create_container("Bad--Name")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn test_ensure_container_accepts_existing() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/images"))
        .respond_with(storage_error(409, "ContainerAlreadyExists"))
        .expect(2)
        .mount(&server)
        .await;

    let client = mock_blob_client(&server);
    client.ensure_container("images").await.unwrap();

    let err = client.create_container("images").await.unwrap_err();
    assert_eq!(err.code(), Some("ContainerAlreadyExists"));
    assert_eq!(err.status().map(|s| s.as_u16()), Some(409));
}

#[tokio::test]
async fn test_list_containers_follows_marker() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("comp", "list"))
        .and(query_param("maxresults", "5000"))
        .and(query_param_is_missing("marker"))
        .respond_with(xml(
            "<EnumerationResults><Containers><Container><Name>a</Name></Container></Containers><NextMarker>m1</NextMarker></EnumerationResults>",
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("comp", "list"))
        .and(query_param("marker", "m1"))
        .respond_with(xml(
            "<EnumerationResults><Containers><Container><Name>b</Name></Container></Containers><NextMarker/></EnumerationResults>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let containers = mock_blob_client(&server).list_containers().await.unwrap();
    let names: Vec<_> = containers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[tokio::test]
async fn test_get_container_acl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/public"))
        .and(query_param("restype", "container"))
        .and(query_param("comp", "acl"))
        .respond_with(ResponseTemplate::new(200).insert_header("x-ms-blob-public-access", "container"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .and(query_param("restype", "container"))
        .and(query_param("comp", "acl"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_blob_client(&server);
    assert_eq!(
        client.get_container_acl("public").await.unwrap(),
        ContainerAccess::Container
    );
    assert_eq!(
        client.get_container_acl("private").await.unwrap(),
        ContainerAccess::Private
    );
}

#[tokio::test]
async fn test_set_container_acl() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/images"))
        .and(query_param("restype", "container"))
        .and(query_param("comp", "acl"))
        .and(header("x-ms-blob-public-access", "blob"))
        .and(header_exists("authorization"))
        .and(body_string_contains("<SignedIdentifiers>"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/logs"))
        .and(query_param("comp", "acl"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_blob_client(&server);
    client
        .set_container_acl("images", ContainerAccess::Blob)
        .await
        .unwrap();
    client
        .set_container_acl("logs", ContainerAccess::Private)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let logs = requests.iter().find(|r| r.url.path() == "/logs").unwrap();
    assert!(!logs.headers.contains_key("x-ms-blob-public-access"));
}

#[tokio::test]
async fn test_list_blobs_with_delimiter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .and(query_param("restype", "container"))
        .and(query_param("comp", "list"))
        .and(query_param("prefix", "logs/"))
        .and(query_param("delimiter", "/"))
        .and(query_param("maxresults", "2"))
        .respond_with(xml(
            "<EnumerationResults><Blobs>\
             <Blob><Name>logs/a.txt</Name><Properties><Content-Length>3</Content-Length><BlobType>BlockBlob</BlobType></Properties></Blob>\
             <BlobPrefix><Name>logs/2024/</Name></BlobPrefix>\
             </Blobs><NextMarker>next</NextMarker></EnumerationResults>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let page = mock_blob_client(&server)
        .list_blobs(
            "c",
            &ListBlobsOptions {
                prefix: Some("logs/".to_string()),
                delimiter: Some("/".to_string()),
                max_results: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page.blobs.len(), 1);
    assert_eq!(page.blobs[0].name, "logs/a.txt");
    assert_eq!(page.blobs[0].properties.content_length, 3);
    assert_eq!(page.prefixes, vec!["logs/2024/"]);
    assert_eq!(page.next_marker.as_deref(), Some("next"));
}

#[tokio::test]
async fn test_list_all_blobs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .and(query_param("comp", "list"))
        .and(query_param_is_missing("marker"))
        .respond_with(xml(
            "<EnumerationResults><Blobs><Blob><Name>a</Name></Blob></Blobs><NextMarker>m1</NextMarker></EnumerationResults>",
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .and(query_param("comp", "list"))
        .and(query_param("marker", "m1"))
        .respond_with(xml(
            "<EnumerationResults><Blobs><Blob><Name>b</Name></Blob></Blobs><NextMarker/></EnumerationResults>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let blobs = mock_blob_client(&server)
        .list_all_blobs("c", "")
        .await
        .unwrap();
    let names: Vec<_> = blobs.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[tokio::test]
async fn test_put_block_blob_with_meta() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/c/dir/a%20b.txt"))
        .and(header("x-ms-blob-type", "BlockBlob"))
        .and(header("x-ms-blob-content-type", "text/plain"))
        .and(header("x-ms-meta-owner", "ops"))
        .and(header("content-length", "5"))
        .and(body_string("hello"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let meta = HashMap::from([
        ("Content-Type".to_string(), "text/plain".to_string()),
        ("owner".to_string(), "ops".to_string()),
    ]);
    mock_blob_client(&server)
        .put_block_blob("c", "dir/a b.txt", Bytes::from("hello"), &meta)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_get_blob_range() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/c/a.txt"))
        .and(header("x-ms-range", "bytes=2-4"))
        .respond_with(ResponseTemplate::new(206).set_body_string("llo"))
        .expect(1)
        .mount(&server)
        .await;

    let data = mock_blob_client(&server)
        .get_blob("c", "a.txt", Some(2..=4))
        .await
        .unwrap();
    assert_eq!(data, Bytes::from("llo"));
}

#[tokio::test]
async fn test_get_missing_blob() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/c/missing"))
        .respond_with(storage_error(404, "BlobNotFound"))
        .mount(&server)
        .await;

    let err = mock_blob_client(&server)
        .get_blob("c", "missing", None)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.code(), Some("BlobNotFound"));
}

#[tokio::test]
async fn test_rejected_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(storage_error(403, "AuthenticationFailed"))
        .mount(&server)
        .await;

    let err = mock_blob_client(&server)
        .get_blob("c", "a.txt", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAccessKey);
}

#[tokio::test]
async fn test_delete_and_copy_blob() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/c/old"))
        .and(header("x-ms-delete-snapshots", "include"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/c/new"))
        .and(header("x-ms-copy-source", "https://src.blob.core.windows.net/c/old"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_blob_client(&server);
    client
        .copy_blob("c", "new", "https://src.blob.core.windows.net/c/old")
        .await
        .unwrap();
    client.delete_blob("c", "old").await.unwrap();
}

#[tokio::test]
async fn test_cors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("restype", "service"))
        .and(query_param("comp", "properties"))
        .respond_with(xml(
            "<StorageServiceProperties><Cors><CorsRule>\
             <AllowedOrigins>*</AllowedOrigins><AllowedMethods>GET,HEAD</AllowedMethods>\
             <MaxAgeInSeconds>60</MaxAgeInSeconds><ExposedHeaders></ExposedHeaders>\
             <AllowedHeaders>x-ms-*</AllowedHeaders>\
             </CorsRule></Cors></StorageServiceProperties>",
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/"))
        .and(query_param("restype", "service"))
        .and(query_param("comp", "properties"))
        .and(body_string(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?><StorageServiceProperties><Cors><CorsRule>\
             <AllowedOrigins>*</AllowedOrigins><AllowedMethods>GET,HEAD,PUT</AllowedMethods>\
             <MaxAgeInSeconds>60</MaxAgeInSeconds><ExposedHeaders/>\
             <AllowedHeaders>x-ms-*</AllowedHeaders>\
             </CorsRule></Cors></StorageServiceProperties>",
        ))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_blob_client(&server);
    let mut rules = client.get_cors().await.unwrap();
    assert_eq!(
        rules,
        vec![CorsRule {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec!["GET".to_string(), "HEAD".to_string()],
            allowed_headers: vec!["x-ms-*".to_string()],
            exposed_headers: vec![],
            max_age_in_seconds: 60,
        }]
    );

    rules[0].allowed_methods.push("PUT".to_string());
    client.set_cors(&rules).await.unwrap();
}
