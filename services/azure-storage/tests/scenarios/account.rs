use azrest_azure_storage::{ContainerAccess, StorageAccount, VhdUpload};
use azrest_core::time::now;
use azrest_core::ErrorKind;
use bytes::Bytes;
use http::Method;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;
use std::io::Write;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{mock_arm_client, mock_config, mount_token, ACCOUNT, ACCOUNT_KEY};

const ACCOUNT_ID: &str =
    "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Storage/storageAccounts/acct";

fn account(server: &MockServer, read_only: bool) -> StorageAccount {
    let client = mock_arm_client(mock_config(server).with_read_only(read_only));
    StorageAccount::new(client, ACCOUNT_ID, ACCOUNT, "eastus")
        .unwrap()
        .with_blob_endpoint(server.uri())
}

async fn mount_keys(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("{ACCOUNT_ID}/listKeys")))
        .and(query_param("api-version", "2016-12-01"))
        .and(header("authorization", "Bearer arm-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "keys": [
                {"keyName": "key1", "value": "cmVhZA==", "permissions": "READ"},
                {"keyName": "key2", "value": ACCOUNT_KEY, "permissions": "FULL"},
            ]
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_key_is_fetched_once() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_keys(&server).await;
    Mock::given(method("PUT"))
        .and(path("/c/a.txt"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&server)
        .await;

    let account = account(&server, false);
    assert_eq!(account.key().await.unwrap(), ACCOUNT_KEY);

    let blobs = account.blob_client();
    for _ in 0..2 {
        blobs
            .put_block_blob("c", "a.txt", Bytes::from("hi"), &HashMap::new())
            .await
            .unwrap();
    }

    let requests = server.received_requests().await.unwrap();
    let signed = requests.iter().find(|r| r.url.path() == "/c/a.txt").unwrap();
    let auth = signed.headers["authorization"].to_str().unwrap();
    assert!(auth.starts_with("SharedKey acct:"));
}

#[tokio::test]
async fn test_missing_key() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path(format!("{ACCOUNT_ID}/listKeys")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"keys": []})))
        .mount(&server)
        .await;

    let err = account(&server, false).key().await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_read_only_account_cannot_fetch_keys() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path(format!("{ACCOUNT_ID}/listKeys")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = account(&server, true).key().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AccountReadOnly);
}

#[tokio::test]
async fn test_sign_url() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path(format!("{ACCOUNT_ID}/listAccountSas")))
        .and(body_partial_json(json!({
            "signedServices": "b",
            "signedResourceTypes": "co",
            "signedPermission": "rwca",
            "signedProtocol": "https,http",
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"accountSasToken": "sv=2016-05-31&sig=abc%3D"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let account = account(&server, false);
    let url = account
        .sign_url(Method::PUT, "vhds", "disk.vhd", now() + chrono::TimeDelta::hours(1))
        .await
        .unwrap();
    assert_eq!(
        url,
        format!("{}/vhds/disk.vhd?sv=2016-05-31&sig=abc%3D", server.uri())
    );

    let err = account
        .sign_url(Method::HEAD, "vhds", "disk.vhd", now())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotSupported);
}

async fn mount_containers(server: &MockServer, acls: &[(&str, Option<&str>)]) {
    let names: String = acls
        .iter()
        .map(|(name, _)| format!("<Container><Name>{name}</Name></Container>"))
        .collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("comp", "list"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!("<EnumerationResults><Containers>{names}</Containers><NextMarker/></EnumerationResults>"),
            "application/xml",
        ))
        .mount(server)
        .await;
    for (name, access) in acls {
        let mut resp = ResponseTemplate::new(200);
        if let Some(access) = access {
            resp = resp.insert_header("x-ms-blob-public-access", *access);
        }
        Mock::given(method("GET"))
            .and(path(format!("/{name}")))
            .and(query_param("comp", "acl"))
            .respond_with(resp)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_account_acl_is_common_container_acl() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_keys(&server).await;
    mount_containers(&server, &[("a", Some("container")), ("b", Some("container"))]).await;

    let account = account(&server, false);
    assert_eq!(account.get_acl().await.unwrap(), ContainerAccess::Container);
}

#[tokio::test]
async fn test_account_acl_mixed_is_private() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_keys(&server).await;
    mount_containers(&server, &[("a", Some("container")), ("b", None)]).await;

    let account = account(&server, false);
    assert_eq!(account.get_acl().await.unwrap(), ContainerAccess::Private);
}

#[tokio::test]
async fn test_set_account_acl() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_keys(&server).await;
    mount_containers(&server, &[("a", None), ("b", None)]).await;
    Mock::given(method("PUT"))
        .and(query_param("restype", "container"))
        .and(query_param("comp", "acl"))
        .and(header("x-ms-blob-public-access", "container"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let account = account(&server, false);
    account.set_acl(ContainerAccess::Container).await.unwrap();
}

#[tokio::test]
async fn test_list_accounts() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/subscriptions/sub/providers/Microsoft.Storage/storageAccounts"))
        .and(query_param("api-version", "2016-12-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{
                "id": ACCOUNT_ID,
                "name": ACCOUNT,
                "location": "westeurope",
                "properties": {"primaryEndpoints": {"blob": "https://acct.blob.core.windows.net/"}},
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_arm_client(mock_config(&server));
    let accounts = StorageAccount::list(&client).await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].name(), ACCOUNT);
    assert_eq!(accounts[0].location(), "westeurope");
    assert_eq!(
        accounts[0].blob_endpoint(),
        "https://acct.blob.core.windows.net"
    );
}

#[tokio::test]
async fn test_upload_vhd_creates_container() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_keys(&server).await;
    Mock::given(method("PUT"))
        .and(path("/vhds"))
        .and(query_param("restype", "container"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/vhds/disk.vhd"))
        .and(header("x-ms-blob-type", "PageBlob"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/vhds/disk.vhd"))
        .and(query_param("comp", "page"))
        .and(header("x-ms-range", "bytes=0-1023"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let vhd = dir.path().join("disk.vhd");
    std::fs::File::create(&vhd)
        .unwrap()
        .write_all(&[7; 1024])
        .unwrap();

    let url = account(&server, false)
        .upload_vhd("vhds", &VhdUpload::new(&vhd))
        .await
        .unwrap();
    assert_eq!(url, format!("{}/vhds/disk.vhd", server.uri()));
}

#[tokio::test]
async fn test_invalid_account_name() {
    let server_uri = "http://127.0.0.1:1";
    let config = azrest_azure_arm::Config::default()
        .with_endpoints(azrest_azure_arm::Endpoints::with_base(server_uri));
    let client = mock_arm_client(config);
    let err = StorageAccount::new(client, ACCOUNT_ID, "Not_Valid", "eastus").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}
