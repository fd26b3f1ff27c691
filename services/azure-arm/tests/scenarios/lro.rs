use azrest_azure_arm::Config;
use azrest_core::ErrorKind;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{mock_client, mock_config, mount_token};

const VM: &str = "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/vm";
const OPERATION: &str = "/subscriptions/sub/providers/Microsoft.Compute/locations/eastus/operations/op";

async fn mount_accepted_put(server: &MockServer, body: Value) {
    Mock::given(method("PUT"))
        .and(path(VM))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header(
                    "Azure-AsyncOperation",
                    format!("{}{OPERATION}", server.uri()).as_str(),
                )
                .set_body_json(body),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_create_polls_until_succeeded() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_accepted_put(&server, json!({})).await;
    Mock::given(method("GET"))
        .and(path(OPERATION))
        .and(query_param("api-version", "2021-11-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "InProgress"})))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(OPERATION))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Succeeded",
            "properties": {"output": {"id": VM, "name": "vm"}},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(mock_config(&server));
    let vm = client.put(VM, &json!({"location": "eastus"})).await.unwrap();
    assert_eq!(vm, json!({"id": VM, "name": "vm"}));
}

#[tokio::test]
async fn test_succeeded_without_output_returns_original_body() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_accepted_put(&server, json!({"name": "vm", "properties": {}})).await;
    Mock::given(method("GET"))
        .and(path(OPERATION))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})))
        .mount(&server)
        .await;

    let client = mock_client(mock_config(&server));
    let vm = client.put(VM, &json!({})).await.unwrap();
    assert_eq!(vm, json!({"name": "vm", "properties": {}}));
}

#[tokio::test]
async fn test_failed_operation() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_accepted_put(&server, json!({})).await;
    Mock::given(method("GET"))
        .and(path(OPERATION))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Failed",
            "error": {"code": "AllocationFailed", "message": "no capacity"},
        })))
        .mount(&server)
        .await;

    let client = mock_client(mock_config(&server));
    let err = client.put(VM, &json!({})).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OperationFailed);
    assert_eq!(err.code(), Some("AllocationFailed"));
}

#[tokio::test]
async fn test_os_provisioning_timeout_is_success() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_accepted_put(&server, json!({})).await;
    Mock::given(method("GET"))
        .and(path(OPERATION))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Failed",
            "error": {"code": "OSProvisioningTimedOut", "message": "slow guest"},
        })))
        .mount(&server)
        .await;

    let client = mock_client(mock_config(&server));
    let body = client.put(VM, &json!({})).await.unwrap();
    assert_eq!(body["status"], "Failed");
}

#[tokio::test]
async fn test_body_with_id_is_not_polled() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_accepted_put(&server, json!({"id": VM})).await;
    Mock::given(method("GET"))
        .and(path(OPERATION))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = mock_client(mock_config(&server));
    let vm = client.put(VM, &json!({})).await.unwrap();
    assert_eq!(vm, json!({"id": VM}));
}

#[tokio::test]
async fn test_accepted_polls_follow_location() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("DELETE"))
        .and(path(VM))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Location", format!("{}/poll/1", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/poll/1"))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Location", format!("{}/poll/2", server.uri()).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/poll/2"))
        .and(query_param("api-version", "2021-11-01"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(mock_config(&server));
    client.delete(VM).await.unwrap();
}

#[tokio::test]
async fn test_throttled_poll_is_retried() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_accepted_put(&server, json!({})).await;
    Mock::given(method("GET"))
        .and(path(OPERATION))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(OPERATION))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Succeeded",
            "properties": {"output": {"ok": true}},
        })))
        .mount(&server)
        .await;

    let client = mock_client(mock_config(&server));
    assert_eq!(client.put(VM, &json!({})).await.unwrap(), json!({"ok": true}));
}

#[tokio::test]
async fn test_poll_timeout() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_accepted_put(&server, json!({})).await;
    Mock::given(method("GET"))
        .and(path(OPERATION))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "InProgress"})))
        .mount(&server)
        .await;

    let config: Config = mock_config(&server)
        .with_lro_polling(Duration::from_millis(10), Duration::from_millis(100));
    let client = mock_client(config);
    let err = client.put(VM, &json!({})).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}
