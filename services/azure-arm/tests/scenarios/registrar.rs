use azrest_core::ErrorKind;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{mock_client, mock_config, mount_token};

const VNET: &str = "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/vnet";

fn providers(state: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "value": [
            {"id": "/subscriptions/sub/providers/Microsoft.Compute", "namespace": "Microsoft.Compute", "registrationState": "Registered"},
            {"id": "/subscriptions/sub/providers/Microsoft.Network", "namespace": "Microsoft.Network", "registrationState": state},
        ]
    }))
}

async fn mount_registration(server: &MockServer, namespace: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/subscriptions/sub/providers/{namespace}/register")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"namespace": namespace})))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/subscriptions/sub/providers"))
        .respond_with(providers("Registering"))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/subscriptions/sub/providers"))
        .respond_with(providers("Registered"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_register_on_subscription_not_registered() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_registration(&server, "Microsoft.Network").await;
    Mock::given(method("PUT"))
        .and(path(VNET))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {"code": "SubscriptionNotRegistered", "message": "register Microsoft.Network"}
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(VNET))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": VNET})))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(mock_config(&server));
    let vnet = client.put(VNET, &json!({"location": "eastus"})).await.unwrap();
    assert_eq!(vnet, json!({"id": VNET}));
}

#[tokio::test]
async fn test_register_missing_registration_targets() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_registration(&server, "Microsoft.Network").await;
    Mock::given(method("PUT"))
        .and(path(VNET))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {
                "code": "MissingSubscriptionRegistration",
                "message": "The subscription is not registered.",
                "details": [{"code": "MissingSubscriptionRegistration", "target": "Microsoft.Network", "message": ""}],
            }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(VNET))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": VNET})))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(mock_config(&server));
    client.put(VNET, &json!({})).await.unwrap();
}

#[tokio::test]
async fn test_registration_retried_once() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_registration(&server, "Microsoft.Network").await;
    Mock::given(method("PUT"))
        .and(path(VNET))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {"code": "SubscriptionNotRegistered", "message": "still not registered"}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = mock_client(mock_config(&server));
    let err = client.put(VNET, &json!({})).await.unwrap_err();
    assert_eq!(err.code(), Some("SubscriptionNotRegistered"));
}

#[tokio::test]
async fn test_list_services() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/subscriptions/sub/providers"))
        .respond_with(providers("NotRegistered"))
        .mount(&server)
        .await;

    let client = mock_client(mock_config(&server));
    let services = client.list_services().await.unwrap();
    assert_eq!(services.len(), 2);
    assert_eq!(services[1].namespace, "Microsoft.Network");
    assert_eq!(services[1].registration_state, "NotRegistered");
}

#[tokio::test]
async fn test_register_timeout() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/subscriptions/sub/providers/Microsoft.Network/register"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/subscriptions/sub/providers"))
        .respond_with(providers("Registering"))
        .mount(&server)
        .await;

    let config = mock_config(&server).with_register_polling(
        std::time::Duration::from_millis(10),
        std::time::Duration::from_millis(50),
    );
    let client = mock_client(config);
    let err = client.register_service("Microsoft.Network").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn test_register_request_is_not_retried() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/subscriptions/sub/providers/Microsoft.Network/register"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {"code": "SubscriptionNotRegistered", "message": "not registered"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/subscriptions/sub/providers"))
        .respond_with(providers("NotRegistered"))
        .expect(0)
        .mount(&server)
        .await;

    let client = mock_client(mock_config(&server));
    let err = client.register_service("Microsoft.Network").await.unwrap_err();
    assert_eq!(err.code(), Some("SubscriptionNotRegistered"));
}
