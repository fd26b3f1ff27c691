use azrest_azure_arm::{filter_by_location, one_of, Query};
use azrest_core::ErrorKind;
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{mock_client, mock_config, mount_token};

const DISKS: &str = "/subscriptions/sub/providers/Microsoft.Compute/disks";

#[derive(Debug, Deserialize, PartialEq)]
struct Disk {
    name: String,
    location: String,
}

#[tokio::test]
async fn test_list_follows_next_link() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path(DISKS))
        .and(query_param("api-version", "2018-06-01"))
        .and(query_param_is_missing("$skipToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"name": "a", "location": "eastus"}],
            "nextLink": format!("{}{DISKS}?api-version=2018-06-01&$skipToken=t1", server.uri()),
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DISKS))
        .and(query_param("$skipToken", "t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"name": "b", "location": "West US"}],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(mock_config(&server));
    let disks: Vec<Disk> = client
        .list("Microsoft.Compute/disks", Query::new())
        .await
        .unwrap();
    assert_eq!(
        disks,
        vec![
            Disk {
                name: "a".to_string(),
                location: "eastus".to_string()
            },
            Disk {
                name: "b".to_string(),
                location: "West US".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn test_list_stops_on_repeated_skip_token() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let next_link = format!("{}{DISKS}?$skiptoken=same", server.uri());
    Mock::given(method("GET"))
        .and(path(DISKS))
        .and(query_param_is_missing("$skiptoken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"name": "a"}],
            "nextLink": next_link,
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DISKS))
        .and(query_param("$skiptoken", "same"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"name": "b"}],
            "nextLink": next_link,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(mock_config(&server));
    let items = client
        .list_all("Microsoft.Compute/disks", Query::new())
        .await
        .unwrap();
    assert_eq!(items, vec![json!({"name": "a"}), json!({"name": "b"})]);
}

#[tokio::test]
async fn test_list_in_location() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path(DISKS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {"name": "a", "location": "eastus"},
                {"name": "b", "location": " EastUS "},
                {"name": "c", "location": "westus"},
            ],
        })))
        .mount(&server)
        .await;

    let client = mock_client(mock_config(&server));
    let disks: Vec<Disk> = client
        .list_in_location("Microsoft.Compute/disks", "eastus", Query::new())
        .await
        .unwrap();
    let names: Vec<_> = disks.into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[tokio::test]
async fn test_list_front_door_policies_per_resource_group() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path(
            "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Network/frontdoorWebApplicationFirewallPolicies",
        ))
        .and(query_param("api-version", "2020-11-01"))
        .and(query_param_is_missing("resourceGroups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": [{"name": "waf"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(mock_config(&server));
    let items = client
        .list_all(
            "Microsoft.Network/frontdoorWebApplicationFirewallPolicies",
            Query::from([("resourceGroups", "rg")]),
        )
        .await
        .unwrap();
    assert_eq!(items, vec![json!({"name": "waf"})]);

    let err = client
        .list_all(
            "Microsoft.Network/frontdoorWebApplicationFirewallPolicies",
            Query::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_filter_and_pick_one() {
    let items = vec![
        json!({"name": "a", "location": "eastus"}),
        json!({"name": "b"}),
    ];
    let found: Vec<Value> = filter_by_location(items, "EASTUS");
    assert_eq!(one_of(found, "disk").unwrap()["name"], "a");

    let err = one_of(Vec::<Value>::new(), "disk").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = one_of(vec![1, 2], "disk").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Duplicate);
}
