mod common;

use std::net::SocketAddr;
use std::time::Duration;

use gateway_api::proxy::table::RouteTable;
use gateway_api::AppState;

async fn start_gateway() -> (SocketAddr, AppState) {
    let (verifier, _hits) = common::mock_verifier();
    let verify_addr = common::spawn(verifier).await;
    let config = common::test_config(&format!("http://{verify_addr}/verify"));
    common::start_gateway(config, RouteTable::empty()).await
}

#[tokio::test]
async fn management_surface_requires_a_valid_principal() {
    let (gateway, _state) = start_gateway().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("http://{gateway}/internal/connections/stats"))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(body["message"], "Unauthorized Token");

    let resp = client
        .get(format!("http://{gateway}/internal/connections/stats"))
        .bearer_auth("wrong-token")
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn stats_reflect_connected_sessions() {
    let (gateway, _state) = start_gateway().await;
    let token = common::mint_session_token("u7", "admin", 300);
    let mut ws = common::connect_realtime(gateway, &token).await;
    common::next_event(&mut ws).await; // connected

    let client = reqwest::Client::new();
    let body: serde_json::Value = client
        .get(format!("http://{gateway}/internal/connections/stats"))
        .bearer_auth(common::TEST_TOKEN)
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["totalConnections"], 1);
    assert_eq!(body["data"]["authenticatedUsers"], 1);
    assert_eq!(body["data"]["onlineUserIds"][0], "u7");
}

#[tokio::test]
async fn user_online_endpoint_tracks_connect_and_disconnect() {
    let (gateway, state) = start_gateway().await;
    let client = reqwest::Client::new();
    let url = format!("http://{gateway}/internal/connections/u7/online");

    let body: serde_json::Value = client
        .get(&url)
        .bearer_auth(common::TEST_TOKEN)
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["online"], false);

    let token = common::mint_session_token("u7", "customer", 300);
    let mut ws = common::connect_realtime(gateway, &token).await;
    common::next_event(&mut ws).await;

    let body: serde_json::Value = client
        .get(&url)
        .bearer_auth(common::TEST_TOKEN)
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["online"], true);

    drop(ws);
    let hub = state.hub.clone();
    assert!(common::wait_until(|| !hub.is_user_online("u7"), Duration::from_secs(3)).await);

    let body: serde_json::Value = client
        .get(&url)
        .bearer_auth(common::TEST_TOKEN)
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["online"], false);
}

#[tokio::test]
async fn system_broadcast_delivers_to_connected_clients() {
    let (gateway, _state) = start_gateway().await;
    let token = common::mint_session_token("u1", "customer", 300);
    let mut ws = common::connect_realtime(gateway, &token).await;
    common::next_event(&mut ws).await;

    let client = reqwest::Client::new();
    let body: serde_json::Value = client
        .post(format!("http://{gateway}/internal/broadcast"))
        .bearer_auth(common::TEST_TOKEN)
        .json(&serde_json::json!({
            "target": "system",
            "payload": { "message": "deploy at 18:00" }
        }))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["success"], true);

    let event = common::next_event(&mut ws).await;
    assert_eq!(event["type"], "system_notification");
    assert_eq!(event["data"]["message"], "deploy at 18:00");
}

#[tokio::test]
async fn role_broadcast_without_role_reports_validation_failure() {
    let (gateway, _state) = start_gateway().await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{gateway}/internal/broadcast"))
        .bearer_auth(common::TEST_TOKEN)
        .json(&serde_json::json!({ "target": "role", "payload": {} }))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("role"));
}

#[tokio::test]
async fn order_created_notifies_the_owner_session() {
    let (gateway, _state) = start_gateway().await;
    let token = common::mint_session_token("u7", "customer", 300);
    let mut ws = common::connect_realtime(gateway, &token).await;
    common::next_event(&mut ws).await;

    let client = reqwest::Client::new();
    let body: serde_json::Value = client
        .post(format!("http://{gateway}/internal/notifications/order-created"))
        .bearer_auth(common::TEST_TOKEN)
        .json(&serde_json::json!({
            "aliasId": "ORD-900",
            "userId": "u7",
            "status": "Created"
        }))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["success"], true);

    let event = common::next_event(&mut ws).await;
    assert_eq!(event["type"], "order_update");
    assert_eq!(event["data"]["aliasId"], "ORD-900");

    let event = common::next_event(&mut ws).await;
    assert_eq!(event["type"], "user_notification");
    assert!(event["data"]["message"].as_str().unwrap().contains("ORD-900"));
}

#[tokio::test]
async fn inventory_endpoint_translates_and_alerts_admins() {
    let (gateway, _state) = start_gateway().await;
    let mut admin =
        common::connect_realtime(gateway, &common::mint_session_token("u9", "admin", 300)).await;
    common::next_event(&mut admin).await;

    let client = reqwest::Client::new();
    let body: serde_json::Value = client
        .post(format!("http://{gateway}/internal/notifications/inventory"))
        .bearer_auth(common::TEST_TOKEN)
        .json(&serde_json::json!({
            "productId": "p1",
            "name": "Widget",
            "status": "low_stock",
            "quantity": 2
        }))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["success"], true);

    let event = common::next_event(&mut admin).await;
    assert_eq!(event["type"], "inventory_alert");
    let event = common::next_event(&mut admin).await;
    assert_eq!(event["type"], "role_notification");
    assert!(event["data"]["message"].as_str().unwrap().contains("Widget"));
}
