//! Common test utilities for staleguard-connector-entra integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use staleguard_connector_entra::{EntraConfig, EntraConnector, EntraCredentials, GraphClient};

pub const TENANT: &str = "test-tenant";

/// Test data factory for creating Entra devices.
pub fn create_test_device(id: &str, name: &str, last_sign_in: Option<&str>) -> Value {
    json!({
        "id": id,
        "displayName": name,
        "approximateLastSignInDateTime": last_sign_in
    })
}

/// Wraps items in an OData response format.
pub fn create_odata_response(items: Vec<Value>, next_link: Option<&str>) -> Value {
    let mut response = json!({ "value": items });
    if let Some(link) = next_link {
        response["@odata.nextLink"] = json!(link);
    }
    response
}

/// Creates an OData error response.
pub fn create_odata_error(code: &str, message: &str) -> Value {
    json!({
        "error": {
            "code": code,
            "message": message
        }
    })
}

/// Creates a mock OAuth token response.
pub fn create_token_response(access_token: &str, expires_in: u64) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": expires_in
    })
}

/// Mounts a successful token endpoint.
pub async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("/{}/oauth2/v2.0/token", TENANT)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(create_token_response("test-token", 3600)),
        )
        .mount(server)
        .await;
}

/// Connector pointed at `server` for both login and Graph, with fast retries.
pub fn connector_for(server: &MockServer, page_size: u32) -> EntraConnector {
    let config = EntraConfig::builder()
        .tenant_id(TENANT)
        .page_size(page_size)
        .max_retries(3)
        .login_endpoint(server.uri())
        .graph_endpoint(server.uri())
        .build()
        .expect("valid config");

    let connector = EntraConnector::new(
        config,
        EntraCredentials {
            client_id: "client".to_string(),
            client_secret: "secret".to_string().into(),
        },
    )
    .expect("connector");

    let graph = GraphClient::new(connector.token_cache().clone(), connector.config())
        .expect("graph client")
        .with_initial_backoff(Duration::from_millis(10));
    connector.with_graph_client(graph)
}
