/// Integration tests for the devtime cache — wholesale snapshot refresh
/// and the clean cascade, against a mock inspection API.
use serde_json::json;
use std::sync::Arc;
use svcbuilder::client::BuilderClient;
use svcbuilder::devtime::DevtimeCache;
use svcbuilder::session::{FileSecretStore, SessionState, Token, WorkspaceConnection};
use svcbuilder::transport::Transport;
use svcbuilder::tree::devtime::{children, service_validity, DevtimeNode};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(dir: &TempDir, endpoint: &str) -> BuilderClient {
    let session = SessionState::new(FileSecretStore::new(dir.path().join("secrets.json")));
    session
        .save(&WorkspaceConnection {
            name: "acme".to_string(),
            url: format!("{endpoint}/ws/acme"),
            service_endpoint: endpoint.to_string(),
            builder_endpoint: endpoint.to_string(),
            access_key: "key".to_string(),
            token: Some(Token {
                token: "jwt".to_string(),
                expire_at: 1_900_000_000,
            }),
        })
        .unwrap();
    BuilderClient::new(Transport::new(5_000).unwrap(), Arc::new(session))
}

async fn mock_inspection(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/inspect/dataSources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "main", "dbType": "mysql", "url": "jdbc:mysql://db/shop" }
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/inspect/applications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "name": "shop" }])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/inspect/application/shop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "shop",
            "dataSource": "main",
            "modules": [{
                "name": "m1",
                "services": [
                    { "name": "orders", "type": "query", "valid": true,
                      "tests": [{ "name": "smoke" }] },
                    { "name": "legacy", "type": "sql", "valid": false,
                      "invalidMessage": "missing binding" }
                ]
            }]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn refresh_builds_the_deployed_state_view() {
    let server = MockServer::start().await;
    mock_inspection(&server).await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&dir, &server.uri());
    let cache = DevtimeCache::new(dir.path().join("devtime"));
    cache.refresh_all(&client).await.unwrap();

    let root_children = children(cache.root(), &DevtimeNode::Root).await.unwrap();
    assert_eq!(root_children.len(), 2);

    let sources = children(cache.root(), &DevtimeNode::DataSources)
        .await
        .unwrap();
    assert_eq!(sources.len(), 1);

    let apps = children(cache.root(), &DevtimeNode::Applications)
        .await
        .unwrap();
    let DevtimeNode::Application(app) = &apps[0] else {
        panic!("expected application node");
    };
    assert_eq!(app.name, "shop");

    let modules = children(cache.root(), &apps[0]).await.unwrap();
    let services = children(cache.root(), &modules[0]).await.unwrap();
    assert_eq!(services.len(), 2);

    // validity tags survive the snapshot round trip
    let DevtimeNode::Service { service, .. } = &services[1] else {
        panic!("expected service node");
    };
    let validity = service_validity(service);
    assert!(!validity.valid);
    assert_eq!(validity.reason.as_deref(), Some("missing binding"));

    let tests = children(cache.root(), &services[0]).await.unwrap();
    assert_eq!(tests.len(), 1);
}

#[tokio::test]
async fn clean_application_cascades_to_the_local_mirror() {
    let server = MockServer::start().await;
    mock_inspection(&server).await;
    Mock::given(method("POST"))
        .and(path("/inspect/cleanApplication"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&dir, &server.uri());
    let cache = DevtimeCache::new(dir.path().join("devtime"));
    cache.refresh_all(&client).await.unwrap();

    let snapshot = cache.root().join("applications/shop.json");
    assert!(snapshot.exists());

    cache.clean_application(&client, "acme/shop").await.unwrap();
    assert!(!snapshot.exists());
}

#[tokio::test]
async fn failed_clean_keeps_the_local_mirror() {
    let server = MockServer::start().await;
    mock_inspection(&server).await;
    Mock::given(method("POST"))
        .and(path("/inspect/cleanApplication"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "busy"})))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&dir, &server.uri());
    let cache = DevtimeCache::new(dir.path().join("devtime"));
    cache.refresh_all(&client).await.unwrap();

    let snapshot = cache.root().join("applications/shop.json");
    assert!(cache.clean_application(&client, "acme/shop").await.is_err());
    // the mirror delete only cascades after the backend accepted the clean
    assert!(snapshot.exists());
}
