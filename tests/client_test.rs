/// Integration tests for the transport + client façade against a mock
/// backend — bearer injection, workspace-prefix stripping, multipart
/// archive uploads, and the failure taxonomy.
use serde_json::json;
use std::sync::Arc;
use svcbuilder::client::BuilderClient;
use svcbuilder::lifecycle::datasources;
use svcbuilder::model::DataSourceDef;
use svcbuilder::session::{FileSecretStore, SessionState, Token, WorkspaceConnection};
use svcbuilder::transport::{Transport, TransportError};
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn connected_session(dir: &TempDir, builder_endpoint: &str) -> Arc<SessionState> {
    let session = SessionState::new(FileSecretStore::new(dir.path().join("secrets.json")));
    session
        .save(&WorkspaceConnection {
            name: "acme".to_string(),
            url: format!("{builder_endpoint}/ws/acme"),
            service_endpoint: builder_endpoint.to_string(),
            builder_endpoint: builder_endpoint.to_string(),
            access_key: "key-123".to_string(),
            token: Some(Token {
                token: "jwt-abc".to_string(),
                expire_at: 1_900_000_000,
            }),
        })
        .unwrap();
    Arc::new(session)
}

fn client(session: Arc<SessionState>) -> BuilderClient {
    BuilderClient::new(Transport::new(5_000).unwrap(), session)
}

// ─── Workspace flows ──────────────────────────────────────────────────────────

#[tokio::test]
async fn connect_echoes_access_key_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/builder/connect"))
        .and(body_json(json!({
            "workspaceUrl": "https://b.example/ws/acme",
            "accessKey": "key-123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "acme",
            "url": "https://b.example/ws/acme",
            "serviceEndpoint": "https://b.example",
            "builderEndpoint": "https://b.example/builder",
            "accessKey": "",
            "token": { "token": "jwt-abc", "expireAt": 1900000000u32 }
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client(connected_session(&dir, &server.uri()));
    let connection = client
        .connect(&server.uri(), "https://b.example/ws/acme", "key-123")
        .await
        .unwrap();
    assert_eq!(connection.name, "acme");
    // blank key in the response is filled from the request
    assert_eq!(connection.access_key, "key-123");
}

#[tokio::test]
async fn refresh_token_returns_new_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/builder/refreshToken"))
        .and(body_json(json!({
            "workspaceName": "acme",
            "accessKey": "key-123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "jwt-new",
            "expireAt": 2000000000u32
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client(connected_session(&dir, &server.uri()));
    let token = client
        .refresh_token(&server.uri(), "acme", "key-123")
        .await
        .unwrap();
    assert_eq!(token.token, "jwt-new");
}

// ─── Auth + path shapes ───────────────────────────────────────────────────────

#[tokio::test]
async fn inspect_calls_carry_bearer_and_strip_workspace_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        // leading workspace segment "acme" must not appear in the path
        .and(path("/inspect/service/shop/src/m1/orders"))
        .and(header("Authorization", "Bearer jwt-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "orders",
            "type": "query",
            "valid": false,
            "invalidMessage": "data source offline"
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client(connected_session(&dir, &server.uri()));
    let service = client
        .get_service("acme/shop/src/m1/orders")
        .await
        .unwrap();
    assert!(!service.valid);
    assert_eq!(service.invalid_message.as_deref(), Some("data source offline"));
}

#[tokio::test]
async fn missing_session_fails_before_any_request() {
    let dir = TempDir::new().unwrap();
    let empty = Arc::new(SessionState::new(FileSecretStore::new(
        dir.path().join("secrets.json"),
    )));
    let client = client(empty);
    let err = client.get_applications().await.unwrap_err();
    assert!(err.to_string().contains("no workspace connection"));
}

// ─── Deploy ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn deploy_posts_multipart_archive_part() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/deploy/service"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client(connected_session(&dir, &server.uri()));
    client
        .deploy_service("acme/shop/src/m1/orders", vec![1, 2, 3, 4])
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    // multipart form: scalar uri field plus the binary archive part
    assert!(body.contains("name=\"archive\""));
    assert!(body.contains("filename=\"archive.tar.gz\""));
    assert!(body.contains("name=\"uri\""));
    assert!(body.contains("shop/src/m1/orders"));
}

// ─── Failure taxonomy ─────────────────────────────────────────────────────────

#[tokio::test]
async fn http_statuses_map_to_the_fixed_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inspect/applications"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "token expired"})))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client(connected_session(&dir, &server.uri()));
    let err = client.get_applications().await.unwrap_err();
    match err.downcast_ref::<TransportError>() {
        Some(TransportError::NotAuthorized(msg)) => assert_eq!(msg, "token expired"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_a_connect_error() {
    let dir = TempDir::new().unwrap();
    // nothing listens on the discard port
    let client = client(connected_session(&dir, "http://127.0.0.1:9"));
    let err = client.get_applications().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TransportError>(),
        Some(TransportError::Connect(_))
    ));
}

// ─── Data-source masking ──────────────────────────────────────────────────────

#[tokio::test]
async fn successful_probe_masks_password_and_stores_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/test/dataSource"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"succeed": true})))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let session = connected_session(&dir, &server.uri());
    let client = client(Arc::clone(&session));

    let file = dir.path().join("main.datasource.json");
    let def = DataSourceDef {
        name: "main".into(),
        db_type: "mysql".into(),
        url: "jdbc:mysql://db:3306/shop".into(),
        username: "root".into(),
        password: "hunter2".into(),
        schema: "shop".into(),
    };
    def.save(&file).await.unwrap();

    let outcome = datasources::test(&client, &session, "acme", &file).await.unwrap();
    assert!(outcome.succeed);

    let on_disk = DataSourceDef::load(&file).await.unwrap();
    assert_eq!(on_disk.password, datasources::PASSWORD_MASK);
    assert_eq!(
        session
            .get_ds_password("acme/main.datasource.json")
            .unwrap()
            .as_deref(),
        Some("hunter2")
    );
}

#[tokio::test]
async fn failed_probe_call_leaves_password_untouched() {
    let dir = TempDir::new().unwrap();
    // network failure — nothing listens here
    let session = connected_session(&dir, "http://127.0.0.1:9");
    let client = client(Arc::clone(&session));

    let file = dir.path().join("main.datasource.json");
    let def = DataSourceDef {
        name: "main".into(),
        db_type: "mysql".into(),
        url: "jdbc:mysql://db:3306/shop".into(),
        username: "root".into(),
        password: "hunter2".into(),
        schema: "shop".into(),
    };
    def.save(&file).await.unwrap();

    assert!(datasources::test(&client, &session, "acme", &file)
        .await
        .is_err());
    let on_disk = DataSourceDef::load(&file).await.unwrap();
    assert_eq!(on_disk.password, "hunter2");
}

#[tokio::test]
async fn negative_probe_result_is_not_an_error_and_keeps_password() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/test/dataSource"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "succeed": false,
            "message": "access denied for user"
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let session = connected_session(&dir, &server.uri());
    let client = client(Arc::clone(&session));

    let file = dir.path().join("main.datasource.json");
    let def = DataSourceDef {
        name: "main".into(),
        db_type: "mysql".into(),
        url: "jdbc:mysql://db:3306/shop".into(),
        username: "root".into(),
        password: "wrong".into(),
        schema: "shop".into(),
    };
    def.save(&file).await.unwrap();

    let outcome = datasources::test(&client, &session, "acme", &file).await.unwrap();
    assert!(!outcome.succeed);
    assert_eq!(outcome.message, "access denied for user");

    let on_disk = DataSourceDef::load(&file).await.unwrap();
    assert_eq!(on_disk.password, "wrong");
}
