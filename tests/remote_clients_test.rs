use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{post, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use todo_app::auth::{IdentityGate, Session, SessionCredentials};
use todo_app::error::AppError;
use todo_app::graphql::{CreateTodoInput, DataService, GraphqlAuth, GraphqlConfig, GraphqlHttpClient};
use todo_app::storage::{BlobStore, HttpBlobStore, StorageConfig};

#[derive(Clone, Default)]
struct Captured {
    requests: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{}", addr)
}

async fn fake_graphql(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let query = body["query"].as_str().unwrap_or_default().to_string();
    captured.requests.lock().await.push((headers, body.clone()));

    let response = if query.contains("listTodos") {
        json!({ "data": { "listTodos": { "items": [
            { "id": "1", "name": "Buy milk", "description": "2% milk", "image": "key1" },
            null,
            { "id": "2", "name": "Walk dog", "description": "around the block", "image": null }
        ], "nextToken": null } } })
    } else if query.contains("createTodo") {
        let input = &body["variables"]["input"];
        json!({ "data": { "createTodo": {
            "id": "new-1",
            "name": input["name"],
            "description": input["description"],
            "image": input.get("image").cloned().unwrap_or(Value::Null)
        } } })
    } else if query.contains("deleteTodo") {
        let id = body["variables"]["input"]["id"].as_str().unwrap_or_default();
        if id == "missing" {
            json!({ "data": { "deleteTodo": null }, "errors": [
                { "message": "The conditional request failed", "errorType": "DynamoDB:ConditionalCheckFailedException" }
            ] })
        } else {
            json!({ "data": { "deleteTodo": { "id": id } } })
        }
    } else {
        json!({ "errors": [{ "message": "unknown operation" }] })
    };
    Json(response)
}

async fn graphql_client(auth: GraphqlAuth) -> (GraphqlHttpClient, Captured) {
    graphql_client_with(auth, SessionCredentials::default()).await
}

async fn graphql_client_with(
    auth: GraphqlAuth,
    credentials: SessionCredentials,
) -> (GraphqlHttpClient, Captured) {
    let captured = Captured::default();
    let router = Router::new()
        .route("/graphql", post(fake_graphql))
        .with_state(captured.clone());
    let base = spawn(router).await;
    let client = GraphqlHttpClient::new(GraphqlConfig { endpoint: format!("{}/graphql", base), auth }, credentials)
        .expect("client");
    (client, captured)
}

#[tokio::test]
async fn list_todos_maps_records_and_skips_null_items() {
    let (client, captured) = graphql_client(GraphqlAuth::ApiKey("da2-test".to_string())).await;

    let todos = client.list_todos().await.expect("list");

    assert_eq!(todos.len(), 2);
    assert_eq!(todos[0].id.as_deref(), Some("1"));
    assert_eq!(todos[0].image_key.as_deref(), Some("key1"));
    assert_eq!(todos[0].image_url, None);
    assert_eq!(todos[1].image_key, None);

    let requests = captured.requests.lock().await;
    let (headers, body) = &requests[0];
    assert_eq!(headers.get("x-api-key").and_then(|v| v.to_str().ok()), Some("da2-test"));
    assert!(headers.get("authorization").is_none());
    assert!(body.get("variables").is_none());
}

#[tokio::test]
async fn create_todo_sends_input_variables_with_user_pool_token() {
    let credentials = SessionCredentials::new(Some("id-token".to_string()));
    let (client, captured) = graphql_client_with(GraphqlAuth::UserPool, credentials).await;
    let input = CreateTodoInput {
        name: "Buy milk".to_string(),
        description: "2% milk, 1 gal".to_string(),
        image: None,
    };

    let echo = client.create_todo(&input).await.expect("create");

    assert_eq!(echo.id.as_deref(), Some("new-1"));
    assert_eq!(echo.name, "Buy milk");

    let requests = captured.requests.lock().await;
    let (headers, body) = &requests[0];
    assert_eq!(headers.get("authorization").and_then(|v| v.to_str().ok()), Some("id-token"));
    assert_eq!(
        body["variables"]["input"],
        json!({ "name": "Buy milk", "description": "2% milk, 1 gal" })
    );
}

#[tokio::test]
async fn user_pool_mode_without_session_sends_nothing() {
    let (client, captured) = graphql_client(GraphqlAuth::UserPool).await;

    let err = client.list_todos().await.expect_err("no session");

    assert!(matches!(err, AppError::Unauthorized));
    assert!(captured.requests.lock().await.is_empty());
}

#[tokio::test]
async fn delete_todo_surfaces_graphql_errors() {
    let (client, captured) = graphql_client(GraphqlAuth::None).await;

    client.delete_todo("abc123").await.expect("delete");
    let err = client.delete_todo("missing").await.expect_err("should fail");

    match err {
        AppError::GraphQl(msg) => assert!(msg.contains("ConditionalCheckFailedException")),
        other => panic!("unexpected error: {:?}", other),
    }
    let requests = captured.requests.lock().await;
    assert_eq!(requests[0].1["variables"]["input"], json!({ "id": "abc123" }));
}

#[tokio::test]
async fn non_success_status_is_a_remote_error() {
    let router = Router::new().route(
        "/graphql",
        post(|| async { (StatusCode::UNAUTHORIZED, "UnauthorizedException") }),
    );
    let base = spawn(router).await;
    let client = GraphqlHttpClient::new(
        GraphqlConfig { endpoint: format!("{}/graphql", base), auth: GraphqlAuth::None },
        SessionCredentials::default(),
    )
    .expect("client");

    let err = client.list_todos().await.expect_err("should fail");
    assert!(matches!(err, AppError::Remote(msg) if msg.contains("401")));
}

#[derive(Clone, Default)]
struct Bucket {
    puts: Arc<Mutex<Vec<(String, Option<String>, Vec<u8>)>>>,
    authorizations: Arc<Mutex<Vec<Option<String>>>>,
}

async fn store_object(
    State(bucket): State<Bucket>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    bucket.authorizations.lock().await.push(authorization);
    bucket.puts.lock().await.push((key, content_type, body.to_vec()));
    StatusCode::OK
}

async fn object_exists(Path(key): Path<String>) -> StatusCode {
    if key == "photo.png" { StatusCode::OK } else { StatusCode::NOT_FOUND }
}

async fn blob_store(verify_keys: bool) -> (HttpBlobStore, Bucket, String) {
    blob_store_with(verify_keys, SessionCredentials::default()).await
}

async fn blob_store_with(verify_keys: bool, credentials: SessionCredentials) -> (HttpBlobStore, Bucket, String) {
    let bucket = Bucket::default();
    let router = Router::new()
        .route("/bucket/public/{key}", put(store_object).head(object_exists))
        .with_state(bucket.clone());
    let base = spawn(router).await;

    let mut config = StorageConfig::new(&format!("{}/bucket", base)).expect("config");
    config.verify_keys = verify_keys;
    (HttpBlobStore::new(config, credentials).expect("store"), bucket, base)
}

#[tokio::test]
async fn put_uploads_raw_bytes_under_key() {
    let (store, bucket, _base) = blob_store(false).await;

    store.put("photo.png", b"\x89PNG".to_vec(), Some("image/png")).await.expect("put");
    store.put("notes.bin", vec![0, 1], None).await.expect("put");

    let puts = bucket.puts.lock().await;
    assert_eq!(puts[0], ("photo.png".to_string(), Some("image/png".to_string()), b"\x89PNG".to_vec()));
    assert_eq!(puts[1].1.as_deref(), Some("binary/octet-stream"));
}

#[tokio::test]
async fn put_carries_current_session_token() {
    let gate = IdentityGate::new(None);
    let (store, bucket, _base) = blob_store_with(false, gate.credentials()).await;

    store.put("anonymous.png", vec![1], None).await.expect("put");
    gate.sign_in(Session { username: "bob".to_string(), id_token: "bob-token".to_string() })
        .await
        .expect("sign in");
    store.put("bob.png", vec![2], None).await.expect("put");

    assert_eq!(
        *bucket.authorizations.lock().await,
        vec![None, Some("Bearer bob-token".to_string())]
    );
}

#[tokio::test]
async fn get_url_verifies_keys_when_enabled() {
    let (store, _bucket, base) = blob_store(true).await;

    let url = store.get_url("photo.png").await.expect("url");
    assert_eq!(url, format!("{}/bucket/public/photo.png", base));

    let err = store.get_url("gone.png").await.expect_err("missing");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn get_url_without_verification_does_no_io() {
    let config = StorageConfig::new("http://127.0.0.1:9/bucket").expect("config");
    let store = HttpBlobStore::new(config, SessionCredentials::default()).expect("store");

    let url = store.get_url("anything.png").await.expect("url");
    assert_eq!(url, "http://127.0.0.1:9/bucket/public/anything.png");
}
