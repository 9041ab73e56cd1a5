use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use parley::{InMemoryPersistenceClient, PersistenceClient};
use parley_api::{app::build_router, config::Config, middleware::auth::Claims, state::AppState};

const SECRET: &str = "integration_secret";

const CONFIG: &str = r#"
    [server]
    host = "127.0.0.1"
    port = 0

    [cors]
    enabled = false
    origins = []

    [storage]
    backend = "memory"

    [mongodb]
    database = "unused"

    [logging]
    level = "debug"
    format = "pretty"

    [auth]
    enabled = true

    [pagination]
    default_limit = 20
    max_limit = 100
"#;

struct TestApp {
    router: Router,
    store: Arc<InMemoryPersistenceClient>,
    token: String,
}

async fn setup() -> TestApp {
    let mut config: Config = toml::from_str(CONFIG).unwrap();
    config.auth.jwt_secret = SECRET.to_string();

    let store = Arc::new(InMemoryPersistenceClient::new());
    for name in ["alice", "bob", "carol"] {
        store.create_user(name).await.unwrap();
    }

    let state = Arc::new(AppState::new(config, store.clone()));
    TestApp {
        router: build_router(state),
        store,
        token: token_for(1),
    }
}

fn token_for(user_id: i64) -> String {
    let claims = Claims {
        user_id,
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp(),
        token_type: Some("access".to_string()),
        jti: None,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

impl TestApp {
    async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.call_with_token(method, uri, body, Some(&self.token)).await
    }

    async fn call_with_token(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

#[tokio::test]
async fn test_conversation_flow() {
    let app = setup().await;

    let (status, thread) = app
        .call(Method::POST, "/threads/", Some(json!({"participants": [1, 2]})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(thread["participants"], json!([1, 2]));
    let thread_id = thread["id"].as_i64().unwrap();

    let (status, again) = app
        .call(Method::POST, "/threads/", Some(json!({"participants": ["2", 1]})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["id"].as_i64(), Some(thread_id));

    let (status, message) = app
        .call(
            Method::POST,
            "/messages/",
            Some(json!({"sender": 1, "thread": thread_id, "text": "hello"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(message["is_read"], json!(false));
    assert_eq!(message["text"], json!("hello"));
    let message_id = message["id"].as_i64().unwrap();

    let (status, unread) = app
        .call(Method::GET, "/messages/unread-count/?user_id=2", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unread["unread_count"], json!(1));

    let (status, read) = app
        .call(Method::PATCH, &format!("/messages/{}/mark-as-read/", message_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["is_read"], json!(true));

    let (_, unread) = app
        .call(Method::GET, "/messages/unread-count/?user_id=2", None)
        .await;
    assert_eq!(unread["unread_count"], json!(0));
}

#[tokio::test]
async fn test_three_participants_rejected_and_nothing_persisted() {
    let app = setup().await;

    let (status, body) = app
        .call(Method::POST, "/threads/", Some(json!({"participants": [1, 2, 3]})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("exactly 2"));

    let page = app
        .store
        .list_threads_for_user(1, parley::PageRequest::new(20, 0))
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_non_integer_participant_rejected() {
    let app = setup().await;

    let (status, body) = app
        .call(Method::POST, "/threads/", Some(json!({"participants": [1, "bob"]})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Invalid participant ID: bob"));
}

#[tokio::test]
async fn test_unknown_participant_is_not_found() {
    let app = setup().await;

    let (status, _) = app
        .call(Method::POST, "/threads/", Some(json!({"participants": [1, 99]})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_overlong_text_rejected() {
    let app = setup().await;
    let (_, thread) = app
        .call(Method::POST, "/threads/", Some(json!({"participants": [1, 2]})))
        .await;

    let text = "x".repeat(1025);
    let (status, _) = app
        .call(
            Method::POST,
            "/messages/",
            Some(json!({"sender": 1, "thread": thread["id"], "text": text})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, page) = app
        .call(
            Method::GET,
            &format!("/messages/thread/{}/messages/", thread["id"]),
            None,
        )
        .await;
    assert_eq!(page["total"], json!(0));
}

#[tokio::test]
async fn test_missing_message_fields_rejected() {
    let app = setup().await;

    let (status, body) = app
        .call(Method::POST, "/messages/", Some(json!({"sender": 1, "text": "hi"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("thread is required."));
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let app = setup().await;

    let (status, _) = app
        .call_with_token(Method::GET, "/threads/list_for_user/?user_id=1", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call_with_token(
            Method::GET,
            "/threads/list_for_user/?user_id=1",
            None,
            Some("not-a-jwt"),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = setup().await;

    let (status, body) = app.call_with_token(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["services"]["storage"], json!("connected"));
}

#[tokio::test]
async fn test_user_id_query_validation() {
    let app = setup().await;

    let (status, body) = app
        .call(Method::GET, "/threads/list_for_user/", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("user_id is required."));

    let (status, body) = app
        .call(Method::GET, "/messages/unread-count/?user_id=abc", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("user_id must be an integer."));

    let (status, _) = app
        .call(Method::GET, "/threads/list_for_user/?user_id=42", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_message_pagination() {
    let app = setup().await;
    let (_, thread) = app
        .call(Method::POST, "/threads/", Some(json!({"participants": [1, 2]})))
        .await;

    for i in 0..5 {
        let (status, _) = app
            .call(
                Method::POST,
                "/messages/",
                Some(json!({"sender": 2, "thread": thread["id"], "text": format!("m{}", i)})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, page) = app
        .call(
            Method::GET,
            &format!("/messages/thread/{}/messages/?limit=2&offset=1", thread["id"]),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], json!(5));
    assert_eq!(page["limit"], json!(2));
    assert_eq!(page["offset"], json!(1));
    let texts: Vec<&str> = page["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["m1", "m2"]);
}

#[tokio::test]
async fn test_trailing_slash_is_optional() {
    let app = setup().await;
    app.call(Method::POST, "/threads", Some(json!({"participants": [1, 2]})))
        .await;

    let (with_slash, a) = app
        .call(Method::GET, "/threads/list_for_user/?user_id=1", None)
        .await;
    let (without_slash, b) = app
        .call(Method::GET, "/threads/list_for_user?user_id=1", None)
        .await;
    assert_eq!(with_slash, StatusCode::OK);
    assert_eq!(without_slash, StatusCode::OK);
    assert_eq!(a, b);
    assert_eq!(a["total"], json!(1));
}

#[tokio::test]
async fn test_update_and_delete_thread() {
    let app = setup().await;
    let (_, thread) = app
        .call(Method::POST, "/threads/", Some(json!({"participants": [1, 2]})))
        .await;
    let uri = format!("/threads/{}/", thread["id"]);

    let (status, _) = app
        .call(Method::PATCH, &uri, Some(json!({"participants": [1, 2, 3]})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = app
        .call(Method::PATCH, &uri, Some(json!({"participants": [1, 3]})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["participants"], json!([1, 3]));

    let (status, _) = app.call(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.call(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mark_as_read_unknown_message() {
    let app = setup().await;

    let (status, _) = app
        .call(Method::PATCH, "/messages/999/mark-as-read/", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_message_with_unknown_references_is_bad_request() {
    let app = setup().await;
    let (_, thread) = app
        .call(Method::POST, "/threads/", Some(json!({"participants": [1, 2]})))
        .await;

    let (status, body) = app
        .call(
            Method::POST,
            "/messages/",
            Some(json!({"sender": 99, "thread": thread["id"], "text": "hi"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("User 99 not found."));

    let (status, body) = app
        .call(
            Method::POST,
            "/messages/",
            Some(json!({"sender": 1, "thread": 99, "text": "hi"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Thread 99 not found."));
}

#[tokio::test]
async fn test_list_all_threads_and_messages() {
    let app = setup().await;
    let (_, ab) = app
        .call(Method::POST, "/threads/", Some(json!({"participants": [1, 2]})))
        .await;
    for text in ["one", "two", "three"] {
        app.call(
            Method::POST,
            "/messages/",
            Some(json!({"sender": 1, "thread": ab["id"], "text": text})),
        )
        .await;
    }

    let (status, threads) = app.call(Method::GET, "/threads/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(threads["total"], json!(1));
    assert_eq!(threads["results"][0]["id"], ab["id"]);

    let (status, messages) = app
        .call(Method::GET, "/messages?limit=1&offset=2", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(messages["total"], json!(3));
    assert_eq!(messages["results"].as_array().unwrap().len(), 1);
    assert_eq!(messages["results"][0]["text"], json!("three"));
}

#[tokio::test]
async fn test_put_replaces_participants() {
    let app = setup().await;
    let (_, thread) = app
        .call(Method::POST, "/threads/", Some(json!({"participants": [1, 2]})))
        .await;

    let (status, updated) = app
        .call(
            Method::PUT,
            &format!("/threads/{}", thread["id"]),
            Some(json!({"participants": [2, 3]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["participants"], json!([2, 3]));
}

#[tokio::test]
async fn test_participants_checked_one_at_a_time() {
    let app = setup().await;

    let (status, body) = app
        .call(Method::POST, "/threads/", Some(json!({"participants": [99, "x"]})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("User 99 not found."));

    let (status, body) = app
        .call(Method::POST, "/threads/", Some(json!({"participants": ["x", 99]})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Invalid participant ID: x"));
}

#[tokio::test]
async fn test_unparseable_paging_values_use_defaults() {
    let app = setup().await;

    let (status, page) = app
        .call(
            Method::GET,
            "/threads/list_for_user/?user_id=1&limit=abc&offset=-2",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["limit"], json!(20));
    assert_eq!(page["offset"], json!(0));
}
