//! Full-stack REST API integration tests.
//!
//! Each test builds the axum router over the in-memory adapter and a scripted
//! completion service, then sends real HTTP requests via `tower::ServiceExt`.
//! This validates routing, auth, serialisation, handler logic and storage in one pass.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt; // for `.oneshot()`
use uuid::Uuid;

use api_lib::adapters::InMemoryAdapter;
use api_lib::web::create_router;
use api_lib::web::state::AppState;
use mind_mapper_core::domain::MapFields;
use mind_mapper_core::ports::{AccountService, CompletionService, PortError, PortResult};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Replies with canned completions and remembers the prompts it was sent.
#[derive(Default)]
struct ScriptedCompletion {
    json_reply: Option<String>,
    text_reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    fn json(reply: Value) -> Self {
        Self {
            json_reply: Some(reply.to_string()),
            ..Default::default()
        }
    }

    fn raw(reply: &str) -> Self {
        Self {
            json_reply: Some(reply.to_string()),
            ..Default::default()
        }
    }

    fn text(reply: &str) -> Self {
        Self {
            text_reply: Some(reply.to_string()),
            ..Default::default()
        }
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }

    fn reply(&self, prompt: &str, reply: &Option<String>) -> PortResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        reply
            .clone()
            .ok_or_else(|| PortError::Unexpected("provider unavailable".to_string()))
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete_json(&self, system_prompt: &str) -> PortResult<String> {
        self.reply(system_prompt, &self.json_reply)
    }

    async fn complete_text(&self, prompt: &str) -> PortResult<String> {
        self.reply(prompt, &self.text_reply)
    }
}

struct Harness {
    router: axum::Router,
    store: Arc<InMemoryAdapter>,
    completion: Arc<ScriptedCompletion>,
    user_id: Uuid,
    token: String,
}

async fn setup_with(completion: ScriptedCompletion) -> Harness {
    let store = Arc::new(InMemoryAdapter::new());
    let completion = Arc::new(completion);
    let state = Arc::new(AppState {
        maps: store.clone(),
        accounts: store.clone(),
        identity: store.clone(),
        completion: completion.clone(),
        auth_session_days: 30,
    });

    let user = store
        .create_user_with_email("ada@example.com", "not-a-real-hash")
        .await
        .expect("user");
    let token = Uuid::new_v4().to_string();
    store
        .create_auth_session(&token, user.user_id, Utc::now() + Duration::days(1))
        .await
        .expect("session");

    Harness {
        router: create_router(state),
        store,
        completion,
        user_id: user.user_id,
        token,
    }
}

async fn setup() -> Harness {
    setup_with(ScriptedCompletion::default()).await
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(val) => builder.body(Body::from(val.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
}

impl Harness {
    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let resp = self
            .router
            .clone()
            .oneshot(request(method, uri, Some(self.token.as_str()), body))
            .await
            .unwrap();
        let status = resp.status();
        (status, body_json(resp).await)
    }

    /// Sends a body verbatim, for requests that are not valid JSON.
    async fn send_raw(&self, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", self.token))
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        (status, body_json(resp).await)
    }

    fn seed(&self, fields: Value) -> Uuid {
        let fields: MapFields = match fields {
            Value::Object(map) => map,
            other => panic!("seed must be an object: {other}"),
        };
        self.store.insert_raw(self.user_id, fields).unwrap()
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_bearer_token_is_unauthorized() {
    let h = setup().await;
    let resp = h
        .router
        .clone()
        .oneshot(request(Method::GET, "/get-maps", None, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(body_json(resp).await["error"].is_string());
}

#[tokio::test]
async fn unknown_token_is_forbidden() {
    let h = setup().await;
    let resp = h
        .router
        .clone()
        .oneshot(request(Method::GET, "/get-maps", Some("forged"), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn expired_token_is_forbidden() {
    let h = setup().await;
    h.store
        .create_auth_session("stale", h.user_id, Utc::now() - Duration::minutes(1))
        .await
        .unwrap();
    let resp = h
        .router
        .clone()
        .oneshot(request(Method::GET, "/get-maps", Some("stale"), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn signup_login_and_logout_round_trip() {
    let h = setup().await;
    let credentials = json!({"email": "grace@example.com", "password": "hunter22"});

    let resp = h
        .router
        .clone()
        .oneshot(request(Method::POST, "/auth/signup", None, Some(credentials.clone())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = h
        .router
        .clone()
        .oneshot(request(Method::POST, "/auth/signup", None, Some(credentials.clone())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = h
        .router
        .clone()
        .oneshot(request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "grace@example.com", "password": "wrong"})),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = h
        .router
        .clone()
        .oneshot(request(Method::POST, "/auth/login", None, Some(credentials)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let token = body_json(resp).await["token"].as_str().unwrap().to_string();

    let resp = h
        .router
        .clone()
        .oneshot(request(Method::GET, "/get-maps", Some(token.as_str()), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = h
        .router
        .clone()
        .oneshot(request(Method::POST, "/auth/logout", Some(token.as_str()), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = h
        .router
        .clone()
        .oneshot(request(Method::GET, "/get-maps", Some(token.as_str()), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generate_map_with_emojis_is_normalized() {
    let h = setup_with(ScriptedCompletion::json(json!({
        "text": "Sun", "emoji": "☀️", "children": [{"text": "Ray"}]
    })))
    .await;

    let (status, body) = h
        .send(Method::POST, "/generate-map", Some(json!({"topic": "Sun", "emojisEnabled": true})))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"content": "☀️ Sun", "children": [{"content": "📌 Ray"}]}));
    assert!(h.completion.last_prompt().contains(r#""text": "Sun""#));
}

#[tokio::test]
async fn generate_map_without_emojis_passes_tree_through() {
    let tree = json!({"content": "Sun", "children": [{"content": "Ray", "children": []}]});
    let h = setup_with(ScriptedCompletion::json(tree.clone())).await;

    let (status, body) = h
        .send(Method::POST, "/generate-map", Some(json!({"topic": "Sun"})))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, tree);
}

#[tokio::test]
async fn generate_map_requires_topic() {
    let h = setup().await;
    let (status, _) = h
        .send(Method::POST, "/generate-map", Some(json!({"emojisEnabled": true})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = h
        .send(Method::POST, "/generate-map", Some(json!({"topic": ""})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn loosely_typed_fields_are_read_by_truthiness() {
    let tree = json!({"content": "5", "children": []});
    let h = setup_with(ScriptedCompletion::json(tree.clone())).await;

    let (status, body) = h
        .send(
            Method::POST,
            "/generate-map",
            Some(json!({"topic": 5, "emojisEnabled": null})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, tree);
    assert!(h.completion.last_prompt().contains('5'));

    let (status, body) = h
        .send(
            Method::POST,
            "/create-map",
            Some(json!({"content": {"content": "Root"}, "title": 7})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], json!("7"));
}

#[tokio::test]
async fn malformed_bodies_are_rejected_with_an_error_body() {
    let h = setup().await;

    for (uri, raw) in [
        ("/create-map", ""),
        ("/create-map", "not json"),
        ("/generate-map", "[1, 2"),
        ("/update-map", "{\"documentId\":"),
    ] {
        let (status, body) = h.send_raw(Method::POST, uri, raw).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} with {raw:?}");
        assert!(body["error"].is_string(), "{uri} with {raw:?} gave {body}");
    }

    let (status, body) = h
        .send(
            Method::POST,
            "/auth/signup",
            Some(json!({"email": 5, "password": "secret"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn unparseable_completion_is_a_server_error() {
    let h = setup_with(ScriptedCompletion::raw("Sure! Here is your map: {")).await;
    let (status, body) = h
        .send(Method::POST, "/generate-map", Some(json!({"topic": "Sun"})))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn non_object_node_is_a_server_error() {
    let h = setup_with(ScriptedCompletion::json(json!({"text": "Sun", "children": ["Ray"]}))).await;
    let (status, _) = h
        .send(Method::POST, "/generate-map", Some(json!({"topic": "Sun", "emojisEnabled": true})))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn provider_failure_is_a_server_error() {
    let h = setup().await;
    let (status, _) = h
        .send(Method::POST, "/expand-node", Some(json!({"path": ["Sun"]})))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn expand_node_filters_and_decorates() {
    let h = setup_with(ScriptedCompletion::json(json!({
        "nodes": [{"text": "A", "emoji": "🔥"}, {"text": ""}, "stray", {"text": " B "}]
    })))
    .await;

    let (status, body) = h
        .send(
            Method::POST,
            "/expand-node",
            Some(json!({"path": ["Chemistry", "Reactions"], "emojisEnabled": true})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"content": "🔥 A"}, {"content": "📌 B"}]));
    assert!(h.completion.last_prompt().contains("Chemistry -> Reactions"));
}

#[tokio::test]
async fn expand_node_plain_accepts_bare_lists() {
    let h = setup_with(ScriptedCompletion::json(json!([
        {"content": "X"}, {"content": "  "}, {"other": 1}
    ])))
    .await;

    let (status, body) = h
        .send(Method::POST, "/expand-node", Some(json!({"path": ["Root"]})))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"content": "X"}]));
}

#[tokio::test]
async fn expand_node_requires_path() {
    let h = setup().await;
    let (status, _) = h
        .send(Method::POST, "/expand-node", Some(json!({"path": []})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn explanation_returns_free_text() {
    let h = setup_with(ScriptedCompletion::text("Chlorophyll absorbs light.")).await;
    let (status, body) = h
        .send(Method::POST, "/get-explanation", Some(json!({"prompt": "Explain chlorophyll"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"explanation": "Chlorophyll absorbs light."}));
    assert_eq!(h.completion.last_prompt(), "Explain chlorophyll");

    let (status, _) = h
        .send(Method::POST, "/get-explanation", Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Map documents
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_map_mirrors_content_and_lists_it() {
    let h = setup().await;
    let tree = json!({"content": "Photosynthesis", "children": [{"content": "Light"}]});

    let (status, created) = h
        .send(Method::POST, "/create-map", Some(json!({"content": tree.clone()})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], json!("Photosynthesis"));
    assert_eq!(created["content"], tree);

    let (status, listing) = h.send(Method::GET, "/get-maps", None).await;
    assert_eq!(status, StatusCode::OK);
    let maps = listing.as_array().unwrap();
    assert_eq!(maps.len(), 1);
    assert_eq!(maps[0]["id"], created["id"]);
    assert_eq!(maps[0]["content"], tree);
    assert_eq!(maps[0]["mapData"], tree);
    assert!(maps[0]["createdAt"].is_string());
    assert!(maps[0]["lastUpdated"].is_string());
}

#[tokio::test]
async fn create_map_title_fallbacks() {
    let h = setup().await;

    let (_, created) = h
        .send(Method::POST, "/create-map", Some(json!({"content": ["a"], "title": ""})))
        .await;
    assert_eq!(created["title"], json!("Bez nazwy"));

    let (_, created) = h
        .send(Method::POST, "/create-map", Some(json!({"content": {"content": "X"}, "title": "Mine"})))
        .await;
    assert_eq!(created["title"], json!("Mine"));
}

#[tokio::test]
async fn create_map_requires_content() {
    let h = setup().await;
    for body in [json!({"title": "t"}), json!({"content": null}), json!({"content": {}})] {
        let (status, _) = h.send(Method::POST, "/create-map", Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    }
}

#[tokio::test]
async fn maps_are_private_to_their_owner() {
    let h = setup().await;
    let stranger = Uuid::new_v4();
    let foreign = h
        .store
        .insert_raw(stranger, serde_json::from_value(json!({"title": "secret"})).unwrap())
        .unwrap();

    let (_, listing) = h.send(Method::GET, "/get-maps", None).await;
    assert_eq!(listing, json!([]));

    let (status, _) = h
        .send(Method::PUT, &format!("/update-map/{foreign}"), Some(json!({"title": "mine now"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_by_body_rewrites_both_tree_keys() {
    let h = setup().await;
    let (_, created) = h
        .send(Method::POST, "/create-map", Some(json!({"content": {"content": "Old"}})))
        .await;
    let id = created["id"].as_str().unwrap().to_string();

    let new_tree = json!({"content": "New", "children": [{"content": "Leaf"}]});
    let (status, body) = h
        .send(
            Method::POST,
            "/update-map",
            Some(json!({"documentId": id, "newMapContent": new_tree.clone()})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": id, "updated": true}));

    let (_, listing) = h.send(Method::GET, "/get-maps", None).await;
    assert_eq!(listing[0]["content"], new_tree);
    assert_eq!(listing[0]["mapData"], new_tree);
    assert_eq!(listing[0]["title"], json!("Old"));
}

#[tokio::test]
async fn update_by_body_validation() {
    let h = setup().await;

    let (status, _) = h
        .send(Method::POST, "/update-map", Some(json!({"newMapData": {"content": "x"}})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // An explicit null newMapData wins over newMapContent.
    let (status, _) = h
        .send(
            Method::POST,
            "/update-map",
            Some(json!({"documentId": Uuid::new_v4(), "newMapData": null, "newMapContent": {"content": "x"}})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = h
        .send(
            Method::POST,
            "/update-map",
            Some(json!({"documentId": Uuid::new_v4(), "newMapData": {"content": "x"}})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = h
        .send(
            Method::POST,
            "/update-map",
            Some(json!({"documentId": "not-a-uuid", "newMapData": {"content": "x"}})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_by_path_changes_title_and_tree() {
    let h = setup().await;
    let (_, created) = h
        .send(Method::POST, "/create-map", Some(json!({"content": {"content": "Old"}})))
        .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _) = h
        .send(Method::PATCH, &format!("/update-map/{id}"), Some(json!({"title": "Renamed"})))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, listing) = h.send(Method::GET, "/get-maps", None).await;
    assert_eq!(listing[0]["title"], json!("Renamed"));
    assert_eq!(listing[0]["content"], json!({"content": "Old"}));

    let (status, body) = h
        .send(Method::PUT, &format!("/update-map/{id}"), Some(json!({"content": {"content": "New"}})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], json!(true));

    let (_, listing) = h.send(Method::GET, "/get-maps", None).await;
    assert_eq!(listing[0]["content"], json!({"content": "New"}));
    assert_eq!(listing[0]["mapData"], json!({"content": "New"}));

    let (status, _) = h
        .send(Method::PUT, &format!("/update-map/{id}"), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_by_path_with_only_unknown_keys_bumps_last_updated() {
    let h = setup().await;
    let id = h.seed(json!({
        "title": "Kept",
        "content": {"content": "Kept"},
        "lastUpdated": "2020-01-01T00:00:00+00:00"
    }));

    let (status, body) = h
        .send(Method::PUT, &format!("/update-map/{id}"), Some(json!({"foo": 1})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": id.to_string(), "updated": true}));

    let (_, listing) = h.send(Method::GET, "/get-maps", None).await;
    let map = &listing[0];
    assert_eq!(map["title"], json!("Kept"));
    assert_eq!(map["content"], json!({"content": "Kept"}));
    assert!(map.get("foo").is_none());
    assert_ne!(map["lastUpdated"], json!("2020-01-01T00:00:00+00:00"));
}

// ---------------------------------------------------------------------------
// Migration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn migrate_maps_repairs_legacy_documents() {
    let h = setup().await;
    let structured = h.seed(json!({"mapStructure": {"content": "Topic"}}));
    let empty = h.seed(json!({}));
    h.seed(json!({"name": "Done", "mapData": {"content": "Done"}}));

    let (status, report) = h.send(Method::POST, "/migrate-maps", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        report,
        json!({"migrated": 2, "skipped": 1, "total": 3, "errors": []})
    );

    let (_, listing) = h.send(Method::GET, "/get-maps", None).await;
    let by_id = |id: Uuid| {
        listing
            .as_array()
            .unwrap()
            .iter()
            .find(|m| m["id"] == json!(id.to_string()))
            .cloned()
            .unwrap()
    };

    let repaired = by_id(structured);
    assert_eq!(repaired["name"], json!("Topic"));
    assert_eq!(repaired["mapData"], json!({"content": "Topic"}));
    assert_eq!(repaired["content"], json!({"content": "Topic"}));

    let repaired = by_id(empty);
    let prefix: String = empty.to_string().chars().take(8).collect();
    assert_eq!(repaired["name"], json!(format!("Mapa {prefix}")));
    assert_eq!(repaired["mapData"], json!({}));

    let (_, again) = h.send(Method::POST, "/migrate-maps", None).await;
    assert_eq!(again, json!({"migrated": 0, "skipped": 3, "total": 3, "errors": []}));
}
