//! HTTP contract test for the Supabase client.
//!
//! Runs the client against an in-process axum server that speaks just enough
//! PostgREST and GoTrue: an anon bearer may read, only the signed-in user's
//! token may write.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use radio_core::config::SupabaseConfig;
use radio_core::protocol::StationDraft;
use radio_core::session::{AuthError, AuthService, SessionGate};
use radio_core::supabase::SupabaseClient;
use radio_core::sync::{RemoteSync, StationTable, SyncError};

const ANON_KEY: &str = "anon-key";
const USER_TOKEN: &str = "user-token";

#[derive(Default)]
struct MockDb {
    rows: Vec<Value>,
    next_id: i64,
    last_order: Option<String>,
}

type Db = Arc<Mutex<MockDb>>;

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn has_apikey(headers: &HeaderMap) -> bool {
    headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(ANON_KEY)
}

fn rls_denied() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "code": "42501", "message": "new row violates row-level security policy" })),
    )
        .into_response()
}

fn can_write(headers: &HeaderMap) -> bool {
    has_apikey(headers) && bearer(headers).as_deref() == Some(USER_TOKEN)
}

fn id_filter(q: &HashMap<String, String>) -> Option<i64> {
    q.get("id")?.strip_prefix("eq.")?.parse().ok()
}

async fn list_stations(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    if !has_apikey(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut db = db.lock().unwrap();
    db.last_order = q.get("order").cloned();
    Json(db.rows.clone()).into_response()
}

async fn insert_station(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(body): Json<Vec<Value>>,
) -> Response {
    if !can_write(&headers) {
        return rls_denied();
    }
    let mut db = db.lock().unwrap();
    for mut row in body {
        db.next_id += 1;
        row["id"] = json!(db.next_id);
        row["created_at"] = json!("2026-10-19T08:00:00+00:00");
        db.rows.push(row);
    }
    StatusCode::CREATED.into_response()
}

async fn patch_station(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
    Json(patch): Json<Value>,
) -> Response {
    if !can_write(&headers) {
        return rls_denied();
    }
    let Some(id) = id_filter(&q) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let mut db = db.lock().unwrap();
    if let Some(row) = db.rows.iter_mut().find(|r| r["id"] == json!(id)) {
        if let (Some(row), Some(patch)) = (row.as_object_mut(), patch.as_object()) {
            for (k, v) in patch {
                row.insert(k.clone(), v.clone());
            }
        }
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn delete_station(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    if !can_write(&headers) {
        return rls_denied();
    }
    let Some(id) = id_filter(&q) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    db.lock().unwrap().rows.retain(|r| r["id"] != json!(id));
    StatusCode::NO_CONTENT.into_response()
}

async fn token(Query(q): Query<HashMap<String, String>>, Json(body): Json<Value>) -> Response {
    if q.get("grant_type").map(String::as_str) != Some("password") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    if body["password"] != "hunter2" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" })),
        )
            .into_response();
    }
    Json(json!({
        "access_token": USER_TOKEN,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh",
        "user": { "id": "9f1c", "email": body["email"], "role": "authenticated" }
    }))
    .into_response()
}

async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn visitor_count(headers: HeaderMap) -> Response {
    let accept = headers.get("accept").and_then(|v| v.to_str().ok());
    if accept != Some("application/vnd.pgrst.object+json") {
        return StatusCode::NOT_ACCEPTABLE.into_response();
    }
    Json(json!({ "count": 77 })).into_response()
}

async fn spawn_mock() -> (String, Db) {
    let db: Db = Arc::new(Mutex::new(MockDb::default()));
    let app = Router::new()
        .route(
            "/rest/v1/stations",
            get(list_stations)
                .post(insert_station)
                .patch(patch_station)
                .delete(delete_station),
        )
        .route("/rest/v1/visitor_count", get(visitor_count))
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/logout", post(logout))
        .with_state(db.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), db)
}

fn client_for(url: &str) -> Arc<SupabaseClient> {
    let cfg = SupabaseConfig {
        url: url.to_string(),
        anon_key: ANON_KEY.to_string(),
        ..SupabaseConfig::default()
    };
    Arc::new(SupabaseClient::new(&cfg).unwrap())
}

#[tokio::test]
async fn writes_require_sign_in_and_refetch() {
    let (url, db) = spawn_mock().await;
    let client = client_for(&url);
    let sync = RemoteSync::new(client.clone() as Arc<dyn StationTable>);
    let gate = SessionGate::new(client.clone() as Arc<dyn AuthService>);

    assert!(sync.load().await.unwrap().is_empty());
    assert_eq!(
        db.lock().unwrap().last_order.as_deref(),
        Some("city.asc.nullslast,name.asc")
    );

    let draft = StationDraft::from_fields("Prambors", "https://stream.example/prambors", "Jakarta", "").unwrap();
    match sync.add(draft.clone()).await {
        Err(SyncError::Api { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "new row violates row-level security policy");
        }
        other => panic!("expected RLS rejection, got {:?}", other),
    }

    let err = gate.sign_in("admin@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected(ref m) if m == "Invalid login credentials"));
    assert!(!gate.is_admin());

    gate.sign_in("admin@example.com", "hunter2").await.unwrap();
    assert!(gate.is_admin());

    let rows = sync.add(draft).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Prambors");
    assert_eq!(rows[0].city.as_deref(), Some("Jakarta"));
    assert_eq!(rows[0].color_or_default(), "#e2e8f0");
    assert!(rows[0].created_at.is_some());

    let mut edited = rows[0].clone();
    edited.name = "Prambors FM".to_string();
    edited.city = Some("   ".to_string());
    let rows = sync.update(edited).await.unwrap();
    assert_eq!(rows[0].name, "Prambors FM");
    assert_eq!(rows[0].city, None);

    let rows = sync.delete(rows[0].id).await.unwrap();
    assert!(rows.is_empty());

    gate.sign_out().await.unwrap();
    assert!(!gate.is_admin());
    let again = StationDraft::from_fields("X", "https://x", "", "").unwrap();
    assert!(sync.add(again).await.is_err());
}

#[tokio::test]
async fn visit_count_falls_back_to_plain_read() {
    let (url, _db) = spawn_mock().await;
    let client = client_for(&url);
    assert_eq!(client.visit_count().await.unwrap(), 77);
}
