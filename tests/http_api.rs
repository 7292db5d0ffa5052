//! HTTP client tests against a local axum server
//!
//! Covers the wire format, auth header, read retries and the no-retry rule
//! for writes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, patch},
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use school_console::api::{DirectoryApi, HttpApi, HttpApiConfig, SummaryApi};
use school_console::directory::{SchoolDirectoryService, StatusFilter};
use school_console::error::Error;
use school_console::notify::RecordingNotifier;
use school_console::types::{CurrentUser, Role, SchoolId};

// ─────────────────────────────────────────────────────────────────
// Test server
// ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct ServerState {
    schools: Vec<Value>,
    summary: Option<Value>,
    fail_reads: u32,
    fail_writes: bool,
    omit_write_message: bool,
    reads: u32,
    writes: u32,
    last_auth: Option<String>,
    last_patch_body: Option<Value>,
}

type Shared = Arc<Mutex<ServerState>>;
type Reply = (StatusCode, Json<Value>);

fn record_read(state: &mut ServerState, headers: &HeaderMap) -> Option<Reply> {
    state.reads += 1;
    state.last_auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if state.fail_reads > 0 {
        state.fail_reads -= 1;
        return Some((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "maintenance"})),
        ));
    }
    None
}

fn school_index(state: &ServerState, id: &str) -> Option<usize> {
    state
        .schools
        .iter()
        .position(|s| s["id"].to_string().trim_matches('"') == id)
}

async fn school_list(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Reply {
    let mut state = state.lock();
    if let Some(reply) = record_read(&mut state, &headers) {
        return reply;
    }
    let wanted = q.get("is_active").map(|v| v == "true").unwrap_or(true);
    let schools: Vec<Value> = state
        .schools
        .iter()
        .filter(|s| s["is_active"].as_bool() == Some(wanted))
        .cloned()
        .collect();
    (StatusCode::OK, Json(json!({ "schools": schools })))
}

async fn school_by_id(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Reply {
    let mut state = state.lock();
    if let Some(reply) = record_read(&mut state, &headers) {
        return reply;
    }
    let id = q.get("school_id").cloned().unwrap_or_default();
    match school_index(&state, &id) {
        Some(i) => (StatusCode::OK, Json(json!({ "school": state.schools[i] }))),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "School not found."}))),
    }
}

fn apply_write(state: &mut ServerState, id: &str, target: bool) -> Reply {
    state.writes += 1;
    if state.fail_writes {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "database unavailable"})),
        );
    }
    let Some(i) = school_index(state, id) else {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "School not found."})));
    };
    if state.omit_write_message {
        return (StatusCode::OK, Json(json!({})));
    }
    state.schools[i]["is_active"] = json!(target);
    let message = if target { "School reactivated" } else { "School deactivated" };
    (StatusCode::OK, Json(json!({ "message": message })))
}

async fn deactivate(
    State(state): State<Shared>,
    Query(q): Query<HashMap<String, String>>,
) -> Reply {
    let id = q.get("school_id").cloned().unwrap_or_default();
    apply_write(&mut state.lock(), &id, false)
}

async fn reactivate(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut state = state.lock();
    state.last_patch_body = Some(body.clone());
    let id = body["school_id"].as_str().unwrap_or_default().to_string();
    apply_write(&mut state, &id, true)
}

async fn board_list(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let mut state = state.lock();
    if let Some(reply) = record_read(&mut state, &headers) {
        return reply;
    }
    (
        StatusCode::OK,
        Json(json!({"boards": [
            {"id": 1, "board_name": "SSC"},
            {"id": 2, "board_name": "CBSE"}
        ]})),
    )
}

async fn dashboard_data(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let mut state = state.lock();
    if let Some(reply) = record_read(&mut state, &headers) {
        return reply;
    }
    match state.summary.clone() {
        Some(data) => (StatusCode::OK, Json(json!({ "data": data }))),
        None => (StatusCode::OK, Json(json!({"message": "no data"}))),
    }
}

async fn spawn_server(state: Shared) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");

    let app = Router::new()
        .route("/school/manage_school/school_list", get(school_list))
        .route("/school/manage_school/getSchoolById", get(school_by_id))
        .route("/school/manage_school/deactivateSchoolById", delete(deactivate))
        .route("/school/manage_school/reactivateSchoolById", patch(reactivate))
        .route("/school/manage_school/board_list", get(board_list))
        .route("/core/dashboard/getDashboardData", get(dashboard_data))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn seeded_state() -> Shared {
    Arc::new(Mutex::new(ServerState {
        schools: vec![
            json!({
                "id": 7,
                "name": "Greenwood High International School",
                "address": "123 Education Lane, Bengaluru",
                "contact_number": "+91 80 1234 5678",
                "email": "info@greenwoodhigh.edu",
                "school_admin": 2,
                "is_active": true,
                "boards": [{"id": 2, "board_name": "CBSE"}]
            }),
            json!({
                "id": 8,
                "name": "Riverside Academy",
                "address": "Pune",
                "contact_number": null,
                "email": "office@riverside.edu",
                "is_active": false
            }),
        ],
        ..Default::default()
    }))
}

fn client(base_url: &str) -> HttpApi {
    HttpApi::new(HttpApiConfig {
        base_url: base_url.to_string(),
        auth_token: Some("test-token".to_string()),
        timeout_secs: 5,
        max_retries: 2,
        retry_base_delay: Duration::from_millis(10),
    })
    .unwrap()
}

// ─────────────────────────────────────────────────────────────────
// Reads
// ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_parses_backend_payload() {
    let state = seeded_state();
    let api = client(&spawn_server(state.clone()).await);

    let active = api.list_by_status(true).await.unwrap();
    assert_eq!(active.schools.len(), 1);
    let school = &active.schools[0];
    assert_eq!(school.id.as_str(), "7");
    assert_eq!(school.phone, "+91 80 1234 5678");
    assert_eq!(school.admin_id.as_deref(), Some("2"));
    assert_eq!(school.board_names(), vec!["CBSE"]);

    let inactive = api.list_by_status(false).await.unwrap();
    assert_eq!(inactive.schools[0].phone, "");

    assert_eq!(state.lock().last_auth.as_deref(), Some("Bearer test-token"));
}

#[tokio::test]
async fn test_reads_retry_transient_errors() {
    let state = seeded_state();
    state.lock().fail_reads = 2;
    let api = client(&spawn_server(state.clone()).await);

    let boards = api.list_boards().await.unwrap();
    assert_eq!(boards.len(), 2);
    assert_eq!(boards[1].name, "CBSE");
    assert_eq!(state.lock().reads, 3);
    assert_eq!(api.total_requests(), 3);
}

#[tokio::test]
async fn test_reads_give_up_after_max_retries() {
    let state = seeded_state();
    state.lock().fail_reads = 10;
    let api = client(&spawn_server(state.clone()).await);

    let err = api.list_by_status(true).await.unwrap_err();
    assert!(matches!(err, Error::FetchFailed { .. }));
    assert!(err.to_string().contains("maintenance"));
    assert_eq!(state.lock().reads, 3);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let state = seeded_state();
    let api = client(&spawn_server(state.clone()).await);

    let err = api.get_by_id(&SchoolId::from("404")).await.unwrap_err();
    assert!(matches!(err, Error::FetchFailed { .. }));
    assert!(err.to_string().contains("School not found"));
    assert_eq!(state.lock().reads, 1);
    assert_eq!(api.total_requests(), 1);
}

#[tokio::test]
async fn test_connection_refused_is_fetch_failed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{}", addr))
        .list_by_status(true)
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}

// ─────────────────────────────────────────────────────────────────
// Writes
// ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_deactivate_and_reactivate_round_trip() {
    let state = seeded_state();
    let api = client(&spawn_server(state.clone()).await);
    let id = SchoolId::from("7");

    let reply = api.deactivate(&id).await.unwrap();
    assert_eq!(reply.confirmation(), Some("School deactivated"));
    assert!(api.list_by_status(true).await.unwrap().schools.is_empty());

    let reply = api.reactivate(&id).await.unwrap();
    assert_eq!(reply.confirmation(), Some("School reactivated"));
    assert_eq!(
        state.lock().last_patch_body,
        Some(json!({"school_id": "7"}))
    );
    assert_eq!(api.list_by_status(true).await.unwrap().schools.len(), 1);
}

#[tokio::test]
async fn test_failed_write_is_sent_once() {
    let state = seeded_state();
    state.lock().fail_writes = true;
    let api = client(&spawn_server(state.clone()).await);

    let err = api.deactivate(&SchoolId::from("7")).await.unwrap_err();
    assert!(matches!(err, Error::TransitionFailed { .. }));
    assert!(err.to_string().contains("database unavailable"));
    assert_eq!(state.lock().writes, 1);
}

// ─────────────────────────────────────────────────────────────────
// Summary
// ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_summary_envelope() {
    let state = seeded_state();
    state.lock().summary = Some(json!({"total_schools": 5, "total_active_users": "42"}));
    let api = client(&spawn_server(state.clone()).await);

    let summary = api.get_summary(&CurrentUser::new(Role::SuperAdmin)).await.unwrap();
    assert_eq!(summary.count("total_schools"), Some(5));
    assert_eq!(summary.count("total_active_users"), Some(42));
}

#[tokio::test]
async fn test_summary_without_data_is_malformed() {
    let api = client(&spawn_server(seeded_state()).await);

    let err = api.get_summary(&CurrentUser::new(Role::SuperAdmin)).await.unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }));
}

// ─────────────────────────────────────────────────────────────────
// Service over HTTP
// ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_directory_service_scenario_over_http() {
    let state = seeded_state();
    let api = Arc::new(client(&spawn_server(state.clone()).await));
    let notifier = Arc::new(RecordingNotifier::new());
    let service = SchoolDirectoryService::new(api, notifier);

    service.select_filter(StatusFilter::Active).await;
    assert_eq!(service.view().schools.len(), 1);

    let message = service
        .set_active(&SchoolId::from("7"), false)
        .await
        .unwrap();
    assert_eq!(message, "School deactivated");
    assert!(service.view().schools.is_empty());

    let inactive = service.list_by_status(false).await.unwrap();
    let ids: Vec<_> = inactive.schools.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["7", "8"]);
}

#[tokio::test]
async fn test_unconfirmed_write_over_http_is_a_failure() {
    let state = seeded_state();
    state.lock().omit_write_message = true;
    let api = Arc::new(client(&spawn_server(state.clone()).await));
    let service = SchoolDirectoryService::new(api, Arc::new(RecordingNotifier::new()));

    let err = service
        .set_active(&SchoolId::from("7"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TransitionFailed { .. }));
    assert_eq!(state.lock().schools[0]["is_active"], json!(true));
}
