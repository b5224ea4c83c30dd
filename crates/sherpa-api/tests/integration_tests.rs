//! Integration tests for the HTTP surface.
//!
//! Each test builds its own router over recording fakes of the manual and
//! places collaborators and drives it with `tower::ServiceExt::oneshot`.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use sherpa_api::error::ErrorBody;
use sherpa_api::handlers::{ChatReplyBody, HealthResponse, HistoryResponse, SessionsResponse};
use sherpa_api::{create_router, AppState};
use sherpa_chat::{ChatOrchestrator, ReplyKind, Role, REFUSAL_MESSAGE};
use sherpa_core::config::SherpaConfig;
use sherpa_core::types::{Capability, Coordinates, PlaceCategory, PointOfInterest};
use sherpa_manual::{ManualAnswerer, ManualError};
use sherpa_places::{PlacesError, PlacesLookup};

// =============================================================================
// Helpers
// =============================================================================

#[derive(Default)]
struct Calls {
    manual: Mutex<Vec<(String, String)>>,
    places: Mutex<Vec<(String, PlaceCategory)>>,
}

struct FakeManual(Arc<Calls>);

#[async_trait]
impl ManualAnswerer for FakeManual {
    async fn answer(&self, model: &str, problem: &str) -> Result<String, ManualError> {
        self.0
            .manual
            .lock()
            .unwrap()
            .push((model.to_string(), problem.to_string()));
        Ok(format!("Manual answer for {model}"))
    }
}

struct FakePlaces(Arc<Calls>);

#[async_trait]
impl PlacesLookup for FakePlaces {
    async fn nearest(
        &self,
        address: &str,
        category: PlaceCategory,
    ) -> Result<Vec<PointOfInterest>, PlacesError> {
        self.0
            .places
            .lock()
            .unwrap()
            .push((address.to_string(), category));
        Ok(vec![
            PointOfInterest {
                address: "1 A Rd".to_string(),
                coordinates: Coordinates::new(1.0, 2.0),
                name: "Station A".to_string(),
            },
            PointOfInterest {
                address: "2 B Rd".to_string(),
                coordinates: Coordinates::new(3.0, 4.0),
                name: "Station B".to_string(),
            },
        ])
    }
}

fn make_app() -> (axum::Router, Arc<Calls>) {
    let config = SherpaConfig::default();
    let calls = Arc::new(Calls::default());
    let orchestrator = ChatOrchestrator::with_collaborators(
        &config,
        Arc::new(FakeManual(Arc::clone(&calls))),
        Arc::new(FakePlaces(Arc::clone(&calls))),
    );
    (create_router(AppState::new(config, orchestrator)), calls)
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

async fn send_chat(app: &axum::Router, message: &str, session_id: Option<Uuid>) -> ChatReplyBody {
    let body = serde_json::json!({"message": message, "session_id": session_id}).to_string();
    let resp = app.clone().oneshot(post_json("/chat", &body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_happy_path() {
    let (app, _) = make_app();
    let resp = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.active_sessions, 0);
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_chat_refuses_out_of_scope() {
    let (app, calls) = make_app();
    let reply = send_chat(&app, "What's the weather?", None).await;

    assert_eq!(reply.reply, REFUSAL_MESSAGE);
    assert_eq!(reply.kind, ReplyKind::Refusal);
    assert!(reply.capability.is_none());
    assert!(calls.manual.lock().unwrap().is_empty());
    assert!(calls.places.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_clarifies_then_lists_places() {
    let (app, calls) = make_app();

    let first = send_chat(&app, "Where is the nearest charging station?", None).await;
    assert_eq!(first.kind, ReplyKind::Clarification);
    assert!(first.reply.contains("address"));
    assert!(calls.places.lock().unwrap().is_empty());

    let second = send_chat(&app, "1 Raffles Place, Singapore", Some(first.session_id)).await;
    assert_eq!(second.session_id, first.session_id);
    assert_eq!(second.kind, ReplyKind::Places);
    assert_eq!(second.capability, Some(Capability::Charger));
    let a = second.reply.find("Station A").unwrap();
    let b = second.reply.find("Station B").unwrap();
    assert!(a < b);
    assert_eq!(
        *calls.places.lock().unwrap(),
        vec![("1 Raffles Place, Singapore".to_string(), PlaceCategory::Charger)]
    );
}

#[tokio::test]
async fn test_chat_manual_question() {
    let (app, calls) = make_app();
    let reply = send_chat(&app, "My Kia EV6 battery won't charge", None).await;

    assert_eq!(reply.kind, ReplyKind::Answer);
    assert_eq!(reply.reply, "Manual answer for Kia EV6");
    assert_eq!(
        *calls.manual.lock().unwrap(),
        vec![("Kia EV6".to_string(), "My Kia EV6 battery won't charge".to_string())]
    );
}

#[tokio::test]
async fn test_chat_empty_message_returns_400() {
    let (app, _) = make_app();
    let resp = app
        .oneshot(post_json("/chat", r#"{"message": "  "}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: ErrorBody = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(err.error, "bad_request");
    assert_eq!(err.message, "message cannot be empty");
}

#[tokio::test]
async fn test_chat_missing_message_field_is_rejected() {
    let (app, _) = make_app();
    let resp = app
        .oneshot(post_json("/chat", r#"{"text": "hello"}"#))
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}

// =============================================================================
// Sessions
// =============================================================================

#[tokio::test]
async fn test_history_returns_transcript_in_order() {
    let (app, _) = make_app();
    let reply = send_chat(&app, "hello", None).await;

    let resp = app
        .clone()
        .oneshot(get(&format!("/sessions/{}/history", reply.session_id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let history: HistoryResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(history.session_id, reply.session_id);
    assert_eq!(history.messages.len(), 2);
    assert_eq!(history.messages[0].role, Role::User);
    assert_eq!(history.messages[0].text, "hello");
    assert_eq!(history.messages[1].role, Role::Assistant);
    assert_eq!(history.messages[1].position, 1);
}

#[tokio::test]
async fn test_list_sessions() {
    let (app, _) = make_app();
    send_chat(&app, "hello", None).await;
    send_chat(&app, "hi there", None).await;

    let resp = app.oneshot(get("/sessions")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let list: SessionsResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(list.sessions.len(), 2);
}

#[tokio::test]
async fn test_history_unknown_session_returns_404() {
    let (app, _) = make_app();
    let resp = app
        .oneshot(get(&format!("/sessions/{}/history", Uuid::new_v4())))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_history_invalid_id_returns_400() {
    let (app, _) = make_app();
    let resp = app.oneshot(get("/sessions/not-a-uuid/history")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_session() {
    let (app, _) = make_app();
    let reply = send_chat(&app, "hello", None).await;
    let uri = format!("/sessions/{}", reply.session_id);

    let resp = app
        .clone()
        .oneshot(Request::delete(uri.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .oneshot(Request::delete(uri.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
