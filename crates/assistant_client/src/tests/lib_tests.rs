use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use map_view::{MarkerKind, GEOCODE_ZOOM, PLACES_ZOOM};
use serde_json::{json, Value};
use shared::{domain::Coordinate, payload::Place, protocol::MapCommand};
use tokio::net::TcpListener;

use super::*;

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    body: Arc<Value>,
    seen_queries: Arc<Mutex<Vec<String>>>,
}

async fn handle_ask(
    State(state): State<StubState>,
    Json(request): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if let Some(query) = request.get("query").and_then(Value::as_str) {
        state.seen_queries.lock().await.push(query.to_string());
    }
    (state.status, Json((*state.body).clone()))
}

async fn spawn_assistant_server(
    status: StatusCode,
    body: Value,
) -> (String, Arc<Mutex<Vec<String>>>) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let seen_queries = Arc::new(Mutex::new(Vec::new()));
    let state = StubState {
        status,
        body: Arc::new(body),
        seen_queries: Arc::clone(&seen_queries),
    };
    let app = Router::new()
        .route("/ai_assistant", post(handle_ask))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), seen_queries)
}

fn markable_place(name: &str, lat: f64, lng: f64) -> Place {
    Place {
        name: name.to_string(),
        address: None,
        location: Some(Coordinate::new(lat, lng)),
        lat: None,
        lng: None,
        rating: None,
        price_level: None,
        open_now: None,
    }
}

#[tokio::test]
async fn successful_places_exchange_updates_transcript_and_map() {
    let (base_url, seen_queries) = spawn_assistant_server(
        StatusCode::OK,
        json!({
            "intent": "places_search",
            "places": [
                {"name": "Cafe One", "address": "MG Road", "rating": 4.5,
                 "location": {"lat": 9.93, "lng": 76.26}},
                {"name": "Cafe Two", "lat": 9.94, "lng": 76.27}
            ]
        }),
    )
    .await;

    let session = ChatSession::new(
        Arc::new(HttpAssistantService::new(base_url)),
        MapController::new(),
    );

    let entry = session.send_query("find cafes near me").await.expect("reply");
    assert_eq!(entry.sender, Sender::Assistant);
    assert!(entry.text.starts_with("Found 2 places:"));

    let transcript = session.transcript().await;
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[0].text, GREETING);
    assert_eq!(transcript[1].sender, Sender::User);
    assert_eq!(transcript[1].text, "find cafes near me");

    assert_eq!(
        seen_queries.lock().await.as_slice(),
        ["find cafes near me"]
    );

    let view = session.map().view_state().await;
    assert_eq!(view.zoom, PLACES_ZOOM);
    assert_eq!(view.markers.len(), 2);
    assert_eq!(view.markers[0].kind, MarkerKind::Place);
    assert_eq!(view.center, Coordinate::new(9.93, 76.26));
}

#[tokio::test]
async fn geocode_exchange_reads_short_field_names_and_zooms_in() {
    let (base_url, _seen) = spawn_assistant_server(
        StatusCode::OK,
        json!({
            "intent": "geocode",
            "locations": [
                {"address": "Marine Drive, Kochi", "lat": 9.9312, "lng": 76.2673}
            ]
        }),
    )
    .await;

    let session = ChatSession::new(
        Arc::new(HttpAssistantService::new(base_url)),
        MapController::new(),
    );

    let entry = session.send_query("where is marine drive").await.expect("reply");
    assert!(entry.text.contains("Marine Drive, Kochi"));
    assert!(entry.text.contains("9.9312"));
    assert!(entry.text.contains("76.2673"));

    let view = session.map().view_state().await;
    assert_eq!(view.zoom, GEOCODE_ZOOM);
    assert_eq!(view.markers.len(), 1);
    assert_eq!(view.center, Coordinate::new(9.9312, 76.2673));
}

#[tokio::test]
async fn service_failure_appends_fallback_and_leaves_map_untouched() {
    let (base_url, _seen) =
        spawn_assistant_server(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "boom"})).await;

    let session = ChatSession::new(
        Arc::new(HttpAssistantService::new(base_url)),
        MapController::new(),
    );
    session
        .map()
        .apply_command(MapCommand::Places(vec![markable_place(
            "Existing", 9.93, 76.26,
        )]))
        .await;

    let entry = session.send_query("anything").await.expect("fallback entry");
    assert_eq!(entry.text, SERVICE_FAILURE_REPLY);

    // No new command: the prior view state must be fully intact.
    let view = session.map().view_state().await;
    assert_eq!(view.markers.len(), 1);
    assert_eq!(view.markers[0].label, "Existing");
    assert_eq!(view.zoom, PLACES_ZOOM);
}

#[tokio::test]
async fn missing_service_is_treated_as_a_failed_call() {
    let session = ChatSession::new(Arc::new(MissingAssistantService), MapController::new());
    let mut events = session.subscribe_events();

    let entry = session.send_query("hello").await.expect("fallback entry");
    assert_eq!(entry.text, SERVICE_FAILURE_REPLY);

    let transcript = session.transcript().await;
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[2].text, SERVICE_FAILURE_REPLY);

    // User entry, error, fallback entry.
    let mut saw_error = false;
    for _ in 0..3 {
        if let Ok(ChatEvent::Error(_)) = events.try_recv() {
            saw_error = true;
        }
    }
    assert!(saw_error);
}

#[tokio::test]
async fn reply_only_payload_forwards_idle_command() {
    let (base_url, _seen) =
        spawn_assistant_server(StatusCode::OK, json!({"reply": "Just chatting"})).await;

    let session = ChatSession::new(
        Arc::new(HttpAssistantService::new(base_url)),
        MapController::new(),
    );
    session
        .map()
        .apply_command(MapCommand::Places(vec![markable_place(
            "Existing", 9.93, 76.26,
        )]))
        .await;

    let entry = session.send_query("how are you").await.expect("reply");
    assert_eq!(entry.text, "Just chatting");

    // Idle command clears markers; camera stays where it was.
    let view = session.map().view_state().await;
    assert!(view.markers.is_empty());
    assert_eq!(view.center, Coordinate::new(9.93, 76.26));
    assert_eq!(view.zoom, PLACES_ZOOM);
}

#[tokio::test]
async fn blank_query_is_rejected_without_touching_the_transcript() {
    let session = ChatSession::new(Arc::new(MissingAssistantService), MapController::new());
    session.send_query("   ").await.expect_err("must reject");
    assert_eq!(session.transcript().await.len(), 1);
}
