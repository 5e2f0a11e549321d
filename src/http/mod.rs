use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::ballot::BallotError;
use crate::state::AppState;
use crate::store::StoreError;

mod exec;
mod votes;

pub fn router(state: AppState) -> Router {
    // The voting page is served from a different origin than the API
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_live))
        .route("/health/ready", get(health_ready))
        .merge(votes::router())
        .merge(exec::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_live(State(state): State<AppState>) -> Result<Json<HealthResponse>, HttpError> {
    let response = HealthResponse {
        status: "live",
        uptime_seconds: state.start_time.elapsed().as_secs(),
    };
    Ok(Json(response))
}

async fn health_ready(State(state): State<AppState>) -> Result<Json<ReadyResponse>, HttpError> {
    state.store.ping().await.map_err(|err| {
        error!("Vote store ping failed: {err}");
        HttpError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "vote store is not reachable".to_string(),
        )
    })?;

    let response = ReadyResponse {
        status: "ready",
        store: state.store.backend_tag(),
        cached_summaries: state.cache.summary.entry_count(),
    };
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
struct ReadyResponse {
    status: &'static str,
    store: &'static str,
    cached_summaries: u64,
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: String) -> Self {
        assert!(status != StatusCode::OK, "Error status cannot be 200");
        assert!(!message.is_empty(), "Error message cannot be empty");
        Self { status, message }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into())
    }
}

impl From<BallotError> for HttpError {
    fn from(err: BallotError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<StoreError> for HttpError {
    fn from(err: StoreError) -> Self {
        error!("Vote store failure: {err}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "the vote store could not complete the request, please try again".to_string(),
        )
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        info!("HTTP error: {}", self.message);
        let body = Json(ErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    ok: bool,
    error: String,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use chrono::Utc;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::{CacheConfig, VotingConfig};
    use crate::roster::Nominee;
    use crate::state::ApiCache;
    use crate::store::{MemoryStore, VoteStore};
    use crate::tally::VoteRecord;

    fn nominee(name: &str, stance: &str) -> Nominee {
        Nominee {
            name: name.to_string(),
            topic: "School uniforms".to_string(),
            stance: stance.to_string(),
            notes: String::new(),
        }
    }

    async fn test_state(voting: VotingConfig) -> (AppState, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store
            .seed_roster(&[
                nominee("Luis", "a favor"),
                nominee("Marta", "ambos"),
                nominee("Sara", "a favor"),
                nominee("Pablo", "en contra"),
                nominee("Irene", "en contra"),
                nominee("Nico", "ambos"),
            ])
            .await
            .unwrap();
        let cache = Arc::new(ApiCache::new(&CacheConfig::default()));
        let state = AppState::new(store.clone(), cache, voting);
        (state, store)
    }

    fn relaxed() -> VotingConfig {
        VotingConfig {
            require_complete_ballot: false,
            enforce_roster: true,
        }
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded;charset=UTF-8")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn full_ballot(voter: &str) -> Value {
        json!({
            "voterName": voter,
            "favor": {"first": "Luis", "second": "Marta", "third": "Sara"},
            "contra": {"first": "Pablo", "second": "Irene", "third": "Nico"}
        })
    }

    #[tokio::test]
    async fn full_ballot_is_recorded_and_tallied() {
        let (state, store) = test_state(VotingConfig::default()).await;

        let (status, body) = send(&state, post_json("/ballots", full_ballot("Ana"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["recorded"], 6);
        assert_eq!(store.vote_records().await.unwrap().len(), 6);

        let (status, body) = send(&state, get("/summary")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["roster"].as_array().unwrap().len(), 6);
        assert_eq!(body["votes"]["favor"]["totals"][0], json!({"name": "Luis", "points": 2.0}));
        assert_eq!(body["votes"]["contra"]["table"][2]["name"], "Nico");
        assert_eq!(body["votes"]["contra"]["table"][2]["third"], 1);
    }

    #[tokio::test]
    async fn partial_ballot_tallies_when_completeness_is_relaxed() {
        let (state, _) = test_state(relaxed()).await;
        let ballot = json!({
            "voterName": "Ana",
            "favor": {"first": "Luis", "second": "Marta", "third": ""},
            "contra": {"first": "", "second": "", "third": ""}
        });

        let (status, body) = send(&state, post_json("/ballots", ballot)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recorded"], 2);

        let (_, body) = send(&state, get("/summary")).await;
        let favor = &body["votes"]["favor"]["table"];
        assert_eq!(
            favor[0],
            json!({"name": "Luis", "points": 2.0, "first": 1, "second": 0, "third": 0})
        );
        assert_eq!(
            favor[1],
            json!({"name": "Marta", "points": 1.5, "first": 0, "second": 1, "third": 0})
        );
        assert_eq!(body["votes"]["contra"], json!({"totals": [], "table": []}));
    }

    #[tokio::test]
    async fn incomplete_ballot_is_rejected_by_default() {
        let (state, store) = test_state(VotingConfig::default()).await;
        let ballot = json!({
            "voterName": "Ana",
            "favor": {"first": "Luis", "second": "Marta", "third": "Sara"},
            "contra": {"first": "Pablo", "second": "", "third": "Nico"}
        });

        let (status, body) = send(&state, post_json("/ballots", ballot)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "ballot is incomplete: contra second pick is missing");
        assert!(store.vote_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_nominee_rejects_whole_ballot() {
        let (state, store) = test_state(relaxed()).await;
        let ballot = json!({
            "voterName": "Ana",
            "favor": {"first": "Luis", "second": "Luis", "third": ""},
            "contra": {"first": "Pablo", "second": "", "third": ""}
        });

        let (status, body) = send(&state, post_json("/ballots", ballot)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"ok": false, "error": "ballot for favor contains duplicate nominees"})
        );
        assert!(store.vote_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_voter_and_empty_ballot_are_distinct_errors() {
        let (state, _) = test_state(relaxed()).await;

        let mut nameless = full_ballot("  ");
        nameless["favor"]["second"] = json!("Luis");
        let (status, body) = send(&state, post_json("/ballots", nameless)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "voter name is required");

        let empty = json!({"voterName": "Ana"});
        let (status, body) = send(&state, post_json("/ballots", empty)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ballot contains no valid votes");
    }

    #[tokio::test]
    async fn roster_membership_is_enforced() {
        let (state, _) = test_state(relaxed()).await;

        let stranger = json!({"voterName": "Ana", "favor": {"first": "Lucia"}});
        let (status, body) = send(&state, post_json("/ballots", stranger)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Lucia is not on the roster");

        let wrong_side = json!({"voterName": "Ana", "contra": {"first": "Luis"}});
        let (status, body) = send(&state, post_json("/ballots", wrong_side)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Luis cannot be nominated in contra");
    }

    #[tokio::test]
    async fn unknown_nominee_is_accepted_when_roster_is_not_enforced() {
        let voting = VotingConfig {
            require_complete_ballot: false,
            enforce_roster: false,
        };
        let (state, _) = test_state(voting).await;

        let stranger = json!({"voterName": "Ana", "favor": {"first": "Lucia"}});
        let (status, body) = send(&state, post_json("/ballots", stranger)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recorded"], 1);
    }

    #[tokio::test]
    async fn malformed_json_body_reports_structured_error() {
        let (state, _) = test_state(VotingConfig::default()).await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/ballots")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
        assert!(body["error"].as_str().unwrap().starts_with("invalid ballot payload"));
    }

    #[tokio::test]
    async fn summary_reflects_ballots_submitted_after_it_was_cached() {
        let (state, _) = test_state(VotingConfig::default()).await;

        let (_, before) = send(&state, get("/summary")).await;
        assert_eq!(before["votes"]["favor"]["table"], json!([]));

        send(&state, post_json("/ballots", full_ballot("Ana"))).await;
        send(&state, post_json("/ballots", full_ballot("Bruno"))).await;

        let (_, after) = send(&state, get("/summary")).await;
        assert_eq!(after["votes"]["favor"]["totals"][0]["points"], 4.0);
        assert_eq!(after["votes"]["favor"]["table"][0]["first"], 2);
    }

    #[tokio::test]
    async fn summary_skips_malformed_stored_rows() {
        let (state, store) = test_state(VotingConfig::default()).await;
        store
            .push_raw(VoteRecord {
                submitted_at: Utc::now(),
                voter: "legacy".to_string(),
                category: "neutral".to_string(),
                rank: "first".to_string(),
                nominee: "Luis".to_string(),
                points: 2.0,
            })
            .await;
        store
            .push_raw(VoteRecord {
                submitted_at: Utc::now(),
                voter: "legacy".to_string(),
                category: "Favor".to_string(),
                rank: "honorable".to_string(),
                nominee: "Luis".to_string(),
                points: 0.5,
            })
            .await;

        let (status, body) = send(&state, get("/summary")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["votes"]["favor"]["table"],
            json!([{"name": "Luis", "points": 0.5, "first": 0, "second": 0, "third": 0}])
        );
        assert_eq!(body["votes"]["contra"]["table"], json!([]));
    }

    #[tokio::test]
    async fn roster_endpoint_lists_nominees_in_order() {
        let (state, _) = test_state(VotingConfig::default()).await;
        let (status, body) = send(&state, get("/roster")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["roster"][0]["name"], "Luis");
        assert_eq!(body["roster"][3]["stance"], "en contra");
    }

    #[tokio::test]
    async fn roster_can_be_filtered_by_category() {
        let (state, _) = test_state(VotingConfig::default()).await;

        let (_, body) = send(&state, get("/roster?category=contra")).await;
        let names: Vec<_> = body["roster"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Marta", "Pablo", "Irene", "Nico"]);

        let (status, body) = send(&state, get("/roster?category=neutral")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "unknown category neutral");
    }

    #[tokio::test]
    async fn exec_get_dispatches_on_action() {
        let (state, _) = test_state(VotingConfig::default()).await;

        let (status, body) = send(&state, get("/exec")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["votes"].is_object());
        assert!(body["roster"].is_array());

        let (status, body) = send(&state, get("/exec?action=ROSTER")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("votes").is_none());
        assert_eq!(body["roster"].as_array().unwrap().len(), 6);

        let (status, body) = send(&state, get("/exec?action=delete")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"ok": false, "error": "unsupported action"}));
    }

    #[tokio::test]
    async fn exec_post_accepts_form_encoded_payload() {
        let (state, store) = test_state(VotingConfig::default()).await;
        let payload = full_ballot("Ana").to_string();

        let (status, body) = send(&state, post_form("/exec", &format!("payload={payload}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(store.vote_records().await.unwrap().len(), 6);

        let (status, body) = send(&state, post_form("/exec", "other=1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "request is missing the ballot payload");

        let (status, body) = send(&state, post_form("/exec", "payload={broken")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ballot payload is not valid JSON");
    }

    #[tokio::test]
    async fn exec_post_without_form_encoding_gets_json_error() {
        let (state, store) = test_state(VotingConfig::default()).await;

        let (status, body) = send(&state, post_json("/exec", full_ballot("Ana"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("invalid form submission")
        );
        assert!(store.vote_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn readiness_reports_store_backend() {
        let (state, _) = test_state(VotingConfig::default()).await;
        let (status, body) = send(&state, get("/health/ready")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["store"], "memory");

        let (status, body) = send(&state, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "live");
    }
}
