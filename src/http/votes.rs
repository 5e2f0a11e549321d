use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{info, warn};

use crate::ballot::{Ballot, Category, check_complete, check_roster, validate};
use crate::models::voting::{
    RosterQuery, RosterResponse, SubmissionResponse, SummaryPayload, SummaryResponse,
};
use crate::state::AppState;
use crate::tally::summarize;

use super::HttpError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/roster", get(get_roster))
        .route("/summary", get(get_summary))
        .route("/ballots", post(submit_ballot))
}

async fn get_roster(
    Query(query): Query<RosterQuery>,
    State(state): State<AppState>,
) -> Result<Json<RosterResponse>, HttpError> {
    let roster = state.store.roster().await?;

    let nominees = match query.category.as_deref() {
        Some(raw) => {
            let category = Category::parse(raw).ok_or_else(|| {
                HttpError::bad_request(format!("unknown category {}", raw.trim()))
            })?;
            roster.eligible(category).cloned().collect()
        }
        None => roster.into_nominees(),
    };

    Ok(Json(RosterResponse {
        ok: true,
        roster: nominees,
    }))
}

async fn get_summary(State(state): State<AppState>) -> Result<Json<SummaryResponse>, HttpError> {
    let payload = load_summary(&state).await?;
    Ok(Json(SummaryResponse::from(payload.as_ref())))
}

async fn submit_ballot(
    State(state): State<AppState>,
    payload: Result<Json<Ballot>, JsonRejection>,
) -> Result<Json<SubmissionResponse>, HttpError> {
    let Json(ballot) = payload.map_err(|rejection| {
        HttpError::bad_request(format!("invalid ballot payload: {}", rejection.body_text()))
    })?;
    let response = record_ballot(&state, &ballot).await?;
    Ok(Json(response))
}

/// Roster plus tally, served from cache when no ballot arrived since the
/// last computation.
pub(super) async fn load_summary(state: &AppState) -> Result<Arc<SummaryPayload>, HttpError> {
    if let Some(cached) = state.cache.cached_summary().await {
        return Ok(cached);
    }

    let generation = state.cache.generation();
    let roster = state.store.roster().await?;
    let records = state.store.vote_records().await?;
    let payload = Arc::new(SummaryPayload {
        roster: roster.into_nominees(),
        votes: summarize(&records),
    });

    state
        .cache
        .store_summary(generation, Arc::clone(&payload))
        .await;
    Ok(payload)
}

/// Validates a ballot against the configured policy and appends its rows.
/// Every check runs before the store is touched.
pub(super) async fn record_ballot(
    state: &AppState,
    ballot: &Ballot,
) -> Result<SubmissionResponse, HttpError> {
    let rows = validate(ballot).inspect_err(|err| warn!("Ballot rejected: {err}"))?;

    if state.voting.require_complete_ballot {
        check_complete(ballot).inspect_err(|err| warn!("Ballot rejected: {err}"))?;
    }

    if state.voting.enforce_roster {
        let roster = state.store.roster().await?;
        check_roster(&rows, &roster).inspect_err(|err| warn!("Ballot rejected: {err}"))?;
    }

    state.store.append_votes(&rows).await?;
    state.cache.invalidate_summary();

    let voter = ballot.voter();
    info!("Recorded {} votes from {voter}", rows.len());

    Ok(SubmissionResponse {
        ok: true,
        message: format!("{voter}, your vote has been recorded"),
        recorded: rows.len(),
    })
}
