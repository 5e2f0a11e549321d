//! Single-endpoint API matching the spreadsheet web app the voting page was
//! first written against: `GET /exec?action=summary|roster` and a
//! form-encoded `POST /exec` carrying the ballot JSON in `payload`.

use axum::extract::rejection::FormRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Json, Router};

use crate::ballot::Ballot;
use crate::models::voting::{ExecForm, ExecQuery, RosterResponse, SummaryResponse};
use crate::state::AppState;

use super::HttpError;
use super::votes::{load_summary, record_ballot};

pub fn router() -> Router<AppState> {
    Router::new().route("/exec", get(exec_query).post(exec_submit))
}

async fn exec_query(
    Query(query): Query<ExecQuery>,
    State(state): State<AppState>,
) -> Result<Response, HttpError> {
    let action = query
        .action
        .as_deref()
        .map(|action| action.trim().to_lowercase())
        .filter(|action| !action.is_empty())
        .unwrap_or_else(|| "summary".to_string());

    match action.as_str() {
        "summary" => {
            let payload = load_summary(&state).await?;
            Ok(Json(SummaryResponse::from(payload.as_ref())).into_response())
        }
        "roster" => {
            let roster = state.store.roster().await?;
            let response = RosterResponse {
                ok: true,
                roster: roster.into_nominees(),
            };
            Ok(Json(response).into_response())
        }
        _ => Err(HttpError::bad_request("unsupported action")),
    }
}

async fn exec_submit(
    State(state): State<AppState>,
    form: Result<Form<ExecForm>, FormRejection>,
) -> Result<Response, HttpError> {
    let Form(form) = form.map_err(|rejection| {
        HttpError::bad_request(format!("invalid form submission: {}", rejection.body_text()))
    })?;
    let raw = form.payload.unwrap_or_default();
    if raw.trim().is_empty() {
        return Err(HttpError::bad_request("request is missing the ballot payload"));
    }

    let ballot: Ballot = serde_json::from_str(&raw)
        .map_err(|_| HttpError::bad_request("ballot payload is not valid JSON"))?;
    let response = record_ballot(&state, &ballot).await?;
    Ok(Json(response).into_response())
}
