use serde::{Deserialize, Serialize};

use crate::roster::Nominee;
use crate::tally::VotesSummary;

/// Roster and tally served together, as the page renders both at once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryPayload {
    pub roster: Vec<Nominee>,
    pub votes: VotesSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResponse {
    pub ok: bool,
    pub roster: Vec<Nominee>,
    pub votes: VotesSummary,
}

impl From<&SummaryPayload> for SummaryResponse {
    fn from(payload: &SummaryPayload) -> Self {
        Self {
            ok: true,
            roster: payload.roster.clone(),
            votes: payload.votes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterResponse {
    pub ok: bool,
    pub roster: Vec<Nominee>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionResponse {
    pub ok: bool,
    pub message: String,
    pub recorded: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RosterQuery {
    /// Restrict to nominees whose stance fits this category.
    pub category: Option<String>,
}

// Query/form shapes of the Apps Script style `/exec` endpoint

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecQuery {
    pub action: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecForm {
    pub payload: Option<String>,
}
