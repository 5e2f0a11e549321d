//! Ballot validation.
//!
//! A ballot carries up to three ranked picks in each of the two categories.
//! Validation turns it into one [`PreparedVote`] per non-empty pick, or
//! rejects the whole ballot. Nothing is written until every row of the
//! ballot has been prepared.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::roster::Roster;

pub const MAX_VOTER_NAME_LEN: usize = 128;
pub const MAX_PICK_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Favor,
    Contra,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Favor, Category::Contra];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Favor => "favor",
            Category::Contra => "contra",
        }
    }

    /// Matches a stored category value, ignoring case and padding.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "favor" => Some(Category::Favor),
            "contra" => Some(Category::Contra),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    First,
    Second,
    Third,
}

impl Rank {
    pub const ALL: [Rank; 3] = [Rank::First, Rank::Second, Rank::Third];

    pub fn as_str(self) -> &'static str {
        match self {
            Rank::First => "first",
            Rank::Second => "second",
            Rank::Third => "third",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "first" => Some(Rank::First),
            "second" => Some(Rank::Second),
            "third" => Some(Rank::Third),
            _ => None,
        }
    }

    /// Weight awarded to a nominee picked at this rank.
    pub fn points(self) -> f64 {
        match self {
            Rank::First => 2.0,
            Rank::Second => 1.5,
            Rank::Third => 1.0,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three ranked picks for one category. `None`, `null` and `""` all mean
/// the slot was left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedPicks {
    #[serde(default)]
    pub first: Option<String>,
    #[serde(default)]
    pub second: Option<String>,
    #[serde(default)]
    pub third: Option<String>,
}

impl RankedPicks {
    pub fn new(first: &str, second: &str, third: &str) -> Self {
        Self {
            first: Some(first.to_string()),
            second: Some(second.to_string()),
            third: Some(third.to_string()),
        }
    }

    /// Trimmed pick at `rank`, empty when the slot is blank.
    pub fn get(&self, rank: Rank) -> &str {
        let slot = match rank {
            Rank::First => &self.first,
            Rank::Second => &self.second,
            Rank::Third => &self.third,
        };
        slot.as_deref().map(str::trim).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ballot {
    #[serde(default)]
    pub voter_name: String,
    #[serde(default)]
    pub favor: RankedPicks,
    #[serde(default)]
    pub contra: RankedPicks,
}

impl Ballot {
    pub fn picks(&self, category: Category) -> &RankedPicks {
        match category {
            Category::Favor => &self.favor,
            Category::Contra => &self.contra,
        }
    }

    pub fn voter(&self) -> &str {
        self.voter_name.trim()
    }
}

/// One row ready to be appended to the vote log.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedVote {
    pub submitted_at: DateTime<Utc>,
    pub voter: String,
    pub category: Category,
    pub rank: Rank,
    pub nominee: String,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BallotError {
    #[error("voter name is required")]
    MissingVoterName,
    #[error("voter name exceeds {} character limit", MAX_VOTER_NAME_LEN)]
    VoterNameTooLong,
    #[error("nominee name exceeds {} character limit", MAX_PICK_LEN)]
    PickTooLong,
    #[error("ballot is incomplete: {category} {rank} pick is missing")]
    IncompleteBallot { category: Category, rank: Rank },
    #[error("ballot for {category} contains duplicate nominees")]
    DuplicateNominee { category: Category },
    #[error("ballot contains no valid votes")]
    NoValidVotes,
    #[error("{nominee} is not on the roster")]
    UnknownNominee { nominee: String },
    #[error("{nominee} cannot be nominated in {category}")]
    IneligibleNominee { nominee: String, category: Category },
}

/// Validates a ballot and stamps its rows with the current time.
pub fn validate(ballot: &Ballot) -> Result<Vec<PreparedVote>, BallotError> {
    validate_at(ballot, Utc::now())
}

pub fn validate_at(
    ballot: &Ballot,
    submitted_at: DateTime<Utc>,
) -> Result<Vec<PreparedVote>, BallotError> {
    let voter = ballot.voter();
    if voter.is_empty() {
        return Err(BallotError::MissingVoterName);
    }
    if voter.chars().count() > MAX_VOTER_NAME_LEN {
        return Err(BallotError::VoterNameTooLong);
    }

    let mut rows = Vec::with_capacity(Category::ALL.len() * Rank::ALL.len());
    for category in Category::ALL {
        let picks = ballot.picks(category);
        let mut seen = HashSet::new();
        for rank in Rank::ALL {
            let nominee = picks.get(rank);
            if nominee.is_empty() {
                continue;
            }
            if nominee.chars().count() > MAX_PICK_LEN {
                return Err(BallotError::PickTooLong);
            }
            if !seen.insert(nominee) {
                return Err(BallotError::DuplicateNominee { category });
            }
            rows.push(PreparedVote {
                submitted_at,
                voter: voter.to_string(),
                category,
                rank,
                nominee: nominee.to_string(),
                points: rank.points(),
            });
        }
    }

    if rows.is_empty() {
        return Err(BallotError::NoValidVotes);
    }

    assert!(rows.len() <= 6, "Ballot produced more rows than slots");
    Ok(rows)
}

/// Requires every rank of both categories to be filled.
pub fn check_complete(ballot: &Ballot) -> Result<(), BallotError> {
    for category in Category::ALL {
        let picks = ballot.picks(category);
        for rank in Rank::ALL {
            if picks.get(rank).is_empty() {
                return Err(BallotError::IncompleteBallot { category, rank });
            }
        }
    }
    Ok(())
}

/// Checks every prepared row against the roster. An empty roster means it
/// has not been loaded yet, so nothing is checked.
pub fn check_roster(rows: &[PreparedVote], roster: &Roster) -> Result<(), BallotError> {
    if roster.is_empty() {
        return Ok(());
    }
    for row in rows {
        let nominee = roster
            .find(&row.nominee)
            .ok_or_else(|| BallotError::UnknownNominee {
                nominee: row.nominee.clone(),
            })?;
        if !nominee.stance().accepts(row.category) {
            return Err(BallotError::IneligibleNominee {
                nominee: row.nominee.clone(),
                category: row.category,
            });
        }
    }
    Ok(())
}
