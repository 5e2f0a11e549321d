use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::ballot::PreparedVote;
use crate::roster::{Nominee, Roster};
use crate::tally::VoteRecord;

use super::{StoreError, VoteStore};

/// In-process store for tests and for running without a database.
#[derive(Default)]
pub struct MemoryStore {
    nominees: RwLock<Vec<Nominee>>,
    votes: RwLock<Vec<VoteRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a raw row as-is, bypassing ballot validation.
    #[cfg(test)]
    pub async fn push_raw(&self, record: VoteRecord) {
        self.votes.write().await.push(record);
    }
}

#[async_trait]
impl VoteStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn roster(&self) -> Result<Roster, StoreError> {
        Ok(Roster::new(self.nominees.read().await.clone()))
    }

    async fn seed_roster(&self, nominees: &[Nominee]) -> Result<bool, StoreError> {
        let mut current = self.nominees.write().await;
        if !current.is_empty() || nominees.is_empty() {
            return Ok(false);
        }
        current.extend_from_slice(nominees);
        Ok(true)
    }

    async fn append_votes(&self, rows: &[PreparedVote]) -> Result<(), StoreError> {
        let mut votes = self.votes.write().await;
        votes.extend(rows.iter().map(|row| VoteRecord {
            submitted_at: row.submitted_at,
            voter: row.voter.clone(),
            category: row.category.as_str().to_string(),
            rank: row.rank.as_str().to_string(),
            nominee: row.nominee.clone(),
            points: row.points,
        }));
        Ok(())
    }

    async fn vote_records(&self) -> Result<Vec<VoteRecord>, StoreError> {
        Ok(self.votes.read().await.clone())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
