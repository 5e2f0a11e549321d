//! Persistence for the roster and the vote log.

use async_trait::async_trait;
use sea_orm::DbErr;

use crate::ballot::PreparedVote;
use crate::roster::{Nominee, Roster};
use crate::tally::VoteRecord;

mod database;
mod memory;

pub use database::DatabaseStore;
pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Backend holding the roster and the append-only vote log.
///
/// `append_votes` must write a ballot's rows as one batch: concurrent
/// submissions may land in any order but never interleave half-written.
#[async_trait]
pub trait VoteStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn roster(&self) -> Result<Roster, StoreError>;

    /// Loads `nominees` only when the roster is still empty. Returns whether
    /// anything was written.
    async fn seed_roster(&self, nominees: &[Nominee]) -> Result<bool, StoreError>;

    async fn append_votes(&self, rows: &[PreparedVote]) -> Result<(), StoreError>;

    async fn vote_records(&self) -> Result<Vec<VoteRecord>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
