use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::{debug, info};

use crate::ballot::PreparedVote;
use crate::entities::prelude::{Nominee as NomineeEntity, Vote as VoteEntity};
use crate::entities::{nominee, vote};
use crate::roster::{MAX_ROSTER_SIZE, Nominee, Roster};
use crate::tally::VoteRecord;

use super::{StoreError, VoteStore};

/// Store backed by the `nominees` and `votes` tables.
#[derive(Clone)]
pub struct DatabaseStore {
    database: DatabaseConnection,
}

impl DatabaseStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

#[async_trait]
impl VoteStore for DatabaseStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn roster(&self) -> Result<Roster, StoreError> {
        let rows = NomineeEntity::find()
            .order_by_asc(nominee::Column::Id)
            .limit(MAX_ROSTER_SIZE as u64 + 1)
            .all(&self.database)
            .await?;

        let nominees = rows
            .into_iter()
            .map(|row| Nominee {
                name: row.name,
                topic: row.topic,
                stance: row.stance,
                notes: row.notes,
            })
            .collect();
        Ok(Roster::from_rows(nominees))
    }

    async fn seed_roster(&self, nominees: &[Nominee]) -> Result<bool, StoreError> {
        if nominees.is_empty() {
            return Ok(false);
        }
        assert!(
            nominees.len() <= MAX_ROSTER_SIZE,
            "Roster seed exceeds defensive bound"
        );

        let txn = self.database.begin().await?;
        let existing = NomineeEntity::find().count(&txn).await?;
        if existing > 0 {
            debug!("Roster already holds {existing} nominees, skipping seed");
            txn.rollback().await?;
            return Ok(false);
        }

        let models = nominees.iter().map(|entry| nominee::ActiveModel {
            id: NotSet,
            name: Set(entry.name.clone()),
            topic: Set(entry.topic.clone()),
            stance: Set(entry.stance.clone()),
            notes: Set(entry.notes.clone()),
        });
        NomineeEntity::insert_many(models).exec(&txn).await?;
        txn.commit().await?;

        info!("Seeded roster with {} nominees", nominees.len());
        Ok(true)
    }

    async fn append_votes(&self, rows: &[PreparedVote]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }

        let models = rows.iter().map(|row| vote::ActiveModel {
            id: NotSet,
            submitted_at: Set(row.submitted_at.fixed_offset()),
            voter: Set(row.voter.clone()),
            category: Set(row.category.as_str().to_string()),
            rank: Set(row.rank.as_str().to_string()),
            nominee: Set(row.nominee.clone()),
            points: Set(row.points),
        });

        let txn = self.database.begin().await?;
        VoteEntity::insert_many(models).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn vote_records(&self) -> Result<Vec<VoteRecord>, StoreError> {
        let rows = VoteEntity::find()
            .order_by_asc(vote::Column::Id)
            .all(&self.database)
            .await?;

        let records = rows
            .into_iter()
            .map(|row| VoteRecord {
                submitted_at: row.submitted_at.with_timezone(&Utc),
                voter: row.voter,
                category: row.category,
                rank: row.rank,
                nominee: row.nominee,
                points: row.points,
            })
            .collect();
        Ok(records)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.database.ping().await?;
        Ok(())
    }
}
