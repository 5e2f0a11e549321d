use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::Expr;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Append-only vote log: one row per non-empty pick of an accepted ballot.
        // Category and rank stay free text so the tally can skip rows it does
        // not recognise instead of failing the whole summary.
        manager
            .create_table(
                Table::create()
                    .table(Votes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Votes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Votes::SubmittedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Votes::Voter).string_len(128).not_null())
                    .col(ColumnDef::new(Votes::Category).string_len(16).not_null())
                    .col(ColumnDef::new(Votes::Rank).string_len(16).not_null())
                    .col(ColumnDef::new(Votes::Nominee).string_len(128).not_null())
                    .col(ColumnDef::new(Votes::Points).double().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_votes_category_nominee")
                    .table(Votes::Table)
                    .col(Votes::Category)
                    .col(Votes::Nominee)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Votes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Votes {
    Table,
    Id,
    SubmittedAt,
    Voter,
    Category,
    Rank,
    Nominee,
    Points,
}
