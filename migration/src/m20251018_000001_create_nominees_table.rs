use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Roster of students that can be nominated; read-only during a session
        manager
            .create_table(
                Table::create()
                    .table(Nominees::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Nominees::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Nominees::Name)
                            .string_len(128)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Nominees::Topic).string_len(256).not_null())
                    .col(ColumnDef::new(Nominees::Stance).string_len(32).not_null())
                    .col(ColumnDef::new(Nominees::Notes).text().not_null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Nominees::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Nominees {
    Table,
    Id,
    Name,
    Topic,
    Stance,
    Notes,
}
