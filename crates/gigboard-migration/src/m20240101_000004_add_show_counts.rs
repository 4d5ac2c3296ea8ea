//! Cached past/upcoming show counters on both parent tables.
//!
//! The counters back the listing pages; detail views recompute live.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_venues::Venues;
use super::m20240101_000002_create_artists::Artists;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Venues::Table)
                    .add_column(
                        ColumnDef::new(ShowCounts::PastShowsCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .add_column(
                        ColumnDef::new(ShowCounts::UpcomingShowsCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Artists::Table)
                    .add_column(
                        ColumnDef::new(ShowCounts::PastShowsCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .add_column(
                        ColumnDef::new(ShowCounts::UpcomingShowsCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Venues::Table)
                    .drop_column(ShowCounts::PastShowsCount)
                    .drop_column(ShowCounts::UpcomingShowsCount)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Artists::Table)
                    .drop_column(ShowCounts::PastShowsCount)
                    .drop_column(ShowCounts::UpcomingShowsCount)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum ShowCounts {
    PastShowsCount,
    UpcomingShowsCount,
}
