use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const INDEX_NAME: &str = "idx_flood_record_user_occurred";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FloodRecord::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FloodRecord::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FloodRecord::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FloodRecord::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Serves both the per-subject eviction and the windowed count.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(INDEX_NAME)
                    .table(FloodRecord::Table)
                    .col(FloodRecord::UserId)
                    .col(FloodRecord::OccurredAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name(INDEX_NAME).table(FloodRecord::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(FloodRecord::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FloodRecord {
    Table,
    Id,
    UserId,
    OccurredAt,
}
