use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Profiles::DocId).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Profiles::OwnerId).string().not_null().unique_key())
                    .col(id_list(Profiles::PostIds))
                    .col(id_list(Profiles::FavoritePostIds))
                    .col(id_list(Profiles::VisitedPostIds))
                    .col(ColumnDef::new(Profiles::Version).big_integer().not_null())
                    .col(
                        ColumnDef::new(Profiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Profiles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await
    }
}

fn id_list(column: Profiles) -> ColumnDef {
    ColumnDef::new(column)
        .json_binary()
        .not_null()
        .default(Expr::cust("'[]'::jsonb"))
        .to_owned()
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    DocId,
    OwnerId,
    PostIds,
    FavoritePostIds,
    VisitedPostIds,
    Version,
    CreatedAt,
    UpdatedAt,
}
