use sea_orm_migration::prelude::*;

/// Reverse index from a post id to the profiles that mention it.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProfilePostRefs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ProfilePostRefs::PostId).string().not_null())
                    .col(ColumnDef::new(ProfilePostRefs::OwnerId).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(ProfilePostRefs::PostId)
                            .col(ProfilePostRefs::OwnerId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_profile_post_refs_owner_id")
                    .table(ProfilePostRefs::Table)
                    .col(ProfilePostRefs::OwnerId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProfilePostRefs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ProfilePostRefs {
    Table,
    PostId,
    OwnerId,
}
