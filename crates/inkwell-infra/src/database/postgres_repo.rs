//! PostgreSQL repository implementations.
//!
//! Every write is a compare-and-swap: `UPDATE ... WHERE key = $1 AND
//! version = $2`. A profile row and its reverse index rows are written in
//! one transaction; posts and profiles never share a transaction.

use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};

use inkwell_core::domain::{Post, Profile};
use inkwell_core::error::RepoError;
use inkwell_core::ports::{DocumentRepository, PostRepository, ProfileRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::profile::{self, Entity as ProfileEntity};
use super::entity::profile_ref::{self, Entity as ProfileRefEntity};
use super::entity::encode_ids;
use super::postgres_base::{PostgresBaseRepository, missed_write, repo_err};

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL profile repository.
pub type PostgresProfileRepository = PostgresBaseRepository<ProfileEntity>;

impl PostgresPostRepository {
    async fn stored_version(&self, key: &str) -> Result<Option<i64>, RepoError> {
        let model = PostEntity::find()
            .filter(post::Column::PostId.eq(key))
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(model.map(|m| m.version))
    }
}

#[async_trait]
impl DocumentRepository<Post> for PostgresPostRepository {
    async fn find_by_key(&self, key: &str) -> Result<Option<Post>, RepoError> {
        tracing::debug!(post_id = %key, "Finding post");

        PostEntity::find()
            .filter(post::Column::PostId.eq(key))
            .one(&self.db)
            .await
            .map_err(repo_err)?
            .map(Post::try_from)
            .transpose()
    }

    async fn insert(&self, mut entity: Post) -> Result<Post, RepoError> {
        entity.version = 1;
        let model = post::ActiveModel::new_document(&entity)
            .insert(&self.db)
            .await
            .map_err(repo_err)?;
        Post::try_from(model)
    }

    async fn replace(&self, mut entity: Post, expected_version: u64) -> Result<Post, RepoError> {
        let next = expected_version + 1;
        let result = PostEntity::update_many()
            .col_expr(post::Column::Title, Expr::value(entity.title.clone()))
            .col_expr(post::Column::Content, Expr::value(entity.content.clone()))
            .col_expr(post::Column::Images, Expr::value(encode_ids(&entity.images)))
            .col_expr(
                post::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(entity.updated)),
            )
            .col_expr(post::Column::Version, Expr::value(next as i64))
            .filter(post::Column::PostId.eq(entity.id.as_str()))
            .filter(post::Column::Version.eq(expected_version as i64))
            .exec(&self.db)
            .await
            .map_err(repo_err)?;

        if result.rows_affected == 0 {
            let stored = self.stored_version(&entity.id).await?;
            return Err(missed_write(stored, expected_version));
        }

        entity.version = next;
        Ok(entity)
    }

    async fn delete(&self, key: &str) -> Result<(), RepoError> {
        let result = PostEntity::delete_many()
            .filter(post::Column::PostId.eq(key))
            .exec(&self.db)
            .await
            .map_err(repo_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<Post>, RepoError> {
        let models = PostEntity::find()
            .filter(post::Column::OwnerId.eq(owner_id))
            .order_by_desc(post::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        models.into_iter().map(Post::try_from).collect()
    }

    async fn scan(&self) -> Result<Vec<Post>, RepoError> {
        let models = PostEntity::find()
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        models.into_iter().map(Post::try_from).collect()
    }
}

impl PostgresProfileRepository {
    async fn stored_version(&self, key: &str) -> Result<Option<i64>, RepoError> {
        let model = ProfileEntity::find()
            .filter(profile::Column::OwnerId.eq(key))
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(model.map(|m| m.version))
    }
}

/// Rewrite the reverse index rows of one profile.
async fn write_refs(txn: &DatabaseTransaction, entity: &Profile) -> Result<(), RepoError> {
    ProfileRefEntity::delete_many()
        .filter(profile_ref::Column::OwnerId.eq(entity.owner_id.as_str()))
        .exec(txn)
        .await
        .map_err(repo_err)?;

    let rows: Vec<profile_ref::ActiveModel> = entity
        .referenced_post_ids()
        .into_iter()
        .map(|post_id| profile_ref::ActiveModel {
            post_id: Set(post_id.to_string()),
            owner_id: Set(entity.owner_id.clone()),
        })
        .collect();

    if !rows.is_empty() {
        ProfileRefEntity::insert_many(rows)
            .exec_without_returning(txn)
            .await
            .map_err(repo_err)?;
    }

    Ok(())
}

async fn rollback(txn: DatabaseTransaction) -> Result<(), RepoError> {
    txn.rollback().await.map_err(repo_err)
}

#[async_trait]
impl DocumentRepository<Profile> for PostgresProfileRepository {
    async fn find_by_key(&self, key: &str) -> Result<Option<Profile>, RepoError> {
        tracing::debug!(owner_id = %key, "Finding profile");

        ProfileEntity::find()
            .filter(profile::Column::OwnerId.eq(key))
            .one(&self.db)
            .await
            .map_err(repo_err)?
            .map(Profile::try_from)
            .transpose()
    }

    async fn insert(&self, mut entity: Profile) -> Result<Profile, RepoError> {
        entity.version = 1;

        let txn = self.db.begin().await.map_err(repo_err)?;
        let model = profile::ActiveModel::new_document(&entity)
            .insert(&txn)
            .await
            .map_err(repo_err)?;
        write_refs(&txn, &entity).await?;
        txn.commit().await.map_err(repo_err)?;

        Profile::try_from(model)
    }

    async fn replace(
        &self,
        mut entity: Profile,
        expected_version: u64,
    ) -> Result<Profile, RepoError> {
        let next = expected_version + 1;

        let txn = self.db.begin().await.map_err(repo_err)?;
        let result = ProfileEntity::update_many()
            .col_expr(profile::Column::PostIds, Expr::value(encode_ids(entity.post_ids())))
            .col_expr(
                profile::Column::FavoritePostIds,
                Expr::value(encode_ids(entity.favorite_post_ids())),
            )
            .col_expr(
                profile::Column::VisitedPostIds,
                Expr::value(encode_ids(entity.visited_post_ids())),
            )
            .col_expr(
                profile::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(entity.updated)),
            )
            .col_expr(profile::Column::Version, Expr::value(next as i64))
            .filter(profile::Column::OwnerId.eq(entity.owner_id.as_str()))
            .filter(profile::Column::Version.eq(expected_version as i64))
            .exec(&txn)
            .await
            .map_err(repo_err)?;

        if result.rows_affected == 0 {
            rollback(txn).await?;
            let stored = self.stored_version(&entity.owner_id).await?;
            return Err(missed_write(stored, expected_version));
        }

        write_refs(&txn, &entity).await?;
        txn.commit().await.map_err(repo_err)?;

        entity.take_pending();
        entity.version = next;
        Ok(entity)
    }

    async fn delete(&self, key: &str) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(repo_err)?;
        let result = ProfileEntity::delete_many()
            .filter(profile::Column::OwnerId.eq(key))
            .exec(&txn)
            .await
            .map_err(repo_err)?;

        if result.rows_affected == 0 {
            rollback(txn).await?;
            return Err(RepoError::NotFound);
        }

        ProfileRefEntity::delete_many()
            .filter(profile_ref::Column::OwnerId.eq(key))
            .exec(&txn)
            .await
            .map_err(repo_err)?;
        txn.commit().await.map_err(repo_err)?;

        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn find_referencing(&self, post_id: &str) -> Result<Vec<Profile>, RepoError> {
        let owners: Vec<String> = ProfileRefEntity::find()
            .filter(profile_ref::Column::PostId.eq(post_id))
            .all(&self.db)
            .await
            .map_err(repo_err)?
            .into_iter()
            .map(|row| row.owner_id)
            .collect();

        if owners.is_empty() {
            return Ok(Vec::new());
        }

        let models = ProfileEntity::find()
            .filter(profile::Column::OwnerId.is_in(owners))
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        models.into_iter().map(Profile::try_from).collect()
    }
}

