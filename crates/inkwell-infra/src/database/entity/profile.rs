//! Profile entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use inkwell_core::domain::Profile;
use inkwell_core::error::RepoError;

use super::{decode_ids, encode_ids};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub doc_id: Uuid,
    #[sea_orm(unique)]
    pub owner_id: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub post_ids: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub favorite_post_ids: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub visited_post_ids: Json,
    pub version: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Profile.
impl TryFrom<Model> for Profile {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Profile::restore(
            model.owner_id,
            model.created_at.into(),
            model.updated_at.into(),
            decode_ids("post_ids", model.post_ids)?,
            decode_ids("favorite_post_ids", model.favorite_post_ids)?,
            decode_ids("visited_post_ids", model.visited_post_ids)?,
            model.version as u64,
        ))
    }
}

impl ActiveModel {
    /// A brand new document row for `profile` under a fresh physical key.
    pub fn new_document(profile: &Profile) -> Self {
        Self {
            doc_id: Set(Uuid::new_v4()),
            owner_id: Set(profile.owner_id.clone()),
            post_ids: Set(encode_ids(profile.post_ids())),
            favorite_post_ids: Set(encode_ids(profile.favorite_post_ids())),
            visited_post_ids: Set(encode_ids(profile.visited_post_ids())),
            version: Set(profile.version as i64),
            created_at: Set(profile.created.into()),
            updated_at: Set(profile.updated.into()),
        }
    }
}
