//! Post entity for SeaORM.
//!
//! `doc_id` is the physical key; callers address posts by `post_id`.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use inkwell_core::domain::Post;
use inkwell_core::error::RepoError;

use super::{decode_ids, encode_ids};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub doc_id: Uuid,
    #[sea_orm(unique)]
    pub post_id: String,
    pub owner_id: String,
    pub title: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub images: Json,
    pub version: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl TryFrom<Model> for Post {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.post_id,
            owner_id: model.owner_id,
            created: model.created_at.into(),
            updated: model.updated_at.into(),
            title: model.title,
            content: model.content,
            images: decode_ids("images", model.images)?,
            version: model.version as u64,
        })
    }
}

impl ActiveModel {
    /// A brand new document row for `post` under a fresh physical key.
    pub fn new_document(post: &Post) -> Self {
        Self {
            doc_id: Set(Uuid::new_v4()),
            post_id: Set(post.id.clone()),
            owner_id: Set(post.owner_id.clone()),
            title: Set(post.title.clone()),
            content: Set(post.content.clone()),
            images: Set(encode_ids(&post.images)),
            version: Set(post.version as i64),
            created_at: Set(post.created.into()),
            updated_at: Set(post.updated.into()),
        }
    }
}
