//! Post entity for SeaORM.
//!
//! Tags, likers and the embedded comment list are stored as JSONB. `version`
//! is bumped on every write and guards the compare-and-swap in
//! `PostgresPostRepository::update_with`.

use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::de::DeserializeOwned;

use pressroom_core::domain::{Post, Reactions};
use pressroom_core::error::RepoError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub author_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,
    pub media: Option<String>,
    pub status: String,
    pub published: bool,
    pub publish_at: Option<DateTimeWithTimeZone>,
    pub likes: i64,
    #[sea_orm(column_type = "JsonBinary")]
    pub liked_by: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub comments: Json,
    pub version: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn decode<T: DeserializeOwned>(id: Uuid, column: &str, value: Json) -> Result<T, RepoError> {
    serde_json::from_value(value)
        .map_err(|e| RepoError::Corrupt(format!("post {} column {}: {}", id, column, e)))
}

/// Conversion from SeaORM Model to Domain Post.
impl TryFrom<Model> for Post {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let id = model.id;
        let status = model
            .status
            .parse()
            .map_err(|_| RepoError::Corrupt(format!("post {} has status '{}'", id, model.status)))?;
        let likes = u64::try_from(model.likes)
            .map_err(|_| RepoError::Corrupt(format!("post {} has {} likes", id, model.likes)))?;

        Ok(Self {
            id,
            author_id: model.author_id,
            category_id: model.category_id,
            title: model.title,
            content: model.content,
            tags: decode(id, "tags", model.tags)?,
            media: model.media,
            status,
            published: model.published,
            publish_at: model.publish_at.map(Into::into),
            reactions: Reactions {
                likes,
                liked_by: decode(id, "liked_by", model.liked_by)?,
            },
            comments: decode(id, "comments", model.comments)?,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel. `version` starts at 0;
/// updates overwrite it.
impl From<Post> for ActiveModel {
    fn from(post: Post) -> Self {
        Self {
            id: Set(post.id),
            author_id: Set(post.author_id),
            category_id: Set(post.category_id),
            title: Set(post.title),
            content: Set(post.content),
            tags: Set(serde_json::json!(post.tags)),
            media: Set(post.media),
            status: Set(post.status.as_str().to_string()),
            published: Set(post.published),
            publish_at: Set(post.publish_at.map(Into::into)),
            likes: Set(i64::try_from(post.reactions.likes).unwrap_or(i64::MAX)),
            liked_by: Set(serde_json::json!(post.reactions.liked_by)),
            comments: Set(serde_json::json!(post.comments)),
            version: Set(0),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
        }
    }
}
