//! Comment entity <-> model mapper

use grace_core::entities::{AuthorSnapshot, Comment, NewComment};
use grace_core::value_objects::Snowflake;

use crate::models::CommentModel;

/// Convert CommentModel to Comment entity
impl From<CommentModel> for Comment {
    fn from(model: CommentModel) -> Self {
        Comment {
            id: Snowflake::new(model.id),
            post_id: Snowflake::new(model.post_id),
            author: AuthorSnapshot {
                id: model.author_id,
                display_name: model.author_display_name,
                avatar_url: model.author_avatar_url,
            },
            content: model.content,
            created_at: model.created_at,
        }
    }
}

/// Borrowed column values for inserting a NewComment
pub struct CommentInsert<'a> {
    pub id: i64,
    pub post_id: i64,
    pub author_id: &'a str,
    pub author_display_name: &'a str,
    pub author_avatar_url: Option<&'a str>,
    pub content: &'a str,
}

impl<'a> CommentInsert<'a> {
    pub fn new(comment: &'a NewComment) -> Self {
        Self {
            id: comment.id.into_inner(),
            post_id: comment.post_id.into_inner(),
            author_id: &comment.author.id,
            author_display_name: &comment.author.display_name,
            author_avatar_url: comment.author.avatar_url.as_deref(),
            content: &comment.content,
        }
    }
}
