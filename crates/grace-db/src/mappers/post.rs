//! Post entity <-> model mapper

use grace_core::entities::{AuthorSnapshot, NewPost, Post, PostType};
use grace_core::error::DomainError;
use grace_core::value_objects::Snowflake;

use crate::models::PostModel;

/// Convert PostModel to Post entity
///
/// Fails only if the row holds a post type the schema check should have rejected.
impl TryFrom<PostModel> for Post {
    type Error = DomainError;

    fn try_from(model: PostModel) -> Result<Self, Self::Error> {
        let post_type: PostType = model.post_type.parse().map_err(|_| {
            DomainError::DatabaseError(format!(
                "post {} has unknown type {:?}",
                model.id, model.post_type
            ))
        })?;

        Ok(Post {
            id: Snowflake::new(model.id),
            post_type,
            author: AuthorSnapshot {
                id: model.author_id,
                display_name: model.author_display_name,
                avatar_url: model.author_avatar_url,
            },
            title: model.title,
            content: model.content,
            created_at: model.created_at,
            like_count: model.like_count,
            comment_count: model.comment_count,
        })
    }
}

/// Convert a row batch, failing on the first bad row
pub fn posts_from_models(models: Vec<PostModel>) -> Result<Vec<Post>, DomainError> {
    models.into_iter().map(Post::try_from).collect()
}

/// Borrowed column values for inserting a NewPost
pub struct PostInsert<'a> {
    pub id: i64,
    pub post_type: &'static str,
    pub author_id: &'a str,
    pub author_display_name: &'a str,
    pub author_avatar_url: Option<&'a str>,
    pub title: &'a str,
    pub content: &'a str,
    pub client_token: Option<&'a str>,
}

impl<'a> PostInsert<'a> {
    pub fn new(post: &'a NewPost) -> Self {
        Self {
            id: post.id.into_inner(),
            post_type: post.post_type.as_str(),
            author_id: &post.author.id,
            author_display_name: &post.author.display_name,
            author_avatar_url: post.author.avatar_url.as_deref(),
            title: &post.title,
            content: &post.content,
            client_token: post.client_token.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn model(post_type: &str) -> PostModel {
        PostModel {
            id: 7,
            post_type: post_type.to_string(),
            author_id: "u1".to_string(),
            author_display_name: "Mary".to_string(),
            author_avatar_url: None,
            title: "Healed".to_string(),
            content: "Thankful".to_string(),
            client_token: None,
            like_count: 3,
            comment_count: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_model_to_post() {
        let post = Post::try_from(model("testimony")).unwrap();
        assert_eq!(post.id, Snowflake::new(7));
        assert_eq!(post.post_type, PostType::Testimony);
        assert_eq!(post.author.display_name, "Mary");
        assert_eq!(post.like_count, 3);
    }

    #[test]
    fn test_unknown_type_is_database_error() {
        let err = Post::try_from(model("sermon")).unwrap_err();
        assert!(matches!(err, DomainError::DatabaseError(_)));
    }
}
