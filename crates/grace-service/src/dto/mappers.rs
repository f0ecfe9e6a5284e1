//! Entity to DTO mappers
//!
//! Implements `From` conversions from domain entities to response DTOs.

use grace_core::entities::{Comment, Post};
use grace_core::value_objects::Page;

use super::responses::{CommentResponse, PostPageResponse, PostResponse};

impl From<&Post> for PostResponse {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.to_string(),
            post_type: post.post_type.as_str().to_string(),
            author_id: post.author.id.clone(),
            author_display_name: post.author.display_name.clone(),
            author_avatar_url: post.author.avatar_url.clone(),
            title: post.title.clone(),
            content: post.content.clone(),
            created_at: post.created_at,
            like_count: post.like_count,
            comment_count: post.comment_count,
        }
    }
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self::from(&post)
    }
}

impl From<&Page<Post>> for PostPageResponse {
    fn from(page: &Page<Post>) -> Self {
        Self {
            items: page.items.iter().map(PostResponse::from).collect(),
            next_cursor: page.next_cursor.map(|c| c.encode()),
        }
    }
}

impl From<Page<Post>> for PostPageResponse {
    fn from(page: Page<Post>) -> Self {
        Self::from(&page)
    }
}

impl From<&Comment> for CommentResponse {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id.to_string(),
            post_id: comment.post_id.to_string(),
            author_id: comment.author.id.clone(),
            author_display_name: comment.author.display_name.clone(),
            author_avatar_url: comment.author.avatar_url.clone(),
            content: comment.content.clone(),
            created_at: comment.created_at,
        }
    }
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self::from(&comment)
    }
}
