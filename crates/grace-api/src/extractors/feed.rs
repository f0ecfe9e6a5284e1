//! Feed query extractor

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use grace_core::PostFilter;
use grace_service::{dto::ListPostsQuery, PostService};

use crate::response::ApiError;

/// `?type=&cursor=` with the filter already parsed
#[derive(Debug, Clone)]
pub struct FeedQuery {
    pub filter: PostFilter,
    pub cursor: Option<String>,
}

impl TryFrom<ListPostsQuery> for FeedQuery {
    type Error = ApiError;

    fn try_from(query: ListPostsQuery) -> Result<Self, Self::Error> {
        let filter = PostService::parse_filter(query.post_type.as_deref())?;
        Ok(Self {
            filter,
            cursor: query.cursor,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for FeedQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<ListPostsQuery>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_query(e.body_text()))?;

        Self::try_from(query)
    }
}
