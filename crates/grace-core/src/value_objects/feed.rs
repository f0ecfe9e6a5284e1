//! Feed query values: type filter, keyset cursor, and page
//!
//! Feed order is `created_at DESC, id DESC`. A cursor is the sort key of the
//! last item on a page; the next page holds every item strictly below it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Snowflake;
use crate::entities::{Post, PostType};
use crate::error::DomainError;

/// Fixed feed page size; callers cannot change it
pub const FEED_PAGE_SIZE: i64 = 20;

/// Post type filter for feed queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PostFilter {
    #[default]
    All,
    Type(PostType),
}

impl PostFilter {
    /// The type constraint, if any
    #[inline]
    pub fn post_type(self) -> Option<PostType> {
        match self {
            Self::All => None,
            Self::Type(t) => Some(t),
        }
    }

    /// Check whether a post belongs to this filter's result set
    #[inline]
    pub fn matches(self, post: &Post) -> bool {
        self.post_type().map_or(true, |t| post.is_type(t))
    }

    /// Filters whose result sets can contain a post of the given type
    pub fn affected_by(post_type: PostType) -> [PostFilter; 2] {
        [Self::All, Self::Type(post_type)]
    }
}

impl fmt::Display for PostFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Type(t) => t.fmt(f),
        }
    }
}

impl FromStr for PostFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() || s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Type)
        }
    }
}

impl TryFrom<String> for PostFilter {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PostFilter> for String {
    fn from(value: PostFilter) -> Self {
        value.to_string()
    }
}

/// Keyset cursor: the sort key of the last item returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedCursor {
    pub created_at: DateTime<Utc>,
    pub id: Snowflake,
}

impl FeedCursor {
    pub fn new(created_at: DateTime<Utc>, id: Snowflake) -> Self {
        Self {
            created_at: to_store_precision(created_at),
            id,
        }
    }

    /// Cursor pointing just past the given post
    pub fn after(post: &Post) -> Self {
        Self::new(post.created_at, post.id)
    }

    /// Opaque string form handed to clients
    pub fn encode(&self) -> String {
        let raw = format!("{}:{}", self.created_at.timestamp_micros(), self.id);
        URL_SAFE_NO_PAD.encode(raw)
    }

    /// Parse a client-supplied cursor
    pub fn decode(cursor: &str) -> Result<Self, DomainError> {
        let invalid = || DomainError::ValidationError("Invalid cursor".to_string());

        let bytes = URL_SAFE_NO_PAD.decode(cursor.trim()).map_err(|_| invalid())?;
        let raw = String::from_utf8(bytes).map_err(|_| invalid())?;
        let (micros, id) = raw.split_once(':').ok_or_else(invalid)?;

        let micros: i64 = micros.parse().map_err(|_| invalid())?;
        let created_at = DateTime::from_timestamp_micros(micros).ok_or_else(invalid)?;
        let id = Snowflake::parse(id).map_err(|_| invalid())?;

        Ok(Self { created_at, id })
    }

    /// True when `post` sorts strictly after this cursor in feed order
    #[inline]
    pub fn precedes(&self, post: &Post) -> bool {
        (post.created_at, post.id) < (self.created_at, self.id)
    }
}

/// Truncate to the microsecond precision Postgres `timestamptz` keeps, so
/// cursors compare identically against every store.
pub fn to_store_precision(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(ts.timestamp_micros()).unwrap_or(ts)
}

/// One page of an ordered result set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<FeedCursor>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }

    #[inline]
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

impl Page<Post> {
    /// Build a page from up to `limit + 1` rows fetched in feed order.
    ///
    /// The extra row only signals that another page exists and is dropped.
    pub fn from_overfetch(mut rows: Vec<Post>, limit: i64) -> Self {
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let has_more = rows.len() > limit;
        rows.truncate(limit);

        let next_cursor = if has_more {
            rows.last().map(FeedCursor::after)
        } else {
            None
        };

        Self {
            items: rows,
            next_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::AuthorSnapshot;
    use chrono::TimeZone;

    fn post(id: i64, secs: i64) -> Post {
        Post {
            id: Snowflake::new(id),
            post_type: PostType::Prayer,
            author: AuthorSnapshot {
                id: "u".to_string(),
                display_name: "U".to_string(),
                avatar_url: None,
            },
            title: "t".to_string(),
            content: "c".to_string(),
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
            like_count: 0,
            comment_count: 0,
        }
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("all".parse::<PostFilter>().unwrap(), PostFilter::All);
        assert_eq!("".parse::<PostFilter>().unwrap(), PostFilter::All);
        assert_eq!(
            "testimony".parse::<PostFilter>().unwrap(),
            PostFilter::Type(PostType::Testimony)
        );
        assert!("gossip".parse::<PostFilter>().unwrap_err().is_validation());
    }

    #[test]
    fn test_filter_serde() {
        let json = serde_json::to_string(&PostFilter::Type(PostType::Thought)).unwrap();
        assert_eq!(json, "\"thought\"");
        let back: PostFilter = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(back, PostFilter::All);
    }

    #[test]
    fn test_filter_matches() {
        let p = post(1, 100);
        assert!(PostFilter::All.matches(&p));
        assert!(PostFilter::Type(PostType::Prayer).matches(&p));
        assert!(!PostFilter::Type(PostType::Thought).matches(&p));
    }

    #[test]
    fn test_cursor_encode_decode() {
        let cursor = FeedCursor::new(Utc.timestamp_opt(1_750_000_000, 123_456_789).unwrap(), Snowflake::new(77));
        let decoded = FeedCursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded, cursor);
        assert_eq!(decoded.created_at.timestamp_subsec_micros(), 123_456);
    }

    #[test]
    fn test_cursor_rejects_garbage() {
        assert!(FeedCursor::decode("not-a-cursor!").unwrap_err().is_validation());
        assert!(FeedCursor::decode(&URL_SAFE_NO_PAD.encode("12:abc")).is_err());
        assert!(FeedCursor::decode(&URL_SAFE_NO_PAD.encode("nocolon")).is_err());
    }

    #[test]
    fn test_cursor_precedes_breaks_ties_by_id() {
        let cursor = FeedCursor::after(&post(5, 100));
        assert!(cursor.precedes(&post(4, 100)));
        assert!(!cursor.precedes(&post(5, 100)));
        assert!(!cursor.precedes(&post(6, 100)));
        assert!(cursor.precedes(&post(9, 99)));
    }

    #[test]
    fn test_page_from_overfetch() {
        let rows = vec![post(3, 30), post(2, 20), post(1, 10)];
        let page = Page::from_overfetch(rows.clone(), 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next_cursor, Some(FeedCursor::after(&rows[1])));

        let page = Page::from_overfetch(rows, 3);
        assert_eq!(page.items.len(), 3);
        assert!(!page.has_more());
    }
}
