//! Identifier parsing shared by services and the outer surfaces

use grace_core::Snowflake;

use super::error::{ServiceError, ServiceResult};

/// Parse a caller-supplied post id.
///
/// An empty or malformed id cannot name any post, so it is `NotFound`
/// rather than a validation failure.
pub fn parse_post_id(raw: &str) -> ServiceResult<Snowflake> {
    Snowflake::parse(raw).map_err(|_| ServiceError::not_found("Post", raw.trim()))
}

/// Normalize an optional user id; blank counts as anonymous
pub(crate) fn normalize_user_id(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(parse_post_id("123").unwrap(), Snowflake::new(123));
        assert_eq!(parse_post_id(" 42 ").unwrap(), Snowflake::new(42));
    }

    #[test]
    fn test_parse_empty_is_not_found() {
        assert!(parse_post_id("").unwrap_err().is_not_found());
        assert!(parse_post_id("   ").unwrap_err().is_not_found());
    }

    #[test]
    fn test_parse_garbage_is_not_found() {
        assert!(parse_post_id("abc").unwrap_err().is_not_found());
        assert!(parse_post_id("-5").unwrap_err().is_not_found());
        assert!(parse_post_id("0").unwrap_err().is_not_found());
    }

    #[test]
    fn test_normalize_user_id() {
        assert_eq!(normalize_user_id(Some("u1")), Some("u1"));
        assert_eq!(normalize_user_id(Some("  ")), None);
        assert_eq!(normalize_user_id(None), None);
    }
}
