//! Actor - the authenticated identity performing an operation

use serde::{Deserialize, Serialize};

/// Identity supplied by the identity collaborator.
///
/// All three fields are opaque; only non-emptiness of `user_id` and
/// `display_name` is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Actor {
    pub fn new(
        user_id: impl Into<String>,
        display_name: impl Into<String>,
        avatar_url: Option<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            avatar_url: avatar_url.filter(|url| !url.trim().is_empty()),
        }
    }

    /// An actor with an empty user id counts as anonymous
    #[inline]
    pub fn is_authenticated(&self) -> bool {
        !self.user_id.trim().is_empty()
    }

    /// Display name, falling back to the user id when blank
    pub fn display_name_or_id(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.user_id
        } else {
            &self.display_name
        }
    }
}
