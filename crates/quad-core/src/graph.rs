//! The follow graph and user/post search.

use serde::{Deserialize, Serialize};

use crate::{post::PostView, user::UserView};

/// Maximum number of users returned by friend suggestions.
pub const SUGGESTION_LIMIT: usize = 20;

// ─── Search ──────────────────────────────────────────────────────────────────

/// Which collections a search covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchKind {
  #[default]
  Users,
  Posts,
  All,
}

impl SearchKind {
  /// Parse the `type` query parameter. Missing means users; anything that is
  /// neither `users` nor `posts` means both.
  pub fn from_param(param: Option<&str>) -> Self {
    match param {
      None | Some("users") => Self::Users,
      Some("posts") => Self::Posts,
      Some(_) => Self::All,
    }
  }

  /// `(user_limit, post_limit)`; a zero limit skips that collection.
  pub fn limits(self) -> (usize, usize) {
    match self {
      Self::Users => (20, 0),
      Self::Posts => (0, 20),
      Self::All => (10, 10),
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
  pub users: Vec<UserView>,
  pub posts: Vec<PostView>,
}
