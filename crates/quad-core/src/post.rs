//! Posts and threaded comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, error::require_text, user::UserView};

// ─── Posts ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
  pub id:         i64,
  pub author_id:  i64,
  pub content:    String,
  pub image_url:  Option<String>,
  /// Set to `None` when the linked event is deleted.
  pub event_id:   Option<i64>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Input to [`crate::store::ContentStore::create_post`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
  pub content:   String,
  #[serde(default)]
  pub image_url: Option<String>,
  /// An event id that does not resolve is dropped, not rejected.
  #[serde(default)]
  pub event_id:  Option<i64>,
}

impl NewPost {
  pub fn validate(mut self) -> Result<Self> {
    self.content = require_text("content", &self.content)?;
    self.image_url = blank_to_none(self.image_url);
    Ok(self)
  }
}

/// Partial edit applied by the post's author.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostUpdate {
  pub content:   Option<String>,
  pub image_url: Option<String>,
}

impl PostUpdate {
  pub fn validate(mut self) -> Result<Self> {
    if let Some(content) = &self.content {
      self.content = Some(require_text("content", content)?);
    }
    Ok(self)
  }
}

/// A post as seen by a particular viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostView {
  pub id:            i64,
  pub author:        UserView,
  pub content:       String,
  pub image_url:     Option<String>,
  pub event_id:      Option<i64>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
  pub like_count:    u64,
  pub comment_count: u64,
  pub is_liked:      bool,
  pub is_author:     bool,
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
  pub id:         i64,
  pub post_id:    i64,
  pub author_id:  i64,
  pub content:    String,
  /// The comment this one replies to; always on the same post.
  pub parent_id:  Option<i64>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
  #[serde(rename = "post")]
  pub post_id:   i64,
  pub content:   String,
  #[serde(default, rename = "parent")]
  pub parent_id: Option<i64>,
}

impl NewComment {
  pub fn validate(mut self) -> Result<Self> {
    self.content = require_text("content", &self.content)?;
    Ok(self)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
  pub id:         i64,
  pub post_id:    i64,
  pub author:     UserView,
  pub content:    String,
  pub parent_id:  Option<i64>,
  pub created_at: DateTime<Utc>,
  pub like_count: u64,
}

pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
}
