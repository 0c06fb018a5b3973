//! Accounts and profiles.
//!
//! A user is identified by the university-issued seat number, which doubles as
//! the login name. Every user owns exactly one [`Profile`], created alongside
//! the account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, error::require_text};

// ─── Entities ────────────────────────────────────────────────────────────────

/// A stored account. The seat number never changes after registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id:               i64,
  pub seat_number:      String,
  pub full_name:        String,
  pub university_email: Option<String>,
  pub year:             Option<u32>,
  pub department:       String,
  pub created_at:       DateTime<Utc>,
}

/// Free-form profile details owned 1:1 by a [`User`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub bio:        String,
  pub avatar_url: String,
  pub course:     String,
  pub interests:  String,
}

impl Profile {
  /// Overwrite the fields present in `update`, leaving the rest untouched.
  pub fn apply(&mut self, update: ProfileUpdate) {
    if let Some(bio) = update.bio {
      self.bio = bio;
    }
    if let Some(avatar_url) = update.avatar_url {
      self.avatar_url = avatar_url;
    }
    if let Some(course) = update.course {
      self.course = course;
    }
    if let Some(interests) = update.interests {
      self.interests = interests;
    }
  }
}

/// A stored password hash, looked up at login and password change.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub user_id:       i64,
  /// PHC string produced by argon2.
  pub password_hash: String,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::AccountStore::register`]. The password has
/// already been hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub seat_number:      String,
  pub full_name:        String,
  pub university_email: Option<String>,
  pub year:             Option<u32>,
  pub department:       String,
  pub password_hash:    String,
}

impl NewUser {
  /// Trim and check required fields.
  pub fn validate(mut self) -> Result<Self> {
    self.seat_number = require_text("seat_number", &self.seat_number)?;
    self.full_name = require_text("full_name", &self.full_name)?;
    self.department = self.department.trim().to_owned();
    self.university_email = match self.university_email.as_deref().map(str::trim) {
      None | Some("") => None,
      Some(email) => Some(validate_email(email)?),
    };
    Ok(self)
  }
}

/// Partial profile update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
  pub bio:        Option<String>,
  pub avatar_url: Option<String>,
  pub course:     Option<String>,
  pub interests:  Option<String>,
}

/// Normalise and check a university email address.
pub fn validate_email(email: &str) -> Result<String> {
  let email = email.trim();
  if email.is_empty() {
    return Err(Error::validation("Email is required"));
  }
  if !email.contains('@') {
    return Err(Error::validation("Invalid email format"));
  }
  Ok(email.to_owned())
}

// ─── Views ───────────────────────────────────────────────────────────────────

/// The public projection of a user, embedded in every other view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
  pub id:               i64,
  pub seat_number:      String,
  pub full_name:        String,
  pub university_email: Option<String>,
  pub year:             Option<u32>,
  pub department:       String,
  pub profile:          Profile,
  pub posts_count:      u64,
  pub followers_count:  u64,
  pub following_count:  u64,
  /// Users with a follow in both directions.
  pub friends_count:    u64,
}
