//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that lexicographic order in SQL equals
//! chronological order. Enum columns hold their lowercase string form.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use quad_core::{
  event::AttendanceStatus,
  notification::NotificationKind,
  user::{Profile, UserView},
};
use rusqlite::{Row, types::Type};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current instant, truncated to the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_status(s: AttendanceStatus) -> &'static str { s.into() }

pub fn encode_kind(k: NotificationKind) -> &'static str { k.into() }

fn decode_enum<T: FromStr>(what: &str, s: &str) -> Result<T> {
  T::from_str(s).map_err(|_| Error::Decode(format!("unknown {what}: {s:?}")))
}

// ─── Row accessors ───────────────────────────────────────────────────────────
//
// Row mappers run inside `tokio_rusqlite` closures, so decode failures are
// reported as rusqlite conversion errors carrying our own error as source.

fn conversion_failure(idx: usize, e: Error) -> rusqlite::Error {
  rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub fn dt_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
  let raw: String = row.get(idx)?;
  decode_dt(&raw).map_err(|e| conversion_failure(idx, e))
}

pub fn status_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<AttendanceStatus> {
  let raw: String = row.get(idx)?;
  decode_enum("attendance status", &raw).map_err(|e| conversion_failure(idx, e))
}

pub fn kind_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<NotificationKind> {
  let raw: String = row.get(idx)?;
  decode_enum("notification kind", &raw).map_err(|e| conversion_failure(idx, e))
}

/// `COUNT(*)` columns; never negative.
pub fn count_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
  let n: i64 = row.get(idx)?;
  Ok(n.max(0) as u64)
}

pub fn year_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<u32>> {
  let year: Option<i64> = row.get(idx)?;
  Ok(year.and_then(|y| u32::try_from(y).ok()))
}

// ─── UserView projection ─────────────────────────────────────────────────────

/// Number of columns produced by [`user_columns`].
pub const USER_WIDTH: usize = 14;

/// Select list for a [`UserView`] over a `users` alias `u` joined (LEFT) to a
/// `profiles` alias `p`. Read back with [`user_view_at`].
pub fn user_columns(u: &str, p: &str) -> String {
  format!(
    "{u}.user_id, {u}.seat_number, {u}.full_name, {u}.university_email, {u}.year,
     {u}.department, {p}.bio, {p}.avatar_url, {p}.course, {p}.interests,
     (SELECT COUNT(*) FROM posts   WHERE author_id    = {u}.user_id),
     (SELECT COUNT(*) FROM follows WHERE following_id = {u}.user_id),
     (SELECT COUNT(*) FROM follows WHERE follower_id  = {u}.user_id),
     (SELECT COUNT(*) FROM follows fa
        JOIN follows fb ON fb.follower_id = fa.following_id
                       AND fb.following_id = fa.follower_id
       WHERE fa.follower_id = {u}.user_id)"
  )
}

/// `FROM users u LEFT JOIN profiles p` with the default aliases.
pub const USER_FROM: &str = "users u LEFT JOIN profiles p ON p.user_id = u.user_id";

pub fn user_view_at(row: &Row<'_>, start: usize) -> rusqlite::Result<UserView> {
  let text = |i: usize| -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(start + i)?.unwrap_or_default())
  };
  Ok(UserView {
    id:               row.get(start)?,
    seat_number:      row.get(start + 1)?,
    full_name:        row.get(start + 2)?,
    university_email: row.get(start + 3)?,
    year:             year_at(row, start + 4)?,
    department:       text(5)?,
    profile:          Profile {
      bio:        text(6)?,
      avatar_url: text(7)?,
      course:     text(8)?,
      interests:  text(9)?,
    },
    posts_count:      count_at(row, start + 10)?,
    followers_count:  count_at(row, start + 11)?,
    following_count:  count_at(row, start + 12)?,
    friends_count:    count_at(row, start + 13)?,
  })
}

/// Like [`user_view_at`] for a LEFT-joined user that may be absent.
pub fn opt_user_view_at(row: &Row<'_>, start: usize) -> rusqlite::Result<Option<UserView>> {
  let id: Option<i64> = row.get(start)?;
  match id {
    Some(_) => user_view_at(row, start).map(Some),
    None => Ok(None),
  }
}

// ─── LIKE patterns ───────────────────────────────────────────────────────────

/// Wrap `needle` for a case-insensitive substring match with `ESCAPE '\'`.
pub fn like_pattern(needle: &str) -> String {
  let mut escaped = String::with_capacity(needle.len() + 2);
  escaped.push('%');
  for c in needle.chars() {
    if matches!(c, '%' | '_' | '\\') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped.push('%');
  escaped
}
