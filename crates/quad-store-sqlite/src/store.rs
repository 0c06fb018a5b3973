//! [`SqliteStore`]: the SQLite implementation of the `quad_core` store traits.
//!
//! The trait impls are split by component under `store/`. Closures passed to
//! [`tokio_rusqlite::Connection::call`] return `quad_core::Result<T>` as their
//! success value, so a domain rejection discovered mid-transaction rolls the
//! transaction back and surfaces through `.await??`.

mod accounts;
mod content;
mod events;
mod graph;
mod messaging;
mod notifications;

use std::path::Path;

use chrono::{DateTime, Utc};
use quad_core::notification::{NewNotification, Notification};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  Result,
  encode::{encode_dt, encode_kind},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Quad social store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Shared statements ───────────────────────────────────────────────────────

fn user_exists(conn: &Connection, user_id: i64) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM users WHERE user_id = ?1",
        rusqlite::params![user_id],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

/// The display name used in notification texts.
fn full_name(conn: &Connection, user_id: i64) -> rusqlite::Result<Option<String>> {
  conn
    .query_row(
      "SELECT full_name FROM users WHERE user_id = ?1",
      rusqlite::params![user_id],
      |r| r.get(0),
    )
    .optional()
}

fn is_following(conn: &Connection, follower: i64, following: i64) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM follows WHERE follower_id = ?1 AND following_id = ?2",
        rusqlite::params![follower, following],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

/// Append a notification row and return it.
fn insert_notification(
  conn: &Connection,
  input: NewNotification,
  at: DateTime<Utc>,
) -> rusqlite::Result<Notification> {
  conn.execute(
    "INSERT INTO notifications (user_id, actor_id, kind, text, related_object_id, is_read, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
    rusqlite::params![
      input.user_id,
      input.actor_id,
      encode_kind(input.kind),
      input.text,
      input.related_object_id,
      encode_dt(at),
    ],
  )?;

  Ok(Notification {
    id:                conn.last_insert_rowid(),
    user_id:           input.user_id,
    actor_id:          input.actor_id,
    kind:              input.kind,
    text:              input.text,
    related_object_id: input.related_object_id,
    is_read:           false,
    created_at:        at,
  })
}

// ─── Ownership checks ────────────────────────────────────────────────────────

/// Where a row's owning user is recorded.
struct Owned {
  table: &'static str,
  key:   &'static str,
  owner: &'static str,
  /// Capitalised noun used in not-found messages.
  noun:  &'static str,
}

const POST: Owned = Owned { table: "posts", key: "post_id", owner: "author_id", noun: "Post" };
const COMMENT: Owned =
  Owned { table: "comments", key: "comment_id", owner: "author_id", noun: "Comment" };
const STORY: Owned = Owned { table: "stories", key: "story_id", owner: "author_id", noun: "Story" };
const STORY_REPLY: Owned =
  Owned { table: "story_replies", key: "reply_id", owner: "author_id", noun: "Story reply" };
const EVENT: Owned = Owned { table: "events", key: "event_id", owner: "created_by", noun: "Event" };

/// The owner of row `id`, or `None` if the row does not exist.
fn owner_of(conn: &Connection, of: &Owned, id: i64) -> rusqlite::Result<Option<i64>> {
  let sql = format!("SELECT {} FROM {} WHERE {} = ?1", of.owner, of.table, of.key);
  conn.query_row(&sql, rusqlite::params![id], |r| r.get(0)).optional()
}

/// Not-found if the row is missing, permission-denied (with `denied`) if
/// `actor` does not own it.
fn check_owner(
  conn: &Connection,
  of: &Owned,
  id: i64,
  actor: i64,
  denied: &str,
) -> rusqlite::Result<quad_core::Result<()>> {
  Ok(match owner_of(conn, of, id)? {
    None => Err(quad_core::Error::not_found(of.noun)),
    Some(owner) if owner != actor => Err(quad_core::Error::permission(denied)),
    Some(_) => Ok(()),
  })
}

/// Existence check for rows addressed by id.
fn require_row(conn: &Connection, of: &Owned, id: i64) -> rusqlite::Result<quad_core::Result<i64>> {
  Ok(owner_of(conn, of, id)?.ok_or_else(|| quad_core::Error::not_found(of.noun)))
}

/// Delete row `id` after an ownership check.
fn delete_owned(
  conn: &Connection,
  of: &Owned,
  id: i64,
  actor: i64,
  denied: &str,
) -> rusqlite::Result<quad_core::Result<()>> {
  if let Err(e) = check_owner(conn, of, id, actor, denied)? {
    return Ok(Err(e));
  }
  let sql = format!("DELETE FROM {} WHERE {} = ?1", of.table, of.key);
  conn.execute(&sql, rusqlite::params![id])?;
  Ok(Ok(()))
}
