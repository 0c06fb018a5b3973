//! [`GraphStore`] for [`SqliteStore`].

use quad_core::{
  Error as CoreError,
  graph::{SUGGESTION_LIMIT, SearchKind, SearchResults},
  notification::{Engagement, NewNotification},
  store::GraphStore,
  user::UserView,
};
use rusqlite::{Connection, Params};

use super::{SqliteStore, content::query_post_views, full_name, insert_notification, user_exists};
use crate::{
  Result,
  encode::{USER_FROM, encode_dt, like_pattern, now, user_columns, user_view_at},
};

/// Run a user-view query whose WHERE/ORDER/LIMIT tail is `tail`.
fn query_users<P: Params>(
  conn: &Connection,
  tail: &str,
  params: P,
) -> rusqlite::Result<Vec<UserView>> {
  let sql = format!("SELECT {} FROM {USER_FROM} {tail}", user_columns("u", "p"));
  let mut stmt = conn.prepare(&sql)?;
  let users = stmt
    .query_map(params, |row| user_view_at(row, 0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(users)
}

impl GraphStore for SqliteStore {
  async fn follow(&self, actor: i64, target: i64) -> Result<Engagement> {
    if actor == target {
      return Err(CoreError::SelfFollow.into());
    }
    let at = now();

    let engagement = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !user_exists(&tx, target)? {
          return Ok(Err(CoreError::not_found("User")));
        }

        let created = tx.execute(
          "INSERT INTO follows (follower_id, following_id, created_at) VALUES (?1, ?2, ?3)
           ON CONFLICT (follower_id, following_id) DO NOTHING",
          rusqlite::params![actor, target, encode_dt(at)],
        )? == 1;

        let notification = if created {
          let name = full_name(&tx, actor)?.unwrap_or_default();
          Some(insert_notification(&tx, NewNotification::followed(target, actor, &name), at)?)
        } else {
          None
        };

        tx.commit()?;
        Ok(Ok(Engagement { created, notification }))
      })
      .await??;

    if engagement.created {
      tracing::debug!(actor, target, "follow recorded");
    }
    Ok(engagement)
  }

  async fn unfollow(&self, actor: i64, target: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        if !user_exists(conn, target)? {
          return Ok(Err(CoreError::not_found("User")));
        }
        conn.execute(
          "DELETE FROM follows WHERE follower_id = ?1 AND following_id = ?2",
          rusqlite::params![actor, target],
        )?;
        Ok(Ok(()))
      })
      .await??;
    Ok(())
  }

  async fn friends(&self, actor: i64) -> Result<Vec<UserView>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(query_users(
            conn,
            "WHERE u.user_id IN (SELECT following_id FROM follows WHERE follower_id = ?1)
               AND u.user_id IN (SELECT follower_id FROM follows WHERE following_id = ?1)
             ORDER BY u.user_id",
            rusqlite::params![actor],
          )?)
        })
        .await?,
    )
  }

  async fn friend_requests(&self, actor: i64) -> Result<Vec<UserView>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(query_users(
            conn,
            "WHERE u.user_id IN (SELECT follower_id FROM follows WHERE following_id = ?1)
               AND u.user_id NOT IN (SELECT following_id FROM follows WHERE follower_id = ?1)
             ORDER BY u.user_id",
            rusqlite::params![actor],
          )?)
        })
        .await?,
    )
  }

  async fn friend_suggestions(&self, actor: i64) -> Result<Vec<UserView>> {
    let limit = SUGGESTION_LIMIT as i64;
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(query_users(
            conn,
            "WHERE u.user_id <> ?1
               AND u.user_id NOT IN (SELECT following_id FROM follows WHERE follower_id = ?1)
             ORDER BY u.user_id
             LIMIT ?2",
            rusqlite::params![actor, limit],
          )?)
        })
        .await?,
    )
  }

  async fn search(&self, actor: i64, query: String, kind: SearchKind) -> Result<SearchResults> {
    let query = query.trim();
    if query.is_empty() {
      return Ok(SearchResults::default());
    }
    let pattern = like_pattern(query);
    let (user_limit, post_limit) = kind.limits();
    let (user_limit, post_limit) = (user_limit as i64, post_limit as i64);

    Ok(
      self
        .conn
        .call(move |conn| {
          let users = if user_limit > 0 {
            query_users(
              conn,
              r"WHERE u.full_name   LIKE ?1 ESCAPE '\'
                   OR u.seat_number LIKE ?1 ESCAPE '\'
                   OR u.department  LIKE ?1 ESCAPE '\'
                ORDER BY u.user_id
                LIMIT ?2",
              rusqlite::params![pattern, user_limit],
            )?
          } else {
            Vec::new()
          };

          let posts = if post_limit > 0 {
            query_post_views(
              conn,
              r"po.content LIKE ?2 ESCAPE '\'",
              "LIMIT ?3",
              rusqlite::params![actor, pattern, post_limit],
            )?
          } else {
            Vec::new()
          };

          Ok(SearchResults { users, posts })
        })
        .await?,
    )
  }
}
