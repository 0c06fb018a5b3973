//! [`ContentStore`] for [`SqliteStore`]: posts, comments, stories and story
//! replies.

use chrono::{DateTime, Utc};
use quad_core::{
  Error as CoreError,
  notification::{Engagement, NewNotification, Notification},
  post::{Comment, CommentView, NewComment, NewPost, Post, PostUpdate, PostView},
  store::ContentStore,
  story::{NewStory, NewStoryReply, Story, StoryReply, StoryReplyView, StoryView, story_ttl},
};
use rusqlite::{Connection, OptionalExtension as _, Params, Row};

use super::{
  COMMENT, POST, STORY, STORY_REPLY, SqliteStore, check_owner, delete_owned, full_name,
  insert_notification, is_following, require_row,
};
use crate::{
  Result,
  encode::{count_at, dt_at, encode_dt, now, user_columns, user_view_at},
};

// ─── Post views ──────────────────────────────────────────────────────────────

/// Posts as seen by viewer `?1`, filtered by `filter` and newest first.
/// `tail` may add a LIMIT.
pub(super) fn query_post_views<P: Params>(
  conn: &Connection,
  filter: &str,
  tail: &str,
  params: P,
) -> rusqlite::Result<Vec<PostView>> {
  let sql = format!(
    "SELECT po.post_id, po.content, po.image_url, po.event_id, po.created_at, po.updated_at,
            (SELECT COUNT(*) FROM post_likes WHERE post_id = po.post_id),
            (SELECT COUNT(*) FROM comments   WHERE post_id = po.post_id),
            EXISTS (SELECT 1 FROM post_likes WHERE post_id = po.post_id AND user_id = ?1),
            po.author_id = ?1,
            {}
       FROM posts po
       JOIN users u ON u.user_id = po.author_id
       LEFT JOIN profiles p ON p.user_id = u.user_id
      WHERE {filter}
      ORDER BY po.created_at DESC, po.post_id DESC
      {tail}",
    user_columns("u", "p"),
  );
  let mut stmt = conn.prepare(&sql)?;
  let views = stmt
    .query_map(params, post_view_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(views)
}

fn post_view_from_row(row: &Row<'_>) -> rusqlite::Result<PostView> {
  Ok(PostView {
    id:            row.get(0)?,
    content:       row.get(1)?,
    image_url:     row.get(2)?,
    event_id:      row.get(3)?,
    created_at:    dt_at(row, 4)?,
    updated_at:    dt_at(row, 5)?,
    like_count:    count_at(row, 6)?,
    comment_count: count_at(row, 7)?,
    is_liked:      row.get(8)?,
    is_author:     row.get(9)?,
    author:        user_view_at(row, 10)?,
  })
}

fn read_post(conn: &Connection, post_id: i64) -> rusqlite::Result<Option<Post>> {
  conn
    .query_row(
      "SELECT post_id, author_id, content, image_url, event_id, created_at, updated_at
         FROM posts WHERE post_id = ?1",
      rusqlite::params![post_id],
      |row| {
        Ok(Post {
          id:         row.get(0)?,
          author_id:  row.get(1)?,
          content:    row.get(2)?,
          image_url:  row.get(3)?,
          event_id:   row.get(4)?,
          created_at: dt_at(row, 5)?,
          updated_at: dt_at(row, 6)?,
        })
      },
    )
    .optional()
}

// ─── Comment and story views ─────────────────────────────────────────────────

fn comment_view_from_row(row: &Row<'_>) -> rusqlite::Result<CommentView> {
  Ok(CommentView {
    id:         row.get(0)?,
    post_id:    row.get(1)?,
    content:    row.get(2)?,
    parent_id:  row.get(3)?,
    created_at: dt_at(row, 4)?,
    like_count: count_at(row, 5)?,
    author:     user_view_at(row, 6)?,
  })
}

fn story_view_from_row(row: &Row<'_>) -> rusqlite::Result<StoryView> {
  Ok(StoryView {
    id:          row.get(0)?,
    image_url:   row.get(1)?,
    created_at:  dt_at(row, 2)?,
    expires_at:  dt_at(row, 3)?,
    like_count:  count_at(row, 4)?,
    is_liked:    row.get(5)?,
    reply_count: count_at(row, 6)?,
    author:      user_view_at(row, 7)?,
  })
}

/// Whether `actor` may currently see `story_id`: it has not expired and its
/// author is `actor` or someone `actor` follows.
fn story_visible(
  conn: &Connection,
  actor: i64,
  story_id: i64,
  at: DateTime<Utc>,
) -> rusqlite::Result<bool> {
  let row = conn
    .query_row(
      "SELECT author_id, expires_at FROM stories WHERE story_id = ?1",
      rusqlite::params![story_id],
      |row| Ok((row.get::<_, i64>(0)?, dt_at(row, 1)?)),
    )
    .optional()?;
  let Some((author, expires_at)) = row else {
    return Ok(false);
  };
  Ok(at < expires_at && (author == actor || is_following(conn, actor, author)?))
}

impl ContentStore for SqliteStore {
  // ─── Posts ─────────────────────────────────────────────────────────────────

  async fn create_post(&self, actor: i64, input: NewPost) -> Result<Post> {
    let input = input.validate()?;
    let at = now();

    let post = self
      .conn
      .call(move |conn| {
        let event_id = match input.event_id {
          Some(id) => conn
            .query_row("SELECT event_id FROM events WHERE event_id = ?1", [id], |r| r.get(0))
            .optional()?,
          None => None,
        };
        conn.execute(
          "INSERT INTO posts (author_id, content, image_url, event_id, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          rusqlite::params![actor, input.content, input.image_url, event_id, encode_dt(at)],
        )?;
        Ok(Post {
          id: conn.last_insert_rowid(),
          author_id: actor,
          content: input.content,
          image_url: input.image_url,
          event_id,
          created_at: at,
          updated_at: at,
        })
      })
      .await?;

    tracing::debug!(post_id = post.id, author_id = actor, "created post");
    Ok(post)
  }

  async fn list_posts(&self, actor: i64, author: Option<i64>) -> Result<Vec<PostView>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(query_post_views(
            conn,
            "(?2 IS NULL OR po.author_id = ?2)",
            "",
            rusqlite::params![actor, author],
          )?)
        })
        .await?,
    )
  }

  async fn get_post(&self, actor: i64, post_id: i64) -> Result<Option<PostView>> {
    let mut views = self
      .conn
      .call(move |conn| {
        Ok(query_post_views(conn, "po.post_id = ?2", "", rusqlite::params![actor, post_id])?)
      })
      .await?;
    Ok(views.pop())
  }

  async fn edit_post(&self, actor: i64, post_id: i64, update: PostUpdate) -> Result<Post> {
    let update = update.validate()?;
    let at = now();

    Ok(
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction()?;
          if let Err(e) = check_owner(
            &tx,
            &POST,
            post_id,
            actor,
            "You do not have permission to edit this post.",
          )? {
            return Ok(Err(e));
          }
          let Some(mut post) = read_post(&tx, post_id)? else {
            return Ok(Err(CoreError::not_found("Post")));
          };

          if let Some(content) = update.content {
            post.content = content;
          }
          if let Some(image_url) = update.image_url {
            let image_url = image_url.trim();
            post.image_url = (!image_url.is_empty()).then(|| image_url.to_owned());
          }
          post.updated_at = at;

          tx.execute(
            "UPDATE posts SET content = ?1, image_url = ?2, updated_at = ?3 WHERE post_id = ?4",
            rusqlite::params![post.content, post.image_url, encode_dt(at), post_id],
          )?;
          tx.commit()?;
          Ok(Ok(post))
        })
        .await??,
    )
  }

  async fn delete_post(&self, actor: i64, post_id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        Ok(delete_owned(
          conn,
          &POST,
          post_id,
          actor,
          "You do not have permission to delete this post.",
        )?)
      })
      .await??;
    tracing::debug!(post_id, "deleted post");
    Ok(())
  }

  async fn like_post(&self, actor: i64, post_id: i64) -> Result<Engagement> {
    let at = now();
    Ok(
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction()?;
          let author = match require_row(&tx, &POST, post_id)? {
            Ok(author) => author,
            Err(e) => return Ok(Err(e)),
          };

          let created = tx.execute(
            "INSERT OR IGNORE INTO post_likes (user_id, post_id, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![actor, post_id, encode_dt(at)],
          )? == 1;

          let notification = if created && author != actor {
            let name = full_name(&tx, actor)?.unwrap_or_default();
            Some(insert_notification(
              &tx,
              NewNotification::post_liked(author, actor, &name, post_id),
              at,
            )?)
          } else {
            None
          };

          tx.commit()?;
          Ok(Ok(Engagement { created, notification }))
        })
        .await??,
    )
  }

  async fn unlike_post(&self, actor: i64, post_id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        if let Err(e) = require_row(conn, &POST, post_id)? {
          return Ok(Err(e));
        }
        conn.execute(
          "DELETE FROM post_likes WHERE user_id = ?1 AND post_id = ?2",
          rusqlite::params![actor, post_id],
        )?;
        Ok(Ok(()))
      })
      .await??;
    Ok(())
  }

  // ─── Comments ──────────────────────────────────────────────────────────────

  async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>> {
    let sql = format!(
      "SELECT c.comment_id, c.post_id, c.content, c.parent_id, c.created_at,
              (SELECT COUNT(*) FROM comment_likes WHERE comment_id = c.comment_id),
              {}
         FROM comments c
         JOIN users u ON u.user_id = c.author_id
         LEFT JOIN profiles p ON p.user_id = u.user_id
        WHERE c.post_id = ?1 AND c.parent_id IS NULL
        ORDER BY c.created_at, c.comment_id",
      user_columns("u", "p"),
    );
    Ok(
      self
        .conn
        .call(move |conn| {
          if let Err(e) = require_row(conn, &POST, post_id)? {
            return Ok(Err(e));
          }
          let mut stmt = conn.prepare(&sql)?;
          let comments = stmt
            .query_map([post_id], comment_view_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(Ok(comments))
        })
        .await??,
    )
  }

  async fn create_comment(
    &self,
    actor: i64,
    input: NewComment,
  ) -> Result<(Comment, Option<Notification>)> {
    let input = input.validate()?;
    let at = now();

    Ok(
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction()?;
          let author = match require_row(&tx, &POST, input.post_id)? {
            Ok(author) => author,
            Err(e) => return Ok(Err(e)),
          };

          if let Some(parent_id) = input.parent_id {
            let parent_post: Option<i64> = tx
              .query_row(
                "SELECT post_id FROM comments WHERE comment_id = ?1",
                [parent_id],
                |r| r.get(0),
              )
              .optional()?;
            match parent_post {
              None => return Ok(Err(CoreError::not_found("Parent comment"))),
              Some(p) if p != input.post_id => {
                return Ok(Err(CoreError::validation(
                  "Parent comment belongs to a different post",
                )));
              }
              Some(_) => {}
            }
          }

          tx.execute(
            "INSERT INTO comments (post_id, author_id, content, parent_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![input.post_id, actor, input.content, input.parent_id, encode_dt(at)],
          )?;
          let comment = Comment {
            id:         tx.last_insert_rowid(),
            post_id:    input.post_id,
            author_id:  actor,
            content:    input.content,
            parent_id:  input.parent_id,
            created_at: at,
          };

          let notification = if author != actor {
            let name = full_name(&tx, actor)?.unwrap_or_default();
            Some(insert_notification(
              &tx,
              NewNotification::commented(author, actor, &name, comment.post_id),
              at,
            )?)
          } else {
            None
          };

          tx.commit()?;
          Ok(Ok((comment, notification)))
        })
        .await??,
    )
  }

  async fn delete_comment(&self, actor: i64, comment_id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        Ok(delete_owned(
          conn,
          &COMMENT,
          comment_id,
          actor,
          "You do not have permission to delete this comment.",
        )?)
      })
      .await??;
    Ok(())
  }

  async fn like_comment(&self, actor: i64, comment_id: i64) -> Result<bool> {
    let at = encode_dt(now());
    Ok(
      self
        .conn
        .call(move |conn| {
          if let Err(e) = require_row(conn, &COMMENT, comment_id)? {
            return Ok(Err(e));
          }
          let created = conn.execute(
            "INSERT OR IGNORE INTO comment_likes (user_id, comment_id, created_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![actor, comment_id, at],
          )? == 1;
          Ok(Ok(created))
        })
        .await??,
    )
  }

  async fn unlike_comment(&self, actor: i64, comment_id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        if let Err(e) = require_row(conn, &COMMENT, comment_id)? {
          return Ok(Err(e));
        }
        conn.execute(
          "DELETE FROM comment_likes WHERE user_id = ?1 AND comment_id = ?2",
          rusqlite::params![actor, comment_id],
        )?;
        Ok(Ok(()))
      })
      .await??;
    Ok(())
  }

  // ─── Stories ───────────────────────────────────────────────────────────────

  async fn create_story(&self, actor: i64, input: NewStory) -> Result<Story> {
    let input = input.validate()?;
    let created_at = now();
    let expires_at = created_at + story_ttl();

    Ok(
      self
        .conn
        .call(move |conn| {
          conn.execute(
            "INSERT INTO stories (author_id, image_url, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![actor, input.image_url, encode_dt(created_at), encode_dt(expires_at)],
          )?;
          Ok(Story {
            id: conn.last_insert_rowid(),
            author_id: actor,
            image_url: input.image_url,
            created_at,
            expires_at,
          })
        })
        .await?,
    )
  }

  async fn list_stories(
    &self,
    actor: i64,
    as_of: Option<DateTime<Utc>>,
  ) -> Result<Vec<StoryView>> {
    let as_of = encode_dt(as_of.unwrap_or_else(now));
    let sql = format!(
      "SELECT s.story_id, s.image_url, s.created_at, s.expires_at,
              (SELECT COUNT(*) FROM story_likes   WHERE story_id = s.story_id),
              EXISTS (SELECT 1 FROM story_likes   WHERE story_id = s.story_id AND user_id = ?1),
              (SELECT COUNT(*) FROM story_replies WHERE story_id = s.story_id),
              {}
         FROM stories s
         JOIN users u ON u.user_id = s.author_id
         LEFT JOIN profiles p ON p.user_id = u.user_id
        WHERE s.expires_at > ?2
          AND (s.author_id = ?1
               OR s.author_id IN (SELECT following_id FROM follows WHERE follower_id = ?1))
        ORDER BY s.created_at DESC, s.story_id DESC",
      user_columns("u", "p"),
    );
    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare(&sql)?;
          let stories = stmt
            .query_map(rusqlite::params![actor, as_of], story_view_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(stories)
        })
        .await?,
    )
  }

  async fn delete_story(&self, actor: i64, story_id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        Ok(delete_owned(
          conn,
          &STORY,
          story_id,
          actor,
          "You do not have permission to delete this story.",
        )?)
      })
      .await??;
    Ok(())
  }

  async fn like_story(&self, actor: i64, story_id: i64) -> Result<bool> {
    let at = now();
    Ok(
      self
        .conn
        .call(move |conn| {
          if !story_visible(conn, actor, story_id, at)? {
            return Ok(Err(CoreError::not_found("Story")));
          }
          let created = conn.execute(
            "INSERT OR IGNORE INTO story_likes (user_id, story_id, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![actor, story_id, encode_dt(at)],
          )? == 1;
          Ok(Ok(created))
        })
        .await??,
    )
  }

  async fn unlike_story(&self, actor: i64, story_id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        if let Err(e) = require_row(conn, &STORY, story_id)? {
          return Ok(Err(e));
        }
        conn.execute(
          "DELETE FROM story_likes WHERE user_id = ?1 AND story_id = ?2",
          rusqlite::params![actor, story_id],
        )?;
        Ok(Ok(()))
      })
      .await??;
    Ok(())
  }

  // ─── Story replies ─────────────────────────────────────────────────────────

  async fn list_story_replies(&self, story_id: i64) -> Result<Vec<StoryReplyView>> {
    let sql = format!(
      "SELECT r.reply_id, r.story_id, r.content, r.created_at, {}
         FROM story_replies r
         JOIN users u ON u.user_id = r.author_id
         LEFT JOIN profiles p ON p.user_id = u.user_id
        WHERE r.story_id = ?1
        ORDER BY r.created_at, r.reply_id",
      user_columns("u", "p"),
    );
    Ok(
      self
        .conn
        .call(move |conn| {
          if let Err(e) = require_row(conn, &STORY, story_id)? {
            return Ok(Err(e));
          }
          let mut stmt = conn.prepare(&sql)?;
          let replies = stmt
            .query_map([story_id], |row| {
              Ok(StoryReplyView {
                id:         row.get(0)?,
                story_id:   row.get(1)?,
                content:    row.get(2)?,
                created_at: dt_at(row, 3)?,
                author:     user_view_at(row, 4)?,
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(Ok(replies))
        })
        .await??,
    )
  }

  async fn create_story_reply(&self, actor: i64, input: NewStoryReply) -> Result<StoryReply> {
    let input = input.validate()?;
    let at = now();
    Ok(
      self
        .conn
        .call(move |conn| {
          if let Err(e) = require_row(conn, &STORY, input.story_id)? {
            return Ok(Err(e));
          }
          conn.execute(
            "INSERT INTO story_replies (story_id, author_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![input.story_id, actor, input.content, encode_dt(at)],
          )?;
          Ok(Ok(StoryReply {
            id:         conn.last_insert_rowid(),
            story_id:   input.story_id,
            author_id:  actor,
            content:    input.content,
            created_at: at,
          }))
        })
        .await??,
    )
  }

  async fn delete_story_reply(&self, actor: i64, reply_id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        Ok(delete_owned(
          conn,
          &STORY_REPLY,
          reply_id,
          actor,
          "You do not have permission to delete this reply.",
        )?)
      })
      .await??;
    Ok(())
  }
}
