//! [`MessagingStore`] for [`SqliteStore`].

use quad_core::{
  Error as CoreError,
  message::{Conversation, ConversationView, Message, MessageView, canonical_pair},
  store::MessagingStore,
};
use rusqlite::{Connection, OptionalExtension as _, Params, Row};

use super::{SqliteStore, user_exists};
use crate::{
  Result,
  encode::{USER_WIDTH, count_at, dt_at, encode_dt, now, user_columns, user_view_at},
};

fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<Conversation> {
  Ok(Conversation {
    id:         row.get(0)?,
    user1_id:   row.get(1)?,
    user2_id:   row.get(2)?,
    created_at: dt_at(row, 3)?,
  })
}

fn read_conversation(conn: &Connection, id: i64) -> rusqlite::Result<Option<Conversation>> {
  conn
    .query_row(
      "SELECT conversation_id, user1_id, user2_id, created_at
         FROM conversations WHERE conversation_id = ?1",
      [id],
      conversation_from_row,
    )
    .optional()
}

/// Load a conversation `actor` takes part in.
fn participant_conversation(
  conn: &Connection,
  actor: i64,
  id: i64,
) -> rusqlite::Result<quad_core::Result<Conversation>> {
  Ok(match read_conversation(conn, id)? {
    None => Err(CoreError::not_found("Conversation")),
    Some(c) if !c.has_participant(actor) => Err(CoreError::NotParticipant),
    Some(c) => Ok(c),
  })
}

/// Message views matching `filter`, oldest first.
fn query_message_views<P: Params>(
  conn: &Connection,
  filter: &str,
  params: P,
) -> rusqlite::Result<Vec<MessageView>> {
  let sql = format!(
    "SELECT m.message_id, m.conversation_id, m.text, m.created_at, m.is_read, {}
       FROM messages m
       JOIN users u ON u.user_id = m.sender_id
       LEFT JOIN profiles p ON p.user_id = u.user_id
      WHERE {filter}
      ORDER BY m.created_at, m.message_id",
    user_columns("u", "p"),
  );
  let mut stmt = conn.prepare(&sql)?;
  let messages = stmt
    .query_map(params, |row| {
      Ok(MessageView {
        id:              row.get(0)?,
        conversation_id: row.get(1)?,
        text:            row.get(2)?,
        created_at:      dt_at(row, 3)?,
        is_read:         row.get(4)?,
        sender:          user_view_at(row, 5)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(messages)
}

impl MessagingStore for SqliteStore {
  async fn start_conversation(&self, actor: i64, other: i64) -> Result<Conversation> {
    if actor == other {
      return Err(CoreError::SelfConversation.into());
    }
    let (user1, user2) = canonical_pair(actor, other);
    let at = encode_dt(now());

    Ok(
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction()?;
          if !user_exists(&tx, actor)? || !user_exists(&tx, other)? {
            return Ok(Err(CoreError::not_found("User")));
          }
          tx.execute(
            "INSERT INTO conversations (user1_id, user2_id, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (user1_id, user2_id) DO NOTHING",
            rusqlite::params![user1, user2, at],
          )?;
          let conversation = tx.query_row(
            "SELECT conversation_id, user1_id, user2_id, created_at
               FROM conversations WHERE user1_id = ?1 AND user2_id = ?2",
            rusqlite::params![user1, user2],
            conversation_from_row,
          )?;
          tx.commit()?;
          Ok(Ok(conversation))
        })
        .await??,
    )
  }

  async fn list_conversations(&self, actor: i64) -> Result<Vec<ConversationView>> {
    let sql = format!(
      "SELECT c.conversation_id,
              {},
              (SELECT COUNT(*) FROM messages
                WHERE conversation_id = c.conversation_id AND sender_id <> ?1 AND is_read = 0)
         FROM conversations c
         JOIN users u ON u.user_id = CASE WHEN c.user1_id = ?1 THEN c.user2_id ELSE c.user1_id END
         LEFT JOIN profiles p ON p.user_id = u.user_id
        WHERE ?1 IN (c.user1_id, c.user2_id)
        ORDER BY COALESCE(
                   (SELECT MAX(created_at) FROM messages WHERE conversation_id = c.conversation_id),
                   c.created_at
                 ) DESC,
                 c.conversation_id DESC",
      user_columns("u", "p"),
    );

    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare(&sql)?;
          let rows = stmt
            .query_map([actor], |row| {
              Ok((row.get::<_, i64>(0)?, count_at(row, 1 + USER_WIDTH)?, user_view_at(row, 1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

          let mut views = Vec::with_capacity(rows.len());
          for (id, unread_count, other_user) in rows {
            let last_message = query_message_views(
              conn,
              "m.message_id = (SELECT message_id FROM messages WHERE conversation_id = ?1
                                ORDER BY created_at DESC, message_id DESC LIMIT 1)",
              [id],
            )?
            .pop();
            views.push(ConversationView { id, other_user, last_message, unread_count });
          }
          Ok(views)
        })
        .await?,
    )
  }

  async fn list_messages(&self, actor: i64, conversation_id: i64) -> Result<Vec<MessageView>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction()?;
          if let Err(e) = participant_conversation(&tx, actor, conversation_id)? {
            return Ok(Err(e));
          }
          let marked = tx.execute(
            "UPDATE messages SET is_read = 1
              WHERE conversation_id = ?1 AND sender_id <> ?2 AND is_read = 0",
            rusqlite::params![conversation_id, actor],
          )?;
          if marked > 0 {
            tracing::trace!(conversation_id, marked, "marked messages read");
          }
          let messages =
            query_message_views(&tx, "m.conversation_id = ?1", [conversation_id])?;
          tx.commit()?;
          Ok(Ok(messages))
        })
        .await??,
    )
  }

  async fn send_message(&self, actor: i64, conversation_id: i64, text: String) -> Result<Message> {
    let text = quad_core::error::require_text("text", &text)?;
    let at = now();

    Ok(
      self
        .conn
        .call(move |conn| {
          if let Err(e) = participant_conversation(conn, actor, conversation_id)? {
            return Ok(Err(e));
          }
          conn.execute(
            "INSERT INTO messages (conversation_id, sender_id, text, created_at, is_read)
             VALUES (?1, ?2, ?3, ?4, 0)",
            rusqlite::params![conversation_id, actor, text, encode_dt(at)],
          )?;
          Ok(Ok(Message {
            id: conn.last_insert_rowid(),
            conversation_id,
            sender_id: actor,
            text,
            created_at: at,
            is_read: false,
          }))
        })
        .await??,
    )
  }
}
