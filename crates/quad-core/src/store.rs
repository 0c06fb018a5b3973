//! Store traits implemented by storage backends (e.g. `quad-store-sqlite`).
//!
//! Every operation takes the acting user as an explicit `actor` argument and
//! enforces its own ownership/participancy rule, returning the domain
//! [`crate::Error`] wrapped in the backend's error type. Engagement operations
//! (follow, post like, comment, RSVP) insert their notification in the same
//! unit of work as the primary mutation and hand it back to the caller so it
//! can be pushed.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  event::{AttendanceStatus, Event, EventUpdate, EventView, NewEvent},
  graph::{SearchKind, SearchResults},
  message::{Conversation, ConversationView, Message, MessageView},
  notification::{Engagement, NewNotification, Notification, NotificationView, PushToken},
  post::{Comment, CommentView, NewComment, NewPost, Post, PostUpdate, PostView},
  story::{NewStory, NewStoryReply, Story, StoryReply, StoryReplyView, StoryView},
  user::{Credentials, NewUser, Profile, ProfileUpdate, User, UserView},
};

/// Backend error types expose the domain rule they report, if any, so callers
/// can tell "not allowed" from "storage broke".
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn domain(&self) -> Option<&crate::Error>;
}

// ─── Accounts ────────────────────────────────────────────────────────────────

pub trait AccountStore: Send + Sync {
  type Error: StoreError;

  /// Create a user and its empty profile. Fails with
  /// [`crate::Error::SeatNumberTaken`] on a duplicate seat number.
  fn register(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn credentials_by_seat(
    &self,
    seat_number: String,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + '_;

  fn credentials_by_id(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + '_;

  fn set_password_hash(
    &self,
    user_id: i64,
    password_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Persist the digest of a freshly issued bearer token.
  fn create_session(
    &self,
    user_id: i64,
    token_digest: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Resolve a token digest to its user, if the session exists.
  fn session_user(
    &self,
    token_digest: String,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  /// Returns `None` if the user does not exist.
  fn get_user(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<Option<UserView>, Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    actor: i64,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  fn update_profile(
    &self,
    actor: i64,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  /// Validate and store a new university email; returns the stored value.
  fn update_email(
    &self,
    actor: i64,
    email: String,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;
}

// ─── Follow graph ────────────────────────────────────────────────────────────

pub trait GraphStore: AccountStore {
  /// Idempotently follow `target`; only the inserting call notifies.
  fn follow(
    &self,
    actor: i64,
    target: i64,
  ) -> impl Future<Output = Result<Engagement, Self::Error>> + Send + '_;

  /// Remove the edge if present.
  fn unfollow(
    &self,
    actor: i64,
    target: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Users with a follow in both directions.
  fn friends(
    &self,
    actor: i64,
  ) -> impl Future<Output = Result<Vec<UserView>, Self::Error>> + Send + '_;

  /// Users who follow `actor` but whom `actor` does not follow back.
  fn friend_requests(
    &self,
    actor: i64,
  ) -> impl Future<Output = Result<Vec<UserView>, Self::Error>> + Send + '_;

  /// Up to [`crate::graph::SUGGESTION_LIMIT`] users `actor` does not follow.
  fn friend_suggestions(
    &self,
    actor: i64,
  ) -> impl Future<Output = Result<Vec<UserView>, Self::Error>> + Send + '_;

  fn search(
    &self,
    actor: i64,
    query: String,
    kind: SearchKind,
  ) -> impl Future<Output = Result<SearchResults, Self::Error>> + Send + '_;
}

// ─── Content ─────────────────────────────────────────────────────────────────

pub trait ContentStore: AccountStore {
  fn create_post(
    &self,
    actor: i64,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  /// Newest first, optionally restricted to one author.
  fn list_posts(
    &self,
    actor: i64,
    author: Option<i64>,
  ) -> impl Future<Output = Result<Vec<PostView>, Self::Error>> + Send + '_;

  fn get_post(
    &self,
    actor: i64,
    post_id: i64,
  ) -> impl Future<Output = Result<Option<PostView>, Self::Error>> + Send + '_;

  fn edit_post(
    &self,
    actor: i64,
    post_id: i64,
    update: PostUpdate,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  fn delete_post(
    &self,
    actor: i64,
    post_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn like_post(
    &self,
    actor: i64,
    post_id: i64,
  ) -> impl Future<Output = Result<Engagement, Self::Error>> + Send + '_;

  fn unlike_post(
    &self,
    actor: i64,
    post_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Top-level comments of a post, oldest first.
  fn list_comments(
    &self,
    post_id: i64,
  ) -> impl Future<Output = Result<Vec<CommentView>, Self::Error>> + Send + '_;

  /// Returns the comment and the notification sent to the post's author.
  fn create_comment(
    &self,
    actor: i64,
    input: NewComment,
  ) -> impl Future<Output = Result<(Comment, Option<Notification>), Self::Error>> + Send + '_;

  fn delete_comment(
    &self,
    actor: i64,
    comment_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Returns whether a like row was inserted.
  fn like_comment(
    &self,
    actor: i64,
    comment_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn unlike_comment(
    &self,
    actor: i64,
    comment_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn create_story(
    &self,
    actor: i64,
    input: NewStory,
  ) -> impl Future<Output = Result<Story, Self::Error>> + Send + '_;

  /// Unexpired stories by `actor` or anyone `actor` follows, newest first.
  ///
  /// `as_of` defaults to now.
  fn list_stories(
    &self,
    actor: i64,
    as_of: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Vec<StoryView>, Self::Error>> + Send + '_;

  fn delete_story(
    &self,
    actor: i64,
    story_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Like a story visible to `actor`; returns whether a row was inserted.
  fn like_story(
    &self,
    actor: i64,
    story_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn unlike_story(
    &self,
    actor: i64,
    story_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Oldest first.
  fn list_story_replies(
    &self,
    story_id: i64,
  ) -> impl Future<Output = Result<Vec<StoryReplyView>, Self::Error>> + Send + '_;

  fn create_story_reply(
    &self,
    actor: i64,
    input: NewStoryReply,
  ) -> impl Future<Output = Result<StoryReply, Self::Error>> + Send + '_;

  fn delete_story_reply(
    &self,
    actor: i64,
    reply_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Messaging ───────────────────────────────────────────────────────────────

pub trait MessagingStore: AccountStore {
  /// Get or create the single conversation between `actor` and `other`.
  fn start_conversation(
    &self,
    actor: i64,
    other: i64,
  ) -> impl Future<Output = Result<Conversation, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_conversations(
    &self,
    actor: i64,
  ) -> impl Future<Output = Result<Vec<ConversationView>, Self::Error>> + Send + '_;

  /// Oldest first. Marks every unread message not sent by `actor` as read.
  fn list_messages(
    &self,
    actor: i64,
    conversation_id: i64,
  ) -> impl Future<Output = Result<Vec<MessageView>, Self::Error>> + Send + '_;

  fn send_message(
    &self,
    actor: i64,
    conversation_id: i64,
    text: String,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;
}

// ─── Events ──────────────────────────────────────────────────────────────────

pub trait EventStore: AccountStore {
  fn create_event(
    &self,
    actor: i64,
    input: NewEvent,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Latest start date first.
  fn list_events(
    &self,
    actor: i64,
  ) -> impl Future<Output = Result<Vec<EventView>, Self::Error>> + Send + '_;

  fn get_event(
    &self,
    actor: i64,
    event_id: i64,
  ) -> impl Future<Output = Result<Option<EventView>, Self::Error>> + Send + '_;

  fn update_event(
    &self,
    actor: i64,
    event_id: i64,
    update: EventUpdate,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  fn delete_event(
    &self,
    actor: i64,
    event_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Upsert the actor's attendance; only the inserting call notifies.
  fn set_attendance(
    &self,
    actor: i64,
    event_id: i64,
    status: AttendanceStatus,
  ) -> impl Future<Output = Result<Engagement, Self::Error>> + Send + '_;

  fn clear_attendance(
    &self,
    actor: i64,
    event_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Notifications ───────────────────────────────────────────────────────────

pub trait NotificationStore: AccountStore {
  /// Append a notification row. Never deduplicates.
  fn notify(
    &self,
    input: NewNotification,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_notifications(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<Vec<NotificationView>, Self::Error>> + Send + '_;

  /// Returns how many notifications flipped to read.
  fn mark_all_read(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Fails with not-found unless the notification belongs to `user_id`.
  fn mark_read(
    &self,
    user_id: i64,
    notification_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Idempotent get-or-create on (user, token).
  fn register_push_token(
    &self,
    user_id: i64,
    token: String,
  ) -> impl Future<Output = Result<PushToken, Self::Error>> + Send + '_;

  fn push_tokens(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;
}

// ─── Umbrella ────────────────────────────────────────────────────────────────

/// Everything the HTTP layer needs from a backend.
pub trait SocialStore:
  AccountStore + GraphStore + ContentStore + MessagingStore + EventStore + NotificationStore
{
}

impl<T> SocialStore for T where
  T: AccountStore + GraphStore + ContentStore + MessagingStore + EventStore + NotificationStore
{
}
