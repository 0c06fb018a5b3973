//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{TimeDelta, Utc};
use quad_core::{
  Error as CoreError, ErrorKind,
  event::{AttendanceStatus, EventUpdate, NewEvent},
  graph::SearchKind,
  notification::{NewNotification, NotificationKind},
  post::{NewComment, NewPost, PostUpdate},
  store::{
    AccountStore, ContentStore, EventStore, GraphStore, MessagingStore, NotificationStore,
    StoreError as _,
  },
  story::{NewStory, NewStoryReply},
  user::{NewUser, ProfileUpdate},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, seat: &str, name: &str) -> i64 {
  s.register(NewUser {
    seat_number:      seat.into(),
    full_name:        name.into(),
    university_email: Some(format!("{seat}@uni.example")),
    year:             Some(2),
    department:       "Computer Science".into(),
    password_hash:    "hash".into(),
  })
  .await
  .unwrap()
  .id
}

fn post(content: &str) -> NewPost {
  NewPost { content: content.into(), image_url: None, event_id: None }
}

fn event(title: &str) -> NewEvent {
  let start = Utc::now() + TimeDelta::days(3);
  NewEvent {
    title:       title.into(),
    description: String::new(),
    location:    "Main hall".into(),
    latitude:    None,
    longitude:   None,
    start_date:  start,
    end_date:    start + TimeDelta::hours(2),
  }
}

fn kind(err: &Error) -> Option<ErrorKind> { err.domain().map(CoreError::kind) }

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_creates_user_and_profile() {
  let s = store().await;
  let id = user(&s, "CS-101", "Ada Lovelace").await;

  let view = s.get_user(id).await.unwrap().unwrap();
  assert_eq!(view.seat_number, "CS-101");
  assert_eq!(view.full_name, "Ada Lovelace");
  assert_eq!(view.profile, Default::default());
  assert_eq!(view.posts_count, 0);

  let creds = s.credentials_by_seat("CS-101".into()).await.unwrap().unwrap();
  assert_eq!(creds.user_id, id);
  assert_eq!(creds.password_hash, "hash");
}

#[tokio::test]
async fn duplicate_seat_number_is_rejected() {
  let s = store().await;
  user(&s, "CS-101", "Ada").await;

  let err = s
    .register(NewUser {
      seat_number:      "CS-101".into(),
      full_name:        "Someone Else".into(),
      university_email: None,
      year:             None,
      department:       String::new(),
      password_hash:    "hash".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::SeatNumberTaken)));
}

#[tokio::test]
async fn sessions_resolve_to_their_user() {
  let s = store().await;
  let id = user(&s, "CS-101", "Ada").await;

  s.create_session(id, "digest".into()).await.unwrap();
  assert_eq!(s.session_user("digest".into()).await.unwrap(), Some(id));
  assert_eq!(s.session_user("other".into()).await.unwrap(), None);
}

#[tokio::test]
async fn profile_update_is_partial() {
  let s = store().await;
  let id = user(&s, "CS-101", "Ada").await;

  s.update_profile(id, ProfileUpdate { bio: Some("Engines".into()), ..Default::default() })
    .await
    .unwrap();
  let profile = s
    .update_profile(id, ProfileUpdate { course: Some("BSCS".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(profile.bio, "Engines");
  assert_eq!(profile.course, "BSCS");
  assert_eq!(s.get_profile(id).await.unwrap(), profile);
}

#[tokio::test]
async fn update_email_validates() {
  let s = store().await;
  let id = user(&s, "CS-101", "Ada").await;

  let err = s.update_email(id, "not-an-email".into()).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Validation));

  let email = s.update_email(id, "ada@uni.example".into()).await.unwrap();
  let view = s.get_user(id).await.unwrap().unwrap();
  assert_eq!(view.university_email.as_deref(), Some(email.as_str()));
}

// ─── Follow graph ────────────────────────────────────────────────────────────

#[tokio::test]
async fn self_follow_fails_without_a_row() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;

  let err = s.follow(a, a).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::SelfFollow)));
  assert_eq!(s.get_user(a).await.unwrap().unwrap().following_count, 0);
}

#[tokio::test]
async fn double_follow_is_idempotent_and_notifies_once() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;

  let first = s.follow(a, b).await.unwrap();
  assert!(first.created);
  let n = first.notification.unwrap();
  assert_eq!(n.user_id, b);
  assert_eq!(n.kind, NotificationKind::Follow);
  assert_eq!(n.text, "Ada started following you");

  let second = s.follow(a, b).await.unwrap();
  assert!(!second.created);
  assert!(second.notification.is_none());

  assert_eq!(s.get_user(b).await.unwrap().unwrap().followers_count, 1);
  assert_eq!(s.list_notifications(b).await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_follows_converge_to_one_edge() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;

  let (first, second) = tokio::join!(s.follow(a, b), s.follow(a, b));
  let (first, second) = (first.unwrap(), second.unwrap());
  assert!(first.created ^ second.created);

  let edges: i64 = s
    .conn
    .call(move |conn| {
      Ok(conn.query_row(
        "SELECT COUNT(*) FROM follows WHERE follower_id = ?1 AND following_id = ?2",
        [a, b],
        |r| r.get(0),
      )?)
    })
    .await
    .unwrap();
  assert_eq!(edges, 1);
  assert_eq!(s.list_notifications(b).await.unwrap().len(), 1);
}

#[tokio::test]
async fn follow_unknown_user_is_not_found() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let err = s.follow(a, 999).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn friend_requests_clear_when_followed_back() {
  let s = store().await;
  let seven = user(&s, "S7", "Seven").await;
  let nine = user(&s, "S9", "Nine").await;

  s.follow(seven, nine).await.unwrap();
  let requests = s.friend_requests(nine).await.unwrap();
  assert_eq!(requests.iter().map(|u| u.id).collect::<Vec<_>>(), vec![seven]);
  assert!(s.friends(nine).await.unwrap().is_empty());

  s.follow(nine, seven).await.unwrap();
  assert!(s.friend_requests(nine).await.unwrap().is_empty());

  let friends = s.friends(nine).await.unwrap();
  assert_eq!(friends.len(), 1);
  assert_eq!(friends[0].id, seven);
  assert_eq!(friends[0].friends_count, 1);
}

#[tokio::test]
async fn unfollow_removes_edge() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;

  s.follow(a, b).await.unwrap();
  s.unfollow(a, b).await.unwrap();
  s.unfollow(a, b).await.unwrap();
  assert_eq!(s.get_user(b).await.unwrap().unwrap().followers_count, 0);
}

#[tokio::test]
async fn suggestions_skip_self_and_followed() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;
  let c = user(&s, "C", "Curie").await;

  s.follow(a, b).await.unwrap();
  let ids: Vec<_> = s.friend_suggestions(a).await.unwrap().into_iter().map(|u| u.id).collect();
  assert_eq!(ids, vec![c]);
}

#[tokio::test]
async fn search_users_and_posts() {
  let s = store().await;
  let a = user(&s, "CS-101", "Ada Lovelace").await;
  let b = user(&s, "EE-200", "Nikola Tesla").await;
  s.create_post(b, post("Alternating current for everyone")).await.unwrap();
  s.create_post(a, post("Notes on the analytical engine")).await.unwrap();

  let results = s.search(a, "tesla".into(), SearchKind::Users).await.unwrap();
  assert_eq!(results.users.len(), 1);
  assert_eq!(results.users[0].id, b);
  assert!(results.posts.is_empty());

  let results = s.search(a, "ENGINE".into(), SearchKind::Posts).await.unwrap();
  assert!(results.users.is_empty());
  assert_eq!(results.posts.len(), 1);
  assert!(results.posts[0].is_author);

  let results = s.search(a, "cs-".into(), SearchKind::All).await.unwrap();
  assert_eq!(results.users.len(), 1);

  let results = s.search(a, "   ".into(), SearchKind::All).await.unwrap();
  assert!(results.users.is_empty() && results.posts.is_empty());
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  s.create_post(a, post("plain text")).await.unwrap();

  let results = s.search(a, "%".into(), SearchKind::Posts).await.unwrap();
  assert!(results.posts.is_empty());
}

// ─── Posts and comments ──────────────────────────────────────────────────────

#[tokio::test]
async fn posts_list_newest_first_with_viewer_flags() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;

  let first = s.create_post(a, post("first")).await.unwrap();
  let second = s.create_post(b, post("second")).await.unwrap();
  s.like_post(b, first.id).await.unwrap();

  let feed = s.list_posts(b, None).await.unwrap();
  assert_eq!(feed.iter().map(|p| p.id).collect::<Vec<_>>(), vec![second.id, first.id]);
  assert!(feed[0].is_author);
  assert!(feed[1].is_liked);
  assert_eq!(feed[1].like_count, 1);

  let by_a = s.list_posts(b, Some(a)).await.unwrap();
  assert_eq!(by_a.len(), 1);
  assert_eq!(by_a[0].author.id, a);
}

#[tokio::test]
async fn empty_post_is_rejected() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let err = s.create_post(a, post("   ")).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Validation));
}

#[tokio::test]
async fn unknown_event_link_is_dropped() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let p = s
    .create_post(a, NewPost { content: "hi".into(), image_url: None, event_id: Some(42) })
    .await
    .unwrap();
  assert_eq!(p.event_id, None);
}

#[tokio::test]
async fn only_the_author_edits_or_deletes() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;
  let p = s.create_post(a, post("draft")).await.unwrap();

  let err = s
    .edit_post(b, p.id, PostUpdate { content: Some("hijack".into()), image_url: None })
    .await
    .unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Permission));

  let edited = s
    .edit_post(a, p.id, PostUpdate { content: Some("final".into()), image_url: None })
    .await
    .unwrap();
  assert_eq!(edited.content, "final");
  assert!(edited.updated_at >= p.updated_at);

  let err = s.delete_post(b, p.id).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Permission));
  s.delete_post(a, p.id).await.unwrap();
  assert!(s.get_post(a, p.id).await.unwrap().is_none());

  let err = s.delete_post(a, p.id).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn like_unlike_like_notifies_twice() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;
  let p = s.create_post(a, post("hello")).await.unwrap();

  assert!(s.like_post(b, p.id).await.unwrap().created);
  s.unlike_post(b, p.id).await.unwrap();
  let again = s.like_post(b, p.id).await.unwrap();
  assert!(again.created);
  assert_eq!(again.notification.unwrap().text, "Babbage liked your post");

  assert_eq!(s.get_post(a, p.id).await.unwrap().unwrap().like_count, 1);
  let likes: Vec<_> = s
    .list_notifications(a)
    .await
    .unwrap()
    .into_iter()
    .filter(|n| n.kind == NotificationKind::Like)
    .collect();
  assert_eq!(likes.len(), 2);
  assert_eq!(likes[0].actor.as_ref().map(|u| u.id), Some(b));
}

#[tokio::test]
async fn liking_own_post_does_not_notify() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let p = s.create_post(a, post("hello")).await.unwrap();

  let like = s.like_post(a, p.id).await.unwrap();
  assert!(like.created);
  assert!(like.notification.is_none());
  assert!(!s.like_post(a, p.id).await.unwrap().created);
  assert!(s.list_notifications(a).await.unwrap().is_empty());
}

#[tokio::test]
async fn comments_thread_and_notify_author() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;
  let p = s.create_post(a, post("hello")).await.unwrap();

  let (top, notification) = s
    .create_comment(b, NewComment { post_id: p.id, content: "nice".into(), parent_id: None })
    .await
    .unwrap();
  let notification = notification.unwrap();
  assert_eq!(notification.kind, NotificationKind::Comment);
  assert_eq!(notification.related_object_id, Some(p.id));

  let (reply, notification) = s
    .create_comment(a, NewComment { post_id: p.id, content: "thanks".into(), parent_id: Some(top.id) })
    .await
    .unwrap();
  assert_eq!(reply.parent_id, Some(top.id));
  assert!(notification.is_none());

  let comments = s.list_comments(p.id).await.unwrap();
  assert_eq!(comments.len(), 1);
  assert_eq!(comments[0].id, top.id);
  assert_eq!(s.get_post(a, p.id).await.unwrap().unwrap().comment_count, 2);
}

#[tokio::test]
async fn reply_parent_must_share_the_post() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let p1 = s.create_post(a, post("one")).await.unwrap();
  let p2 = s.create_post(a, post("two")).await.unwrap();
  let (c1, _) = s
    .create_comment(a, NewComment { post_id: p1.id, content: "c".into(), parent_id: None })
    .await
    .unwrap();

  let err = s
    .create_comment(a, NewComment { post_id: p2.id, content: "r".into(), parent_id: Some(c1.id) })
    .await
    .unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Validation));
}

#[tokio::test]
async fn comment_likes_do_not_notify() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;
  let p = s.create_post(b, post("hello")).await.unwrap();
  let (c, _) = s
    .create_comment(a, NewComment { post_id: p.id, content: "hey".into(), parent_id: None })
    .await
    .unwrap();

  assert!(s.like_comment(b, c.id).await.unwrap());
  assert!(!s.like_comment(b, c.id).await.unwrap());
  assert_eq!(s.list_comments(p.id).await.unwrap()[0].like_count, 1);
  assert!(s.list_notifications(a).await.unwrap().is_empty());

  s.unlike_comment(b, c.id).await.unwrap();
  assert_eq!(s.list_comments(p.id).await.unwrap()[0].like_count, 0);

  let err = s.delete_comment(b, c.id).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Permission));
  s.delete_comment(a, c.id).await.unwrap();
}

#[tokio::test]
async fn deleting_a_post_cascades() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;
  let p = s.create_post(a, post("hello")).await.unwrap();
  let (c, _) = s
    .create_comment(b, NewComment { post_id: p.id, content: "hey".into(), parent_id: None })
    .await
    .unwrap();
  s.like_post(b, p.id).await.unwrap();

  s.delete_post(a, p.id).await.unwrap();
  let err = s.like_comment(b, c.id).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::NotFound));
  assert_eq!(s.get_user(a).await.unwrap().unwrap().posts_count, 0);
}

// ─── Stories ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stories_are_visible_to_followers_until_expiry() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;
  let c = user(&s, "C", "Curie").await;
  s.follow(b, a).await.unwrap();

  let story = s
    .create_story(a, NewStory { image_url: "https://img.example/1.png".into() })
    .await
    .unwrap();
  assert_eq!(story.expires_at - story.created_at, TimeDelta::hours(24));

  assert_eq!(s.list_stories(a, None).await.unwrap().len(), 1);
  assert_eq!(s.list_stories(b, None).await.unwrap().len(), 1);
  assert!(s.list_stories(c, None).await.unwrap().is_empty());

  let later = story.created_at + TimeDelta::hours(25);
  assert!(s.list_stories(b, Some(later)).await.unwrap().is_empty());
}

#[tokio::test]
async fn story_likes_require_visibility() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;
  let c = user(&s, "C", "Curie").await;
  s.follow(b, a).await.unwrap();
  let story = s
    .create_story(a, NewStory { image_url: "https://img.example/1.png".into() })
    .await
    .unwrap();

  assert!(s.like_story(b, story.id).await.unwrap());
  assert!(!s.like_story(b, story.id).await.unwrap());
  let err = s.like_story(c, story.id).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::NotFound));

  let views = s.list_stories(b, None).await.unwrap();
  assert_eq!(views[0].like_count, 1);
  assert!(views[0].is_liked);
  assert!(s.list_notifications(a).await.unwrap().is_empty());

  s.unlike_story(b, story.id).await.unwrap();
  assert_eq!(s.list_stories(b, None).await.unwrap()[0].like_count, 0);
}

#[tokio::test]
async fn story_replies_and_deletion() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;
  let story = s
    .create_story(a, NewStory { image_url: "https://img.example/1.png".into() })
    .await
    .unwrap();

  let reply = s
    .create_story_reply(b, NewStoryReply { story_id: story.id, content: "wow".into() })
    .await
    .unwrap();
  let replies = s.list_story_replies(story.id).await.unwrap();
  assert_eq!(replies.len(), 1);
  assert_eq!(replies[0].author.id, b);

  let err = s.delete_story_reply(a, reply.id).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Permission));

  let err = s.delete_story(b, story.id).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Permission));
  s.delete_story(a, story.id).await.unwrap();

  let err = s.list_story_replies(story.id).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::NotFound));
  let err = s.delete_story_reply(b, reply.id).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::NotFound));
}

// ─── Messaging ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn conversation_is_shared_by_both_sides() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;

  let ab = s.start_conversation(a, b).await.unwrap();
  let ba = s.start_conversation(b, a).await.unwrap();
  assert_eq!(ab.id, ba.id);
  assert!(ab.user1_id < ab.user2_id);

  let err = s.start_conversation(a, a).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::SelfConversation)));
}

#[tokio::test]
async fn concurrent_starts_share_one_conversation() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;

  let (ab, ba) = tokio::join!(s.start_conversation(a, b), s.start_conversation(b, a));
  assert_eq!(ab.unwrap().id, ba.unwrap().id);
  assert_eq!(s.list_conversations(a).await.unwrap().len(), 1);
}

#[tokio::test]
async fn listing_messages_marks_them_read_once() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;
  let conv = s.start_conversation(a, b).await.unwrap();

  s.send_message(a, conv.id, "hi".into()).await.unwrap();
  s.send_message(a, conv.id, "there".into()).await.unwrap();

  // The sender's own view does not mark anything.
  let own = s.list_messages(a, conv.id).await.unwrap();
  assert!(own.iter().all(|m| !m.is_read));
  assert_eq!(s.list_conversations(b).await.unwrap()[0].unread_count, 2);

  let read = s.list_messages(b, conv.id).await.unwrap();
  assert_eq!(read.iter().map(|m| m.text.as_str()).collect::<Vec<_>>(), ["hi", "there"]);
  assert!(read.iter().all(|m| m.is_read));

  let again = s.list_messages(b, conv.id).await.unwrap();
  assert_eq!(again, read);
  assert_eq!(s.list_conversations(b).await.unwrap()[0].unread_count, 0);
}

#[tokio::test]
async fn outsiders_cannot_read_or_send() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;
  let c = user(&s, "C", "Curie").await;
  let conv = s.start_conversation(a, b).await.unwrap();

  let err = s.list_messages(c, conv.id).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::NotParticipant)));
  let err = s.send_message(c, conv.id, "hey".into()).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Permission));

  let err = s.send_message(a, conv.id, "  ".into()).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Validation));
  let err = s.list_messages(a, 999).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn conversations_carry_last_message_and_other_user() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;
  let c = user(&s, "C", "Curie").await;
  let ab = s.start_conversation(a, b).await.unwrap();
  let ac = s.start_conversation(a, c).await.unwrap();

  s.send_message(b, ab.id, "first".into()).await.unwrap();
  s.send_message(c, ac.id, "second".into()).await.unwrap();

  let convs = s.list_conversations(a).await.unwrap();
  assert_eq!(convs.iter().map(|c| c.id).collect::<Vec<_>>(), vec![ac.id, ab.id]);
  assert_eq!(convs[0].other_user.id, c);
  assert_eq!(convs[0].last_message.as_ref().map(|m| m.text.as_str()), Some("second"));
  assert!(s.list_notifications(a).await.unwrap().is_empty());
}

// ─── Events ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_event_defaults_coordinates() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let e = s.create_event(a, event("Hackathon")).await.unwrap();
  assert_eq!(e.latitude, quad_core::event::DEFAULT_LATITUDE);
  assert_eq!(e.longitude, quad_core::event::DEFAULT_LONGITUDE);
  assert_eq!(e.created_by, a);
}

#[tokio::test]
async fn interested_then_going_keeps_one_row_and_one_notification() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;
  let e = s.create_event(a, event("Expo")).await.unwrap();

  let first = s.set_attendance(b, e.id, AttendanceStatus::Interested).await.unwrap();
  assert!(first.created);
  assert_eq!(first.notification.unwrap().text, "Babbage is interested in your event: Expo");

  let second = s.set_attendance(b, e.id, AttendanceStatus::Going).await.unwrap();
  assert!(!second.created);
  assert!(second.notification.is_none());

  let view = s.get_event(b, e.id).await.unwrap().unwrap();
  assert_eq!((view.interested_count, view.going_count), (0, 1));
  assert!(view.is_going && !view.is_interested);
  assert_eq!(s.list_notifications(a).await.unwrap().len(), 1);

  s.clear_attendance(b, e.id).await.unwrap();
  let view = s.get_event(b, e.id).await.unwrap().unwrap();
  assert_eq!(view.going_count, 0);
}

#[tokio::test]
async fn creator_rsvp_does_not_notify() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let e = s.create_event(a, event("Expo")).await.unwrap();

  let rsvp = s.set_attendance(a, e.id, AttendanceStatus::Going).await.unwrap();
  assert!(rsvp.created);
  assert!(rsvp.notification.is_none());
}

#[tokio::test]
async fn only_the_creator_updates_or_deletes_events() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;
  let e = s.create_event(a, event("Expo")).await.unwrap();

  let update = EventUpdate { title: Some("Renamed".into()), ..Default::default() };
  let err = s.update_event(b, e.id, update.clone()).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Permission));
  assert_eq!(s.update_event(a, e.id, update).await.unwrap().title, "Renamed");

  let bad = EventUpdate { end_date: Some(e.start_date - TimeDelta::hours(1)), ..Default::default() };
  let err = s.update_event(a, e.id, bad).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Validation));

  let err = s.delete_event(b, e.id).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Permission));
}

#[tokio::test]
async fn deleting_an_event_unlinks_posts() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let e = s.create_event(a, event("Expo")).await.unwrap();
  let p = s
    .create_post(a, NewPost { content: "come!".into(), image_url: None, event_id: Some(e.id) })
    .await
    .unwrap();
  assert_eq!(p.event_id, Some(e.id));

  s.delete_event(a, e.id).await.unwrap();
  assert!(s.get_event(a, e.id).await.unwrap().is_none());
  assert_eq!(s.get_post(a, p.id).await.unwrap().unwrap().event_id, None);

  let err = s.set_attendance(a, e.id, AttendanceStatus::Going).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn events_list_latest_start_first() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let early = s.create_event(a, event("Early")).await.unwrap();
  let mut late = event("Late");
  late.start_date += TimeDelta::days(7);
  late.end_date += TimeDelta::days(7);
  let late = s.create_event(a, late).await.unwrap();

  let ids: Vec<_> = s.list_events(a).await.unwrap().into_iter().map(|e| e.id).collect();
  assert_eq!(ids, vec![late.id, early.id]);
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn notify_and_mark_read() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;

  let n1 = s.notify(NewNotification::followed(a, b, "Babbage")).await.unwrap();
  s.notify(NewNotification::followed(a, b, "Babbage")).await.unwrap();

  let listed = s.list_notifications(a).await.unwrap();
  assert_eq!(listed.len(), 2);
  assert!(listed.iter().all(|n| !n.is_read));

  let err = s.mark_read(b, n1.id).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::NotFound));
  s.mark_read(a, n1.id).await.unwrap();

  assert_eq!(s.mark_all_read(a).await.unwrap(), 1);
  assert_eq!(s.mark_all_read(a).await.unwrap(), 0);
  assert!(s.list_notifications(a).await.unwrap().iter().all(|n| n.is_read));
}

#[tokio::test]
async fn push_tokens_are_unique_per_user() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;

  let first = s.register_push_token(a, "ExponentPushToken[abc]".into()).await.unwrap();
  let second = s.register_push_token(a, "ExponentPushToken[abc]".into()).await.unwrap();
  assert_eq!(first, second);
  s.register_push_token(a, "ExponentPushToken[def]".into()).await.unwrap();

  assert_eq!(s.push_tokens(a).await.unwrap().len(), 2);
  let err = s.register_push_token(a, " ".into()).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Validation));
}

#[tokio::test]
async fn deleting_a_user_cascades() {
  let s = store().await;
  let a = user(&s, "A", "Ada").await;
  let b = user(&s, "B", "Babbage").await;
  s.follow(a, b).await.unwrap();
  s.create_post(a, post("bye")).await.unwrap();

  s.conn
    .call(move |conn| {
      conn.execute("DELETE FROM users WHERE user_id = ?1", [a])?;
      Ok(())
    })
    .await
    .unwrap();

  let b_view = s.get_user(b).await.unwrap().unwrap();
  assert_eq!(b_view.followers_count, 0);
  assert!(s.list_posts(b, None).await.unwrap().is_empty());
  assert!(s.list_notifications(b).await.unwrap().is_empty());
}
