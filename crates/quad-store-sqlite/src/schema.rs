//! SQL schema for the Quad SQLite store.
//!
//! Executed once at connection startup. Every dependent row references its
//! owner with `ON DELETE CASCADE`, so deleting a user, post, story,
//! conversation or event removes everything hanging off it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id          INTEGER PRIMARY KEY AUTOINCREMENT,
    seat_number      TEXT NOT NULL UNIQUE,
    full_name        TEXT NOT NULL,
    university_email TEXT,
    year             INTEGER,
    department       TEXT NOT NULL DEFAULT '',
    password_hash    TEXT NOT NULL,
    created_at       TEXT NOT NULL          -- RFC 3339 UTC, fixed width
);

CREATE TABLE IF NOT EXISTS profiles (
    user_id    INTEGER PRIMARY KEY REFERENCES users(user_id) ON DELETE CASCADE,
    bio        TEXT NOT NULL DEFAULT '',
    avatar_url TEXT NOT NULL DEFAULT '',
    course     TEXT NOT NULL DEFAULT '',
    interests  TEXT NOT NULL DEFAULT ''
);

-- Only the sha-256 digest of a bearer token is stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_digest TEXT PRIMARY KEY,
    user_id      INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS follows (
    follower_id  INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    following_id INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at   TEXT NOT NULL,
    PRIMARY KEY (follower_id, following_id),
    CHECK (follower_id <> following_id)
);

CREATE TABLE IF NOT EXISTS events (
    event_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    location    TEXT NOT NULL DEFAULT '',
    latitude    REAL NOT NULL,
    longitude   REAL NOT NULL,
    start_date  TEXT NOT NULL,
    end_date    TEXT NOT NULL,
    created_by  INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS event_attendances (
    user_id    INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    event_id   INTEGER NOT NULL REFERENCES events(event_id) ON DELETE CASCADE,
    status     TEXT NOT NULL,           -- 'interested' | 'going'
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, event_id)
);

CREATE TABLE IF NOT EXISTS posts (
    post_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    author_id  INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    content    TEXT NOT NULL,
    image_url  TEXT,
    event_id   INTEGER REFERENCES events(event_id) ON DELETE SET NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS post_likes (
    user_id    INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    post_id    INTEGER NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, post_id)
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id    INTEGER NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
    author_id  INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    content    TEXT NOT NULL,
    parent_id  INTEGER REFERENCES comments(comment_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS comment_likes (
    user_id    INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    comment_id INTEGER NOT NULL REFERENCES comments(comment_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, comment_id)
);

CREATE TABLE IF NOT EXISTS stories (
    story_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    author_id  INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    image_url  TEXT NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL            -- created_at + 24h; never updated
);

CREATE TABLE IF NOT EXISTS story_likes (
    user_id    INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    story_id   INTEGER NOT NULL REFERENCES stories(story_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, story_id)
);

CREATE TABLE IF NOT EXISTS story_replies (
    reply_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    story_id   INTEGER NOT NULL REFERENCES stories(story_id) ON DELETE CASCADE,
    author_id  INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Participants in canonical order; one row per unordered pair.
CREATE TABLE IF NOT EXISTS conversations (
    conversation_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user1_id        INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    user2_id        INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at      TEXT NOT NULL,
    UNIQUE (user1_id, user2_id),
    CHECK  (user1_id < user2_id)
);

CREATE TABLE IF NOT EXISTS messages (
    message_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    conversation_id INTEGER NOT NULL REFERENCES conversations(conversation_id) ON DELETE CASCADE,
    sender_id       INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    text            TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    is_read         INTEGER NOT NULL DEFAULT 0
);

-- Append-only sink; never deduplicated.
CREATE TABLE IF NOT EXISTS notifications (
    notification_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id           INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    actor_id          INTEGER REFERENCES users(user_id) ON DELETE CASCADE,
    kind              TEXT NOT NULL,
    text              TEXT NOT NULL,
    related_object_id INTEGER,
    is_read           INTEGER NOT NULL DEFAULT 0,
    created_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS push_tokens (
    user_id    INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    token      TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, token)
);

CREATE INDEX IF NOT EXISTS follows_following_idx     ON follows(following_id);
CREATE INDEX IF NOT EXISTS posts_author_idx          ON posts(author_id, created_at);
CREATE INDEX IF NOT EXISTS comments_post_idx         ON comments(post_id);
CREATE INDEX IF NOT EXISTS stories_author_idx        ON stories(author_id, expires_at);
CREATE INDEX IF NOT EXISTS messages_conversation_idx ON messages(conversation_id, created_at);
CREATE INDEX IF NOT EXISTS notifications_user_idx    ON notifications(user_id, created_at);

PRAGMA user_version = 1;
";
