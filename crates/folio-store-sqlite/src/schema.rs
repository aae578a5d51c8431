//! SQL schema for the Folio SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,      -- argon2 PHC string
    bio           TEXT,
    image         TEXT,
    created_at    TEXT NOT NULL       -- RFC 3339 UTC
);

-- Relationship rows are soft-deleted: a NULL deleted_at marks the edge active.
CREATE TABLE IF NOT EXISTS follows (
    follower_id INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    followee_id INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL,
    deleted_at  TEXT,
    PRIMARY KEY (follower_id, followee_id),
    CHECK (follower_id != followee_id)
);

CREATE TABLE IF NOT EXISTS articles (
    article_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    slug            TEXT NOT NULL,
    title           TEXT NOT NULL,
    description     TEXT NOT NULL DEFAULT '',
    body            TEXT NOT NULL,
    tag_list        TEXT NOT NULL DEFAULT '[]',   -- JSON, display order
    author_id       INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    -- Always equal to the number of active favorites rows for the article.
    favorites_count INTEGER NOT NULL DEFAULT 0 CHECK (favorites_count >= 0),
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tags (
    tag_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name   TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS article_tags (
    article_id INTEGER NOT NULL REFERENCES articles(article_id) ON DELETE CASCADE,
    tag_id     INTEGER NOT NULL REFERENCES tags(tag_id),
    PRIMARY KEY (article_id, tag_id)
);

CREATE TABLE IF NOT EXISTS favorites (
    user_id    INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    article_id INTEGER NOT NULL REFERENCES articles(article_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    deleted_at TEXT,
    PRIMARY KEY (user_id, article_id)
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    article_id INTEGER NOT NULL REFERENCES articles(article_id) ON DELETE CASCADE,
    author_id  INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    body       TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS articles_author_idx  ON articles(author_id);
CREATE INDEX IF NOT EXISTS article_tags_tag_idx ON article_tags(tag_id);
CREATE INDEX IF NOT EXISTS favorites_article_idx
    ON favorites(article_id) WHERE deleted_at IS NULL;
CREATE INDEX IF NOT EXISTS follows_followee_idx ON follows(followee_id);
CREATE INDEX IF NOT EXISTS comments_article_idx ON comments(article_id);

PRAGMA user_version = 1;
";
