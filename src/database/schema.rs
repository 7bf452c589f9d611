//! Database schema migrations

use anyhow::Result;
use sqlx::{Pool, Sqlite};

/// Run database migrations to create/update schema
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    // Profiles, one per identity
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL UNIQUE,
            display_name TEXT,
            avatar_url TEXT,
            bio TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_profiles_display_name ON profiles(display_name);
        "#,
    )
    .execute(pool)
    .await?;

    // Friendships, one row per unordered pair
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS friendships (
            id TEXT PRIMARY KEY,
            requester_id TEXT NOT NULL,
            addressee_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'accepted', 'rejected')),
            created_at TEXT NOT NULL,
            CHECK (requester_id <> addressee_id)
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_friendships_pair
            ON friendships(min(requester_id, addressee_id), max(requester_id, addressee_id));
        CREATE INDEX IF NOT EXISTS idx_friendships_addressee ON friendships(addressee_id);
        "#,
    )
    .execute(pool)
    .await?;

    // Playlists
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlists (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            cover_url TEXT,
            tracks TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_playlists_user ON playlists(user_id);
        "#,
    )
    .execute(pool)
    .await?;

    // Saved tracks
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_library (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            video_id TEXT NOT NULL,
            title TEXT NOT NULL,
            artist TEXT,
            thumbnail_url TEXT,
            duration TEXT,
            created_at TEXT NOT NULL,
            UNIQUE(user_id, video_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Listening history (append-only)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS listening_history (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            video_id TEXT NOT NULL,
            title TEXT NOT NULL,
            artist TEXT,
            thumbnail_url TEXT,
            duration TEXT,
            played_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_listening_history_user ON listening_history(user_id);
        CREATE INDEX IF NOT EXISTS idx_listening_history_played_at ON listening_history(played_at);
        "#,
    )
    .execute(pool)
    .await?;

    // Preferences, at most one row per owner
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_preferences (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL UNIQUE,
            preferred_artists TEXT NOT NULL DEFAULT '[]',
            is_configured INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
