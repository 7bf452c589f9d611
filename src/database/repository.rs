//! Database repository - main entry point
//! Implements the gateway contract on top of a SQLite pool

use anyhow::Result;
use parking_lot::RwLock;
use serde_json::Value;
use sqlx::{Pool, Sqlite, sqlite::SqlitePoolOptions};
use std::path::Path;
use std::sync::Arc;

use super::{schema, sql};
use crate::api::{
    Gateway, GatewayError, NewProfile, Query, Row, Table, UserId,
    model::{self, Profile},
};
use crate::utils::now_timestamp;

/// Database connection pool wrapper with a local session
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
    session: Arc<RwLock<Option<UserId>>>,
}

impl Database {
    /// Create and initialize database at the given path
    pub async fn new(db_path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await?;

        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&pool)
            .await?;

        schema::run_migrations(&pool).await?;

        Ok(Self::from_pool(pool))
    }

    /// Fresh in-memory database
    ///
    /// A single connection, since every SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        schema::run_migrations(&pool).await?;
        Ok(Self::from_pool(pool))
    }

    fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            session: Arc::new(RwLock::new(None)),
        }
    }

    // ============ Session ============

    /// Start a local session for `user_id`
    pub fn sign_in_as(&self, user_id: &UserId) {
        tracing::info!(user_id = %user_id, "Local session started");
        *self.session.write() = Some(user_id.clone());
    }

    pub fn sign_out(&self) {
        *self.session.write() = None;
    }

    /// Create the profile row for a new identity, returns the existing one if present
    pub async fn register_user(
        &self,
        user_id: &UserId,
        display_name: &str,
    ) -> Result<Profile, GatewayError> {
        let existing = self
            .select(&Query::from(Table::Profiles).eq("user_id", user_id.as_str()).limit(1))
            .await?;
        if let Some(row) = existing.into_iter().next() {
            return model::decode(row);
        }

        let row = model::encode(&NewProfile {
            user_id: user_id.to_string(),
            display_name: Some(display_name.to_string()),
            avatar_url: None,
            bio: None,
        })?;
        model::decode(self.insert(Table::Profiles, row).await?)
    }

    async fn fetch_by_id(&self, table: Table, id: &str) -> Result<Row, GatewayError> {
        let statement = sql::build_select(&Query::from(table).eq("id", id).limit(1))?;
        let row = statement
            .query()
            .fetch_one(&self.pool)
            .await
            .map_err(sql::map_error)?;
        sql::row_to_json(table, &row)
    }
}

impl Gateway for Database {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, GatewayError> {
        let statement = sql::build_select(query)?;
        let rows = statement
            .query()
            .fetch_all(&self.pool)
            .await
            .map_err(sql::map_error)?;

        rows.iter()
            .map(|row| sql::row_to_json(query.table, row))
            .collect()
    }

    async fn insert(&self, table: Table, mut row: Row) -> Result<Row, GatewayError> {
        let id = match row.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                row.insert("id".to_string(), Value::String(id.clone()));
                id
            }
        };
        let stamp = table.timestamp_column();
        if row.get(stamp).is_none_or(Value::is_null) {
            row.insert(stamp.to_string(), Value::String(now_timestamp()));
        }

        let statement = sql::build_insert(table, &row)?;
        statement
            .query()
            .execute(&self.pool)
            .await
            .map_err(sql::map_error)?;

        self.fetch_by_id(table, &id).await
    }

    async fn update(&self, table: Table, id: &str, changes: Row) -> Result<(), GatewayError> {
        let Some(statement) = sql::build_update(table, id, &changes)? else {
            return Ok(());
        };
        statement
            .query()
            .execute(&self.pool)
            .await
            .map_err(sql::map_error)?;
        Ok(())
    }

    async fn delete(&self, table: Table, id: &str) -> Result<(), GatewayError> {
        let statement = format!("DELETE FROM {} WHERE id = ?", table.name());
        sqlx::query(&statement)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(sql::map_error)?;
        Ok(())
    }

    fn current_user(&self) -> Option<UserId> {
        self.session.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Filter, LibraryEntry, NewLibraryEntry, UserPreference};
    use serde_json::json;

    fn library_row(user: &str, video: &str, artist: &str) -> Row {
        model::encode(&NewLibraryEntry {
            user_id: user.to_string(),
            video_id: video.to_string(),
            title: format!("title {}", video),
            artist: artist.to_string(),
            thumbnail_url: String::new(),
            duration: "3:00".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_generates_id_and_timestamp() {
        let db = Database::in_memory().await.unwrap();
        let stored = db
            .insert(Table::UserLibrary, library_row("u1", "abc", "A"))
            .await
            .unwrap();

        let entry: LibraryEntry = model::decode(stored).unwrap();
        assert!(!entry.id.is_empty());
        assert!(entry.created_at.is_some());
        assert_eq!(entry.video_id, "abc");
    }

    #[tokio::test]
    async fn test_library_unique_per_owner_and_track() {
        let db = Database::in_memory().await.unwrap();
        db.insert(Table::UserLibrary, library_row("u1", "abc", "A"))
            .await
            .unwrap();

        let err = db
            .insert(Table::UserLibrary, library_row("u1", "abc", "A"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());

        // Same track for another owner is fine
        db.insert(Table::UserLibrary, library_row("u2", "abc", "A"))
            .await
            .unwrap();

        let rows = db
            .select(&Query::from(Table::UserLibrary).eq("user_id", "u1"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_friendship_pair_unique_in_both_directions() {
        let db = Database::in_memory().await.unwrap();
        let forward = json!({"requester_id": "a", "addressee_id": "b", "status": "pending"});
        let backward = json!({"requester_id": "b", "addressee_id": "a", "status": "pending"});

        db.insert(Table::Friendships, forward.as_object().unwrap().clone())
            .await
            .unwrap();
        let err = db
            .insert(Table::Friendships, backward.as_object().unwrap().clone())
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_select_ilike_order_limit() {
        let db = Database::in_memory().await.unwrap();
        for (video, artist) in [("1", "Carpenter Brut"), ("2", "Vangelis"), ("3", "carpenter brut")] {
            db.insert(Table::UserLibrary, library_row("u1", video, artist))
                .await
                .unwrap();
        }

        let rows = db
            .select(
                &Query::from(Table::UserLibrary)
                    .eq("user_id", "u1")
                    .contains("artist", "CARPENTER")
                    .order("video_id", false)
                    .limit(5),
            )
            .await
            .unwrap();
        let entries: Vec<LibraryEntry> = model::decode_all(rows).unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.video_id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
    }

    #[tokio::test]
    async fn test_json_and_bool_columns_round_trip() {
        let db = Database::in_memory().await.unwrap();
        let row = json!({"user_id": "u1", "preferred_artists": ["A", "B"], "is_configured": true});
        db.insert(Table::UserPreferences, row.as_object().unwrap().clone())
            .await
            .unwrap();

        let rows = db
            .select(
                &Query::from(Table::UserPreferences)
                    .eq("user_id", "u1")
                    .eq("is_configured", true),
            )
            .await
            .unwrap();
        let prefs: Vec<UserPreference> = model::decode_all(rows).unwrap();
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].preferred_artists, vec!["A", "B"]);
        assert!(prefs[0].is_configured);
    }

    #[tokio::test]
    async fn test_update_and_delete_by_id() {
        let db = Database::in_memory().await.unwrap();
        let row = json!({"requester_id": "a", "addressee_id": "b", "status": "pending"});
        let stored = db
            .insert(Table::Friendships, row.as_object().unwrap().clone())
            .await
            .unwrap();
        let id = stored["id"].as_str().unwrap().to_string();

        let changes = json!({"status": "accepted"});
        db.update(Table::Friendships, &id, changes.as_object().unwrap().clone())
            .await
            .unwrap();
        let rows = db
            .select(&Query::from(Table::Friendships).filter(Filter::eq("status", "accepted")))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        db.delete(Table::Friendships, &id).await.unwrap();
        let rows = db.select(&Query::from(Table::Friendships)).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_session_and_register() {
        let db = Database::in_memory().await.unwrap();
        assert!(db.current_user().is_none());

        let user = UserId::new("u1");
        db.sign_in_as(&user);
        assert_eq!(db.current_user(), Some(user.clone()));

        let first = db.register_user(&user, "Night Owl").await.unwrap();
        let second = db.register_user(&user, "Other").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.display_name.as_deref(), Some("Night Owl"));

        db.sign_out();
        assert!(db.current_user().is_none());
    }
}
