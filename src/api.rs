//! Backend gateway module
//!
//! The hosted backend owns every durable row. This module defines the
//! contract the rest of the crate talks to (`Gateway`), the fluent query
//! type, typed records, and the PostgREST client.

pub mod model;
mod query;
mod rest;

use std::future::Future;

use serde_json::{Map, Value};

pub use model::{
    Friendship, FriendshipStatus, HistoryEntry, LibraryEntry, NewFriendship, NewHistoryEntry,
    NewLibraryEntry, NewPlaylist, NewPreference, NewProfile, Playlist, Profile, ProfileChanges,
    Track, UserPreference,
};
pub use query::{Filter, Order, Query};
pub use rest::RestGateway;

/// A raw row as exchanged with the backend
pub type Row = Map<String, Value>;

/// Opaque identity handed out by the backend's auth provider
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a column is stored and decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Bool,
    /// JSON document (arrays of artists, track lists)
    Json,
}

/// Tables exposed by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Profiles,
    Friendships,
    Playlists,
    UserLibrary,
    ListeningHistory,
    UserPreferences,
}

impl Table {
    /// Table name on the wire and in SQL
    pub fn name(&self) -> &'static str {
        match self {
            Table::Profiles => "profiles",
            Table::Friendships => "friendships",
            Table::Playlists => "playlists",
            Table::UserLibrary => "user_library",
            Table::ListeningHistory => "listening_history",
            Table::UserPreferences => "user_preferences",
        }
    }

    /// Known columns, in schema order
    pub fn columns(&self) -> &'static [(&'static str, ColumnKind)] {
        use ColumnKind::*;
        match self {
            Table::Profiles => &[
                ("id", Text),
                ("user_id", Text),
                ("display_name", Text),
                ("avatar_url", Text),
                ("bio", Text),
                ("created_at", Text),
            ],
            Table::Friendships => &[
                ("id", Text),
                ("requester_id", Text),
                ("addressee_id", Text),
                ("status", Text),
                ("created_at", Text),
            ],
            Table::Playlists => &[
                ("id", Text),
                ("user_id", Text),
                ("name", Text),
                ("description", Text),
                ("cover_url", Text),
                ("tracks", Json),
                ("created_at", Text),
            ],
            Table::UserLibrary => &[
                ("id", Text),
                ("user_id", Text),
                ("video_id", Text),
                ("title", Text),
                ("artist", Text),
                ("thumbnail_url", Text),
                ("duration", Text),
                ("created_at", Text),
            ],
            Table::ListeningHistory => &[
                ("id", Text),
                ("user_id", Text),
                ("video_id", Text),
                ("title", Text),
                ("artist", Text),
                ("thumbnail_url", Text),
                ("duration", Text),
                ("played_at", Text),
            ],
            Table::UserPreferences => &[
                ("id", Text),
                ("user_id", Text),
                ("preferred_artists", Json),
                ("is_configured", Bool),
                ("created_at", Text),
            ],
        }
    }

    /// Look up the kind of a column, `None` if the table has no such column
    pub fn column_kind(&self, column: &str) -> Option<ColumnKind> {
        self.columns()
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, kind)| *kind)
    }

    /// Column stamped with the insertion time when the caller leaves it out
    pub fn timestamp_column(&self) -> &'static str {
        match self {
            Table::ListeningHistory => "played_at",
            _ => "created_at",
        }
    }

    /// Reject column names the table does not know about
    pub fn check_column(&self, column: &str) -> Result<ColumnKind, GatewayError> {
        self.column_kind(column)
            .ok_or_else(|| GatewayError::UnknownColumn {
                table: self.name(),
                column: column.to_string(),
            })
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors reported by a gateway
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// Insert collided with a unique constraint
    #[error("duplicate row: {0}")]
    UniqueViolation(String),
    #[error("unknown column `{column}` on table `{table}`")]
    UnknownColumn { table: &'static str, column: String },
    /// Row did not match the expected record shape
    #[error("malformed row: {0}")]
    Decode(String),
    #[error("not authorized")]
    Unauthorized,
    #[error("backend error: {0}")]
    Backend(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl GatewayError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, GatewayError::UniqueViolation(_))
    }
}

/// The backend contract: filtered reads, single-row writes and the
/// current identity.
///
/// Implementations must be cheap to share behind an `Arc`; every future is
/// `Send` so writes can be spawned as fire-and-forget tasks.
pub trait Gateway: Send + Sync + 'static {
    /// Run a filtered read
    fn select(&self, query: &Query) -> impl Future<Output = Result<Vec<Row>, GatewayError>> + Send;

    /// Insert one row, returning it as stored (with generated id)
    fn insert(
        &self,
        table: Table,
        row: Row,
    ) -> impl Future<Output = Result<Row, GatewayError>> + Send;

    /// Update the row with the given id
    fn update(
        &self,
        table: Table,
        id: &str,
        changes: Row,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Delete the row with the given id
    fn delete(&self, table: Table, id: &str)
    -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Signed-in identity, if any
    fn current_user(&self) -> Option<UserId>;
}
