//! Typed records for backend rows
//!
//! Rows arrive as loosely typed JSON objects; every read goes through
//! [`decode`] so a malformed row is rejected at the boundary instead of
//! leaking into session state.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{GatewayError, Row};

/// In-memory descriptor of a playable item. Never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Display duration, e.g. "3:45"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Playable media URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Track {
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            thumbnail: None,
            duration: None,
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    /// Build a track for a bare media URL (file stem becomes id and title)
    pub fn from_url(url: &str) -> Self {
        let stem = url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .map(|name| name.split('.').next().unwrap_or(name))
            .filter(|s| !s.is_empty())
            .unwrap_or("track");
        Self::new(stem, stem, "Unknown Artist").with_url(url)
    }

    /// Convert a loosely shaped legacy record into a track.
    ///
    /// Accepts the id under `videoId`, `video_id` or `id`, and the
    /// thumbnail under `thumbnail` or `thumbnail_url`. A record without any
    /// id gets a generated `track_<millis>` id.
    pub fn from_row(row: &Row) -> Self {
        let text = |key: &str| {
            row.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let id = text("videoId")
            .or_else(|| text("video_id"))
            .or_else(|| text("id"))
            .unwrap_or_else(|| format!("track_{}", chrono::Utc::now().timestamp_millis()));

        Self {
            id,
            title: text("title").unwrap_or_default(),
            artist: text("artist").unwrap_or_default(),
            thumbnail: text("thumbnail").or_else(|| text("thumbnail_url")),
            duration: text("duration"),
            url: text("url"),
        }
    }
}

/// Public profile, one per identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl Profile {
    /// Stand-in used when a friend has no profile row
    pub fn placeholder(user_id: &str) -> Self {
        Self {
            id: user_id.to_string(),
            user_id: user_id.to_string(),
            display_name: None,
            avatar_url: None,
            bio: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub user_id: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

/// Editable profile fields
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileChanges {
    pub display_name: String,
    pub bio: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
            FriendshipStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Friendship {
    pub id: String,
    pub requester_id: String,
    pub addressee_id: String,
    pub status: FriendshipStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Friendship {
    /// The party that is not `user_id`
    pub fn other_party(&self, user_id: &str) -> &str {
        if self.requester_id == user_id {
            &self.addressee_id
        } else {
            &self.requester_id
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewFriendship {
    pub requester_id: String,
    pub addressee_id: String,
    pub status: FriendshipStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub tracks: Option<Vec<Track>>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPlaylist {
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
}

/// Saved track, unique per (user_id, video_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub id: String,
    pub user_id: String,
    pub video_id: String,
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewLibraryEntry {
    pub user_id: String,
    pub video_id: String,
    pub title: String,
    pub artist: String,
    pub thumbnail_url: String,
    pub duration: String,
}

/// Append-only listening log row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub user_id: String,
    pub video_id: String,
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    pub played_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewHistoryEntry {
    pub user_id: String,
    pub video_id: String,
    pub title: String,
    pub artist: String,
    pub thumbnail_url: Option<String>,
    pub duration: Option<String>,
}

impl NewHistoryEntry {
    pub fn for_track(user_id: &str, track: &Track) -> Self {
        Self {
            user_id: user_id.to_string(),
            video_id: track.id.clone(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            thumbnail_url: track.thumbnail.clone(),
            duration: track.duration.clone(),
        }
    }
}

/// At most one row per owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreference {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub preferred_artists: Vec<String>,
    #[serde(default)]
    pub is_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPreference {
    pub user_id: String,
    pub preferred_artists: Vec<String>,
    pub is_configured: bool,
}

impl From<&HistoryEntry> for Track {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            id: entry.video_id.clone(),
            title: entry.title.clone(),
            artist: entry.artist.clone().unwrap_or_default(),
            thumbnail: entry.thumbnail_url.clone().filter(|s| !s.is_empty()),
            duration: entry.duration.clone(),
            url: None,
        }
    }
}

impl From<&LibraryEntry> for Track {
    fn from(entry: &LibraryEntry) -> Self {
        Self {
            id: entry.video_id.clone(),
            title: entry.title.clone(),
            artist: entry.artist.clone().unwrap_or_default(),
            thumbnail: entry.thumbnail_url.clone().filter(|s| !s.is_empty()),
            duration: entry.duration.clone(),
            url: None,
        }
    }
}

/// Decode one raw row into a typed record
pub fn decode<T: DeserializeOwned>(row: Row) -> Result<T, GatewayError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| GatewayError::Decode(e.to_string()))
}

/// Decode every row, failing on the first malformed one
pub fn decode_all<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, GatewayError> {
    rows.into_iter().map(decode).collect()
}

/// Encode a record into a raw row
pub fn encode<T: Serialize>(value: &T) -> Result<Row, GatewayError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => Err(GatewayError::Decode(format!("expected an object, got {}", other))),
        Err(e) => Err(GatewayError::Decode(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_from_row_prefers_video_id_aliases() {
        let legacy = row(json!({
            "videoId": "abc",
            "video_id": "ignored",
            "title": "T",
            "artist": "A",
            "thumbnail_url": "http://x/t.jpg"
        }));
        let track = Track::from_row(&legacy);
        assert_eq!(track.id, "abc");
        assert_eq!(track.thumbnail.as_deref(), Some("http://x/t.jpg"));
        assert_eq!(track.url, None);

        let snake = row(json!({"video_id": "def", "title": "T", "artist": "A"}));
        assert_eq!(Track::from_row(&snake).id, "def");
    }

    #[test]
    fn test_from_row_generates_id() {
        let bare = row(json!({"title": "T", "artist": "A"}));
        assert!(Track::from_row(&bare).id.starts_with("track_"));
    }

    #[test]
    fn test_from_url_uses_file_stem() {
        let track = Track::from_url("http://x/songs/a.mp3");
        assert_eq!(track.id, "a");
        assert_eq!(track.url.as_deref(), Some("http://x/songs/a.mp3"));
    }

    #[test]
    fn test_decode_rejects_bad_status() {
        let bad = row(json!({
            "id": "1",
            "requester_id": "a",
            "addressee_id": "b",
            "status": "blocked"
        }));
        assert!(matches!(
            decode::<Friendship>(bad),
            Err(GatewayError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_missing_required_column() {
        let bad = row(json!({"id": "1", "user_id": "u"}));
        assert!(decode::<LibraryEntry>(bad).is_err());
    }

    #[test]
    fn test_friendship_other_party() {
        let friendship = Friendship {
            id: "1".into(),
            requester_id: "a".into(),
            addressee_id: "b".into(),
            status: FriendshipStatus::Accepted,
            created_at: None,
        };
        assert_eq!(friendship.other_party("a"), "b");
        assert_eq!(friendship.other_party("b"), "a");
    }

    #[test]
    fn test_history_entry_to_track() {
        let entry = HistoryEntry {
            id: "h1".into(),
            user_id: "u".into(),
            video_id: "abc".into(),
            title: "T".into(),
            artist: None,
            thumbnail_url: Some(String::new()),
            duration: Some("3:00".into()),
            played_at: "2026-01-01T00:00:00.000Z".into(),
        };
        let track = Track::from(&entry);
        assert_eq!(track.id, "abc");
        assert_eq!(track.artist, "");
        assert_eq!(track.thumbnail, None);
    }
}
