//! Video search through the YouTube Data API v3

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use crate::api::Track;
use crate::i18n::Key;
use crate::session::Notifier;

use super::{FeatureError, InputError};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const MAX_RESULTS: &str = "20";

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: ItemId,
    snippet: Snippet,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Deserialize, Default)]
struct Thumbnails {
    #[serde(default)]
    default: Option<Thumbnail>,
}

#[derive(Deserialize)]
struct Thumbnail {
    url: String,
}

pub struct YoutubeSearch {
    client: Client,
    base_url: String,
    api_key: String,
    notifier: Notifier,
}

impl YoutubeSearch {
    pub fn new(client: Client, api_key: impl Into<String>, notifier: Notifier) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            notifier,
        }
    }

    /// Point at another API root (mirrors, local fakes)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Up to 20 videos matching `text`
    pub async fn search(&self, text: &str) -> Result<Vec<Track>, FeatureError> {
        let text = text.trim();
        if text.is_empty() {
            self.notifier
                .error(Key::Error, self.notifier.text(Key::EmptyQuery));
            return Err(InputError::EmptyQuery.into());
        }

        match self.request(text).await {
            Ok(tracks) => {
                debug!(query = text, results = tracks.len(), "Search finished");
                Ok(tracks)
            }
            Err(e) => {
                error!(error = %e, query = text, "Search failed");
                self.notifier.failure(Key::SearchFailed);
                Err(FeatureError::Search(e.to_string()))
            }
        }
    }

    async fn request(&self, text: &str) -> Result<Vec<Track>, reqwest::Error> {
        let response: SearchResponse = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("maxResults", MAX_RESULTS),
                ("q", text),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(into_tracks(response))
    }
}

/// Items without a video id (channels, playlists) are skipped
fn into_tracks(response: SearchResponse) -> Vec<Track> {
    response
        .items
        .into_iter()
        .filter_map(|item| {
            let video_id = item.id.video_id?;
            let mut track = Track::new(video_id, item.snippet.title, item.snippet.channel_title);
            track.thumbnail = item.snippet.thumbnails.default.map(|t| t.url);
            Some(track)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Locale;

    const SAMPLE: &str = r#"{
        "kind": "youtube#searchListResponse",
        "items": [
            {
                "id": {"kind": "youtube#video", "videoId": "WiST_wKlFDY"},
                "snippet": {
                    "title": "Blade Runner Blues",
                    "channelTitle": "Vangelis",
                    "thumbnails": {"default": {"url": "https://i.ytimg.com/vi/WiST_wKlFDY/default.jpg"}}
                }
            },
            {
                "id": {"kind": "youtube#channel", "channelId": "UC123"},
                "snippet": {"title": "Vangelis - Topic", "channelTitle": "Vangelis"}
            },
            {
                "id": {"kind": "youtube#video", "videoId": "abc"},
                "snippet": {"title": "No thumbnail", "channelTitle": "Someone", "thumbnails": {}}
            }
        ]
    }"#;

    #[test]
    fn test_items_map_to_tracks() {
        let response: SearchResponse = serde_json::from_str(SAMPLE).unwrap();
        let tracks = into_tracks(response);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, "WiST_wKlFDY");
        assert_eq!(tracks[0].artist, "Vangelis");
        assert_eq!(
            tracks[0].thumbnail.as_deref(),
            Some("https://i.ytimg.com/vi/WiST_wKlFDY/default.jpg")
        );
        assert_eq!(tracks[1].thumbnail, None);
    }

    #[test]
    fn test_missing_items_is_empty() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(into_tracks(response).is_empty());
    }

    #[tokio::test]
    async fn test_blank_query_rejected_before_request() {
        let (notifier, mut rx) = Notifier::channel(Locale::default());
        // Unroutable root: any request would fail with a transport error
        let search = YoutubeSearch::new(Client::new(), "key", notifier)
            .with_base_url("http://127.0.0.1:9");

        assert!(matches!(
            search.search("   ").await,
            Err(FeatureError::Input(InputError::EmptyQuery))
        ));
        let notification = rx.try_recv().unwrap();
        assert_eq!(notification.message, "Enter something to search for");
    }
}
