//! Gallery: history-based picks and artist search over the user's own rows

use crate::api::{Gateway, GatewayError, HistoryEntry, LibraryEntry, Query, Table, Track, model};
use crate::i18n::Key;

use super::{FeatureContext, FeatureError, dedupe_by_id};

const HISTORY_WINDOW: usize = 50;
const TOP_ARTISTS: usize = 5;
const MAX_PICKS: usize = 12;
/// Artists need this many matching tracks to get their own group
const GROUP_THRESHOLD: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ArtistGroup {
    pub artist: String,
    pub tracks: Vec<Track>,
}

impl ArtistGroup {
    pub fn count(&self) -> usize {
        self.tracks.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtistSearch {
    pub tracks: Vec<Track>,
    pub groups: Vec<ArtistGroup>,
}

pub struct GalleryService<G: Gateway> {
    ctx: FeatureContext<G>,
}

impl<G: Gateway> GalleryService<G> {
    pub fn new(ctx: FeatureContext<G>) -> Self {
        Self { ctx }
    }

    /// Up to 12 recent plays by the user's five most played artists
    pub async fn recommendations(&self) -> Result<Vec<Track>, FeatureError> {
        let user = self.ctx.require_user()?;
        let query = Query::from(Table::ListeningHistory)
            .eq("user_id", user.as_str())
            .order("played_at", false)
            .limit(HISTORY_WINDOW);

        let history: Vec<HistoryEntry> = match self.ctx.gateway.select(&query).await {
            Ok(rows) => model::decode_all(rows)?,
            Err(e) => return Err(self.ctx.gateway_failure(Key::LoadFailed, e)),
        };

        let top = top_artists(&history, TOP_ARTISTS);
        Ok(history
            .iter()
            .filter(|entry| {
                entry
                    .artist
                    .as_deref()
                    .is_some_and(|artist| top.iter().any(|t| t == artist))
            })
            .take(MAX_PICKS)
            .map(Track::from)
            .collect())
    }

    /// History and library tracks whose artist contains `text`
    ///
    /// Blank text yields an empty result without touching the gateway.
    pub async fn search_by_artist(&self, text: &str) -> Result<ArtistSearch, FeatureError> {
        let user = self.ctx.require_user()?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(ArtistSearch::default());
        }

        let history_query = Query::from(Table::ListeningHistory)
            .eq("user_id", user.as_str())
            .contains("artist", text);
        let library_query = Query::from(Table::UserLibrary)
            .eq("user_id", user.as_str())
            .contains("artist", text);

        let fetched = async {
            let history: Vec<HistoryEntry> =
                model::decode_all(self.ctx.gateway.select(&history_query).await?)?;
            let library: Vec<LibraryEntry> =
                model::decode_all(self.ctx.gateway.select(&library_query).await?)?;
            Ok::<_, GatewayError>((history, library))
        };
        let (history, library) = match fetched.await {
            Ok(found) => found,
            Err(e) => return Err(self.ctx.gateway_failure(Key::SearchFailed, e)),
        };

        let tracks = dedupe_by_id(
            history
                .iter()
                .map(Track::from)
                .chain(library.iter().map(Track::from)),
        );
        let groups = artist_groups(&tracks, GROUP_THRESHOLD);
        Ok(ArtistSearch { tracks, groups })
    }
}

/// Most played artists, ties keep first appearance order
fn top_artists(history: &[HistoryEntry], n: usize) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for artist in history.iter().filter_map(|e| e.artist.as_deref()) {
        if artist.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(a, _)| a == artist) {
            Some((_, count)) => *count += 1,
            None => counts.push((artist.to_string(), 1)),
        }
    }
    // Stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(n).map(|(artist, _)| artist).collect()
}

/// Group tracks by artist, keeping groups of at least `threshold` tracks
fn artist_groups(tracks: &[Track], threshold: usize) -> Vec<ArtistGroup> {
    let mut groups: Vec<ArtistGroup> = Vec::new();
    for track in tracks {
        match groups.iter_mut().find(|g| g.artist == track.artist) {
            Some(group) => group.tracks.push(track.clone()),
            None => groups.push(ArtistGroup {
                artist: track.artist.clone(),
                tracks: vec![track.clone()],
            }),
        }
    }
    groups.retain(|g| g.count() >= threshold);
    groups.sort_by(|a, b| b.count().cmp(&a.count()));
    groups
}
