//! My Wave: a shuffled mix of known tracks by the user's preferred artists

use rand::seq::SliceRandom;

use crate::api::{
    Filter, Gateway, GatewayError, HistoryEntry, LibraryEntry, NewPreference, Query, Table, Track,
    UserId, UserPreference, model,
};
use crate::i18n::Key;

use super::{FeatureContext, FeatureError, dedupe_by_id};

const SOURCE_LIMIT: usize = 50;
const MIX_SIZE: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub enum Wave {
    /// No configured preferences, or an empty artist list
    NotConfigured,
    /// `tracks` may be empty when nothing by those artists was played or saved
    Ready {
        artists: Vec<String>,
        tracks: Vec<Track>,
    },
}

pub struct WaveService<G: Gateway> {
    ctx: FeatureContext<G>,
}

impl<G: Gateway> WaveService<G> {
    pub fn new(ctx: FeatureContext<G>) -> Self {
        Self { ctx }
    }

    pub async fn load(&self) -> Result<Wave, FeatureError> {
        let user = self.ctx.require_user()?;
        let preference = match self.preference_of(&user).await {
            Ok(preference) => preference,
            Err(e) => return Err(self.ctx.gateway_failure(Key::LoadFailed, e)),
        };
        let artists = match preference {
            Some(p) if p.is_configured && !p.preferred_artists.is_empty() => p.preferred_artists,
            _ => return Ok(Wave::NotConfigured),
        };

        let tracks = match self.matching_tracks(&user, &artists).await {
            Ok(tracks) => tracks,
            Err(e) => return Err(self.ctx.gateway_failure(Key::LoadFailed, e)),
        };
        let mut tracks = dedupe_by_id(tracks);
        tracks.shuffle(&mut rand::rng());
        tracks.truncate(MIX_SIZE);
        tracing::debug!(artists = artists.len(), tracks = tracks.len(), "Wave assembled");

        Ok(Wave::Ready { artists, tracks })
    }

    /// Replace the preferred artists, creating the preference row if missing
    pub async fn save_preferences(&self, artists: &[String]) -> Result<Vec<String>, FeatureError> {
        let user = self.ctx.require_user()?;
        let mut cleaned: Vec<String> = Vec::new();
        for artist in artists.iter().map(|a| a.trim()).filter(|a| !a.is_empty()) {
            if !cleaned.iter().any(|c| c.eq_ignore_ascii_case(artist)) {
                cleaned.push(artist.to_string());
            }
        }

        match self.write_preference(&user, &cleaned).await {
            Ok(()) => {
                self.ctx.notifier.success(Key::PreferencesSaved, cleaned.join(", "));
                Ok(cleaned)
            }
            Err(e) => Err(self.ctx.gateway_failure(Key::PreferencesSaveFailed, e)),
        }
    }

    async fn write_preference(&self, user: &UserId, artists: &[String]) -> Result<(), GatewayError> {
        let preference = NewPreference {
            user_id: user.to_string(),
            preferred_artists: artists.to_vec(),
            is_configured: !artists.is_empty(),
        };
        let row = model::encode(&preference)?;
        match self.preference_of(user).await? {
            Some(existing) => {
                self.ctx
                    .gateway
                    .update(Table::UserPreferences, &existing.id, row)
                    .await
            }
            None => self
                .ctx
                .gateway
                .insert(Table::UserPreferences, row)
                .await
                .map(|_| ()),
        }
    }

    async fn preference_of(&self, user: &UserId) -> Result<Option<UserPreference>, GatewayError> {
        let query = Query::from(Table::UserPreferences)
            .eq("user_id", user.as_str())
            .limit(1);
        let rows = self.ctx.gateway.select(&query).await?;
        rows.into_iter().next().map(model::decode).transpose()
    }

    async fn matching_tracks(&self, user: &UserId, artists: &[String]) -> Result<Vec<Track>, GatewayError> {
        let any_artist = || {
            artists
                .iter()
                .map(|artist| Filter::contains("artist", artist))
                .collect::<Vec<_>>()
        };

        let history_query = Query::from(Table::ListeningHistory)
            .eq("user_id", user.as_str())
            .or(any_artist())
            .order("played_at", false)
            .limit(SOURCE_LIMIT);
        let library_query = Query::from(Table::UserLibrary)
            .eq("user_id", user.as_str())
            .or(any_artist())
            .order("created_at", false)
            .limit(SOURCE_LIMIT);

        let history: Vec<HistoryEntry> =
            model::decode_all(self.ctx.gateway.select(&history_query).await?)?;
        let library: Vec<LibraryEntry> =
            model::decode_all(self.ctx.gateway.select(&library_query).await?)?;

        Ok(history
            .iter()
            .map(Track::from)
            .chain(library.iter().map(Track::from))
            .collect())
    }
}
