//! Curated recommendations, personalized once the user has listened to anything

use crate::api::{Gateway, Query, Table, Track};
use crate::i18n::Key;

use super::FeatureContext;

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub track: Track,
    /// Localized reason shown next to the track
    pub reason: String,
}

/// (video id, title, artist, reason)
const CURATED: [(&str, &str, &str, Key); 6] = [
    ("jfKfPfyJRdk", "lofi hip hop radio - beats to relax/study to", "Lofi Girl", Key::ReasonPopularDark),
    ("4xDzrJKXOOY", "The Abyss - Dark Ambient", "Cryo Chamber", Key::ReasonDarkAmbient),
    ("5qap5aO4i9A", "Dark Synthwave Mix", "Various Artists", Key::ReasonSynthwave),
    ("WiST_wKlFDY", "Blade Runner Blues", "Vangelis", Key::ReasonCyberpunk),
    ("hFcLyDb6niA", "Carpenter Brut - Turbo Killer", "Carpenter Brut", Key::ReasonDarkwave),
    ("oe7fy5Q-5-s", "Dark Gothic Music", "Adrian von Ziegler", Key::ReasonGothic),
];

const PERSONAL_REASONS: [Key; 2] = [Key::ReasonFromHistory, Key::ReasonLikeYourTaste];

pub struct RecommendationsService<G: Gateway> {
    ctx: FeatureContext<G>,
}

impl<G: Gateway> RecommendationsService<G> {
    pub fn new(ctx: FeatureContext<G>) -> Self {
        Self { ctx }
    }

    /// The curated list. Never fails: a history lookup error keeps the
    /// generic reasons.
    pub async fn load(&self) -> Vec<Recommendation> {
        let personalized = self.has_history().await;
        CURATED
            .iter()
            .enumerate()
            .map(|(i, (video_id, title, artist, reason))| {
                let reason = match PERSONAL_REASONS.get(i) {
                    Some(personal) if personalized => *personal,
                    _ => *reason,
                };
                Recommendation {
                    track: Track::new(*video_id, *title, *artist).with_thumbnail(format!(
                        "https://i.ytimg.com/vi/{}/maxresdefault.jpg",
                        video_id
                    )),
                    reason: self.ctx.notifier.text(reason).to_string(),
                }
            })
            .collect()
    }

    async fn has_history(&self) -> bool {
        let Some(user) = self.ctx.gateway.current_user() else {
            return false;
        };
        let query = Query::from(Table::ListeningHistory)
            .select(&["id"])
            .eq("user_id", user.as_str())
            .limit(1);
        match self.ctx.gateway.select(&query).await {
            Ok(rows) => !rows.is_empty(),
            Err(e) => {
                tracing::warn!(error = %e, "History lookup for recommendations failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::testing::{add_history, at, context};

    #[tokio::test]
    async fn test_anonymous_gets_generic_reasons() {
        let (ctx, _rx) = context(None).await;
        let recs = RecommendationsService::new(ctx).load().await;
        assert_eq!(recs.len(), 6);
        assert_eq!(recs[0].reason, "Popular in dark music");
        assert_eq!(recs[3].track.artist, "Vangelis");
        assert_eq!(
            recs[0].track.thumbnail.as_deref(),
            Some("https://i.ytimg.com/vi/jfKfPfyJRdk/maxresdefault.jpg")
        );
    }

    #[tokio::test]
    async fn test_history_personalizes_first_two() {
        let (ctx, _rx) = context(Some("u1")).await;
        let service = RecommendationsService::new(ctx.clone());
        assert_eq!(service.load().await[1].reason, "Dark ambient");

        add_history(&ctx.gateway, "u1", "x", "A", &at(1)).await;
        let recs = service.load().await;
        assert_eq!(recs[0].reason, "Based on your history");
        assert_eq!(recs[1].reason, "Similar to your taste");
        assert_eq!(recs[2].reason, "Synthwave classic");
    }
}
