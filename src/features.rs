//! Feature modules - queries and writes behind each view
//!
//! Each feature talks to the gateway directly and reports outcomes through
//! the shared `Notifier`. Features never touch playback; callers hand the
//! returned tracks to the session.

pub mod friends;
pub mod gallery;
pub mod profile;
pub mod recent;
pub mod recommendations;
pub mod search;
pub mod settings;
pub mod wave;

use std::sync::Arc;

use crate::api::{Gateway, GatewayError, Track, UserId};
use crate::i18n::Key;
use crate::session::Notifier;

pub use friends::{Friend, FriendRequest, FriendResponse, FriendsService};
pub use gallery::{ArtistGroup, ArtistSearch, GalleryService};
pub use profile::ProfileService;
pub use recent::RecentTracksService;
pub use recommendations::{Recommendation, RecommendationsService};
pub use search::YoutubeSearch;
pub use settings::{BackendKind, ProxyType, Settings};
pub use wave::{Wave, WaveService};

/// Rejected before any gateway write
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("search text is empty")]
    EmptyQuery,
    #[error("cannot send a friend request to yourself")]
    SelfRequest,
    #[error("no user matches the search")]
    UserNotFound,
    #[error("a friendship already exists between these users")]
    DuplicateRequest,
    #[error("name is empty")]
    EmptyName,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum FeatureError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("sign in required")]
    AuthRequired,
    #[error("only the owner can do this")]
    NotOwner,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("search provider error: {0}")]
    Search(String),
}

/// What every feature needs: the gateway and the notification channel
pub struct FeatureContext<G: Gateway> {
    pub gateway: Arc<G>,
    pub notifier: Notifier,
}

impl<G: Gateway> Clone for FeatureContext<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            notifier: self.notifier.clone(),
        }
    }
}

impl<G: Gateway> FeatureContext<G> {
    pub fn new(gateway: Arc<G>, notifier: Notifier) -> Self {
        Self { gateway, notifier }
    }

    /// Signed-in identity, views without one degrade to read-only
    pub(crate) fn require_user(&self) -> Result<UserId, FeatureError> {
        self.gateway.current_user().ok_or(FeatureError::AuthRequired)
    }

    /// Log, notify a generic failure and wrap the error
    pub(crate) fn gateway_failure(&self, message: Key, e: GatewayError) -> FeatureError {
        tracing::error!(error = %e, "{}", self.notifier.text(message));
        self.notifier.failure(message);
        FeatureError::Gateway(e)
    }

    /// Notify an input error with a translated title and message
    pub(crate) fn reject(&self, title: Key, message: Key, error: InputError) -> FeatureError {
        self.notifier.error(title, self.notifier.text(message));
        FeatureError::Input(error)
    }
}

/// Keep the first track for each id, preserving order
pub(crate) fn dedupe_by_id(tracks: impl IntoIterator<Item = Track>) -> Vec<Track> {
    let mut seen = std::collections::HashSet::new();
    tracks
        .into_iter()
        .filter(|track| seen.insert(track.id.clone()))
        .collect()
}
