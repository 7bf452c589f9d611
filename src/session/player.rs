//! Player session coordinator
//!
//! Bridges callers to the playback engine and the gateway: keeps one
//! current track, mirrors engine state into `PlayerState`, records listening
//! history as a side effect of play requests, and answers library
//! membership for the current track.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rand::seq::IndexedRandom;
use tokio::task::JoinSet;

use super::notify::Notifier;
use super::poller::{self, PollerHandle};
use super::state::{PlayerState, SharedState};
use crate::api::{
    Gateway, GatewayError, NewHistoryEntry, NewLibraryEntry, Query, Table, Track, UserId, model,
};
use crate::audio::{MediaBackend, PlaybackEngine, PlaybackError};
use crate::i18n::Key;
use crate::utils::format_time;

/// Result of `add_to_library`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryOutcome {
    Added,
    /// The (owner, track) pair was already saved, nothing was written
    AlreadyPresent,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LibraryError {
    /// No signed-in identity or no current track
    #[error("sign in required")]
    AuthRequired,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Shared source of truth for what is playing
pub struct PlayerSession<G: Gateway, B: MediaBackend> {
    gateway: Arc<G>,
    engine: Arc<PlaybackEngine<B>>,
    state: SharedState,
    notifier: Notifier,
    fallback_tracks: Vec<Track>,
    online: AtomicBool,
    history_tasks: Mutex<JoinSet<()>>,
    history_failures: Arc<AtomicU64>,
}

impl<G: Gateway, B: MediaBackend> std::fmt::Debug for PlayerSession<G, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerSession")
            .field("state", &self.state)
            .field("engine", &self.engine)
            .field("history_failures", &self.history_failures())
            .finish_non_exhaustive()
    }
}

impl<G: Gateway, B: MediaBackend> PlayerSession<G, B> {
    pub fn new(
        gateway: Arc<G>,
        engine: Arc<PlaybackEngine<B>>,
        notifier: Notifier,
        fallback_tracks: Vec<Track>,
    ) -> Self {
        let volume = engine.volume();
        Self {
            gateway,
            engine,
            state: SharedState::new(volume),
            notifier,
            fallback_tracks,
            online: AtomicBool::new(true),
            history_tasks: Mutex::new(JoinSet::new()),
            history_failures: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state.snapshot()
    }

    pub fn engine(&self) -> &PlaybackEngine<B> {
        &self.engine
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Presumed connectivity; history is only recorded while online
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Relaxed);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    /// Number of history writes that failed since startup
    pub fn history_failures(&self) -> u64 {
        self.history_failures.load(Ordering::Relaxed)
    }

    // ============ Playback ============

    /// Play `track` and make it current
    ///
    /// Failures are reported as a notification and returned; a request that
    /// was replaced by a newer one returns `Superseded` without notifying.
    pub async fn play_track(&self, track: Track) -> Result<(), PlaybackError> {
        match self.engine.play(&track).await {
            Ok(()) => {}
            Err(PlaybackError::Superseded) => return Err(PlaybackError::Superseded),
            Err(e) => {
                tracing::error!(track_id = %track.id, error = %e, "Playback failed");
                self.notifier
                    .error(Key::PlaybackFailed, self.notifier.text(Key::PlaybackFailedDesc));
                // The engine already dropped the previous track before the open failed
                if self.engine.current_track().is_none() {
                    self.state.update(|state| {
                        state.current_track = None;
                        state.playing = false;
                        state.current_time = 0.0;
                        state.duration = 0.0;
                        state.is_in_library = false;
                    });
                }
                return Err(e);
            }
        }

        let duration = self.engine.duration();
        self.state.update(|state| {
            state.current_track = Some(track.clone());
            state.playing = true;
            state.current_time = 0.0;
            state.duration = duration;
        });

        self.record_history(&track);
        self.refresh_library_flag().await;
        Ok(())
    }

    /// Pause or resume; with no current track, play a random fallback track
    pub async fn toggle_play(&self) -> bool {
        if self.state.snapshot().current_track.is_none() {
            return self.play_random().await.is_ok();
        }

        let playing = self.engine.toggle_playback();
        self.state.update(|state| state.playing = playing);
        playing
    }

    /// Random pick from the fallback set; there is no queue to advance
    pub async fn next(&self) -> Result<(), PlaybackError> {
        self.play_random().await
    }

    /// Same as `next`
    pub async fn previous(&self) -> Result<(), PlaybackError> {
        self.play_random().await
    }

    async fn play_random(&self) -> Result<(), PlaybackError> {
        let track = self.fallback_tracks.choose(&mut rand::rng()).cloned();
        match track {
            Some(track) => self.play_track(track).await,
            None => {
                tracing::warn!("No fallback tracks configured");
                Ok(())
            }
        }
    }

    pub fn seek(&self, seconds: f64) {
        self.engine.seek(seconds);
        self.state.update(|state| state.current_time = seconds);
    }

    /// Clamp to 0 - 100; zero counts as muted
    pub fn set_volume(&self, volume: i32) -> u8 {
        let applied = self.engine.set_volume(volume);
        self.state.update(|state| {
            state.volume = applied;
            state.muted = applied == 0;
        });
        applied
    }

    /// Mute keeps the volume setting; unmute restores it
    ///
    /// Stays muted when the kept volume is zero, there is nothing to restore.
    pub fn toggle_mute(&self) -> bool {
        let (muted, volume) = {
            let state = self.state.snapshot();
            (state.muted, state.volume)
        };

        if muted && volume == 0 {
            return true;
        }
        if muted {
            self.engine.set_volume(i32::from(volume));
        } else {
            self.engine.set_volume(0);
        }
        self.state.update(|state| state.muted = !muted);
        !muted
    }

    /// Copy engine time, duration and playing flag into the session state
    pub fn sync(&self) {
        self.state.apply_status(self.engine.poll());
    }

    /// Poll the engine every `period` until the handle is stopped or dropped
    pub fn spawn_poller(&self, period: Duration) -> PollerHandle {
        let engine = self.engine.clone();
        let state = self.state.clone();
        poller::spawn(period, move || state.apply_status(engine.poll()))
    }

    // ============ History ============

    fn record_history(&self, track: &Track) {
        let Some(user) = self.gateway.current_user() else {
            return;
        };
        if !self.is_online() {
            tracing::debug!(track_id = %track.id, "Offline, skipping history");
            return;
        }

        let row = match model::encode(&NewHistoryEntry::for_track(user.as_str(), track)) {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode history entry");
                return;
            }
        };

        let gateway = self.gateway.clone();
        let failures = self.history_failures.clone();
        let track_id = track.id.clone();

        let mut tasks = self.history_tasks.lock();
        while let Some(finished) = tasks.try_join_next() {
            if let Err(e) = finished {
                tracing::warn!(error = %e, "History task panicked");
            }
        }
        tasks.spawn(async move {
            if let Err(e) = gateway.insert(Table::ListeningHistory, row).await {
                failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    user_id = %user,
                    track_id = %track_id,
                    error = %e,
                    "Failed to record listening history"
                );
            }
        });
    }

    /// Wait for outstanding history writes
    pub async fn flush_history(&self) {
        let mut tasks = std::mem::take(&mut *self.history_tasks.lock());
        while let Some(finished) = tasks.join_next().await {
            if let Err(e) = finished {
                tracing::warn!(error = %e, "History task panicked");
            }
        }
    }

    // ============ Library ============

    fn library_owner(&self) -> Option<(UserId, Track)> {
        let user = self.gateway.current_user()?;
        let track = self.state.snapshot().current_track?;
        Some((user, track))
    }

    /// Save the current track to the signed-in user's library
    pub async fn add_to_library(&self) -> Result<LibraryOutcome, LibraryError> {
        let Some((user, track)) = self.library_owner() else {
            self.notifier.failure(Key::SignInRequired);
            return Err(LibraryError::AuthRequired);
        };

        let duration = track
            .duration
            .clone()
            .unwrap_or_else(|| format_time(self.engine.duration()));
        let entry = NewLibraryEntry {
            user_id: user.to_string(),
            video_id: track.id.clone(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            thumbnail_url: track.thumbnail.clone().unwrap_or_default(),
            duration,
        };

        let result = match model::encode(&entry) {
            Ok(row) => self.gateway.insert(Table::UserLibrary, row).await.map(|_| ()),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.set_in_library(&track.id, true);
                self.notifier.success(Key::AddedToLibrary, track.title.clone());
                Ok(LibraryOutcome::Added)
            }
            Err(e) if e.is_unique_violation() => {
                self.set_in_library(&track.id, true);
                self.notifier.info(Key::AlreadyInLibrary, track.title.clone());
                Ok(LibraryOutcome::AlreadyPresent)
            }
            Err(e) => {
                tracing::error!(track_id = %track.id, error = %e, "Failed to add to library");
                self.notifier.failure(Key::AddToLibraryFailed);
                Err(e.into())
            }
        }
    }

    /// Remove the current track from the signed-in user's library
    pub async fn remove_from_library(&self) -> Result<(), LibraryError> {
        let Some((user, track)) = self.library_owner() else {
            return Err(LibraryError::AuthRequired);
        };

        match self.delete_library_rows(&user, &track.id).await {
            Ok(()) => {
                self.set_in_library(&track.id, false);
                self.notifier.success(Key::RemovedFromLibrary, track.title.clone());
                Ok(())
            }
            Err(e) => {
                tracing::error!(track_id = %track.id, error = %e, "Failed to remove from library");
                self.notifier.failure(Key::RemoveFromLibraryFailed);
                Err(e.into())
            }
        }
    }

    async fn delete_library_rows(&self, user: &UserId, video_id: &str) -> Result<(), GatewayError> {
        let rows = self
            .gateway
            .select(&library_query(user, video_id))
            .await?;
        for row in rows {
            if let Some(id) = row.get("id").and_then(|v| v.as_str()) {
                self.gateway.delete(Table::UserLibrary, id).await?;
            }
        }
        Ok(())
    }

    /// Recompute `is_in_library` for the current track and identity
    pub async fn refresh_library_flag(&self) {
        let Some((user, track)) = self.library_owner() else {
            self.state.update(|state| state.is_in_library = false);
            return;
        };
        if !self.is_online() {
            return;
        }

        match self.gateway.select(&library_query(&user, &track.id).limit(1)).await {
            Ok(rows) => self.set_in_library(&track.id, !rows.is_empty()),
            Err(e) => tracing::warn!(track_id = %track.id, error = %e, "Library check failed"),
        }
    }

    /// Call after sign-in or sign-out
    pub async fn identity_changed(&self) {
        tracing::debug!(user = ?self.gateway.current_user(), "Identity changed");
        self.refresh_library_flag().await;
    }

    /// Only touch the flag if `track_id` is still current
    fn set_in_library(&self, track_id: &str, saved: bool) {
        self.state.update(|state| {
            if state.current_track_id() == Some(track_id) {
                state.is_in_library = saved;
            }
        });
    }

    /// Release the media handle and stop recording
    pub async fn shutdown(&self) {
        self.engine.cleanup();
        self.flush_history().await;
    }
}

fn library_query(user: &UserId, video_id: &str) -> Query {
    Query::from(Table::UserLibrary)
        .select(&["id"])
        .eq("user_id", user.as_str())
        .eq("video_id", video_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{HistoryEntry, LibraryEntry};
    use crate::audio::fake::FakeBackend;
    use crate::database::Database;
    use crate::i18n::Locale;
    use crate::session::{NotificationKind, NotificationReceiver};

    struct Harness {
        session: PlayerSession<Database, FakeBackend>,
        db: Arc<Database>,
        backend: FakeBackend,
        notifications: NotificationReceiver,
    }

    fn fallback() -> Vec<Track> {
        ["f1", "f2", "f3"]
            .iter()
            .map(|id| Track::new(*id, *id, "Fallback").with_url(format!("http://x/{}.mp3", id)))
            .collect()
    }

    async fn harness() -> Harness {
        let db = Arc::new(Database::in_memory().await.unwrap());
        let backend = FakeBackend::new();
        let engine = Arc::new(PlaybackEngine::new(backend.clone(), 80));
        let (notifier, notifications) = Notifier::channel(Locale::default());
        let session = PlayerSession::new(db.clone(), engine, notifier, fallback());
        Harness {
            session,
            db,
            backend,
            notifications,
        }
    }

    fn abc() -> Track {
        Track::new("abc", "T", "A").with_url("http://x/a.mp3")
    }

    async fn history_for(db: &Database, user: &str) -> Vec<HistoryEntry> {
        let rows = db
            .select(&Query::from(Table::ListeningHistory).eq("user_id", user))
            .await
            .unwrap();
        model::decode_all(rows).unwrap()
    }

    #[tokio::test]
    async fn test_play_track_end_to_end() {
        let h = harness().await;
        h.db.sign_in_as(&UserId::new("U1"));

        h.session.play_track(abc()).await.unwrap();
        let state = h.session.state();
        assert_eq!(state.current_track_id(), Some("abc"));
        assert!(state.playing);
        h.session.flush_history().await;

        // Clock is only paused around the poll, the pool has its own timers
        tokio::time::pause();
        let poller = h.session.spawn_poller(Duration::from_secs(1));
        h.backend.advance(7.0);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(h.session.state().current_time, 0.0);
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(h.session.state().current_time, 7.0);
        assert_eq!(h.session.state().duration, 180.0);
        poller.stop().await;
        tokio::time::resume();

        let history = history_for(&h.db, "U1").await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].video_id, "abc");
        assert_eq!(history[0].user_id, "U1");
    }

    #[tokio::test]
    async fn test_anonymous_play_records_nothing() {
        let h = harness().await;
        h.session.play_track(abc()).await.unwrap();
        h.session.flush_history().await;

        let rows = h.db.select(&Query::from(Table::ListeningHistory)).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_offline_play_records_nothing() {
        let h = harness().await;
        h.db.sign_in_as(&UserId::new("U1"));
        h.session.set_online(false);
        h.session.play_track(abc()).await.unwrap();
        h.session.flush_history().await;

        assert!(history_for(&h.db, "U1").await.is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_add_to_library_is_rejected_locally() {
        let mut h = harness().await;
        h.session.play_track(abc()).await.unwrap();

        let result = h.session.add_to_library().await;
        assert!(matches!(result, Err(LibraryError::AuthRequired)));

        let note = h.notifications.try_recv().unwrap();
        assert_eq!(note.kind, NotificationKind::Error);
        assert_eq!(note.message, "You need to sign in");

        let rows = h.db.select(&Query::from(Table::UserLibrary)).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_library_insert_is_already_present() {
        let mut h = harness().await;
        h.db.sign_in_as(&UserId::new("U1"));
        h.session.play_track(abc()).await.unwrap();
        assert!(!h.session.state().is_in_library);

        assert_eq!(h.session.add_to_library().await.unwrap(), LibraryOutcome::Added);
        assert!(h.session.state().is_in_library);
        assert_eq!(
            h.session.add_to_library().await.unwrap(),
            LibraryOutcome::AlreadyPresent
        );

        let rows = h
            .db
            .select(&Query::from(Table::UserLibrary).eq("user_id", "U1"))
            .await
            .unwrap();
        let entries: Vec<LibraryEntry> = model::decode_all(rows).unwrap();
        assert_eq!(entries.len(), 1);
        // No duration on the track, the engine's is formatted
        assert_eq!(entries[0].duration.as_deref(), Some("3:00"));

        let first = h.notifications.try_recv().unwrap();
        assert_eq!(first.kind, NotificationKind::Success);
        let second = h.notifications.try_recv().unwrap();
        assert_eq!(second.kind, NotificationKind::Info);
        assert_eq!(second.title, "Track is already in your library");
    }

    #[tokio::test]
    async fn test_remove_from_library_and_flag_refresh() {
        let h = harness().await;
        h.db.sign_in_as(&UserId::new("U1"));
        h.session.play_track(abc()).await.unwrap();
        h.session.add_to_library().await.unwrap();

        // Replaying the saved track sees it in the library
        h.session.play_track(abc()).await.unwrap();
        assert!(h.session.state().is_in_library);

        h.session.remove_from_library().await.unwrap();
        assert!(!h.session.state().is_in_library);
        let rows = h.db.select(&Query::from(Table::UserLibrary)).await.unwrap();
        assert!(rows.is_empty());

        h.session.add_to_library().await.unwrap();
        h.db.sign_out();
        h.session.identity_changed().await;
        assert!(!h.session.state().is_in_library);
    }

    #[tokio::test]
    async fn test_next_picks_from_fallback_set() {
        let h = harness().await;
        let ids: Vec<String> = fallback().into_iter().map(|t| t.id).collect();

        for _ in 0..2 {
            h.session.next().await.unwrap();
            let current = h.session.state().current_track.unwrap();
            assert!(ids.contains(&current.id));
        }
        h.session.previous().await.unwrap();
        assert!(ids.contains(&h.session.state().current_track.unwrap().id));
        assert_eq!(h.backend.live_urls().len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_play_without_track_plays_fallback() {
        let h = harness().await;
        assert!(h.session.toggle_play().await);
        assert!(h.session.state().current_track.is_some());

        assert!(!h.session.toggle_play().await);
        assert!(!h.session.state().playing);
    }

    #[tokio::test]
    async fn test_playback_failure_notifies() {
        let mut h = harness().await;
        let result = h.session.play_track(Track::new("n", "No url", "x")).await;
        assert!(matches!(result, Err(PlaybackError::MissingUrl { .. })));
        assert!(h.session.state().current_track.is_none());

        let note = h.notifications.try_recv().unwrap();
        assert_eq!(note.kind, NotificationKind::Error);
        assert_eq!(note.title, "Playback error");
    }

    #[tokio::test]
    async fn test_failed_open_clears_previous_track() {
        let mut h = harness().await;
        h.db.sign_in_as(&UserId::new("U1"));
        h.session.play_track(abc()).await.unwrap();
        h.session.add_to_library().await.unwrap();
        assert!(h.session.state().is_in_library);
        while h.notifications.try_recv().is_ok() {}

        let broken = Track::new("broken", "B", "A").with_url("http://x/broken.mp3");
        let result = h.session.play_track(broken).await;
        assert!(matches!(result, Err(PlaybackError::Open(_))));
        assert_eq!(h.notifications.try_recv().unwrap().title, "Playback error");

        h.session.sync();
        let state = h.session.state();
        assert!(state.current_track.is_none());
        assert!(!state.playing);
        assert_eq!(state.current_time, 0.0);
        assert_eq!(state.duration, 0.0);
        assert!(!state.is_in_library);
        assert!(h.backend.live_urls().is_empty());
        assert!(matches!(
            h.session.add_to_library().await,
            Err(LibraryError::AuthRequired)
        ));

        // Nothing loaded, so toggling starts a fallback track
        assert!(h.session.toggle_play().await);
        let ids: Vec<String> = fallback().into_iter().map(|t| t.id).collect();
        assert!(ids.contains(&h.session.state().current_track.unwrap().id));
        assert_eq!(h.backend.live_urls().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_url_keeps_current_track() {
        let h = harness().await;
        h.session.play_track(abc()).await.unwrap();
        assert!(h.session.play_track(Track::new("n", "No url", "x")).await.is_err());

        let state = h.session.state();
        assert_eq!(state.current_track_id(), Some("abc"));
        assert!(state.playing);
    }

    #[tokio::test]
    async fn test_unmute_at_zero_volume_stays_muted() {
        let h = harness().await;
        h.session.play_track(abc()).await.unwrap();
        h.session.set_volume(0);
        assert!(h.session.state().muted);

        assert!(h.session.toggle_mute());
        assert!(h.session.state().muted);
        assert_eq!(h.backend.last_volume(), Some(0.0));

        h.session.set_volume(30);
        assert!(!h.session.state().muted);
        assert!(h.session.toggle_mute());
        assert!(!h.session.toggle_mute());
        assert_eq!(h.backend.last_volume(), Some(0.3));
    }

    #[tokio::test]
    async fn test_volume_and_mute() {
        let h = harness().await;
        h.session.play_track(abc()).await.unwrap();

        assert_eq!(h.session.set_volume(150), 100);
        assert_eq!(h.session.set_volume(60), 60);

        assert!(h.session.toggle_mute());
        assert_eq!(h.backend.last_volume(), Some(0.0));
        assert_eq!(h.session.state().volume, 60);

        assert!(!h.session.toggle_mute());
        assert_eq!(h.backend.last_volume(), Some(0.6));

        h.session.set_volume(-10);
        assert!(h.session.state().muted);
    }

    #[tokio::test]
    async fn test_seek_mirrors_position() {
        let h = harness().await;
        h.session.play_track(abc()).await.unwrap();
        h.session.seek(42.0);
        assert_eq!(h.session.state().current_time, 42.0);
        assert_eq!(h.session.engine().current_time(), 42.0);
    }

    /// Gateway whose history inserts always fail
    struct FailingHistory {
        inner: Database,
    }

    impl Gateway for FailingHistory {
        async fn select(&self, query: &Query) -> Result<Vec<crate::api::Row>, GatewayError> {
            self.inner.select(query).await
        }

        async fn insert(
            &self,
            table: Table,
            row: crate::api::Row,
        ) -> Result<crate::api::Row, GatewayError> {
            if table == Table::ListeningHistory {
                return Err(GatewayError::Transport("offline".into()));
            }
            self.inner.insert(table, row).await
        }

        async fn update(
            &self,
            table: Table,
            id: &str,
            changes: crate::api::Row,
        ) -> Result<(), GatewayError> {
            self.inner.update(table, id, changes).await
        }

        async fn delete(&self, table: Table, id: &str) -> Result<(), GatewayError> {
            self.inner.delete(table, id).await
        }

        fn current_user(&self) -> Option<UserId> {
            self.inner.current_user()
        }
    }

    #[tokio::test]
    async fn test_history_failure_is_counted_not_surfaced() {
        let db = Database::in_memory().await.unwrap();
        db.sign_in_as(&UserId::new("U1"));
        let gateway = Arc::new(FailingHistory { inner: db });
        let engine = Arc::new(PlaybackEngine::new(FakeBackend::new(), 80));
        let (notifier, mut notifications) = Notifier::channel(Locale::default());
        let session = PlayerSession::new(gateway, engine, notifier, fallback());

        session.play_track(abc()).await.unwrap();
        session.play_track(abc()).await.unwrap();
        session.flush_history().await;

        assert_eq!(session.history_failures(), 2);
        assert!(session.state().playing);
        assert!(notifications.try_recv().is_err());
    }
}
