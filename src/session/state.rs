//! Session state shared between the coordinator and its poller

use std::sync::Arc;

use parking_lot::RwLock;

use crate::api::Track;
use crate::audio::EngineStatus;

/// Snapshot of what is playing
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub current_track: Option<Track>,
    pub playing: bool,
    /// Seconds
    pub current_time: f64,
    /// Seconds
    pub duration: f64,
    /// 0 - 100, kept while muted
    pub volume: u8,
    pub muted: bool,
    /// Current track is saved in the signed-in user's library
    pub is_in_library: bool,
}

impl PlayerState {
    pub fn new(volume: u8) -> Self {
        Self {
            current_track: None,
            playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume,
            muted: false,
            is_in_library: false,
        }
    }

    pub fn current_track_id(&self) -> Option<&str> {
        self.current_track.as_ref().map(|t| t.id.as_str())
    }
}

/// Thread-safe shared session state
///
/// Writers never hold the lock across an await point.
#[derive(Debug, Clone)]
pub struct SharedState {
    inner: Arc<RwLock<PlayerState>>,
}

impl SharedState {
    pub fn new(volume: u8) -> Self {
        Self {
            inner: Arc::new(RwLock::new(PlayerState::new(volume))),
        }
    }

    pub fn snapshot(&self) -> PlayerState {
        self.inner.read().clone()
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut PlayerState) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Copy polled engine state in
    pub fn apply_status(&self, status: EngineStatus) {
        let mut state = self.inner.write();
        state.playing = status.playing;
        state.current_time = status.current_time;
        state.duration = status.duration;
    }
}
