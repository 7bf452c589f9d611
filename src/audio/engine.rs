//! Playback engine
//!
//! Owns at most one live media handle. A play request releases the previous
//! handle before opening the next one; every request takes a new generation
//! number, and a handle whose open resolves after a newer request started is
//! released immediately instead of being installed.

use parking_lot::Mutex;

use super::backend::{MediaBackend, MediaHandle};
use super::events::{EngineStatus, MediaEvent, PlaybackError};
use crate::api::Track;

pub const MAX_VOLUME: u8 = 100;

struct EngineInner<H> {
    handle: Option<H>,
    track: Option<Track>,
    playing: bool,
    /// 0 - 100
    volume: u8,
    generation: u64,
}

/// Transport controls over a single media handle
pub struct PlaybackEngine<B: MediaBackend> {
    backend: B,
    inner: Mutex<EngineInner<B::Handle>>,
}

impl<B: MediaBackend> std::fmt::Debug for PlaybackEngine<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("PlaybackEngine")
            .field("track", &inner.track.as_ref().map(|t| &t.id))
            .field("playing", &inner.playing)
            .field("volume", &inner.volume)
            .field("generation", &inner.generation)
            .finish()
    }
}

impl<B: MediaBackend> PlaybackEngine<B> {
    pub fn new(backend: B, volume: u8) -> Self {
        Self {
            backend,
            inner: Mutex::new(EngineInner {
                handle: None,
                track: None,
                playing: false,
                volume: volume.min(MAX_VOLUME),
                generation: 0,
            }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Replace the active handle with one for `track` and start it
    pub async fn play(&self, track: &Track) -> Result<(), PlaybackError> {
        let url = track
            .url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| PlaybackError::MissingUrl {
                track_id: track.id.clone(),
            })?;

        let generation = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            Self::release(&mut inner);
            inner.generation
        };

        tracing::debug!(track_id = %track.id, generation, "Opening media");
        let opened = self.backend.open(url).await;

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            tracing::debug!(track_id = %track.id, generation, "Play request superseded");
            return Err(PlaybackError::Superseded);
        }

        let mut handle = opened?;
        handle.set_volume(f32::from(inner.volume) / 100.0);
        handle.play()?;

        inner.handle = Some(handle);
        inner.track = Some(track.clone());
        inner.playing = true;
        tracing::info!(track_id = %track.id, title = %track.title, "Playback started");
        Ok(())
    }

    /// Pause if playing, resume if paused. Returns the new playing state,
    /// `false` without touching anything when no track is loaded.
    pub fn toggle_playback(&self) -> bool {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let Some(handle) = inner.handle.as_mut() else {
            return false;
        };

        if inner.playing {
            handle.pause();
            inner.playing = false;
        } else {
            match handle.play() {
                Ok(()) => inner.playing = true,
                Err(e) => tracing::warn!("Failed to resume playback: {}", e),
            }
        }
        inner.playing
    }

    /// Pause and rewind to the start
    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        if let Some(handle) = inner.handle.as_mut() {
            handle.pause();
            handle.seek(0.0);
        }
        inner.playing = false;
    }

    /// Clamp to 0 - 100 and apply; the value carries over to future handles
    pub fn set_volume(&self, volume: i32) -> u8 {
        let volume = volume.clamp(0, i32::from(MAX_VOLUME)) as u8;
        let mut inner = self.inner.lock();
        inner.volume = volume;
        if let Some(handle) = inner.handle.as_mut() {
            handle.set_volume(f32::from(volume) / 100.0);
        }
        volume
    }

    pub fn volume(&self) -> u8 {
        self.inner.lock().volume
    }

    /// No bounds check here, the handle clamps
    pub fn seek(&self, seconds: f64) {
        if let Some(handle) = self.inner.lock().handle.as_mut() {
            handle.seek(seconds);
        }
    }

    /// Seconds, zero without a handle
    pub fn current_time(&self) -> f64 {
        self.inner
            .lock()
            .handle
            .as_ref()
            .map_or(0.0, |h| h.position().as_secs_f64())
    }

    /// Seconds, zero without a handle
    pub fn duration(&self) -> f64 {
        self.inner
            .lock()
            .handle
            .as_ref()
            .map_or(0.0, |h| h.duration().as_secs_f64())
    }

    pub fn is_playing(&self) -> bool {
        self.inner.lock().playing
    }

    pub fn current_track(&self) -> Option<Track> {
        self.inner.lock().track.clone()
    }

    /// Drain native events and report the current state
    ///
    /// `Ended` and `Error` both leave the engine paused; errors are not retried.
    pub fn poll(&self) -> EngineStatus {
        let mut inner = self.inner.lock();
        let Some(handle) = inner.handle.as_mut() else {
            return EngineStatus::default();
        };

        let events = handle.drain_events();
        let current_time = handle.position().as_secs_f64();
        let duration = handle.duration().as_secs_f64();

        for event in events {
            match event {
                MediaEvent::Playing => inner.playing = true,
                MediaEvent::Paused => inner.playing = false,
                MediaEvent::Ended => {
                    tracing::debug!("Track ended");
                    inner.playing = false;
                }
                MediaEvent::Error(message) => {
                    tracing::warn!(error = %message, "Playback interrupted");
                    inner.playing = false;
                }
            }
        }

        EngineStatus {
            playing: inner.playing,
            current_time,
            duration,
        }
    }

    /// Release the handle and forget the current track
    pub fn cleanup(&self) {
        let mut inner = self.inner.lock();
        Self::release(&mut inner);
    }

    fn release(inner: &mut EngineInner<B::Handle>) {
        if let Some(mut handle) = inner.handle.take() {
            handle.pause();
        }
        inner.track = None;
        inner.playing = false;
    }
}
