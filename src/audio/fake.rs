//! In-process media backend for tests
//!
//! Tracks which handles are alive, lets tests hold an open at a gate,
//! raise native events and move the playback position.
//! URLs containing `broken` fail to open, `reject` refuses to play.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;

use super::backend::{MediaBackend, MediaHandle};
use super::events::{MediaEvent, PlaybackError};

const FAKE_DURATION: Duration = Duration::from_secs(180);

#[derive(Default)]
struct Shared {
    next_id: u64,
    live: Vec<(u64, String)>,
    gates: HashMap<String, Arc<Notify>>,
    pending_opens: usize,
    position: Duration,
    events: Vec<MediaEvent>,
    last_volume: Option<f32>,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    shared: Arc<Mutex<Shared>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens of `url` wait until the returned gate is notified
    pub fn gate(&self, url: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.shared.lock().gates.insert(url.to_string(), gate.clone());
        gate
    }

    pub fn pending_opens(&self) -> usize {
        self.shared.lock().pending_opens
    }

    /// URLs of handles not yet dropped, oldest first
    pub fn live_urls(&self) -> Vec<String> {
        self.shared.lock().live.iter().map(|(_, url)| url.clone()).collect()
    }

    pub fn advance(&self, seconds: f64) {
        self.shared.lock().position += Duration::from_secs_f64(seconds);
    }

    pub fn raise(&self, event: MediaEvent) {
        self.shared.lock().events.push(event);
    }

    pub fn last_volume(&self) -> Option<f32> {
        self.shared.lock().last_volume
    }
}

pub struct FakeHandle {
    id: u64,
    shared: Arc<Mutex<Shared>>,
}

impl MediaBackend for FakeBackend {
    type Handle = FakeHandle;

    async fn open(&self, url: &str) -> Result<FakeHandle, PlaybackError> {
        let gate = self.shared.lock().gates.get(url).cloned();
        if let Some(gate) = gate {
            self.shared.lock().pending_opens += 1;
            gate.notified().await;
            self.shared.lock().pending_opens -= 1;
        }

        if url.contains("broken") {
            return Err(PlaybackError::Open(format!("cannot decode {}", url)));
        }

        let mut shared = self.shared.lock();
        shared.next_id += 1;
        let id = shared.next_id;
        shared.live.push((id, url.to_string()));
        shared.position = Duration::ZERO;
        shared.events.clear();

        Ok(FakeHandle {
            id,
            shared: self.shared.clone(),
        })
    }
}

impl FakeHandle {
    fn url(&self) -> String {
        let shared = self.shared.lock();
        shared
            .live
            .iter()
            .find(|(id, _)| *id == self.id)
            .map(|(_, url)| url.clone())
            .unwrap_or_default()
    }
}

impl MediaHandle for FakeHandle {
    fn play(&mut self) -> Result<(), PlaybackError> {
        let url = self.url();
        if url.contains("reject") {
            return Err(PlaybackError::Rejected(format!("autoplay blocked for {}", url)));
        }
        Ok(())
    }

    fn pause(&mut self) {}

    fn set_volume(&mut self, volume: f32) {
        self.shared.lock().last_volume = Some(volume);
    }

    fn seek(&mut self, seconds: f64) {
        let target = seconds.clamp(0.0, FAKE_DURATION.as_secs_f64());
        self.shared.lock().position = Duration::from_secs_f64(target);
    }

    fn position(&self) -> Duration {
        self.shared.lock().position
    }

    fn duration(&self) -> Duration {
        FAKE_DURATION
    }

    fn drain_events(&mut self) -> Vec<MediaEvent> {
        std::mem::take(&mut self.shared.lock().events)
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        self.shared.lock().live.retain(|(id, _)| *id != self.id);
    }
}
