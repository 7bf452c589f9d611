//! Rodio media backend
//!
//! The output stream lives on a dedicated thread for the lifetime of the
//! backend; handles only hold a `Sink` connected to its mixer.
//! `http(s)://` URLs are downloaded whole with reqwest, `file://` URLs and
//! plain paths are read from disk.

use std::io::Cursor;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use rodio::mixer::Mixer;
use rodio::{Decoder, OutputStreamBuilder, Sink, Source};

use super::backend::{MediaBackend, MediaHandle};
use super::events::{MediaEvent, PlaybackError};

/// Media backend that plays through the default output device
pub struct RodioBackend {
    mixer: Mixer,
    client: reqwest::Client,
    /// Dropping this lets the output thread exit and close the stream
    _shutdown: mpsc::Sender<()>,
}

impl std::fmt::Debug for RodioBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioBackend").finish_non_exhaustive()
    }
}

impl RodioBackend {
    /// Open the default output device
    pub fn new(client: reqwest::Client) -> Result<Self> {
        let (mixer_tx, mixer_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                let stream = match OutputStreamBuilder::open_default_stream() {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = mixer_tx.send(Err(format!("Failed to create audio output: {}", e)));
                        return;
                    }
                };
                let _ = mixer_tx.send(Ok(stream.mixer().clone()));

                // Park until the backend is dropped
                let _ = shutdown_rx.recv();
                drop(stream);
                tracing::debug!("Audio output closed");
            })
            .context("Failed to spawn audio output thread")?;

        let mixer = mixer_rx
            .recv()
            .context("Audio output thread exited early")?
            .map_err(anyhow::Error::msg)?;

        tracing::info!("Audio output opened");
        Ok(Self {
            mixer,
            client,
            _shutdown: shutdown_tx,
        })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PlaybackError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| PlaybackError::Open(format!("Failed to download {}: {}", url, e)))?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| PlaybackError::Open(format!("Failed to download {}: {}", url, e)))?;
            return Ok(bytes.to_vec());
        }

        let path = url.strip_prefix("file://").unwrap_or(url);
        tokio::fs::read(path)
            .await
            .map_err(|e| PlaybackError::Open(format!("Failed to open file {}: {}", path, e)))
    }
}

impl MediaBackend for RodioBackend {
    type Handle = RodioHandle;

    async fn open(&self, url: &str) -> Result<RodioHandle, PlaybackError> {
        let bytes = self.fetch(url).await?;
        let mixer = self.mixer.clone();

        tokio::task::spawn_blocking(move || RodioHandle::decode(&mixer, bytes))
            .await
            .map_err(|e| PlaybackError::Open(e.to_string()))?
    }
}

/// One decoded track connected to the output mixer
pub struct RodioHandle {
    sink: Sink,
    duration: Duration,
    ended: bool,
}

impl RodioHandle {
    fn decode(mixer: &Mixer, bytes: Vec<u8>) -> Result<Self, PlaybackError> {
        let source = Decoder::new(Cursor::new(bytes))
            .map_err(|e| PlaybackError::Open(format!("Failed to decode audio: {}", e)))?;
        let duration = source.total_duration().unwrap_or(Duration::ZERO);

        let sink = Sink::connect_new(mixer);
        sink.pause();
        sink.append(source);

        Ok(Self {
            sink,
            duration,
            ended: false,
        })
    }
}

impl MediaHandle for RodioHandle {
    fn play(&mut self) -> Result<(), PlaybackError> {
        if self.sink.empty() {
            return Err(PlaybackError::Rejected("nothing left to play".to_string()));
        }
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn seek(&mut self, seconds: f64) {
        let mut target = Duration::from_secs_f64(seconds.max(0.0));
        if !self.duration.is_zero() {
            target = target.min(self.duration);
        }
        if let Err(e) = self.sink.try_seek(target) {
            tracing::warn!("Seek to {:?} failed: {}", target, e);
        }
        self.ended = false;
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn drain_events(&mut self) -> Vec<MediaEvent> {
        if !self.ended && self.sink.empty() {
            self.ended = true;
            return vec![MediaEvent::Ended];
        }
        Vec::new()
    }
}

impl Drop for RodioHandle {
    fn drop(&mut self) {
        self.sink.stop();
    }
}
