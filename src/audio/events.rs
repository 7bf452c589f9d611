//! Playback events and errors
//!
//! The media primitive reports what happened to a handle through
//! `MediaEvent`s; the engine drains them when it is polled. Nothing is
//! pushed to callers.

/// Native events raised by a media handle
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    Playing,
    Paused,
    /// Reached the end of the media
    Ended,
    /// Runtime failure (network interruption, decode error)
    Error(String),
}

/// Errors surfaced by `PlaybackEngine::play`
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlaybackError {
    #[error("track `{track_id}` has no playable url")]
    MissingUrl { track_id: String },
    /// The media could not be fetched or decoded
    #[error("failed to open media: {0}")]
    Open(String),
    /// The primitive refused to start playback
    #[error("playback rejected: {0}")]
    Rejected(String),
    /// A newer play request replaced this one while it was opening
    #[error("superseded by a newer play request")]
    Superseded,
}

/// Engine state copied out on each poll
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineStatus {
    pub playing: bool,
    /// Seconds
    pub current_time: f64,
    /// Seconds
    pub duration: f64,
}
