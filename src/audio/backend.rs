//! Media primitive boundary
//!
//! A backend turns a playable URL into a handle. Releasing a handle is
//! dropping it; implementations must stop output on drop.

use std::future::Future;
use std::time::Duration;

use super::events::{MediaEvent, PlaybackError};

/// A single opened media resource
pub trait MediaHandle: Send + 'static {
    /// Start or resume output
    fn play(&mut self) -> Result<(), PlaybackError>;

    fn pause(&mut self);

    /// Linear gain, 0.0 - 1.0
    fn set_volume(&mut self, volume: f32);

    /// Move to `seconds`, clamped by the handle to the media bounds
    fn seek(&mut self, seconds: f64);

    fn position(&self) -> Duration;

    /// Zero when unknown
    fn duration(&self) -> Duration;

    /// Take every event raised since the last call
    fn drain_events(&mut self) -> Vec<MediaEvent>;
}

/// Opens media handles
pub trait MediaBackend: Send + Sync + 'static {
    type Handle: MediaHandle;

    /// Open `url`; the returned handle is paused
    fn open(&self, url: &str) -> impl Future<Output = Result<Self::Handle, PlaybackError>> + Send;
}
