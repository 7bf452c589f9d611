//! Audio playback module
//!
//! - `PlaybackEngine`: transport controls over a single live media handle
//! - `MediaBackend` / `MediaHandle`: the media primitive boundary
//! - `RodioBackend`: rodio implementation for local and downloaded media
//! - `events`: native handle events and playback errors

mod backend;
mod engine;
pub mod events;
#[cfg(test)]
pub(crate) mod fake;
mod player;

pub use backend::{MediaBackend, MediaHandle};
pub use engine::{MAX_VOLUME, PlaybackEngine};
pub use events::{EngineStatus, MediaEvent, PlaybackError};
pub use player::{RodioBackend, RodioHandle};
