//! Nocturne - music community client core
//!
//! Playback session, personal library, listening history, friends,
//! playlists and discovery views over a hosted backend or a local
//! SQLite store.

pub mod api;
pub mod audio;
pub mod database;
pub mod features;
pub mod i18n;
pub mod session;
pub mod utils;
