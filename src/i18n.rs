//! Internationalization (i18n) support for notifications
//!
//! Structure:
//! - i18n.rs: Core types (Language, Key, Locale) and translation lookup
//! - en.rs: English translations
//! - ru.rs: Russian translations

mod en;
mod ru;

use std::collections::HashMap;

/// Supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    English,
    Russian,
}

impl Language {
    /// Get language display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Russian => "Русский",
        }
    }

    /// Get language code
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Russian => "ru",
        }
    }

    /// Parse a language code, unknown codes fall back to English
    pub fn from_code(code: &str) -> Self {
        Self::all()
            .iter()
            .copied()
            .find(|lang| lang.code().eq_ignore_ascii_case(code.trim()))
            .unwrap_or_default()
    }

    /// All available languages
    pub fn all() -> &'static [Language] {
        &[Language::English, Language::Russian]
    }
}

/// Translation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    // Common
    Error,
    SignInRequired,
    LoadFailed,

    // Playback
    PlaybackFailed,
    PlaybackFailedDesc,

    // Library
    AddedToLibrary,
    AlreadyInLibrary,
    AddToLibraryFailed,
    RemovedFromLibrary,
    RemoveFromLibraryFailed,

    // Friends
    UserNotFound,
    UserNotFoundDesc,
    SelfRequest,
    RequestExists,
    RequestExistsDesc,
    RequestSent,
    RequestSentDesc,
    RequestSendFailed,
    RequestAccepted,
    RequestAcceptedDesc,
    RequestRejected,
    RequestRejectedDesc,
    RespondFailed,
    FriendRemoved,
    FriendRemovedDesc,
    RemoveFriendFailed,

    // Profile
    ProfileUpdated,
    ProfileUpdatedDesc,
    ProfileUpdateFailed,
    PlaylistCreated,
    PlaylistCreatedDesc,
    PlaylistCreateFailed,
    PlaylistNameRequired,
    PlaylistDeleted,
    PlaylistDeletedDesc,
    PlaylistDeleteFailed,
    NotPlaylistOwner,

    // Search & Wave
    EmptyQuery,
    SearchFailed,
    PreferencesSaved,
    PreferencesSaveFailed,

    // Recommendations
    ReasonPopularDark,
    ReasonDarkAmbient,
    ReasonSynthwave,
    ReasonCyberpunk,
    ReasonDarkwave,
    ReasonGothic,
    ReasonFromHistory,
    ReasonLikeYourTaste,
}

/// Get translation for a key in the specified language
pub fn t(lang: Language, key: Key) -> &'static str {
    let translations: &HashMap<Key, &'static str> = match lang {
        Language::English => en::translations(),
        Language::Russian => ru::translations(),
    };

    translations.get(&key).copied().unwrap_or("???")
}

/// Localization context that can be passed around
#[derive(Debug, Clone, Copy, Default)]
pub struct Locale {
    pub language: Language,
}

impl Locale {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// Get translation for a key
    pub fn get(&self, key: Key) -> &'static str {
        t(self.language, key)
    }
}
