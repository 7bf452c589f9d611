//! English translations

use super::Key;
use once_cell::sync::Lazy;
use std::collections::HashMap;

static TRANSLATIONS: Lazy<HashMap<Key, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    // Common
    m.insert(Key::Error, "Error");
    m.insert(Key::SignInRequired, "You need to sign in");
    m.insert(Key::LoadFailed, "Failed to load data");

    // Playback
    m.insert(Key::PlaybackFailed, "Playback error");
    m.insert(Key::PlaybackFailedDesc, "Could not play the track");

    // Library
    m.insert(Key::AddedToLibrary, "Added to library");
    m.insert(Key::AlreadyInLibrary, "Track is already in your library");
    m.insert(Key::AddToLibraryFailed, "Could not add to library");
    m.insert(Key::RemovedFromLibrary, "Removed from library");
    m.insert(Key::RemoveFromLibraryFailed, "Could not remove from library");

    // Friends
    m.insert(Key::UserNotFound, "User not found");
    m.insert(Key::UserNotFoundDesc, "Check that the name is spelled correctly");
    m.insert(Key::SelfRequest, "You can't add yourself as a friend");
    m.insert(Key::RequestExists, "Request already exists");
    m.insert(
        Key::RequestExistsDesc,
        "You already sent a request or are already friends",
    );
    m.insert(Key::RequestSent, "Request sent");
    m.insert(Key::RequestSentDesc, "Friend request sent to");
    m.insert(Key::RequestSendFailed, "Could not send the friend request");
    m.insert(Key::RequestAccepted, "Request accepted");
    m.insert(Key::RequestAcceptedDesc, "Friend request accepted");
    m.insert(Key::RequestRejected, "Request declined");
    m.insert(Key::RequestRejectedDesc, "Friend request declined");
    m.insert(Key::RespondFailed, "Could not respond to the request");
    m.insert(Key::FriendRemoved, "Friend removed");
    m.insert(Key::FriendRemovedDesc, "The user was removed from your friends");
    m.insert(Key::RemoveFriendFailed, "Could not remove the friend");

    // Profile
    m.insert(Key::ProfileUpdated, "Profile updated");
    m.insert(Key::ProfileUpdatedDesc, "Your changes were saved.");
    m.insert(Key::ProfileUpdateFailed, "Could not update the profile");
    m.insert(Key::PlaylistCreated, "Playlist created");
    m.insert(Key::PlaylistCreatedDesc, "The new playlist was added.");
    m.insert(Key::PlaylistCreateFailed, "Could not create the playlist");
    m.insert(Key::PlaylistNameRequired, "Playlist name can't be empty");
    m.insert(Key::PlaylistDeleted, "Playlist deleted");
    m.insert(Key::PlaylistDeletedDesc, "The playlist was deleted.");
    m.insert(Key::PlaylistDeleteFailed, "Could not delete the playlist");
    m.insert(Key::NotPlaylistOwner, "Only the owner can delete this playlist");

    // Search & Wave
    m.insert(Key::EmptyQuery, "Enter something to search for");
    m.insert(Key::SearchFailed, "Search failed");
    m.insert(Key::PreferencesSaved, "Preferences saved");
    m.insert(Key::PreferencesSaveFailed, "Could not save preferences");

    // Recommendations
    m.insert(Key::ReasonPopularDark, "Popular in dark music");
    m.insert(Key::ReasonDarkAmbient, "Dark ambient");
    m.insert(Key::ReasonSynthwave, "Synthwave classic");
    m.insert(Key::ReasonCyberpunk, "Cyberpunk atmosphere");
    m.insert(Key::ReasonDarkwave, "Energetic darkwave");
    m.insert(Key::ReasonGothic, "Gothic atmosphere");
    m.insert(Key::ReasonFromHistory, "Based on your history");
    m.insert(Key::ReasonLikeYourTaste, "Similar to your taste");

    m
});

pub fn translations() -> &'static HashMap<Key, &'static str> {
    &TRANSLATIONS
}
