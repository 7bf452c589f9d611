//! Profile page: the user's profile and playlists

use crate::api::{
    Gateway, GatewayError, NewPlaylist, NewProfile, Playlist, Profile, ProfileChanges, Query,
    Table, UserId, model,
};
use crate::i18n::Key;

use super::{FeatureContext, FeatureError, InputError};

pub struct ProfileService<G: Gateway> {
    ctx: FeatureContext<G>,
}

impl<G: Gateway> ProfileService<G> {
    pub fn new(ctx: FeatureContext<G>) -> Self {
        Self { ctx }
    }

    /// The signed-in user's profile, `None` if it was never created
    pub async fn fetch_profile(&self) -> Result<Option<Profile>, FeatureError> {
        let user = self.ctx.require_user()?;
        Ok(self.profile_of(&user).await?)
    }

    /// Overwrite the editable fields, creating the profile if missing
    pub async fn save_profile(&self, changes: ProfileChanges) -> Result<Profile, FeatureError> {
        let user = self.ctx.require_user()?;
        match self.write_profile(&user, &changes).await {
            Ok(profile) => {
                self.ctx.notifier.success(
                    Key::ProfileUpdated,
                    self.ctx.notifier.text(Key::ProfileUpdatedDesc),
                );
                Ok(profile)
            }
            Err(e) => Err(self.ctx.gateway_failure(Key::ProfileUpdateFailed, e)),
        }
    }

    async fn write_profile(&self, user: &UserId, changes: &ProfileChanges) -> Result<Profile, GatewayError> {
        match self.profile_of(user).await? {
            Some(existing) => {
                self.ctx
                    .gateway
                    .update(Table::Profiles, &existing.id, model::encode(changes)?)
                    .await?;
            }
            None => {
                let profile = NewProfile {
                    user_id: user.to_string(),
                    display_name: Some(changes.display_name.clone()),
                    avatar_url: Some(changes.avatar_url.clone()),
                    bio: Some(changes.bio.clone()),
                };
                self.ctx
                    .gateway
                    .insert(Table::Profiles, model::encode(&profile)?)
                    .await?;
            }
        }
        self.profile_of(user)
            .await?
            .ok_or_else(|| GatewayError::Backend("profile vanished after save".to_string()))
    }

    async fn profile_of(&self, user: &UserId) -> Result<Option<Profile>, GatewayError> {
        let rows = self
            .ctx
            .gateway
            .select(&Query::from(Table::Profiles).eq("user_id", user.as_str()).limit(1))
            .await?;
        rows.into_iter().next().map(model::decode).transpose()
    }

    /// Owner's playlists, newest first
    pub async fn playlists(&self) -> Result<Vec<Playlist>, FeatureError> {
        let user = self.ctx.require_user()?;
        let query = Query::from(Table::Playlists)
            .eq("user_id", user.as_str())
            .order("created_at", false);
        let rows = self.ctx.gateway.select(&query).await?;
        Ok(model::decode_all(rows)?)
    }

    pub async fn create_playlist(&self, name: &str, description: &str) -> Result<Playlist, FeatureError> {
        let user = self.ctx.require_user()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(self.ctx.reject(
                Key::Error,
                Key::PlaylistNameRequired,
                InputError::EmptyName,
            ));
        }

        let playlist = NewPlaylist {
            user_id: user.to_string(),
            name: name.to_string(),
            description: Some(description.trim())
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        };
        let inserted = match model::encode(&playlist) {
            Ok(row) => self.ctx.gateway.insert(Table::Playlists, row).await,
            Err(e) => Err(e),
        };

        match inserted.and_then(model::decode::<Playlist>) {
            Ok(playlist) => {
                self.ctx.notifier.success(
                    Key::PlaylistCreated,
                    self.ctx.notifier.text(Key::PlaylistCreatedDesc),
                );
                Ok(playlist)
            }
            Err(e) => Err(self.ctx.gateway_failure(Key::PlaylistCreateFailed, e)),
        }
    }

    /// Delete a playlist owned by the signed-in user
    pub async fn delete_playlist(&self, playlist_id: &str) -> Result<(), FeatureError> {
        let user = self.ctx.require_user()?;

        let query = Query::from(Table::Playlists)
            .select(&["id", "user_id"])
            .eq("id", playlist_id)
            .limit(1);
        let owner = match self.ctx.gateway.select(&query).await {
            Ok(rows) => rows
                .into_iter()
                .next()
                .and_then(|row| row.get("user_id").and_then(|v| v.as_str()).map(str::to_string)),
            Err(e) => return Err(self.ctx.gateway_failure(Key::PlaylistDeleteFailed, e)),
        };

        // Missing rows are treated like a completed delete
        if owner.as_deref().is_some_and(|owner| owner != user.as_str()) {
            self.ctx.notifier.failure(Key::NotPlaylistOwner);
            return Err(FeatureError::NotOwner);
        }

        match self.ctx.gateway.delete(Table::Playlists, playlist_id).await {
            Ok(()) => {
                self.ctx.notifier.success(
                    Key::PlaylistDeleted,
                    self.ctx.notifier.text(Key::PlaylistDeletedDesc),
                );
                Ok(())
            }
            Err(e) => Err(self.ctx.gateway_failure(Key::PlaylistDeleteFailed, e)),
        }
    }
}
