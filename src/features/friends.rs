//! Friends: accepted friendships, incoming requests and sending requests
//!
//! A friendship is one row per unordered pair. Requests are found by
//! display name; existing rows in either direction block a new request.

use crate::api::{
    Filter, Friendship, FriendshipStatus, Gateway, GatewayError, NewFriendship, Profile, Query,
    Table, model,
};
use crate::i18n::Key;

use super::{FeatureContext, FeatureError, InputError};

/// An accepted friendship joined to the other party's profile
#[derive(Debug, Clone, PartialEq)]
pub struct Friend {
    pub friendship_id: String,
    pub profile: Profile,
    pub since: Option<String>,
}

/// A pending request addressed to the signed-in user
#[derive(Debug, Clone, PartialEq)]
pub struct FriendRequest {
    pub friendship_id: String,
    pub requester: Profile,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendResponse {
    Accept,
    Reject,
}

impl FriendResponse {
    fn status(self) -> FriendshipStatus {
        match self {
            FriendResponse::Accept => FriendshipStatus::Accepted,
            FriendResponse::Reject => FriendshipStatus::Rejected,
        }
    }
}

pub struct FriendsService<G: Gateway> {
    ctx: FeatureContext<G>,
}

impl<G: Gateway> FriendsService<G> {
    pub fn new(ctx: FeatureContext<G>) -> Self {
        Self { ctx }
    }

    /// Accepted friendships where the user is either side
    pub async fn load_friends(&self) -> Result<Vec<Friend>, FeatureError> {
        let user = self.ctx.require_user()?;
        let query = Query::from(Table::Friendships)
            .or(vec![
                Filter::eq("requester_id", user.as_str()),
                Filter::eq("addressee_id", user.as_str()),
            ])
            .eq("status", FriendshipStatus::Accepted.as_str());

        let friendships: Vec<Friendship> = self.fetch(&query).await?;
        let mut friends = Vec::with_capacity(friendships.len());
        for friendship in friendships {
            let profile = self.profile_or_placeholder(friendship.other_party(user.as_str())).await?;
            friends.push(Friend {
                friendship_id: friendship.id,
                profile,
                since: friendship.created_at,
            });
        }
        Ok(friends)
    }

    /// Pending requests addressed to the user
    pub async fn pending_requests(&self) -> Result<Vec<FriendRequest>, FeatureError> {
        let user = self.ctx.require_user()?;
        let query = Query::from(Table::Friendships)
            .eq("addressee_id", user.as_str())
            .eq("status", FriendshipStatus::Pending.as_str());

        let friendships: Vec<Friendship> = self.fetch(&query).await?;
        let mut requests = Vec::with_capacity(friendships.len());
        for friendship in friendships {
            let requester = self.profile_or_placeholder(&friendship.requester_id).await?;
            requests.push(FriendRequest {
                friendship_id: friendship.id,
                requester,
                created_at: friendship.created_at,
            });
        }
        Ok(requests)
    }

    /// Find a user by display name and send them a pending request
    pub async fn send_request(&self, search_text: &str) -> Result<Friendship, FeatureError> {
        let search_text = search_text.trim();
        if search_text.is_empty() {
            return Err(self.ctx.reject(Key::Error, Key::EmptyQuery, InputError::EmptyQuery));
        }
        let user = self.ctx.require_user()?;

        let target = match self.find_by_display_name(search_text).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                return Err(self.ctx.reject(
                    Key::UserNotFound,
                    Key::UserNotFoundDesc,
                    InputError::UserNotFound,
                ));
            }
            Err(e) => return Err(self.ctx.gateway_failure(Key::RequestSendFailed, e)),
        };

        if target.user_id == user.as_str() {
            return Err(self.ctx.reject(Key::Error, Key::SelfRequest, InputError::SelfRequest));
        }

        let existing = Query::from(Table::Friendships)
            .select(&["id"])
            .or(vec![
                Filter::and(vec![
                    Filter::eq("requester_id", user.as_str()),
                    Filter::eq("addressee_id", target.user_id.as_str()),
                ]),
                Filter::and(vec![
                    Filter::eq("requester_id", target.user_id.as_str()),
                    Filter::eq("addressee_id", user.as_str()),
                ]),
            ])
            .limit(1);
        match self.ctx.gateway.select(&existing).await {
            Ok(rows) if !rows.is_empty() => return Err(self.duplicate()),
            Ok(_) => {}
            Err(e) => return Err(self.ctx.gateway_failure(Key::RequestSendFailed, e)),
        }

        let request = NewFriendship {
            requester_id: user.to_string(),
            addressee_id: target.user_id.clone(),
            status: FriendshipStatus::Pending,
        };
        let inserted = match model::encode(&request) {
            Ok(row) => self.ctx.gateway.insert(Table::Friendships, row).await,
            Err(e) => Err(e),
        };

        match inserted.and_then(model::decode::<Friendship>) {
            Ok(friendship) => {
                let name = target.display_name.as_deref().unwrap_or(&target.user_id);
                self.ctx.notifier.success(
                    Key::RequestSent,
                    format!("{} {}", self.ctx.notifier.text(Key::RequestSentDesc), name),
                );
                tracing::info!(addressee = %target.user_id, "Friend request sent");
                Ok(friendship)
            }
            // Lost a race with a request from the other side
            Err(e) if e.is_unique_violation() => Err(self.duplicate()),
            Err(e) => Err(self.ctx.gateway_failure(Key::RequestSendFailed, e)),
        }
    }

    /// Accept or reject a pending request
    pub async fn respond(&self, friendship_id: &str, response: FriendResponse) -> Result<(), FeatureError> {
        let mut changes = crate::api::Row::new();
        changes.insert("status".into(), response.status().as_str().into());

        match self.ctx.gateway.update(Table::Friendships, friendship_id, changes).await {
            Ok(()) => {
                let (title, message) = match response {
                    FriendResponse::Accept => (Key::RequestAccepted, Key::RequestAcceptedDesc),
                    FriendResponse::Reject => (Key::RequestRejected, Key::RequestRejectedDesc),
                };
                self.ctx.notifier.success(title, self.ctx.notifier.text(message));
                Ok(())
            }
            Err(e) => Err(self.ctx.gateway_failure(Key::RespondFailed, e)),
        }
    }

    pub async fn remove_friend(&self, friendship_id: &str) -> Result<(), FeatureError> {
        match self.ctx.gateway.delete(Table::Friendships, friendship_id).await {
            Ok(()) => {
                self.ctx
                    .notifier
                    .success(Key::FriendRemoved, self.ctx.notifier.text(Key::FriendRemovedDesc));
                Ok(())
            }
            Err(e) => Err(self.ctx.gateway_failure(Key::RemoveFriendFailed, e)),
        }
    }

    fn duplicate(&self) -> FeatureError {
        self.ctx.notifier.info(
            Key::RequestExists,
            self.ctx.notifier.text(Key::RequestExistsDesc),
        );
        FeatureError::Input(InputError::DuplicateRequest)
    }

    async fn fetch(&self, query: &Query) -> Result<Vec<Friendship>, FeatureError> {
        let rows = self
            .ctx
            .gateway
            .select(query)
            .await
            .and_then(model::decode_all::<Friendship>);
        rows.map_err(|e| {
            tracing::error!(error = %e, "Failed to load friendships");
            FeatureError::Gateway(e)
        })
    }

    async fn profile_or_placeholder(&self, user_id: &str) -> Result<Profile, FeatureError> {
        let query = Query::from(Table::Profiles).eq("user_id", user_id).limit(1);
        let rows = self.ctx.gateway.select(&query).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(model::decode(row)?),
            None => Ok(Profile::placeholder(user_id)),
        }
    }

    /// Exact case-insensitive match wins; otherwise a single partial match
    async fn find_by_display_name(&self, text: &str) -> Result<Option<Profile>, GatewayError> {
        let rows = self
            .ctx
            .gateway
            .select(&Query::from(Table::Profiles).contains("display_name", text).limit(20))
            .await?;
        let profiles: Vec<Profile> = model::decode_all(rows)?;

        let exact = profiles.iter().find(|p| {
            p.display_name
                .as_deref()
                .is_some_and(|name| name.eq_ignore_ascii_case(text))
        });
        if let Some(profile) = exact {
            return Ok(Some(profile.clone()));
        }
        if profiles.len() == 1 {
            return Ok(profiles.into_iter().next());
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UserId;
    use crate::database::Database;
    use crate::features::testing::context;
    use crate::session::NotificationKind;

    async fn register(db: &Database, user: &str, name: &str) {
        db.register_user(&UserId::new(user), name).await.unwrap();
    }

    async fn friendship_count(db: &Database) -> usize {
        db.select(&Query::from(Table::Friendships)).await.unwrap().len()
    }

    #[tokio::test]
    async fn test_self_request_rejected_before_write() {
        let (ctx, mut rx) = context(Some("u1")).await;
        register(&ctx.gateway, "u1", "Night Owl").await;
        let friends = FriendsService::new(ctx.clone());

        let err = friends.send_request("night owl").await.unwrap_err();
        assert!(matches!(err, FeatureError::Input(InputError::SelfRequest)));
        assert_eq!(friendship_count(&ctx.gateway).await, 0);
        assert_eq!(rx.try_recv().unwrap().message, "You can't add yourself as a friend");
    }

    #[tokio::test]
    async fn test_empty_and_unknown_search() {
        let (ctx, _rx) = context(Some("u1")).await;
        let friends = FriendsService::new(ctx.clone());

        assert!(matches!(
            friends.send_request("   ").await,
            Err(FeatureError::Input(InputError::EmptyQuery))
        ));
        assert!(matches!(
            friends.send_request("nobody").await,
            Err(FeatureError::Input(InputError::UserNotFound))
        ));
    }

    #[tokio::test]
    async fn test_wildcard_name_matches_literally() {
        let (ctx, _rx) = context(Some("u1")).await;
        register(&ctx.gateway, "u1", "Alice").await;
        register(&ctx.gateway, "u2", "Bob").await;
        let friends = FriendsService::new(ctx.clone());

        for text in ["%", "_o_"] {
            assert!(matches!(
                friends.send_request(text).await,
                Err(FeatureError::Input(InputError::UserNotFound))
            ));
        }
        assert_eq!(friendship_count(&ctx.gateway).await, 0);

        register(&ctx.gateway, "u3", "100% Goth").await;
        friends.send_request("100%").await.unwrap();
        assert_eq!(friendship_count(&ctx.gateway).await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_request_in_either_direction() {
        let (ctx, mut rx) = context(Some("u1")).await;
        register(&ctx.gateway, "u1", "Alice").await;
        register(&ctx.gateway, "u2", "Bob").await;
        let friends = FriendsService::new(ctx.clone());

        friends.send_request("bob").await.unwrap();
        assert_eq!(rx.try_recv().unwrap().message, "Friend request sent to Bob");

        let err = friends.send_request("Bob").await.unwrap_err();
        assert!(matches!(err, FeatureError::Input(InputError::DuplicateRequest)));
        let note = rx.try_recv().unwrap();
        assert_eq!(note.kind, NotificationKind::Info);
        assert_eq!(note.title, "Request already exists");

        // The other side asking back is also a duplicate
        ctx.gateway.sign_in_as(&UserId::new("u2"));
        let err = friends.send_request("alice").await.unwrap_err();
        assert!(matches!(err, FeatureError::Input(InputError::DuplicateRequest)));
        assert_eq!(friendship_count(&ctx.gateway).await, 1);
    }

    #[tokio::test]
    async fn test_accept_then_list_both_sides() {
        let (ctx, _rx) = context(Some("u1")).await;
        register(&ctx.gateway, "u1", "Alice").await;
        register(&ctx.gateway, "u2", "Bob").await;
        let friends = FriendsService::new(ctx.clone());
        friends.send_request("Bob").await.unwrap();

        ctx.gateway.sign_in_as(&UserId::new("u2"));
        let pending = friends.pending_requests().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].requester.display_name.as_deref(), Some("Alice"));
        assert!(friends.load_friends().await.unwrap().is_empty());

        friends
            .respond(&pending[0].friendship_id, FriendResponse::Accept)
            .await
            .unwrap();
        assert!(friends.pending_requests().await.unwrap().is_empty());

        let bobs = friends.load_friends().await.unwrap();
        assert_eq!(bobs[0].profile.user_id, "u1");

        ctx.gateway.sign_in_as(&UserId::new("u1"));
        let alices = friends.load_friends().await.unwrap();
        assert_eq!(alices[0].profile.display_name.as_deref(), Some("Bob"));

        friends.remove_friend(&alices[0].friendship_id).await.unwrap();
        assert!(friends.load_friends().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_friend_without_profile_gets_placeholder() {
        let (ctx, _rx) = context(Some("u1")).await;
        let row = serde_json::json!({
            "requester_id": "u1",
            "addressee_id": "ghost",
            "status": "accepted"
        });
        ctx.gateway
            .insert(Table::Friendships, row.as_object().unwrap().clone())
            .await
            .unwrap();

        let friends = FriendsService::new(ctx).load_friends().await.unwrap();
        assert_eq!(friends[0].profile, Profile::placeholder("ghost"));
    }

    #[tokio::test]
    async fn test_ambiguous_name_prefers_exact_match() {
        let (ctx, _rx) = context(Some("u1")).await;
        register(&ctx.gateway, "u2", "Max").await;
        register(&ctx.gateway, "u3", "Maxine").await;
        let friends = FriendsService::new(ctx.clone());

        let friendship = friends.send_request("max").await.unwrap();
        assert_eq!(friendship.addressee_id, "u2");
        assert!(matches!(
            friends.send_request("ma").await,
            Err(FeatureError::Input(InputError::UserNotFound))
        ));
    }

    #[tokio::test]
    async fn test_anonymous_cannot_list() {
        let (ctx, _rx) = context(None).await;
        assert!(matches!(
            FriendsService::new(ctx).load_friends().await,
            Err(FeatureError::AuthRequired)
        ));
    }
}
