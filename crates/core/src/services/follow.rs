//! Follow toggle on the asymmetric profile relation.

use fable_common::{AppError, AppResult};
use fable_db::{
    entities::{follow, user, Follow, Profile, User},
    repositories::FollowRepository,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use std::sync::Arc;

use crate::services::engagement::ToggleState;
use crate::services::notification::notify_on;
use crate::services::txn_err;

/// Follow service.
#[derive(Clone)]
pub struct FollowService {
    db: Arc<DatabaseConnection>,
    follow_repo: FollowRepository,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, follow_repo: FollowRepository) -> Self {
        Self { db, follow_repo }
    }

    /// Toggle following the profile behind a username. The target user is
    /// notified on add only.
    pub async fn toggle_follow(
        &self,
        actor_user_id: &str,
        target_username: &str,
    ) -> AppResult<ToggleState> {
        let actor_user_id = actor_user_id.to_string();
        let target_username = target_username.to_string();

        self.db
            .transaction::<_, ToggleState, AppError>(move |txn| {
                Box::pin(
                    async move { toggle_follow_on(txn, &actor_user_id, &target_username).await },
                )
            })
            .await
            .map_err(txn_err)
    }

    /// Whether one profile follows another.
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        self.follow_repo.is_following(follower_id, followee_id).await
    }

    /// Follower count for a profile.
    pub async fn count_followers(&self, profile_id: &str) -> AppResult<u64> {
        self.follow_repo.count_followers(profile_id).await
    }

    /// Following count for a profile.
    pub async fn count_following(&self, profile_id: &str) -> AppResult<u64> {
        self.follow_repo.count_following(profile_id).await
    }
}

async fn profile_for_user<C: ConnectionTrait>(
    txn: &C,
    user_id: &str,
) -> AppResult<fable_db::entities::profile::Model> {
    Profile::find()
        .filter(fable_db::entities::profile::Column::UserId.eq(user_id))
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Profile for user {user_id} not found")))
}

async fn toggle_follow_on<C: ConnectionTrait>(
    txn: &C,
    actor_user_id: &str,
    target_username: &str,
) -> AppResult<ToggleState> {
    let target_user = User::find()
        .filter(user::Column::UsernameLower.eq(target_username.to_lowercase()))
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("User {target_username} not found")))?;

    let target_profile = profile_for_user(txn, &target_user.id).await?;
    let actor = profile_for_user(txn, actor_user_id).await?;

    let existing = Follow::find()
        .filter(follow::Column::FollowerId.eq(actor.id.as_str()))
        .filter(follow::Column::FolloweeId.eq(target_profile.id.as_str()))
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    if let Some(edge) = existing {
        Follow::delete_by_id(&edge.id)
            .exec(txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        return Ok(ToggleState::Removed);
    }

    let model = follow::ActiveModel {
        id: Set(crate::generate_id()),
        follower_id: Set(actor.id),
        followee_id: Set(target_profile.id),
        created_at: Set(chrono::Utc::now().into()),
    };
    model
        .insert(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let actor_user = User::find_by_id(actor_user_id)
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("User {actor_user_id} not found")))?;

    let message = format!("{} just followed you!", actor_user.username);
    notify_on(txn, &target_user.id, Some(actor_user_id), &message).await?;

    Ok(ToggleState::Added)
}
