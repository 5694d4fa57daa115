//! Profile management.

use fable_common::{AppError, AppResult};
use fable_db::{
    entities::profile,
    repositories::{ProfileRepository, UserRepository},
};
use sea_orm::Set;

/// Input for editing a profile. `None` leaves the field untouched.
#[derive(Default)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<Option<String>>,
}

/// Profile service.
#[derive(Clone)]
pub struct ProfileService {
    profile_repo: ProfileRepository,
    user_repo: UserRepository,
}

impl ProfileService {
    /// Create a new profile service.
    #[must_use]
    pub const fn new(profile_repo: ProfileRepository, user_repo: UserRepository) -> Self {
        Self {
            profile_repo,
            user_repo,
        }
    }

    /// The profile behind a username.
    pub async fn get_by_username(&self, username: &str) -> AppResult<profile::Model> {
        let user = self.user_repo.get_by_username(username).await?;
        self.profile_repo.get_by_user_id(&user.id).await
    }

    /// The caller's own profile.
    pub async fn get_own(&self, user_id: &str) -> AppResult<profile::Model> {
        self.profile_repo.get_by_user_id(user_id).await
    }

    /// Edit the caller's own profile.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<profile::Model> {
        let profile = self.profile_repo.get_by_user_id(user_id).await?;

        let mut active: profile::ActiveModel = profile.into();
        if let Some(name) = input.name {
            if name.len() > 256 {
                return Err(AppError::Validation("Name is too long".to_string()));
            }
            active.name = Set(name);
        }
        if let Some(bio) = input.bio {
            active.bio = Set(bio);
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(avatar_url);
        }

        self.profile_repo.update(active).await
    }

    /// Profiles following the given profile.
    pub async fn followers(&self, profile_id: &str) -> AppResult<Vec<profile::Model>> {
        self.profile_repo.find_followers(profile_id).await
    }

    /// Profiles the given profile follows.
    pub async fn following(&self, profile_id: &str) -> AppResult<Vec<profile::Model>> {
        self.profile_repo.find_following(profile_id).await
    }
}
