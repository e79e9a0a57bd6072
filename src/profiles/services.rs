use tracing::{debug, info};
use uuid::Uuid;

use super::model::{
    Education, Experience, Profile, ProfileError, ProfileOwner, ProfilePatch, ProfileView,
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

impl From<ProfileError> for AppError {
    fn from(e: ProfileError) -> Self {
        AppError::NotFound(e.to_string())
    }
}

fn no_profile() -> AppError {
    AppError::NotFound("There is no profile for this user".into())
}

async fn owner(state: &AppState, user_id: Uuid) -> AppResult<ProfileOwner> {
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(ProfileOwner::from(&user))
}

async fn view(state: &AppState, profile: Profile) -> AppResult<ProfileView> {
    let user = owner(state, profile.user_id).await?;
    Ok(ProfileView { profile, user })
}

/// Loads the caller's profile, applies `mutate` and writes the whole document back.
async fn mutate_profile<F>(state: &AppState, user_id: Uuid, mutate: F) -> AppResult<ProfileView>
where
    F: FnOnce(&mut Profile) -> Result<(), ProfileError>,
{
    let mut profile = state
        .store
        .find_profile_by_user(user_id)
        .await?
        .ok_or_else(no_profile)?;
    mutate(&mut profile)?;
    state.store.save_profile(&profile).await?;
    view(state, profile).await
}

/// Creates the profile or merges `patch` into the existing one.
pub async fn upsert_profile(
    state: &AppState,
    user_id: Uuid,
    patch: ProfilePatch,
) -> AppResult<ProfileView> {
    let owner = owner(state, user_id).await?;
    let profile = match state.store.find_profile_by_user(user_id).await? {
        Some(mut existing) => {
            existing.apply(patch);
            debug!(%user_id, "profile updated");
            existing
        }
        None => {
            info!(%user_id, "profile created");
            Profile::new(user_id, patch)
        }
    };
    state.store.save_profile(&profile).await?;
    Ok(ProfileView {
        profile,
        user: owner,
    })
}

pub async fn my_profile(state: &AppState, user_id: Uuid) -> AppResult<ProfileView> {
    profile_by_user(state, user_id).await
}

pub async fn profile_by_user(state: &AppState, user_id: Uuid) -> AppResult<ProfileView> {
    let profile = state
        .store
        .find_profile_by_user(user_id)
        .await?
        .ok_or_else(no_profile)?;
    view(state, profile).await
}

pub async fn list_profiles(state: &AppState) -> AppResult<Vec<ProfileView>> {
    Ok(state.store.list_profiles().await?)
}

pub async fn add_experience(
    state: &AppState,
    user_id: Uuid,
    entry: Experience,
) -> AppResult<ProfileView> {
    mutate_profile(state, user_id, |p| {
        p.add_experience(entry);
        Ok(())
    })
    .await
}

pub async fn remove_experience(
    state: &AppState,
    user_id: Uuid,
    exp_id: Uuid,
) -> AppResult<ProfileView> {
    mutate_profile(state, user_id, |p| p.remove_experience(exp_id).map(drop)).await
}

pub async fn add_education(
    state: &AppState,
    user_id: Uuid,
    entry: Education,
) -> AppResult<ProfileView> {
    mutate_profile(state, user_id, |p| {
        p.add_education(entry);
        Ok(())
    })
    .await
}

pub async fn remove_education(
    state: &AppState,
    user_id: Uuid,
    edu_id: Uuid,
) -> AppResult<ProfileView> {
    mutate_profile(state, user_id, |p| p.remove_education(edu_id).map(drop)).await
}

/// Removes the user's posts, profile and account. Safe to repeat.
pub async fn delete_account(state: &AppState, user_id: Uuid) -> AppResult<()> {
    state.store.delete_account(user_id).await?;
    info!(%user_id, "account deleted");
    Ok(())
}
