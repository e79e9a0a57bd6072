use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    auth::repo_types::User,
    posts::model::{Post, PostError},
    profiles::model::{Profile, ProfileView},
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// In-place change to a post, run while the store holds that post exclusively.
pub type PostEdit = Box<dyn FnOnce(&mut Post) -> Result<(), PostError> + Send>;

/// Document persistence for users, profiles and posts.
///
/// Aggregates are read and written whole; nested sequences travel with
/// their parent document.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// Returns `false` without writing when the email is already taken.
    async fn insert_user(&self, user: &User) -> anyhow::Result<bool>;
    /// Removes the user together with their profile and posts.
    /// Missing records are not an error.
    async fn delete_account(&self, user_id: Uuid) -> anyhow::Result<()>;

    async fn find_profile_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<Profile>>;
    async fn list_profiles(&self) -> anyhow::Result<Vec<ProfileView>>;
    /// Inserts or replaces the profile owned by `profile.user_id`.
    async fn save_profile(&self, profile: &Profile) -> anyhow::Result<()>;

    async fn find_post(&self, id: Uuid) -> anyhow::Result<Option<Post>>;
    /// Newest first.
    async fn list_posts(&self) -> anyhow::Result<Vec<Post>>;
    async fn insert_post(&self, post: &Post) -> anyhow::Result<()>;
    /// Applies `edit` to the stored post as one atomic step per post, so
    /// concurrent edits of the same post never overwrite each other.
    ///
    /// `None` when the post does not exist. A rejected edit writes nothing.
    async fn update_post(
        &self,
        id: Uuid,
        edit: PostEdit,
    ) -> anyhow::Result<Option<Result<Post, PostError>>>;
    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool>;
}
