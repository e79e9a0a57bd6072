use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PostEdit, Store};
use crate::{
    auth::repo_types::User,
    posts::model::{Post, PostError},
    profiles::model::{Profile, ProfileOwner, ProfileView},
};

/// In-process store backing `AppState::fake()`.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    profiles: RwLock<HashMap<Uuid, Profile>>, // keyed by owner
    posts: RwLock<HashMap<Uuid, Post>>,
    /// Latency added to post reads, standing in for a database round trip.
    read_delay: Option<Duration>,
}

impl MemoryStore {
    pub fn with_read_delay(delay: Duration) -> Self {
        Self {
            read_delay: Some(delay),
            ..Self::default()
        }
    }

    async fn round_trip(&self) {
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> anyhow::Result<bool> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Ok(false);
        }
        users.insert(user.id, user.clone());
        Ok(true)
    }

    async fn delete_account(&self, user_id: Uuid) -> anyhow::Result<()> {
        self.posts.write().await.retain(|_, p| p.user_id != user_id);
        self.profiles.write().await.remove(&user_id);
        self.users.write().await.remove(&user_id);
        Ok(())
    }

    async fn find_profile_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn list_profiles(&self) -> anyhow::Result<Vec<ProfileView>> {
        let users = self.users.read().await;
        let mut views: Vec<ProfileView> = self
            .profiles
            .read()
            .await
            .values()
            .filter_map(|p| {
                users.get(&p.user_id).map(|u| ProfileView {
                    profile: p.clone(),
                    user: ProfileOwner::from(u),
                })
            })
            .collect();
        views.sort_by_key(|v| v.profile.created_at);
        Ok(views)
    }

    async fn save_profile(&self, profile: &Profile) -> anyhow::Result<()> {
        self.profiles
            .write()
            .await
            .insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn find_post(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let post = self.posts.read().await.get(&id).cloned();
        self.round_trip().await;
        Ok(post)
    }

    async fn list_posts(&self) -> anyhow::Result<Vec<Post>> {
        let mut posts: Vec<Post> = self.posts.read().await.values().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn insert_post(&self, post: &Post) -> anyhow::Result<()> {
        self.posts.write().await.insert(post.id, post.clone());
        Ok(())
    }

    async fn update_post(
        &self,
        id: Uuid,
        edit: PostEdit,
    ) -> anyhow::Result<Option<Result<Post, PostError>>> {
        let mut posts = self.posts.write().await;
        self.round_trip().await;
        let Some(stored) = posts.get_mut(&id) else {
            return Ok(None);
        };
        let mut draft = stored.clone();
        if let Err(e) = edit(&mut draft) {
            return Ok(Some(Err(e)));
        }
        *stored = draft.clone();
        Ok(Some(Ok(draft)))
    }

    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.posts.write().await.remove(&id).is_some())
    }
}
