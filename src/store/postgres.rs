use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{PostEdit, Store};
use crate::{
    auth::repo_types::User,
    posts::model::{Comment, Like, Post, PostError},
    profiles::model::{Education, Experience, Profile, ProfileOwner, ProfileView, Social},
};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    user_id: Uuid,
    company: Option<String>,
    website: Option<String>,
    location: Option<String>,
    bio: Option<String>,
    status: String,
    githubusername: Option<String>,
    skills: Vec<String>,
    social: Json<Social>,
    experience: Json<Vec<Experience>>,
    education: Json<Vec<Education>>,
    created_at: OffsetDateTime,
}

impl From<ProfileRow> for Profile {
    fn from(r: ProfileRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            company: r.company,
            website: r.website,
            location: r.location,
            bio: r.bio,
            status: r.status,
            githubusername: r.githubusername,
            skills: r.skills,
            social: r.social.0,
            experience: r.experience.0,
            education: r.education.0,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProfileViewRow {
    #[sqlx(flatten)]
    profile: ProfileRow,
    owner_name: String,
    owner_avatar: String,
}

impl From<ProfileViewRow> for ProfileView {
    fn from(r: ProfileViewRow) -> Self {
        let user = ProfileOwner {
            id: r.profile.user_id,
            name: r.owner_name,
            avatar: r.owner_avatar,
        };
        Self {
            profile: r.profile.into(),
            user,
        }
    }
}

#[derive(Debug, FromRow)]
struct PostRow {
    id: Uuid,
    user_id: Uuid,
    text: String,
    name: String,
    avatar: String,
    likes: Json<Vec<Like>>,
    comments: Json<Vec<Comment>>,
    created_at: OffsetDateTime,
}

impl From<PostRow> for Post {
    fn from(r: PostRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            text: r.text,
            name: r.name,
            avatar: r.avatar,
            likes: r.likes.0,
            comments: r.comments.0,
            created_at: r.created_at,
        }
    }
}

const PROFILE_COLUMNS: &str = "p.id, p.user_id, p.company, p.website, p.location, p.bio, \
     p.status, p.githubusername, p.skills, p.social, p.experience, p.education, p.created_at";

const POST_COLUMNS: &str = "id, user_id, text, name, avatar, likes, comments, created_at";

#[async_trait]
impl Store for PgStore {
    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, avatar, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, avatar, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn insert_user(&self, user: &User) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, avatar, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.avatar)
        .bind(user.created_at)
        .execute(&self.db)
        .await
        .context("insert user")?;
        Ok(res.rows_affected() == 1)
    }

    async fn delete_account(&self, user_id: Uuid) -> anyhow::Result<()> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        sqlx::query("DELETE FROM posts WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("delete posts")?;
        sqlx::query("DELETE FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("delete profile")?;
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("delete user")?;
        tx.commit().await.context("commit tx")?;
        Ok(())
    }

    async fn find_profile_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles p WHERE p.user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("find profile by user")?;
        Ok(row.map(Profile::from))
    }

    async fn list_profiles(&self) -> anyhow::Result<Vec<ProfileView>> {
        let rows = sqlx::query_as::<_, ProfileViewRow>(&format!(
            r#"
            SELECT {PROFILE_COLUMNS}, u.name AS owner_name, u.avatar AS owner_avatar
            FROM profiles p
            JOIN users u ON u.id = p.user_id
            ORDER BY p.created_at ASC
            "#
        ))
        .fetch_all(&self.db)
        .await
        .context("list profiles")?;
        Ok(rows.into_iter().map(ProfileView::from).collect())
    }

    async fn save_profile(&self, profile: &Profile) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, user_id, company, website, location, bio, status,
                                  githubusername, skills, social, experience, education, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (user_id) DO UPDATE
            SET company = EXCLUDED.company,
                website = EXCLUDED.website,
                location = EXCLUDED.location,
                bio = EXCLUDED.bio,
                status = EXCLUDED.status,
                githubusername = EXCLUDED.githubusername,
                skills = EXCLUDED.skills,
                social = EXCLUDED.social,
                experience = EXCLUDED.experience,
                education = EXCLUDED.education
            "#,
        )
        .bind(profile.id)
        .bind(profile.user_id)
        .bind(&profile.company)
        .bind(&profile.website)
        .bind(&profile.location)
        .bind(&profile.bio)
        .bind(&profile.status)
        .bind(&profile.githubusername)
        .bind(&profile.skills)
        .bind(Json(&profile.social))
        .bind(Json(&profile.experience))
        .bind(Json(&profile.education))
        .bind(profile.created_at)
        .execute(&self.db)
        .await
        .context("save profile")?;
        Ok(())
    }

    async fn find_post(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find post")?;
        Ok(row.map(Post::from))
    }

    async fn list_posts(&self) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await
        .context("list posts")?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn insert_post(&self, post: &Post) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, user_id, text, name, avatar, likes, comments, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(post.id)
        .bind(post.user_id)
        .bind(&post.text)
        .bind(&post.name)
        .bind(&post.avatar)
        .bind(Json(&post.likes))
        .bind(Json(&post.comments))
        .bind(post.created_at)
        .execute(&self.db)
        .await
        .context("insert post")?;
        Ok(())
    }

    async fn update_post(
        &self,
        id: Uuid,
        edit: PostEdit,
    ) -> anyhow::Result<Option<Result<Post, PostError>>> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        // row lock serializes concurrent edits of this post until commit
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("lock post")?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut post = Post::from(row);
        if let Err(e) = edit(&mut post) {
            tx.rollback().await.context("rollback tx")?;
            return Ok(Some(Err(e)));
        }

        sqlx::query("UPDATE posts SET likes = $2, comments = $3 WHERE id = $1")
            .bind(id)
            .bind(Json(&post.likes))
            .bind(Json(&post.comments))
            .execute(&mut *tx)
            .await
            .context("update post")?;
        tx.commit().await.context("commit tx")?;
        Ok(Some(Ok(post)))
    }

    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete post")?;
        Ok(res.rows_affected() > 0)
    }
}
