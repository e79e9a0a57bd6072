use tracing::{info, warn};
use uuid::Uuid;

use super::model::{Author, Comment, Like, Post, PostError};
use crate::{
    error::{AppError, AppResult, Validator},
    state::AppState,
};

impl From<PostError> for AppError {
    fn from(e: PostError) -> Self {
        let msg = e.to_string();
        match e {
            PostError::AlreadyLiked => AppError::Conflict(msg),
            PostError::NotLiked => AppError::BadRequest(msg),
            PostError::CommentNotFound => AppError::NotFound(msg),
            PostError::NotOwner => AppError::Unauthorized(msg),
        }
    }
}

fn required_text(text: Option<String>) -> AppResult<String> {
    Validator::new()
        .required("text", text.as_deref(), "Text is required")
        .finish()?;
    Ok(text.unwrap_or_default().trim().to_string())
}

async fn author(state: &AppState, user_id: Uuid) -> AppResult<Author> {
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Author::from(&user))
}

async fn load(state: &AppState, post_id: Uuid) -> AppResult<Post> {
    state
        .store
        .find_post(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))
}

pub async fn create_post(state: &AppState, user_id: Uuid, text: Option<String>) -> AppResult<Post> {
    let text = required_text(text)?;
    let author = author(state, user_id).await?;
    let post = Post::new(&author, text);
    state.store.insert_post(&post).await?;
    info!(post_id = %post.id, %user_id, "post created");
    Ok(post)
}

pub async fn list_posts(state: &AppState) -> AppResult<Vec<Post>> {
    Ok(state.store.list_posts().await?)
}

pub async fn get_post(state: &AppState, post_id: Uuid) -> AppResult<Post> {
    load(state, post_id).await
}

pub async fn delete_post(state: &AppState, post_id: Uuid, user_id: Uuid) -> AppResult<()> {
    let post = load(state, post_id).await?;
    if let Err(e) = post.ensure_owner(user_id) {
        warn!(%post_id, %user_id, "delete of foreign post refused");
        return Err(e.into());
    }
    state.store.delete_post(post_id).await?;
    info!(%post_id, %user_id, "post deleted");
    Ok(())
}

/// Runs `edit` against the stored post as one atomic per-post update.
async fn apply_edit<F>(state: &AppState, post_id: Uuid, edit: F) -> AppResult<Post>
where
    F: FnOnce(&mut Post) -> Result<(), PostError> + Send + 'static,
{
    let outcome = state
        .store
        .update_post(post_id, Box::new(edit))
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))?;
    Ok(outcome?)
}

pub async fn like(state: &AppState, post_id: Uuid, user_id: Uuid) -> AppResult<Vec<Like>> {
    let post = apply_edit(state, post_id, move |p| p.like(user_id)).await?;
    Ok(post.likes)
}

pub async fn unlike(state: &AppState, post_id: Uuid, user_id: Uuid) -> AppResult<Vec<Like>> {
    let post = apply_edit(state, post_id, move |p| p.unlike(user_id)).await?;
    Ok(post.likes)
}

pub async fn add_comment(
    state: &AppState,
    post_id: Uuid,
    user_id: Uuid,
    text: Option<String>,
) -> AppResult<Vec<Comment>> {
    let text = required_text(text)?;
    let author = author(state, user_id).await?;
    let post = apply_edit(state, post_id, move |p| {
        p.add_comment(&author, text);
        Ok(())
    })
    .await?;
    Ok(post.comments)
}

pub async fn remove_comment(
    state: &AppState,
    post_id: Uuid,
    comment_id: Uuid,
    user_id: Uuid,
) -> AppResult<Vec<Comment>> {
    let removed = apply_edit(state, post_id, move |p| {
        p.remove_comment(comment_id, user_id).map(drop)
    })
    .await;
    if let Err(AppError::Unauthorized(_)) = &removed {
        warn!(%post_id, %comment_id, %user_id, "delete of foreign comment refused");
    }
    Ok(removed?.comments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{dto::RegisterRequest, services::register};
    use crate::store::memory::MemoryStore;
    use std::{sync::Arc, time::Duration};

    fn slow_state() -> AppState {
        AppState::fake_with(Arc::new(MemoryStore::with_read_delay(Duration::from_millis(20))))
    }

    async fn new_user(state: &AppState, name: &str) -> Uuid {
        let (user, _) = register(
            state,
            RegisterRequest {
                name: Some(name.into()),
                email: Some(format!("{name}@x.com")),
                password: Some("pw123".into()),
            },
        )
        .await
        .unwrap();
        user.id
    }

    #[tokio::test]
    async fn create_requires_text() {
        let state = AppState::fake();
        let alice = new_user(&state, "alice").await;
        let err = create_post(&state, alice, Some("   ".into())).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(list_posts(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_author_cannot_delete_post() {
        let state = AppState::fake();
        let alice = new_user(&state, "alice").await;
        let bob = new_user(&state, "bob").await;
        let post = create_post(&state, alice, Some("hello".into())).await.unwrap();

        let err = delete_post(&state, post.id, bob).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert_eq!(get_post(&state, post.id).await.unwrap().text, "hello");

        delete_post(&state, post.id, alice).await.unwrap();
        assert!(matches!(
            get_post(&state, post.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn like_twice_conflicts_and_unlike_restores_count() {
        let state = AppState::fake();
        let alice = new_user(&state, "alice").await;
        let bob = new_user(&state, "bob").await;
        let post = create_post(&state, alice, Some("hello".into())).await.unwrap();
        let before = post.likes.len();

        assert_eq!(like(&state, post.id, bob).await.unwrap().len(), before + 1);
        let err = like(&state, post.id, bob).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        assert_eq!(unlike(&state, post.id, bob).await.unwrap().len(), before);
        let err = unlike(&state, post.id, bob).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn missing_post_is_not_found() {
        let state = AppState::fake();
        let alice = new_user(&state, "alice").await;
        let ghost = Uuid::new_v4();
        assert!(matches!(like(&state, ghost, alice).await.unwrap_err(), AppError::NotFound(_)));
        assert!(matches!(
            add_comment(&state, ghost, alice, Some("hi".into())).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            delete_post(&state, ghost, alice).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn comments_snapshot_author_and_only_author_removes() {
        let state = AppState::fake();
        let alice = new_user(&state, "alice").await;
        let bob = new_user(&state, "bob").await;
        let post = create_post(&state, alice, Some("hello".into())).await.unwrap();

        let comments = add_comment(&state, post.id, bob, Some("nice".into())).await.unwrap();
        assert_eq!(comments[0].name, "bob");
        let bobs = comments[0].id;
        add_comment(&state, post.id, alice, Some("thanks".into())).await.unwrap();

        let err = remove_comment(&state, post.id, bobs, alice).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        let err = remove_comment(&state, post.id, Uuid::new_v4(), bob).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let left = remove_comment(&state, post.id, bobs, bob).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].text, "thanks");
    }

    #[tokio::test]
    async fn concurrent_likes_from_different_users_are_all_kept() {
        let state = slow_state();
        let alice = new_user(&state, "alice").await;
        let bob = new_user(&state, "bob").await;
        let carol = new_user(&state, "carol").await;
        let post = create_post(&state, alice, Some("hello".into())).await.unwrap();

        let (a, b) = tokio::join!(like(&state, post.id, bob), like(&state, post.id, carol));
        a.unwrap();
        b.unwrap();

        let stored = get_post(&state, post.id).await.unwrap();
        assert_eq!(stored.likes.len(), 2);
        assert!(stored.is_liked_by(bob));
        assert!(stored.is_liked_by(carol));
    }

    #[tokio::test]
    async fn concurrent_comments_are_all_kept() {
        let state = slow_state();
        let alice = new_user(&state, "alice").await;
        let bob = new_user(&state, "bob").await;
        let post = create_post(&state, alice, Some("hello".into())).await.unwrap();

        let (a, b) = tokio::join!(
            add_comment(&state, post.id, alice, Some("first".into())),
            add_comment(&state, post.id, bob, Some("second".into())),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(get_post(&state, post.id).await.unwrap().comments.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_double_like_by_one_user_keeps_a_single_like() {
        let state = slow_state();
        let alice = new_user(&state, "alice").await;
        let bob = new_user(&state, "bob").await;
        let post = create_post(&state, alice, Some("hello".into())).await.unwrap();

        let (a, b) = tokio::join!(like(&state, post.id, bob), like(&state, post.id, bob));
        assert!(a.is_ok() != b.is_ok());
        assert_eq!(get_post(&state, post.id).await.unwrap().likes.len(), 1);
    }
}
