use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;

use super::{
    dto::TextRequest,
    model::{Comment, Like, Post},
    services,
};
use crate::{
    auth::extractors::AuthUser,
    error::{parse_id, AppResult},
    state::AppState,
};

const POST_NOT_FOUND: &str = "Post not found";

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/post", get(list_posts).post(create_post))
        .route("/post/:id", get(get_post).delete(delete_post))
        .route("/post/like/:id", put(like))
        .route("/post/dislike/:id", put(unlike))
        .route("/post/comment/:id", post(add_comment))
        .route("/post/comment/:id/:comment_id", delete(remove_comment))
}

#[instrument(skip(state, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> AppResult<Json<Post>> {
    let Json(payload) = payload?;
    Ok(Json(services::create_post(&state, user_id, payload.text).await?))
}

#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
) -> AppResult<Json<Vec<Post>>> {
    Ok(Json(services::list_posts(&state).await?))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Post>> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    Ok(Json(services::get_post(&state, id).await?))
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    services::delete_post(&state, id, user_id).await?;
    Ok(Json(json!({ "msg": "Post removed" })))
}

#[instrument(skip(state))]
pub async fn like(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Like>>> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    Ok(Json(services::like(&state, id, user_id).await?))
}

#[instrument(skip(state))]
pub async fn unlike(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Like>>> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    Ok(Json(services::unlike(&state, id, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn add_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> AppResult<Json<Vec<Comment>>> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    let Json(payload) = payload?;
    Ok(Json(
        services::add_comment(&state, id, user_id, payload.text).await?,
    ))
}

#[instrument(skip(state))]
pub async fn remove_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((id, comment_id)): Path<(String, String)>,
) -> AppResult<Json<Vec<Comment>>> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    let comment_id = parse_id(&comment_id, "Comment does not exist")?;
    Ok(Json(
        services::remove_comment(&state, id, comment_id, user_id).await?,
    ))
}
