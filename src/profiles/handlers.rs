use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;

use super::{
    dto::{EducationRequest, ExperienceRequest, ProfileRequest},
    model::ProfileView,
    services,
};
use crate::{
    auth::extractors::AuthUser,
    error::{parse_id, AppResult},
    state::AppState,
};

// GET /profile and /profile/user/:user_id are public, everything else takes AuthUser.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(list_profiles).post(upsert_profile).delete(delete_account),
        )
        .route("/profile/me", get(get_mine))
        .route("/profile/user/:user_id", get(get_by_user))
        .route("/profile/experience", put(add_experience))
        .route("/profile/experience/:exp_id", delete(remove_experience))
        .route("/profile/education", put(add_education))
        .route("/profile/education/:edu_id", delete(remove_education))
}

#[instrument(skip(state))]
pub async fn list_profiles(State(state): State<AppState>) -> AppResult<Json<Vec<ProfileView>>> {
    Ok(Json(services::list_profiles(&state).await?))
}

#[instrument(skip(state))]
pub async fn get_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<ProfileView>> {
    let user_id = parse_id(&user_id, "Profile not found")?;
    Ok(Json(services::profile_by_user(&state, user_id).await?))
}

#[instrument(skip(state))]
pub async fn get_mine(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<ProfileView>> {
    Ok(Json(services::my_profile(&state, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn upsert_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<ProfileRequest>, JsonRejection>,
) -> AppResult<Json<ProfileView>> {
    let Json(payload) = payload?;
    let patch = payload.validate()?;
    Ok(Json(services::upsert_profile(&state, user_id, patch).await?))
}

#[instrument(skip(state))]
pub async fn delete_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Value>> {
    services::delete_account(&state, user_id).await?;
    Ok(Json(json!({ "msg": "User removed" })))
}

#[instrument(skip(state, payload))]
pub async fn add_experience(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<ExperienceRequest>, JsonRejection>,
) -> AppResult<Json<ProfileView>> {
    let Json(payload) = payload?;
    let entry = payload.validate()?;
    Ok(Json(services::add_experience(&state, user_id, entry).await?))
}

#[instrument(skip(state))]
pub async fn remove_experience(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(exp_id): Path<String>,
) -> AppResult<Json<ProfileView>> {
    let exp_id = parse_id(&exp_id, "Experience not found")?;
    Ok(Json(services::remove_experience(&state, user_id, exp_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn add_education(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<EducationRequest>, JsonRejection>,
) -> AppResult<Json<ProfileView>> {
    let Json(payload) = payload?;
    let entry = payload.validate()?;
    Ok(Json(services::add_education(&state, user_id, entry).await?))
}

#[instrument(skip(state))]
pub async fn remove_education(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(edu_id): Path<String>,
) -> AppResult<Json<ProfileView>> {
    let edu_id = parse_id(&edu_id, "Education not found")?;
    Ok(Json(services::remove_education(&state, user_id, edu_id).await?))
}
