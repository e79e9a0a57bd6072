use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{LoginRequest, RegisterRequest},
    jwt::JwtKeys,
    password::{hash_password_blocking, verify_password_blocking},
    repo_types::User,
};
use crate::{
    error::{AppError, AppResult, Validator},
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Gravatar for the address: 200px, pg rated, mystery-person fallback.
pub fn gravatar_url(email: &str) -> String {
    let digest = md5::compute(normalize_email(email).as_bytes());
    format!("https://www.gravatar.com/avatar/{:x}?s=200&r=pg&d=mm", digest)
}

/// Creates the account and returns it with a fresh session token.
pub async fn register(state: &AppState, payload: RegisterRequest) -> AppResult<(User, String)> {
    let name = payload.name.unwrap_or_default();
    let email = normalize_email(payload.email.as_deref().unwrap_or_default());
    let password = payload.password.unwrap_or_default();

    Validator::new()
        .required("name", Some(name.as_str()), "Name is required")
        .check(is_valid_email(&email), "email", "Please include a valid email")
        .check(!password.is_empty(), "password", "Password is required")
        .finish()?;

    if state.store.find_user_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("User already exists".into()));
    }

    let user = User {
        id: Uuid::new_v4(),
        name: name.trim().to_string(),
        avatar: gravatar_url(&email),
        email,
        password_hash: hash_password_blocking(password).await?,
        created_at: OffsetDateTime::now_utc(),
    };

    // the unique index catches a concurrent registration the lookup missed
    if !state.store.insert_user(&user).await? {
        warn!(email = %user.email, "email already registered");
        return Err(AppError::Conflict("User already exists".into()));
    }

    let token = JwtKeys::from_ref(state).issue(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((user, token))
}

/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<String> {
    let email = normalize_email(payload.email.as_deref().unwrap_or_default());
    let password = payload.password.unwrap_or_default();

    Validator::new()
        .check(is_valid_email(&email), "email", "Please include a valid email")
        .check(!password.is_empty(), "password", "Password is required")
        .finish()?;

    let Some(user) = state.store.find_user_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = JwtKeys::from_ref(state).issue(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

pub async fn current_user(state: &AppState, user_id: Uuid) -> AppResult<User> {
    state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}
