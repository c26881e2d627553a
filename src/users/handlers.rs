use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{AuthResponse, LoginRequest, RefreshRequest, SignupRequest, UpdateProfileRequest},
    model::{EmailTaken, NewUser, ProfileUpdate, User},
};
use crate::{
    auth::{
        password::{hash_password, is_valid_email, verify_password, MIN_PASSWORD_LEN},
        AuthUser, JwtKeys,
    },
    error::AppError,
    extractors::{ApiJson, ApiPath},
    llm::prompts::DEFAULT_CALORIE_TARGET,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(signup))
        .route("/users/login", post(login))
        .route("/users/refresh", post(refresh))
        .route("/users/me", get(me))
        .route("/users/:id", get(get_user).put(update_user))
}

/// Trims entries and drops blank ones, keeping order.
fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn check_calorie_target(target: i32) -> Result<i32, AppError> {
    if target <= 0 {
        return Err(AppError::BadRequest(
            "Calorie target must be a positive number".into(),
        ));
    }
    Ok(target)
}

/// Maps an insert failure, turning a lost race on the email index into 409.
fn signup_error(err: anyhow::Error) -> AppError {
    if err.is::<EmailTaken>() {
        AppError::Conflict("Email already registered".into())
    } else {
        AppError::Internal(err)
    }
}

fn issue_tokens(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user,
    })
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let email = payload.email.trim().to_lowercase();
    let name = payload.name.trim().to_string();

    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".into()));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::BadRequest("Invalid email".into()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::BadRequest("Password too short".into()));
    }
    let calorie_target =
        check_calorie_target(payload.calorie_target.unwrap_or(DEFAULT_CALORIE_TARGET))?;

    if state.store.find_user_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = state
        .store
        .create_user(NewUser {
            name,
            email,
            password_hash,
            dietary_preferences: clean_list(payload.dietary_preferences),
            allergies: clean_list(payload.allergies),
            pantry_items: clean_list(payload.pantry_items),
            calorie_target,
        })
        .await
        .map_err(signup_error)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(issue_tokens(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = payload.email.trim().to_lowercase();

    let Some(user) = state.store.find_user_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let user = state
        .store
        .find_user(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<User>, AppError> {
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = state
        .store
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> Result<Json<User>, AppError> {
    let name = match payload.name.map(|n| n.trim().to_string()) {
        Some(n) if n.is_empty() => return Err(AppError::BadRequest("Name cannot be empty".into())),
        other => other,
    };
    let update = ProfileUpdate {
        name,
        dietary_preferences: payload.dietary_preferences.map(clean_list),
        allergies: payload.allergies.map(clean_list),
        pantry_items: payload.pantry_items.map(clean_list),
        calorie_target: payload.calorie_target.map(check_calorie_target).transpose()?,
    };

    let found = if update.is_empty() {
        state.store.find_user(id).await?
    } else {
        state.store.update_user(id, update).await?
    };
    let user = found.ok_or_else(|| AppError::NotFound("User not found".into()))?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(user))
}
