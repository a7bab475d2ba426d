use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{error, info};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::models::{AuthResponse, LoginRequest, SignupRequest, UserProfile};
use crate::services::auth_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/me", get(me))
}

pub async fn signup(
    State(state): State<AppState>,
    AppJson(request): AppJson<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    info!("POST /api/auth/signup - Registering user");

    let response = auth_service::signup(&state.pool, &state.auth, request)
        .await
        .map_err(|e| {
            error!("Signup failed: {}", e);
            e
        })?;

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    info!("POST /api/auth/login - Logging in");

    let response = auth_service::login(&state.pool, &state.auth, request)
        .await
        .map_err(|e| {
            error!("Login failed: {}", e);
            e
        })?;

    Ok(Json(response))
}

pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    info!("GET /api/auth/me - Loading profile for {}", user.user_id);

    let profile = auth_service::me(&state.pool, user.user_id).await.map_err(|e| {
        error!("Failed to load user {}: {}", user.user_id, e);
        e
    })?;

    Ok(Json(profile))
}
