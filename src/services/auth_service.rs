use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::{hash_password, issue_token, verify_password, AuthConfig};
use crate::db::user_queries;
use crate::errors::AppError;
use crate::models::{AuthResponse, LoginRequest, SignupRequest, User, UserProfile};

const MIN_PASSWORD_LEN: usize = 6;

/// Signup input after validation, with the email trimmed and lower-cased.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

fn required(value: Option<String>) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation("Please enter all fields".into()))
}

pub fn validate_signup(request: SignupRequest) -> Result<NewUser, AppError> {
    let username = required(request.username)?;
    let email = required(request.email)?.to_lowercase();
    let password = request
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("Please enter all fields".into()))?;

    if !email.contains('@') {
        return Err(AppError::Validation("Please enter a valid email".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(NewUser { username, email, password })
}

fn invalid_credentials() -> AppError {
    AppError::Validation("Invalid Credentials".into())
}

fn user_exists() -> AppError {
    AppError::Validation("User already exists".into())
}

fn respond(user: User, auth: &AuthConfig) -> Result<AuthResponse, AppError> {
    let token = issue_token(user.id, auth.secret())?;
    Ok(AuthResponse {
        token,
        user: UserProfile::from(user),
    })
}

pub async fn signup(pool: &PgPool, auth: &AuthConfig, request: SignupRequest) -> Result<AuthResponse, AppError> {
    let new_user = validate_signup(request)?;

    if user_queries::find_by_email(pool, &new_user.email).await?.is_some() {
        return Err(user_exists());
    }

    // Argon2 runs on the blocking pool
    let password = new_user.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))??;

    let user = User {
        id: Uuid::new_v4(),
        username: new_user.username,
        email: new_user.email,
        password_hash,
        created_at: Utc::now(),
    };

    // A concurrent signup can still win the race to the unique index
    let user = match user_queries::insert(pool, &user).await {
        Ok(user) => user,
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => return Err(user_exists()),
        Err(e) => return Err(e.into()),
    };

    info!("Registered user {}", user.id);
    respond(user, auth)
}

pub async fn login(pool: &PgPool, auth: &AuthConfig, request: LoginRequest) -> Result<AuthResponse, AppError> {
    let email = required(request.email)?.to_lowercase();
    let password = request
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("Please enter all fields".into()))?;

    let user = user_queries::find_by_email(pool, &email)
        .await?
        .ok_or_else(invalid_credentials)?;

    let hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password check task failed: {}", e)))??;

    if !matches {
        return Err(invalid_credentials());
    }

    respond(user, auth)
}

pub async fn me(pool: &PgPool, user_id: Uuid) -> Result<UserProfile, AppError> {
    user_queries::find_by_id(pool, user_id)
        .await?
        .map(UserProfile::from)
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}
