use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, SqlErr};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::SESSION_COOKIE;
use crate::utils::jwt::create_token;
use crate::utils::validate;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
    pub user_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

/// Register a new user account
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    if payload.username.trim().is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }

    if !validate::is_valid_password(&payload.password) {
        return Err(AppError::Validation(
            "Password must be between 5 and 12 characters".to_string(),
        ));
    }

    if !validate::is_valid_email(&payload.email) {
        return Err(AppError::Validation("Please enter valid email".to_string()));
    }

    // Admin accounts are seeded at startup, never self-registered.
    let role = match payload.user_type.as_deref() {
        None | Some("individual") => UserRole::Individual,
        Some("corporate") => UserRole::Corporate,
        Some(_) => {
            return Err(AppError::Validation("Please enter valid user type".to_string()));
        }
    };

    // Check if username or email already exists
    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(&payload.username))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Duplicate(
            "This username is already registered".to_string(),
        ));
    }

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&payload.email))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Duplicate(
            "This email is already registered".to_string(),
        ));
    }

    // Hash password
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?
        .to_string();

    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(payload.username.clone()),
        email: Set(payload.email.clone()),
        password_hash: Set(password_hash),
        role: Set(role),
        ..Default::default()
    };

    new_user.insert(&state.db).await.map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Duplicate("Username or email is already registered".to_string())
        }
        _ => AppError::Database(err),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Registration successful" })),
    ))
}

/// Login with username and password; sets the session cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let user = user::Entity::find()
        .filter(user::Column::Username.eq(&payload.username))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("There is no user with that username".to_string()))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(format!("Failed to parse password hash: {}", e)))?;

    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::Unauthorized("Invalid username or password".to_string()))?;

    let token = create_token(
        user.id,
        &user.username,
        user.role.clone(),
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    let jar = jar.add(
        Cookie::build((SESSION_COOKIE, token.clone()))
            .path("/")
            .http_only(true),
    );

    Ok((
        jar,
        Json(AuthResponse {
            token,
            user: UserInfo {
                id: user.id,
                username: user.username,
                email: user.email,
                role: user.role,
            },
        }),
    ))
}

/// Clear the session cookie
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"));

    (jar, Json(serde_json::json!({ "message": "Logged out" })))
}
