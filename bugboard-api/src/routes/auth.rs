/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/refresh` - Refresh access token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, http::StatusCode, Json};
use bugboard_shared::{
    auth::{jwt, password},
    models::user::{normalize_email, CreateUser, User},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// User name: letters, digits and `@.+-_`
    #[validate(length(min = 1, max = 64, message = "Name must be 1 to 64 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (will be validated for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    pub password: String,
}

/// Tokens issued at registration or login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_name: String,

    #[serde(flatten)]
    pub tokens: jwt::TokenPair,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

fn field_error(field: &str, message: impl Into<String>) -> ApiError {
    ApiError::ValidationError(vec![ValidationErrorDetail {
        field: field.to_string(),
        message: message.into(),
    }])
}

fn is_valid_username(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "name": "chondosha",
///   "email": "user@example.org",
///   "password": "correct horse"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with
///
/// ```json
/// {
///   "user_name": "chondosha",
///   "access_token": "eyJ...",
///   "refresh_token": "eyJ...",
///   "token_type": "Bearer",
///   "expires_in": 86400
/// }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Name or email already taken
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    let name = req.name.trim();
    if !is_valid_username(name) {
        return Err(field_error(
            "name",
            "Enter a valid username: letters, digits and @/./+/-/_ only",
        ));
    }

    password::validate_password_strength(&req.password, name)
        .map_err(|message| field_error("password", message))?;

    if User::exists(&state.db, name).await? {
        return Err(ApiError::Conflict("A user with that username already exists".to_string()));
    }

    let email = normalize_email(&req.email);
    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict("A user with that email already exists".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;
    let user = User::create(&state.db, CreateUser::regular(name, email, password_hash)).await?;

    info!(user = %user.name, "User registered");

    let tokens = jwt::issue_token_pair(&user.name, state.jwt_secret())?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_name: user.name,
            tokens,
        }),
    ))
}

/// Login endpoint
///
/// Authenticates a user by name and password and returns JWT tokens.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials or inactive account
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid name or password".to_string());

    let user = User::find_by_name(&state.db, req.name.trim())
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? || !user.is_active {
        warn!(user = %user.name, "Failed login");
        return Err(invalid());
    }

    User::update_last_login(&state.db, &user.name).await?;

    let tokens = jwt::issue_token_pair(&user.name, state.jwt_secret())?;

    Ok(Json(AuthResponse {
        user_name: user.name,
        tokens,
    }))
}

/// Token refresh endpoint
///
/// Exchanges a refresh token for a new access token.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}
