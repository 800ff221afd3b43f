use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zoozy_core::mail::PasswordResetMail;
use zoozy_core::time::now_millis;
use zoozy_core::{metrics, password, token};

use crate::users::{
    find_user_by_email, find_user_by_firebase_uid, find_user_by_id, find_user_by_reset_token,
    normalize_email, UserProfile, PROVIDER_GOOGLE, PROVIDER_LOCAL,
};
use crate::{ApiError, ApiResult, AppState, SERVICE_NAME};

const MIN_PASSWORD_LEN: usize = 6;
const RESET_ACKNOWLEDGEMENT: &str =
    "If an account exists for this email, a password reset link has been sent.";

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
    #[serde(default)]
    pub firebase_uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub user: Option<UserProfile>,
}

impl AuthResponse {
    fn ok(message: &str, user: UserProfile) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.to_string(),
            user: Some(user),
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct UserEnvelope {
    pub success: bool,
    pub user: UserProfile,
}

#[derive(Serialize, ToSchema)]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}

fn auth_failed() -> ApiError {
    ApiError::new(
        StatusCode::UNAUTHORIZED,
        "AUTH_FAILED",
        "invalid email or password",
    )
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    if payload.email.trim().is_empty()
        || payload.password.trim().is_empty()
        || payload.display_name.trim().is_empty()
    {
        return Err(ApiError::bad_request(
            "email, password and displayName are required",
        ));
    }

    let email = normalize_email(&payload.email);
    let mut conn = state.pool.acquire().await?;
    if find_user_by_email(&mut conn, &email).await?.is_some() {
        metrics::inc_auth_event(SERVICE_NAME, "register", "conflict");
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "EMAIL_TAKEN",
            "email is already registered",
        ));
    }

    let password_hash = password::hash_password(&payload.password).map_err(ApiError::internal)?;
    let result = sqlx::query(
        "INSERT INTO users (email, password_hash, display_name, provider, is_active, created_at) VALUES (?1, ?2, ?3, ?4, 1, ?5)",
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(payload.display_name.trim())
    .bind(PROVIDER_LOCAL)
    .bind(now_millis())
    .execute(&mut *conn)
    .await?;

    let user = find_user_by_id(&mut conn, result.last_insert_rowid())
        .await?
        .ok_or_else(|| ApiError::internal("registered user vanished"))?;
    metrics::inc_auth_event(SERVICE_NAME, "register", "success");
    tracing::info!(user_id = user.profile.id, "user registered");
    Ok(AuthResponse::ok("Registration successful", user.profile))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    if payload.email.trim().is_empty() || payload.password.trim().is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }

    let mut conn = state.pool.acquire().await?;
    let Some(user) = find_user_by_email(&mut conn, &payload.email).await? else {
        metrics::inc_auth_event(SERVICE_NAME, "login", "failure");
        return Err(auth_failed());
    };
    if !user.profile.is_active {
        metrics::inc_auth_event(SERVICE_NAME, "login", "failure");
        return Err(auth_failed());
    }
    if user.profile.provider != PROVIDER_LOCAL {
        metrics::inc_auth_event(SERVICE_NAME, "login", "provider_mismatch");
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "PROVIDER_MISMATCH",
            format!(
                "this account signs in with {}; password login is not available",
                user.profile.provider
            ),
        ));
    }
    let Some(password_hash) = user.password_hash.as_deref().filter(|hash| !hash.is_empty()) else {
        tracing::warn!(user_id = user.profile.id, "local account has no password hash");
        metrics::inc_auth_event(SERVICE_NAME, "login", "failure");
        return Err(auth_failed());
    };

    let verified =
        password::verify_password(&payload.password, password_hash).map_err(ApiError::internal)?;
    if !verified {
        metrics::inc_auth_event(SERVICE_NAME, "login", "failure");
        return Err(auth_failed());
    }

    sqlx::query("UPDATE users SET updated_at = ?1 WHERE id = ?2")
        .bind(now_millis())
        .bind(user.profile.id)
        .execute(&mut *conn)
        .await?;
    let user = find_user_by_id(&mut conn, user.profile.id)
        .await?
        .ok_or_else(|| ApiError::internal("logged in user vanished"))?;

    metrics::inc_auth_event(SERVICE_NAME, "login", "success");
    Ok(AuthResponse::ok("Login successful", user.profile))
}

/// Upserts an account from a Google identity: uid match, then email link, then create.
pub async fn google_login(
    State(state): State<AppState>,
    Json(payload): Json<GoogleLoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    if payload.firebase_uid.trim().is_empty() || payload.email.trim().is_empty() {
        return Err(ApiError::bad_request("firebaseUid and email are required"));
    }

    let now = now_millis();
    let mut tx = state.pool.begin_with("BEGIN IMMEDIATE").await?;

    let by_uid = find_user_by_firebase_uid(&mut tx, &payload.firebase_uid)
        .await?
        .filter(|user| user.profile.is_active);
    let (user_id, message) = if let Some(user) = by_uid {
        sqlx::query("UPDATE users SET display_name = ?1, photo_url = ?2, updated_at = ?3 WHERE id = ?4")
            .bind(&payload.display_name)
            .bind(&payload.photo_url)
            .bind(now)
            .bind(user.profile.id)
            .execute(&mut *tx)
            .await?;
        (user.profile.id, "Google login successful")
    } else if let Some(user) = find_user_by_email(&mut tx, &payload.email).await? {
        sqlx::query(
            "UPDATE users SET firebase_uid = ?1, provider = ?2, display_name = ?3, photo_url = ?4, updated_at = ?5 WHERE id = ?6",
        )
        .bind(&payload.firebase_uid)
        .bind(PROVIDER_GOOGLE)
        .bind(&payload.display_name)
        .bind(&payload.photo_url)
        .bind(now)
        .bind(user.profile.id)
        .execute(&mut *tx)
        .await?;
        tracing::info!(user_id = user.profile.id, "linked google identity to existing account");
        (user.profile.id, "Google account linked")
    } else {
        let result = sqlx::query(
            "INSERT INTO users (firebase_uid, email, display_name, photo_url, provider, is_active, created_at) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
        )
        .bind(&payload.firebase_uid)
        .bind(normalize_email(&payload.email))
        .bind(&payload.display_name)
        .bind(&payload.photo_url)
        .bind(PROVIDER_GOOGLE)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        (result.last_insert_rowid(), "Google registration successful")
    };

    let user = find_user_by_id(&mut tx, user_id)
        .await?
        .ok_or_else(|| ApiError::internal("google user vanished"))?;
    tx.commit().await?;

    metrics::inc_auth_event(SERVICE_NAME, "google_login", "success");
    Ok(AuthResponse::ok(message, user.profile))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserEnvelope>> {
    let mut conn = state.pool.acquire().await?;
    let user = find_user_by_id(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    Ok(Json(UserEnvelope {
        success: true,
        user: user.profile,
    }))
}

pub async fn get_user_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<UserEnvelope>> {
    let mut conn = state.pool.acquire().await?;
    let user = find_user_by_email(&mut conn, &email)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    Ok(Json(UserEnvelope {
        success: true,
        user: user.profile,
    }))
}

/// Issues a one-hour reset token. The answer is identical whether or not the account exists.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> ApiResult<Json<AckResponse>> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::bad_request("email is required"));
    }

    let mut conn = state.pool.acquire().await?;
    if let Some(user) = find_user_by_email(&mut conn, &payload.email).await? {
        let reset_token = token::generate_reset_token();
        let now = now_millis();
        let expiry = now + Duration::hours(1).num_milliseconds();
        sqlx::query(
            "UPDATE users SET password_reset_token = ?1, password_reset_token_expiry = ?2, updated_at = ?3 WHERE id = ?4",
        )
        .bind(&reset_token)
        .bind(expiry)
        .bind(now)
        .bind(user.profile.id)
        .execute(&mut *conn)
        .await?;
        drop(conn);

        let mail = PasswordResetMail {
            to_email: user.profile.email.clone(),
            display_name: user.profile.display_name.clone(),
            reset_url: format!("{}/reset-password?token={}", state.frontend_url, reset_token),
        };
        if let Err(err) = state.mailer.send_password_reset(mail).await {
            tracing::warn!(user_id = user.profile.id, error = %err, "password reset mail not sent");
        }
        metrics::inc_auth_event(SERVICE_NAME, "reset_request", "issued");
    } else {
        metrics::inc_auth_event(SERVICE_NAME, "reset_request", "unknown_email");
    }

    Ok(Json(AckResponse {
        success: true,
        message: RESET_ACKNOWLEDGEMENT.to_string(),
    }))
}

/// Redeems a reset token. Tokens are single use and switch the account to password login.
pub async fn confirm_reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ConfirmResetPasswordRequest>,
) -> ApiResult<Json<AckResponse>> {
    if payload.token.trim().is_empty() || payload.new_password.trim().is_empty() {
        return Err(ApiError::bad_request("token and newPassword are required"));
    }
    if payload.new_password.trim().chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let mut tx = state.pool.begin_with("BEGIN IMMEDIATE").await?;
    let mut matches = find_user_by_reset_token(&mut tx, &payload.token, now_millis()).await?;
    if matches.len() != 1 {
        metrics::inc_auth_event(SERVICE_NAME, "reset_confirm", "invalid_token");
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "INVALID_TOKEN",
            "reset token is invalid or expired",
        ));
    }
    let user = matches.remove(0);

    let password_hash =
        password::hash_password(&payload.new_password).map_err(ApiError::internal)?;
    sqlx::query(
        "UPDATE users SET password_hash = ?1, provider = ?2, password_reset_token = NULL, password_reset_token_expiry = NULL, updated_at = ?3 WHERE id = ?4",
    )
    .bind(&password_hash)
    .bind(PROVIDER_LOCAL)
    .bind(now_millis())
    .bind(user.profile.id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    metrics::inc_auth_event(SERVICE_NAME, "reset_confirm", "success");
    tracing::info!(user_id = user.profile.id, "password reset completed");
    Ok(Json(AckResponse {
        success: true,
        message: "Password has been reset".to_string(),
    }))
}
