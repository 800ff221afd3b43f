use anyhow::Result;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use sqlx::error::ErrorKind;
use sqlx::SqlitePool;
use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use zoozy_core::mail::{LogMailer, Mailer};
use zoozy_core::{config, db, http, logging, metrics, migrations, server};
use zoozy_sync::SyncService;

mod auth;
mod comments;
mod favorites;
mod messages;
mod notifications;
mod openapi;
mod pets;
mod providers;
mod service_requests;
mod sync;
mod user_requests;
mod user_services;
mod users;

#[cfg(test)]
mod contract_tests;

const SERVICE_NAME: &str = "zoozy-api";

#[derive(Clone)]
pub(crate) struct AppState {
    pool: SqlitePool,
    sync: SyncService,
    mailer: Arc<dyn Mailer>,
    frontend_url: Arc<str>,
    shutdown: CancellationToken,
}

impl AppState {
    fn new(
        pool: SqlitePool,
        mailer: Arc<dyn Mailer>,
        frontend_url: &str,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            sync: SyncService::new(pool.clone(), SERVICE_NAME),
            pool,
            mailer,
            frontend_url: Arc::from(frontend_url.trim_end_matches('/')),
            shutdown,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
struct ErrorResponse {
    code: &'static str,
    message: String,
    details: Option<Value>,
}

#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<Value>,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    /// Logs the cause and hides it from the caller.
    fn internal(err: impl Display) -> Self {
        tracing::error!(error = %err, "request failed");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "internal server error",
        )
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            match db_err.kind() {
                ErrorKind::UniqueViolation => {
                    return ApiError::new(StatusCode::CONFLICT, "CONFLICT", "resource already exists")
                }
                ErrorKind::ForeignKeyViolation => {
                    return ApiError::new(
                        StatusCode::CONFLICT,
                        "REFERENCED",
                        "resource is referenced by other records",
                    )
                }
                _ => {}
            }
        }
        ApiError::internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let payload = ErrorResponse {
            code: self.code,
            message: self.message,
            details: self.details,
        };
        (self.status, Json(payload)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn parse_uuid(raw: &str) -> ApiResult<uuid::Uuid> {
    uuid::Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("id must be a UUID"))
}

#[derive(Serialize, utoipa::ToSchema)]
struct HealthStatus {
    status: String,
}

pub struct ApiConfig {
    pub addr: SocketAddr,
    pub database_url: String,
    pub frontend_url: String,
    pub mail_from: String,
}

pub fn load_config() -> Result<ApiConfig> {
    let addr = config::socket_addr_from_env("ZOOZY_API_ADDR", "0.0.0.0:8080")?;
    let database_url = config::required_env("DATABASE_URL")?;
    let frontend_url = config::optional_env("FRONTEND_URL", "http://localhost:3000");
    let mail_from = config::optional_env("MAIL_FROM", "no-reply@zoozy.app");
    Ok(ApiConfig {
        addr,
        database_url,
        frontend_url,
        mail_from,
    })
}

pub async fn run(config: ApiConfig) -> Result<()> {
    logging::init(SERVICE_NAME);
    metrics::init(SERVICE_NAME);

    let pool = db::connect(&config.database_url).await?;
    migrations::run(&pool).await?;

    let shutdown = CancellationToken::new();
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer::new(config.mail_from));
    let state = AppState::new(pool, mailer, &config.frontend_url, shutdown.clone());

    let router = http::apply_standard_layers(build_router(state), SERVICE_NAME);
    server::serve(config.addr, router, shutdown).await
}

pub(crate) fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/openapi.json", get(openapi_json))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/google-login", post(auth::google_login))
        .route("/api/auth/user/:id", get(auth::get_user))
        .route("/api/auth/user-by-email/:email", get(auth::get_user_by_email))
        .route("/api/auth/reset-password", post(auth::reset_password))
        .route(
            "/api/auth/confirm-reset-password",
            post(auth::confirm_reset_password),
        )
        .route("/api/users/sync", post(users::sync_user))
        .route("/api/users/register", post(users::register_user))
        .route("/api/users/exists/:firebase_uid", get(users::user_exists_by_uid))
        .route(
            "/api/users/:id",
            get(users::get_user_by_firebase_uid).put(users::update_user),
        )
        .route(
            "/api/petprofiles",
            get(pets::list_pets).post(pets::create_pet),
        )
        .route(
            "/api/petprofiles/:id",
            get(pets::get_pet).put(pets::update_pet).delete(pets::delete_pet),
        )
        .route(
            "/api/serviceproviders",
            get(providers::list_providers).post(providers::create_provider),
        )
        .route(
            "/api/serviceproviders/:id",
            get(providers::get_provider)
                .put(providers::update_provider)
                .delete(providers::delete_provider),
        )
        .route(
            "/api/servicerequests",
            get(service_requests::list_requests).post(service_requests::create_request),
        )
        .route(
            "/api/servicerequests/:id",
            get(service_requests::get_request)
                .put(service_requests::update_request)
                .delete(service_requests::delete_request),
        )
        .route(
            "/api/userrequests",
            get(user_requests::list_jobs).post(user_requests::create_job),
        )
        .route(
            "/api/userrequests/:id",
            get(user_requests::get_job)
                .put(user_requests::update_job)
                .delete(user_requests::delete_job),
        )
        .route(
            "/api/userservices",
            get(user_services::list_services).post(user_services::create_service),
        )
        .route("/api/userservices/others", get(user_services::list_other_services))
        .route(
            "/api/userservices/:id",
            get(user_services::get_service)
                .put(user_services::update_service)
                .delete(user_services::delete_service),
        )
        .route(
            "/api/messages",
            get(messages::list_conversation).post(messages::send_message),
        )
        .route("/api/messages/:id", get(messages::get_message))
        .route("/api/notifications", get(notifications::list_notifications))
        .route("/api/notifications/:id", delete(notifications::delete_notification))
        .route("/api/notifications/:id/read", put(notifications::mark_read))
        .route(
            "/api/userfavorites",
            get(favorites::list_favorites).post(favorites::create_favorite),
        )
        .route(
            "/api/userfavorites/by-identifier",
            delete(favorites::delete_by_identifier),
        )
        .route("/api/userfavorites/count", get(favorites::count_favorites))
        .route("/api/userfavorites/users", get(favorites::list_favorite_users))
        .route(
            "/api/userfavorites/:id",
            get(favorites::get_favorite).delete(favorites::delete_favorite),
        )
        .route(
            "/api/usercomments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route("/api/usercomments/by-card", delete(comments::delete_by_card))
        .route(
            "/api/usercomments/:id",
            get(comments::get_comment).delete(comments::delete_comment),
        )
        .route("/api/firebase/sync", post(sync::sync))
        .route("/api/firebase/sync-logs", get(sync::recent_logs))
        .with_state(state)
}

async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    match db::check_ready(&state.pool).await {
        Ok(_) => (StatusCode::OK, Json(HealthStatus { status: "ok".into() })),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthStatus {
                status: "unavailable".into(),
            }),
        ),
    }
}

async fn metrics_endpoint() -> impl IntoResponse {
    metrics::metrics_response(SERVICE_NAME)
}

async fn openapi_json(headers: HeaderMap) -> impl IntoResponse {
    let server_url = openapi::infer_server_url(&headers);
    Json(openapi::document(server_url.as_deref()))
}
