use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use zoozy_sync::{store, SyncError, SyncLog, SyncReport, SyncRequest};

use crate::{ApiError, ApiResult, AppState};

const DEFAULT_LOG_LIMIT: i64 = 20;
const MAX_LOG_LIMIT: i64 = 100;

#[derive(Deserialize)]
pub struct SyncLogQuery {
    pub limit: Option<i64>,
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::InvalidInput(message) => ApiError::bad_request(message),
            SyncError::Cancelled => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "SYNC_CANCELLED",
                "sync was cancelled",
            ),
            SyncError::Database(err) => ApiError::internal(err),
        }
    }
}

/// Reconciles a batch of pets, providers and service requests from a mobile client.
/// A missing, `null` or malformed body is rejected before anything is written.
pub async fn sync(
    State(state): State<AppState>,
    payload: Result<Json<Option<SyncRequest>>, JsonRejection>,
) -> ApiResult<Json<SyncReport>> {
    let request = match payload {
        Ok(Json(Some(request))) => request,
        Ok(Json(None)) => return Err(ApiError::bad_request("sync payload is required")),
        Err(rejection) => {
            return Err(ApiError::bad_request("sync payload is malformed")
                .with_details(json!({ "reason": rejection.body_text() })))
        }
    };

    let report = state
        .sync
        .sync(request, &state.shutdown.child_token())
        .await?;
    Ok(Json(report))
}

pub async fn recent_logs(
    State(state): State<AppState>,
    Query(query): Query<SyncLogQuery>,
) -> ApiResult<Json<Vec<SyncLog>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .clamp(1, MAX_LOG_LIMIT);
    let mut conn = state.pool.acquire().await?;
    Ok(Json(store::list_recent_sync_logs(&mut conn, limit).await?))
}
