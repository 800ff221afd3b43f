#![allow(dead_code)]

use axum::http::HeaderMap;
use utoipa::openapi::server::ServerBuilder;
use utoipa::OpenApi;
use zoozy_sync::{
    PetProfile, PetProfileDto, ServiceProvider, ServiceProviderDto, ServiceRequest,
    ServiceRequestDto, SyncLog, SyncReport, SyncRequest,
};

use crate::auth::{
    AckResponse, AuthResponse, ConfirmResetPasswordRequest, GoogleLoginRequest, LoginRequest,
    RegisterRequest, ResetPasswordRequest, UserEnvelope,
};
use crate::comments::{Comment, CommentPayload};
use crate::favorites::{CountResponse, Favorite, FavoritePayload, FavoriteUser};
use crate::messages::{ConversationEntry, Message, SendMessageRequest};
use crate::notifications::NotificationView;
use crate::pets::PetPayload;
use crate::providers::ProviderPayload;
use crate::service_requests::{ServiceRequestPayload, ServiceRequestView};
use crate::user_requests::{Job, JobPayload};
use crate::user_services::{OwnedService, UserService, UserServicePayload};
use crate::users::{
    ExistsResponse, SyncUserRequest, UpdateUserRequest, UpdateUserResponse, UserIdResponse,
    UserProfile,
};
use crate::{ErrorResponse, HealthStatus};

#[derive(OpenApi)]
#[openapi(
    paths(
        healthz_doc,
        metrics_doc,
        openapi_doc,
        auth_register_doc,
        auth_login_doc,
        auth_google_login_doc,
        auth_user_doc,
        auth_user_by_email_doc,
        auth_reset_password_doc,
        auth_confirm_reset_password_doc,
        users_sync_doc,
        users_register_doc,
        users_exists_doc,
        users_get_doc,
        users_update_doc,
        pets_list_doc,
        pets_create_doc,
        pets_get_doc,
        pets_update_doc,
        pets_delete_doc,
        providers_list_doc,
        providers_create_doc,
        providers_get_doc,
        providers_update_doc,
        providers_delete_doc,
        service_requests_list_doc,
        service_requests_create_doc,
        service_requests_get_doc,
        service_requests_update_doc,
        service_requests_delete_doc,
        jobs_list_doc,
        jobs_create_doc,
        jobs_get_doc,
        jobs_update_doc,
        jobs_delete_doc,
        services_list_doc,
        services_create_doc,
        services_others_doc,
        services_get_doc,
        services_update_doc,
        services_delete_doc,
        messages_conversation_doc,
        messages_send_doc,
        messages_get_doc,
        notifications_list_doc,
        notifications_read_doc,
        notifications_delete_doc,
        favorites_list_doc,
        favorites_create_doc,
        favorites_get_doc,
        favorites_delete_doc,
        favorites_delete_by_identifier_doc,
        favorites_count_doc,
        favorites_users_doc,
        comments_list_doc,
        comments_create_doc,
        comments_get_doc,
        comments_delete_doc,
        comments_delete_by_card_doc,
        firebase_sync_doc,
        firebase_sync_logs_doc
    ),
    components(schemas(
        HealthStatus,
        ErrorResponse,
        RegisterRequest,
        LoginRequest,
        GoogleLoginRequest,
        ResetPasswordRequest,
        ConfirmResetPasswordRequest,
        AuthResponse,
        UserEnvelope,
        AckResponse,
        UserProfile,
        SyncUserRequest,
        UpdateUserRequest,
        UserIdResponse,
        ExistsResponse,
        UpdateUserResponse,
        PetPayload,
        PetProfile,
        ProviderPayload,
        ServiceProvider,
        ServiceRequestPayload,
        ServiceRequest,
        ServiceRequestView,
        Job,
        JobPayload,
        UserService,
        OwnedService,
        UserServicePayload,
        Message,
        ConversationEntry,
        SendMessageRequest,
        NotificationView,
        Favorite,
        FavoritePayload,
        CountResponse,
        FavoriteUser,
        Comment,
        CommentPayload,
        SyncRequest,
        PetProfileDto,
        ServiceProviderDto,
        ServiceRequestDto,
        SyncReport,
        SyncLog
    )),
    tags(
        (name = "zoozy-api", description = "Zoozy pet-care marketplace API")
    )
)]
pub struct ZoozyApiDoc;

pub fn document(server_url: Option<&str>) -> utoipa::openapi::OpenApi {
    let mut doc = ZoozyApiDoc::openapi();
    if let Some(url) = server_url {
        doc.servers = Some(vec![ServerBuilder::new().url(url).build()]);
    }
    doc
}

pub fn infer_server_url(headers: &HeaderMap) -> Option<String> {
    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get("host"))
        .and_then(|value| value.to_str().ok())?;
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");
    Some(format!("{proto}://{host}"))
}

#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, body = HealthStatus), (status = 503, body = HealthStatus))
)]
fn healthz_doc() {}

#[utoipa::path(
    get,
    path = "/metrics",
    responses((status = 200, content_type = "text/plain", body = String))
)]
fn metrics_doc() {}

#[utoipa::path(
    get,
    path = "/api/openapi.json",
    responses((status = 200, body = serde_json::Value))
)]
fn openapi_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, body = AuthResponse),
        (status = 400, body = ErrorResponse),
        (status = 409, body = ErrorResponse)
    )
)]
fn auth_register_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses((status = 200, body = AuthResponse), (status = 401, body = ErrorResponse))
)]
fn auth_login_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/google-login",
    request_body = GoogleLoginRequest,
    responses((status = 200, body = AuthResponse), (status = 400, body = ErrorResponse))
)]
fn auth_google_login_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/user/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses((status = 200, body = UserEnvelope), (status = 404, body = ErrorResponse))
)]
fn auth_user_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/user-by-email/{email}",
    params(("email" = String, Path, description = "Account email")),
    responses((status = 200, body = UserEnvelope), (status = 404, body = ErrorResponse))
)]
fn auth_user_by_email_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses((status = 200, body = AckResponse))
)]
fn auth_reset_password_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/confirm-reset-password",
    request_body = ConfirmResetPasswordRequest,
    responses((status = 200, body = AckResponse), (status = 400, body = ErrorResponse))
)]
fn auth_confirm_reset_password_doc() {}

#[utoipa::path(
    post,
    path = "/api/users/sync",
    request_body = SyncUserRequest,
    responses((status = 200, body = UserIdResponse), (status = 400, body = ErrorResponse))
)]
fn users_sync_doc() {}

#[utoipa::path(
    post,
    path = "/api/users/register",
    request_body = SyncUserRequest,
    responses((status = 201, body = UserIdResponse), (status = 409, body = ErrorResponse))
)]
fn users_register_doc() {}

#[utoipa::path(
    get,
    path = "/api/users/exists/{firebase_uid}",
    params(("firebase_uid" = String, Path, description = "Firebase uid")),
    responses((status = 200, body = ExistsResponse))
)]
fn users_exists_doc() {}

#[utoipa::path(
    get,
    path = "/api/users/{firebase_uid}",
    params(("firebase_uid" = String, Path, description = "Firebase uid")),
    responses((status = 200, body = UserProfile), (status = 404, body = ErrorResponse))
)]
fn users_get_doc() {}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, body = UpdateUserResponse),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    )
)]
fn users_update_doc() {}

#[utoipa::path(
    get,
    path = "/api/petprofiles",
    responses((status = 200, body = Vec<PetProfile>))
)]
fn pets_list_doc() {}

#[utoipa::path(
    post,
    path = "/api/petprofiles",
    request_body = PetPayload,
    responses(
        (status = 201, body = PetProfile),
        (status = 400, body = ErrorResponse),
        (status = 409, body = ErrorResponse)
    )
)]
fn pets_create_doc() {}

#[utoipa::path(
    get,
    path = "/api/petprofiles/{id}",
    params(("id" = uuid::Uuid, Path, description = "Pet profile id")),
    responses((status = 200, body = PetProfile), (status = 404, body = ErrorResponse))
)]
fn pets_get_doc() {}

#[utoipa::path(
    put,
    path = "/api/petprofiles/{id}",
    params(("id" = uuid::Uuid, Path, description = "Pet profile id")),
    request_body = PetPayload,
    responses((status = 200, body = PetProfile), (status = 404, body = ErrorResponse))
)]
fn pets_update_doc() {}

#[utoipa::path(
    delete,
    path = "/api/petprofiles/{id}",
    params(("id" = uuid::Uuid, Path, description = "Pet profile id")),
    responses(
        (status = 204),
        (status = 404, body = ErrorResponse),
        (status = 409, body = ErrorResponse)
    )
)]
fn pets_delete_doc() {}

#[utoipa::path(
    get,
    path = "/api/serviceproviders",
    responses((status = 200, body = Vec<ServiceProvider>))
)]
fn providers_list_doc() {}

#[utoipa::path(
    post,
    path = "/api/serviceproviders",
    request_body = ProviderPayload,
    responses(
        (status = 201, body = ServiceProvider),
        (status = 400, body = ErrorResponse),
        (status = 409, body = ErrorResponse)
    )
)]
fn providers_create_doc() {}

#[utoipa::path(
    get,
    path = "/api/serviceproviders/{id}",
    params(("id" = uuid::Uuid, Path, description = "Service provider id")),
    responses((status = 200, body = ServiceProvider), (status = 404, body = ErrorResponse))
)]
fn providers_get_doc() {}

#[utoipa::path(
    put,
    path = "/api/serviceproviders/{id}",
    params(("id" = uuid::Uuid, Path, description = "Service provider id")),
    request_body = ProviderPayload,
    responses((status = 200, body = ServiceProvider), (status = 404, body = ErrorResponse))
)]
fn providers_update_doc() {}

#[utoipa::path(
    delete,
    path = "/api/serviceproviders/{id}",
    params(("id" = uuid::Uuid, Path, description = "Service provider id")),
    responses(
        (status = 204),
        (status = 404, body = ErrorResponse),
        (status = 409, body = ErrorResponse)
    )
)]
fn providers_delete_doc() {}

#[utoipa::path(
    get,
    path = "/api/servicerequests",
    params(
        ("petId" = Option<uuid::Uuid>, Query, description = "Filter by pet profile"),
        ("providerId" = Option<uuid::Uuid>, Query, description = "Filter by service provider")
    ),
    responses((status = 200, body = Vec<ServiceRequestView>))
)]
fn service_requests_list_doc() {}

#[utoipa::path(
    post,
    path = "/api/servicerequests",
    request_body = ServiceRequestPayload,
    responses((status = 201, body = ServiceRequest), (status = 400, body = ErrorResponse))
)]
fn service_requests_create_doc() {}

#[utoipa::path(
    get,
    path = "/api/servicerequests/{id}",
    params(("id" = uuid::Uuid, Path, description = "Service request id")),
    responses((status = 200, body = ServiceRequestView), (status = 404, body = ErrorResponse))
)]
fn service_requests_get_doc() {}

#[utoipa::path(
    put,
    path = "/api/servicerequests/{id}",
    params(("id" = uuid::Uuid, Path, description = "Service request id")),
    request_body = ServiceRequestPayload,
    responses(
        (status = 200, body = ServiceRequest),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    )
)]
fn service_requests_update_doc() {}

#[utoipa::path(
    delete,
    path = "/api/servicerequests/{id}",
    params(("id" = uuid::Uuid, Path, description = "Service request id")),
    responses((status = 204), (status = 404, body = ErrorResponse))
)]
fn service_requests_delete_doc() {}

#[utoipa::path(
    get,
    path = "/api/userrequests",
    params(("userId" = Option<i64>, Query, description = "Filter by poster")),
    responses((status = 200, body = Vec<Job>))
)]
fn jobs_list_doc() {}

#[utoipa::path(
    post,
    path = "/api/userrequests",
    request_body = JobPayload,
    responses((status = 201, body = Job), (status = 400, body = ErrorResponse))
)]
fn jobs_create_doc() {}

#[utoipa::path(
    get,
    path = "/api/userrequests/{id}",
    params(("id" = i64, Path, description = "Job id")),
    responses((status = 200, body = Job), (status = 404, body = ErrorResponse))
)]
fn jobs_get_doc() {}

#[utoipa::path(
    put,
    path = "/api/userrequests/{id}",
    params(("id" = i64, Path, description = "Job id")),
    request_body = JobPayload,
    responses(
        (status = 204),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    )
)]
fn jobs_update_doc() {}

#[utoipa::path(
    delete,
    path = "/api/userrequests/{id}",
    params(("id" = i64, Path, description = "Job id")),
    responses((status = 204), (status = 404, body = ErrorResponse))
)]
fn jobs_delete_doc() {}

#[utoipa::path(
    get,
    path = "/api/userservices",
    params(("userId" = Option<i64>, Query, description = "Filter by owner")),
    responses((status = 200, body = Vec<UserService>))
)]
fn services_list_doc() {}

#[utoipa::path(
    post,
    path = "/api/userservices",
    request_body = UserServicePayload,
    responses((status = 201, body = UserService), (status = 400, body = ErrorResponse))
)]
fn services_create_doc() {}

#[utoipa::path(
    get,
    path = "/api/userservices/others",
    params(("excludeUserId" = Option<i64>, Query, description = "Owner to leave out")),
    responses((status = 200, body = Vec<OwnedService>))
)]
fn services_others_doc() {}

#[utoipa::path(
    get,
    path = "/api/userservices/{id}",
    params(("id" = i64, Path, description = "Service id")),
    responses((status = 200, body = UserService), (status = 404, body = ErrorResponse))
)]
fn services_get_doc() {}

#[utoipa::path(
    put,
    path = "/api/userservices/{id}",
    params(("id" = i64, Path, description = "Service id")),
    request_body = UserServicePayload,
    responses(
        (status = 204),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    )
)]
fn services_update_doc() {}

#[utoipa::path(
    delete,
    path = "/api/userservices/{id}",
    params(("id" = i64, Path, description = "Service id")),
    responses((status = 204), (status = 404, body = ErrorResponse))
)]
fn services_delete_doc() {}

#[utoipa::path(
    get,
    path = "/api/messages",
    params(
        ("jobId" = i64, Query, description = "Job the conversation belongs to"),
        ("userId" = i64, Query, description = "Participant")
    ),
    responses((status = 200, body = Vec<ConversationEntry>))
)]
fn messages_conversation_doc() {}

#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = SendMessageRequest,
    responses((status = 201, body = Message), (status = 400, body = ErrorResponse))
)]
fn messages_send_doc() {}

#[utoipa::path(
    get,
    path = "/api/messages/{id}",
    params(("id" = i64, Path, description = "Message id")),
    responses((status = 200, body = Message), (status = 404, body = ErrorResponse))
)]
fn messages_get_doc() {}

#[utoipa::path(
    get,
    path = "/api/notifications",
    params(("userId" = i64, Query, description = "Recipient")),
    responses((status = 200, body = Vec<NotificationView>))
)]
fn notifications_list_doc() {}

#[utoipa::path(
    put,
    path = "/api/notifications/{id}/read",
    params(("id" = i64, Path, description = "Notification id")),
    responses((status = 204), (status = 404, body = ErrorResponse))
)]
fn notifications_read_doc() {}

#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    params(("id" = i64, Path, description = "Notification id")),
    responses((status = 204), (status = 404, body = ErrorResponse))
)]
fn notifications_delete_doc() {}

#[utoipa::path(
    get,
    path = "/api/userfavorites",
    params(
        ("userId" = Option<i64>, Query, description = "Filter by user"),
        ("tip" = Option<String>, Query, description = "Filter by card kind")
    ),
    responses((status = 200, body = Vec<Favorite>))
)]
fn favorites_list_doc() {}

#[utoipa::path(
    post,
    path = "/api/userfavorites",
    request_body = FavoritePayload,
    responses(
        (status = 201, body = Favorite),
        (status = 400, body = ErrorResponse),
        (status = 409, body = ErrorResponse)
    )
)]
fn favorites_create_doc() {}

#[utoipa::path(
    get,
    path = "/api/userfavorites/{id}",
    params(("id" = i64, Path, description = "Favorite id")),
    responses((status = 200, body = Favorite), (status = 404, body = ErrorResponse))
)]
fn favorites_get_doc() {}

#[utoipa::path(
    delete,
    path = "/api/userfavorites/{id}",
    params(("id" = i64, Path, description = "Favorite id")),
    responses((status = 204), (status = 404, body = ErrorResponse))
)]
fn favorites_delete_doc() {}

#[utoipa::path(
    delete,
    path = "/api/userfavorites/by-identifier",
    params(
        ("userId" = i64, Query, description = "Owner of the favorite"),
        ("title" = String, Query, description = "Card title"),
        ("tip" = String, Query, description = "Card kind"),
        ("imageUrl" = Option<String>, Query, description = "Card image")
    ),
    responses((status = 204), (status = 404, body = ErrorResponse))
)]
fn favorites_delete_by_identifier_doc() {}

#[utoipa::path(
    get,
    path = "/api/userfavorites/count",
    params(
        ("title" = String, Query, description = "Card title"),
        ("tip" = String, Query, description = "Card kind"),
        ("imageUrl" = Option<String>, Query, description = "Card image")
    ),
    responses((status = 200, body = CountResponse))
)]
fn favorites_count_doc() {}

#[utoipa::path(
    get,
    path = "/api/userfavorites/users",
    params(
        ("title" = String, Query, description = "Card title"),
        ("tip" = String, Query, description = "Card kind"),
        ("imageUrl" = Option<String>, Query, description = "Card image")
    ),
    responses((status = 200, body = Vec<FavoriteUser>))
)]
fn favorites_users_doc() {}

#[utoipa::path(
    get,
    path = "/api/usercomments",
    params(("cardId" = Option<String>, Query, description = "Filter by card")),
    responses((status = 200, body = Vec<Comment>))
)]
fn comments_list_doc() {}

#[utoipa::path(
    post,
    path = "/api/usercomments",
    request_body = CommentPayload,
    responses((status = 201, body = Comment), (status = 400, body = ErrorResponse))
)]
fn comments_create_doc() {}

#[utoipa::path(
    get,
    path = "/api/usercomments/{id}",
    params(("id" = i64, Path, description = "Comment id")),
    responses((status = 200, body = Comment), (status = 404, body = ErrorResponse))
)]
fn comments_get_doc() {}

#[utoipa::path(
    delete,
    path = "/api/usercomments/{id}",
    params(("id" = i64, Path, description = "Comment id")),
    responses((status = 204), (status = 404, body = ErrorResponse))
)]
fn comments_delete_doc() {}

#[utoipa::path(
    delete,
    path = "/api/usercomments/by-card",
    params(("cardId" = String, Query, description = "Card whose comments are removed")),
    responses((status = 204), (status = 404, body = ErrorResponse))
)]
fn comments_delete_by_card_doc() {}

#[utoipa::path(
    post,
    path = "/api/firebase/sync",
    request_body = SyncRequest,
    responses(
        (status = 200, body = SyncReport),
        (status = 400, body = ErrorResponse),
        (status = 503, body = ErrorResponse)
    )
)]
fn firebase_sync_doc() {}

#[utoipa::path(
    get,
    path = "/api/firebase/sync-logs",
    params(("limit" = Option<i64>, Query, description = "Number of entries, newest first")),
    responses((status = 200, body = Vec<SyncLog>))
)]
fn firebase_sync_logs_doc() {}
