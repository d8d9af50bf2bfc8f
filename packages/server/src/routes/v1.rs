use axum::{
    Router,
    routing::{get, patch, post, put},
};
use utoipa::OpenApi;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/profiles", profile_routes())
        .nest("/groups", group_routes())
        .nest("/group-members", membership_routes())
        .nest("/tasks", task_routes())
        .nest("/submissions", submission_routes())
        .nest("/notifications", notification_routes())
        .nest("/rpc", rpc_routes())
        .nest("/realtime", realtime_routes())
        .nest("/storage", storage_routes(config))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(handlers::auth::sign_up))
        .route("/login", post(handlers::auth::sign_in))
        .route("/session", get(handlers::auth::session))
        .route("/user", patch(handlers::auth::update_user))
}

fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/me", patch(handlers::profile::update_my_profile))
        .route("/{id}", get(handlers::profile::get_profile))
}

fn group_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::group::list_groups).post(handlers::group::create_group),
        )
        .route("/{id}", get(handlers::group::get_group))
        .route(
            "/{id}/members",
            get(handlers::group::list_members).post(handlers::group::join_group),
        )
        .route(
            "/{id}/tasks",
            get(handlers::task::list_group_tasks).post(handlers::task::create_task),
        )
}

fn membership_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::group::list_memberships))
}

fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::task::list_tasks))
        .route(
            "/{id}",
            get(handlers::task::get_task).patch(handlers::task::update_task),
        )
        .route(
            "/{id}/submission",
            put(handlers::submission::submit).get(handlers::submission::get_my_submission),
        )
        .route(
            "/{id}/submissions",
            get(handlers::submission::list_task_submissions),
        )
}

fn submission_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::submission::list_submissions))
        .route("/{id}/rating", post(handlers::submission::rate_submission))
}

fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::notification::list_notifications))
        .route("/unread-count", get(handlers::notification::unread_count))
        .route("/{id}/read", post(handlers::notification::mark_read))
}

fn rpc_routes() -> Router<AppState> {
    Router::new().route(
        "/mark_all_notifications_read",
        post(handlers::notification::mark_all_read),
    )
}

fn realtime_routes() -> Router<AppState> {
    Router::new().route(
        "/notifications",
        get(handlers::realtime::notification_changes),
    )
}

fn storage_routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .route(
            "/object/{bucket}/{*path}",
            put(handlers::storage::upload_object),
        )
        .route(
            "/object/public/{bucket}/{*path}",
            get(handlers::storage::download_public_object),
        )
        .layer(handlers::storage::upload_body_limit(
            config.storage.max_object_size,
        ))
}

#[derive(OpenApi)]
#[openapi(paths(
    handlers::auth::sign_up,
    handlers::auth::sign_in,
    handlers::auth::session,
    handlers::auth::update_user,
))]
struct AuthApi;

#[derive(OpenApi)]
#[openapi(paths(handlers::profile::get_profile, handlers::profile::update_my_profile))]
struct ProfileApi;

#[derive(OpenApi)]
#[openapi(paths(
    handlers::group::list_groups,
    handlers::group::create_group,
    handlers::group::get_group,
    handlers::group::join_group,
    handlers::group::list_members,
    handlers::task::list_group_tasks,
    handlers::task::create_task,
))]
struct GroupApi;

#[derive(OpenApi)]
#[openapi(paths(handlers::group::list_memberships))]
struct MembershipApi;

#[derive(OpenApi)]
#[openapi(paths(
    handlers::task::list_tasks,
    handlers::task::get_task,
    handlers::task::update_task,
    handlers::submission::submit,
    handlers::submission::get_my_submission,
    handlers::submission::list_task_submissions,
))]
struct TaskApi;

#[derive(OpenApi)]
#[openapi(paths(
    handlers::submission::list_submissions,
    handlers::submission::rate_submission,
))]
struct SubmissionApi;

#[derive(OpenApi)]
#[openapi(paths(
    handlers::notification::list_notifications,
    handlers::notification::unread_count,
    handlers::notification::mark_read,
))]
struct NotificationApi;

#[derive(OpenApi)]
#[openapi(paths(handlers::notification::mark_all_read))]
struct RpcApi;

#[derive(OpenApi)]
#[openapi(paths(handlers::realtime::notification_changes))]
struct RealtimeApi;

#[derive(OpenApi)]
#[openapi(paths(
    handlers::storage::upload_object,
    handlers::storage::download_public_object,
))]
struct StorageApi;

/// OpenAPI paths for every v1 route, nested at the same prefixes as the router.
#[derive(OpenApi)]
#[openapi(nest(
    (path = "/api/v1/auth", api = AuthApi),
    (path = "/api/v1/profiles", api = ProfileApi),
    (path = "/api/v1/groups", api = GroupApi),
    (path = "/api/v1/group-members", api = MembershipApi),
    (path = "/api/v1/tasks", api = TaskApi),
    (path = "/api/v1/submissions", api = SubmissionApi),
    (path = "/api/v1/notifications", api = NotificationApi),
    (path = "/api/v1/rpc", api = RpcApi),
    (path = "/api/v1/realtime", api = RealtimeApi),
    (path = "/api/v1/storage", api = StorageApi),
))]
pub struct V1Api;
