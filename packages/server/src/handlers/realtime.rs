use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio_stream::StreamExt;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/notifications",
    tag = "Realtime",
    operation_id = "subscribeNotifications",
    summary = "Stream changes on the caller's notifications",
    description = "Server-Sent Events. Each `notification` event carries \
        `{\"event\": \"INSERT\" | \"UPDATE\", \"record\": Notification}` for rows owned by the caller.",
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn notification_changes(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    tracing::debug!("Realtime subscriber connected");
    let stream = state
        .realtime
        .subscribe_user(auth_user.user_id)
        .map(|change| Event::default().event("notification").json_data(change));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
