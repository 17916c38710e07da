use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, patch},
    Router,
};
use std::sync::Arc;

use crate::{
    error::Result,
    models::{
        notification::{Notification, NotificationQuery},
        response::{ApiResponse, Page},
    },
    services::auth::User,
    state::AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/:notification_id/read", patch(mark_read))
}

async fn list_notifications(
    State(app_state): State<Arc<AppState>>,
    user: User,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<ApiResponse<Page<Notification>>>> {
    let page = app_state.notification_service.list(&user, query).await?;
    Ok(Json(ApiResponse::success(page)))
}

async fn mark_read(
    State(app_state): State<Arc<AppState>>,
    user: User,
    Path(notification_id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    app_state
        .notification_service
        .mark_read(&user, &notification_id)
        .await?;

    Ok(Json(ApiResponse::success_with_message((), "Notification marked as read")))
}
