use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::{error, info};

use crate::{services::auth::User, state::AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/connect", get(websocket_handler))
}

/// WebSocket连接处理器
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    user: User,
) -> Response {
    let connection_id = format!("conn_{}", uuid::Uuid::new_v4());

    info!("WebSocket upgrade request from user: {} with connection: {}", user.id, connection_id);

    ws.on_upgrade(move |socket| async move {
        if let Err(e) = state
            .realtime_service
            .handle_connection(socket, user.id.clone(), connection_id.clone())
            .await
        {
            error!("WebSocket connection error for {}: {}", connection_id, e);
        }

        info!("WebSocket connection closed: {} for user: {}", connection_id, user.id);
    })
}
