pub mod content;
pub mod creators;
pub mod notifications;
pub mod payments;
pub mod subscriptions;
pub mod websocket;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{
    state::AppState,
    utils::middleware::{auth_middleware, rate_limit_middleware, request_logging_middleware},
};

/// 构建完整的应用路由 - 使用 /api/gateway/ 前缀
pub fn app(app_state: Arc<AppState>) -> Router {
    let api = Router::new()
        .nest("/api/gateway/creators", creators::router())
        .nest("/api/gateway/subscriptions", subscriptions::router())
        .nest("/api/gateway/payments", payments::router())
        .nest("/api/gateway/content", content::router())
        .nest("/api/gateway/notifications", notifications::router())
        .nest("/api/gateway/ws", websocket::router())
        .layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .layer(middleware::from_fn_with_state(app_state.clone(), rate_limit_middleware));

    Router::new()
        .route("/health", get(health_check))
        .merge(api)
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(cors_layer(&app_state.config.cors_allowed_origins))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// 逗号分隔的来源列表，`*` 表示允许任意来源
fn cors_layer(allowed_origins: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if allowed_origins.trim() == "*" {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    cors.allow_origin(origins)
}

async fn health_check(State(app_state): State<Arc<AppState>>) -> Json<Value> {
    let realtime = app_state.realtime_service.get_stats().await;

    Json(json!({
        "status": "ok",
        "service": "aroyyo-gateway",
        "realtime": realtime,
    }))
}
