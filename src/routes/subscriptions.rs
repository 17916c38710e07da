use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    error::Result,
    models::{response::ApiResponse, subscription::*},
    services::auth::User,
    state::AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/subscribe", post(subscribe))
        .route("/unsubscribe", post(unsubscribe))
        .route("/my", get(my_subscriptions))
}

/// 订阅创作者
async fn subscribe(
    State(app_state): State<Arc<AppState>>,
    user: User,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<ApiResponse<Subscription>>> {
    let subscription = app_state
        .subscription_service
        .subscribe(&user, request)
        .await?;

    Ok(Json(ApiResponse::success(subscription)))
}

/// 取消订阅
async fn unsubscribe(
    State(app_state): State<Arc<AppState>>,
    user: User,
    Json(request): Json<UnsubscribeRequest>,
) -> Result<Json<ApiResponse<Value>>> {
    let success = app_state
        .subscription_service
        .unsubscribe(&user, request)
        .await?;

    Ok(Json(ApiResponse::success(json!({ "success": success }))))
}

/// 当前用户的全部订阅
async fn my_subscriptions(
    State(app_state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<ApiResponse<Vec<Subscription>>>> {
    let subscriptions = app_state.subscription_service.my_subscriptions(&user).await?;
    Ok(Json(ApiResponse::success(subscriptions)))
}
