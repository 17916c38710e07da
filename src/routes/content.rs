use axum::{extract::State, response::Json, routing::get, Router};
use std::sync::Arc;

use crate::{
    error::Result,
    models::{payment::Purchase, response::ApiResponse},
    services::auth::User,
    state::AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/purchased", get(purchased_content))
}

/// 已购内容
async fn purchased_content(
    State(app_state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<ApiResponse<Vec<Purchase>>>> {
    let purchases = app_state.payment_service.purchased_content(&user).await?;
    Ok(Json(ApiResponse::success(purchases)))
}
