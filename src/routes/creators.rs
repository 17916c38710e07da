use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::{
    error::Result,
    models::{
        access::{ContentCard, CreatorCatalog, TierStateReport},
        creator::{CreateTierRequest, Creator, ExploreQuery, HomeFeed, SubscriptionTier},
        response::ApiResponse,
    },
    services::auth::{OptionalUser, User},
    state::AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/explore", get(explore_creators))
        .route("/home", get(home_feed))
        .route("/:creator_id/content", get(get_creator_catalog))
        .route("/:creator_id/content/:content_id/access", get(get_item_access))
        .route("/:creator_id/tiers", get(get_tier_state).post(create_tier))
}

/// 探索页：按领域筛选并搜索创作者
async fn explore_creators(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ExploreQuery>,
) -> Result<Json<ApiResponse<Vec<Creator>>>> {
    let creators = app_state.discovery_service.explore(&query).await?;
    Ok(Json(ApiResponse::success(creators)))
}

/// 首页推荐分组
async fn home_feed(State(app_state): State<Arc<AppState>>) -> Result<Json<ApiResponse<HomeFeed>>> {
    let feed = app_state.discovery_service.home_feed().await?;
    Ok(Json(ApiResponse::success(feed)))
}

/// 创作者内容目录及访问判定
async fn get_creator_catalog(
    State(app_state): State<Arc<AppState>>,
    OptionalUser(user): OptionalUser,
    Path(creator_id): Path<String>,
) -> Result<Json<ApiResponse<CreatorCatalog>>> {
    let catalog = app_state
        .catalog_service
        .creator_catalog(user.as_ref(), &creator_id)
        .await?;

    Ok(Json(ApiResponse::success(catalog)))
}

async fn get_item_access(
    State(app_state): State<Arc<AppState>>,
    OptionalUser(user): OptionalUser,
    Path((creator_id, content_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ContentCard>>> {
    let card = app_state
        .catalog_service
        .item_access(user.as_ref(), &creator_id, &content_id)
        .await?;

    Ok(Json(ApiResponse::success(card)))
}

/// 等级列表及当前订阅所在等级
async fn get_tier_state(
    State(app_state): State<Arc<AppState>>,
    OptionalUser(user): OptionalUser,
    Path(creator_id): Path<String>,
) -> Result<Json<ApiResponse<TierStateReport>>> {
    let report = app_state
        .catalog_service
        .tier_state(user.as_ref(), &creator_id)
        .await?;

    Ok(Json(ApiResponse::success(report)))
}

async fn create_tier(
    State(app_state): State<Arc<AppState>>,
    user: User,
    Path(creator_id): Path<String>,
    Json(request): Json<CreateTierRequest>,
) -> Result<Json<ApiResponse<SubscriptionTier>>> {
    let tier = app_state
        .subscription_service
        .create_tier(&user, &creator_id, request)
        .await?;

    Ok(Json(ApiResponse::success_with_message(tier, "Subscription tier created")))
}
