use axum::{
    extract::{Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{
    error::Result,
    models::{
        payment::{
            PaymentInitialization, PaymentOutcome, PurchaseRequest, SubscriptionCheckoutRequest,
            VerifyQuery,
        },
        response::ApiResponse,
    },
    services::auth::{OptionalUser, User},
    state::AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/purchase", post(initialize_purchase))
        .route("/subscribe", post(initialize_subscription))
        .route("/verify", get(verify_payment))
}

/// 发起单次购买，返回 Paystack 支付地址
async fn initialize_purchase(
    State(app_state): State<Arc<AppState>>,
    user: User,
    Json(request): Json<PurchaseRequest>,
) -> Result<Json<ApiResponse<PaymentInitialization>>> {
    let initialization = app_state
        .payment_service
        .initialize_purchase(&user, request)
        .await?;

    Ok(Json(ApiResponse::success(initialization)))
}

/// 发起付费订阅
async fn initialize_subscription(
    State(app_state): State<Arc<AppState>>,
    user: User,
    Json(request): Json<SubscriptionCheckoutRequest>,
) -> Result<Json<ApiResponse<PaymentInitialization>>> {
    let initialization = app_state
        .payment_service
        .initialize_subscription(&user, request)
        .await?;

    Ok(Json(ApiResponse::success(initialization)))
}

/// 支付回调页校验
async fn verify_payment(
    State(app_state): State<Arc<AppState>>,
    OptionalUser(user): OptionalUser,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<ApiResponse<PaymentOutcome>>> {
    let outcome = app_state
        .payment_service
        .verify_payment(user.as_ref(), query.reference.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(outcome)))
}
