use crate::{
    config::Config,
    error::{AppError, Result},
    models::{
        access::{ActionKind, EntitlementEvent},
        payment::{
            to_minor_units, InitializePaymentPayload, PaymentInitialization, PaymentMetadata,
            PaymentOutcome, PaymentStatus, Purchase, PurchaseRequest, PurchaseType,
            SubscriptionCheckoutRequest,
        },
        websocket::EntitlementChange,
    },
    services::{
        auth::User,
        backend::BackendClient,
        catalog::{build_catalog, owned_subscription, CatalogService},
        entitlement::compute_subscription_state,
        realtime::RealtimeService,
    },
};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Paystack 付款流程：单次购买与付费订阅
#[derive(Clone)]
pub struct PaymentService {
    backend: BackendClient,
    catalog: CatalogService,
    realtime: RealtimeService,
    currency: String,
    callback_url: Option<String>,
}

impl PaymentService {
    pub fn new(
        config: &Config,
        backend: BackendClient,
        catalog: CatalogService,
        realtime: RealtimeService,
    ) -> Self {
        Self {
            backend,
            catalog,
            realtime,
            currency: config.default_currency.clone(),
            callback_url: config.payment_callback_url.clone(),
        }
    }

    /// 发起购买：价格以目录快照为准，客户端传入的任何金额都不可信
    pub async fn initialize_purchase(
        &self,
        user: &User,
        request: PurchaseRequest,
    ) -> Result<PaymentInitialization> {
        request.validate()?;

        let (snapshot, subaccount) = tokio::try_join!(
            self.catalog.snapshot(Some(user), &request.creator_id),
            self.creator_subaccount(&request.creator_id, user),
        )?;
        let already_purchased = snapshot.viewer.has_purchased(&request.content_id);

        let card = build_catalog(&request.creator_id, snapshot)
            .items
            .into_iter()
            .find(|card| card.item.id == request.content_id)
            .ok_or_else(|| AppError::not_found("Content"))?;

        // 重复条目合并后可能仍被锁定，已购买过的内容同样拒绝再次收费
        if card.has_access || already_purchased {
            return Err(AppError::bad_request("Content is already unlocked"));
        }
        let price = match (card.action.offers(ActionKind::Purchase), card.item.valid_price()) {
            (true, Some(price)) => price,
            _ => return Err(AppError::bad_request("Content cannot be purchased individually")),
        };

        let payload = self.payment_payload(
            user,
            price,
            subaccount,
            PaymentMetadata {
                user_id: user.id.clone(),
                creator_id: request.creator_id.clone(),
                content_id: Some(request.content_id.clone()),
                tier_id: None,
                subscription_uuid: None,
                purchase_type: PurchaseType::Individual,
            },
        );
        let initialization = self.start_checkout(payload, user).await?;

        info!(
            "Initialized purchase {} of content {} for user {} ({} {})",
            initialization.reference, request.content_id, user.id, price, self.currency
        );

        Ok(initialization)
    }

    /// 发起付费订阅：金额取自创作者的等级列表，已在该等级时拒绝
    pub async fn initialize_subscription(
        &self,
        user: &User,
        request: SubscriptionCheckoutRequest,
    ) -> Result<PaymentInitialization> {
        request.validate()?;

        let (tiers, subscription, subaccount) = tokio::try_join!(
            self.backend.creator_tiers(&request.creator_id),
            self.backend.my_subscription_for(&request.creator_id, &user.token),
            self.creator_subaccount(&request.creator_id, user),
        )?;

        let report = compute_subscription_state(
            &tiers,
            owned_subscription(subscription.as_ref(), &request.creator_id),
        );
        let tier_state = report
            .tiers
            .iter()
            .find(|t| t.tier.id == request.tier_id)
            .ok_or_else(|| AppError::not_found("Subscription tier"))?;

        if tier_state.is_current {
            return Err(AppError::bad_request("Already subscribed to this tier"));
        }
        let price = tier_state
            .tier
            .price
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| AppError::bad_request("Subscription tier has no valid price"))?;

        let payload = self.payment_payload(
            user,
            price,
            subaccount,
            PaymentMetadata {
                user_id: user.id.clone(),
                creator_id: request.creator_id.clone(),
                content_id: None,
                tier_id: Some(request.tier_id.clone()),
                subscription_uuid: Some(Uuid::new_v4().to_string()),
                purchase_type: PurchaseType::Subscription,
            },
        );
        let initialization = self.start_checkout(payload, user).await?;

        info!(
            "Initialized subscription checkout {} for user {} to creator {} tier {} ({} {})",
            initialization.reference, user.id, request.creator_id, request.tier_id, price, self.currency
        );

        Ok(initialization)
    }

    fn payment_payload(
        &self,
        user: &User,
        price: f64,
        subaccount: Option<String>,
        metadata: PaymentMetadata,
    ) -> InitializePaymentPayload {
        InitializePaymentPayload {
            paystack_reference: Uuid::new_v4().to_string(),
            email: user.email.clone(),
            amount: to_minor_units(price),
            currency: self.currency.clone(),
            callback_url: self.callback_url.clone(),
            subaccount,
            metadata,
        }
    }

    async fn start_checkout(
        &self,
        payload: InitializePaymentPayload,
        user: &User,
    ) -> Result<PaymentInitialization> {
        let mut initialization = self.backend.initialize_payment(&payload, &user.token).await?;
        if initialization.reference.is_empty() {
            initialization.reference = payload.paystack_reference;
        }
        Ok(initialization)
    }

    /// 创作者的分账子账户；资料不存在时按无分账处理
    async fn creator_subaccount(&self, creator_id: &str, user: &User) -> Result<Option<String>> {
        match self.backend.user(creator_id, Some(&user.token)).await {
            Ok(creator) => Ok(creator.subaccount_code().map(str::to_string)),
            Err(AppError::NotFound(_)) => {
                warn!("Creator profile {} not found, checkout without subaccount", creator_id);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// 校验支付结果，空引用号直接判定失败
    pub async fn verify_payment(&self, user: Option<&User>, reference: Option<&str>) -> Result<PaymentOutcome> {
        let reference = match reference.map(str::trim).filter(|r| !r.is_empty()) {
            Some(reference) => reference,
            None => {
                warn!("Payment verification requested without a reference");
                return Ok(PaymentOutcome {
                    status: PaymentStatus::Failed,
                    reference: None,
                    message: Some("Invalid payment reference received.".to_string()),
                });
            }
        };

        let response = self.backend.verify_payment(reference).await?;

        if !response.is_completed() {
            warn!(
                "Payment {} not completed: {}",
                reference,
                response.effective_status()
            );
            return Ok(PaymentOutcome {
                status: PaymentStatus::Failed,
                reference: Some(reference.to_string()),
                message: Some(
                    response
                        .message
                        .unwrap_or_else(|| "Payment verification failed.".to_string()),
                ),
            });
        }

        info!("Payment {} verified", reference);

        if let Some(user) = user {
            self.realtime
                .notify_entitlement_changed(
                    &user.id,
                    EntitlementChange {
                        creator_id: None,
                        content_id: None,
                        event: EntitlementEvent::PurchaseRecorded,
                    },
                )
                .await;
            self.realtime
                .notify(
                    &user.id,
                    json!({
                        "type": "payment",
                        "title": "Payment successful",
                        "message": "Your payment was confirmed.",
                        "reference": reference,
                    }),
                )
                .await;
        }

        Ok(PaymentOutcome {
            status: PaymentStatus::Success,
            reference: Some(reference.to_string()),
            message: response.message,
        })
    }

    pub async fn purchased_content(&self, user: &User) -> Result<Vec<Purchase>> {
        self.backend.purchased_content(&user.id, &user.token).await
    }
}
