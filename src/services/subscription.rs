use crate::{
    error::{AppError, Result},
    models::{
        access::EntitlementEvent,
        creator::{CreateTierPayload, CreateTierRequest, SubscriptionTier},
        subscription::{SubscribeRequest, Subscription, UnsubscribeRequest},
        websocket::EntitlementChange,
    },
    services::{auth::User, backend::BackendClient, realtime::RealtimeService},
};
use serde_json::json;
use tracing::{info, warn};
use validator::Validate;

#[derive(Clone)]
pub struct SubscriptionService {
    backend: BackendClient,
    realtime: RealtimeService,
}

impl SubscriptionService {
    pub fn new(backend: BackendClient, realtime: RealtimeService) -> Self {
        Self { backend, realtime }
    }

    pub async fn subscribe(&self, user: &User, request: SubscribeRequest) -> Result<Subscription> {
        request.validate()?;

        let subscription = self
            .backend
            .subscribe(&request.creator_id, &request.tier_id, &user.token)
            .await?
            .ok_or_else(|| AppError::ExternalService("Backend did not return the subscription".to_string()))?;

        info!(
            "User {} subscribed to creator {} on tier {}",
            user.id, request.creator_id, request.tier_id
        );

        self.realtime
            .notify_entitlement_changed(
                &user.id,
                EntitlementChange {
                    creator_id: Some(request.creator_id.clone()),
                    content_id: None,
                    event: EntitlementEvent::SubscriptionActivated,
                },
            )
            .await;
        self.realtime
            .notify(
                &user.id,
                json!({
                    "type": "subscription",
                    "title": "Subscription active",
                    "message": "Your subscription is now active.",
                    "creatorId": request.creator_id,
                }),
            )
            .await;

        Ok(subscription)
    }

    pub async fn unsubscribe(&self, user: &User, request: UnsubscribeRequest) -> Result<bool> {
        request.validate()?;

        let success = self
            .backend
            .unsubscribe(&request.subscription_id, &user.token)
            .await?;

        if !success {
            warn!(
                "Backend refused to cancel subscription {} for user {}",
                request.subscription_id, user.id
            );
            return Ok(false);
        }

        info!("User {} canceled subscription {}", user.id, request.subscription_id);

        self.realtime
            .notify_entitlement_changed(
                &user.id,
                EntitlementChange {
                    creator_id: request.creator_id,
                    content_id: None,
                    event: EntitlementEvent::SubscriptionEnded,
                },
            )
            .await;

        Ok(true)
    }

    pub async fn my_subscriptions(&self, user: &User) -> Result<Vec<Subscription>> {
        self.backend.my_subscriptions(&user.token).await
    }

    /// 创作者只能为自己创建等级
    pub async fn create_tier(
        &self,
        user: &User,
        creator_id: &str,
        request: CreateTierRequest,
    ) -> Result<SubscriptionTier> {
        if user.id != creator_id {
            return Err(AppError::forbidden("Only the creator can manage their tiers"));
        }
        request.validate()?;

        let payload = CreateTierPayload {
            creator_id,
            name: &request.name,
            price: request.price,
            description: &request.description,
        };

        let tier = self
            .backend
            .create_tier(&payload, &user.token)
            .await?
            .tier
            .ok_or_else(|| AppError::ExternalService("Backend did not return the created tier".to_string()))?;

        info!("Creator {} created tier {} ({})", creator_id, tier.id, tier.name);
        Ok(tier)
    }
}
