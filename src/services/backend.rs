use crate::{
    config::Config,
    error::{AppError, Result},
    models::{
        content::{ContentItem, ContentListResponse},
        creator::{
            CreateTierPayload, Creator, SubscriptionTier, TierCreatedResponse, TierListResponse,
        },
        notification::{Notification, NotificationListResponse},
        payment::{
            InitializePaymentPayload, Purchase, PurchaseListResponse, PaymentInitialization,
            VerificationResponse,
        },
        subscription::{
            Subscription, SubscriptionEnvelope, SubscriptionListResponse, UnsubscribeResponse,
        },
    },
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

/// Aroyyo 后端 HTTP 客户端
///
/// 所有路径相对于 `BACKEND_URL`。需要身份的调用携带观看者自己的 token，
/// 网关不持有任何服务端凭据。
#[derive(Clone)]
pub struct BackendClient {
    http_client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct BackendErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl BackendClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.backend_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        // Url::join 会丢弃没有结尾斜杠的最后一段
        let mut base = config.backend_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            http_client,
            base_url: Url::parse(&base)?,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> Result<RequestBuilder> {
        let url = self.endpoint(path)?;
        debug!("Backend request: {} {}", method, url);

        let builder = self.http_client.request(method, url);
        Ok(match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.map_err(|e| {
            error!("Backend request failed: {}", e);
            AppError::Request(e)
        })?;

        Self::check_status(response).await
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        Ok(self.execute(builder).await?.json::<T>().await?)
    }

    /// 非 2xx 响应转换为 AppError，优先使用后端返回的 message
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<BackendErrorBody>(&body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Backend request failed")
                    .to_string()
            });

        error!("Backend returned {} for {}: {}", status, url, message);

        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(message));
        }

        Err(AppError::Backend {
            status: status.as_u16(),
            message,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> Result<T> {
        self.send(self.request(Method::GET, path, token)?).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<T> {
        self.send(self.request(method, path, token)?.json(body)).await
    }

    // 内容与订阅快照

    pub async fn creator_content(&self, creator_id: &str, token: Option<&str>) -> Result<Vec<ContentItem>> {
        let path = format!("content/creator/{}", urlencoding::encode(creator_id));
        let response: ContentListResponse = self.get(&path, token).await?;
        Ok(response.contents)
    }

    /// 观看者对某创作者的订阅，没有订阅时后端返回 null 或 404
    pub async fn my_subscription_for(&self, creator_id: &str, token: &str) -> Result<Option<Subscription>> {
        let path = format!("subscriptions/creator/{}/me", urlencoding::encode(creator_id));
        match self.get::<SubscriptionEnvelope>(&path, Some(token)).await {
            Ok(envelope) => Ok(envelope.subscription),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn purchased_content(&self, user_id: &str, token: &str) -> Result<Vec<Purchase>> {
        let path = format!("purchased-content/user/{}", urlencoding::encode(user_id));
        let response: PurchaseListResponse = self.get(&path, Some(token)).await?;
        Ok(response.purchased_contents)
    }

    pub async fn creator_tiers(&self, creator_id: &str) -> Result<Vec<SubscriptionTier>> {
        let path = format!("creators/{}/subscription-tiers", urlencoding::encode(creator_id));
        let response: TierListResponse = self.get(&path, None).await?;
        Ok(response.tiers)
    }

    pub async fn create_tier(&self, payload: &CreateTierPayload<'_>, token: &str) -> Result<TierCreatedResponse> {
        let path = format!("creators/{}/tier", urlencoding::encode(payload.creator_id));
        self.send_json(Method::POST, &path, Some(token), payload).await
    }

    // 订阅管理

    pub async fn subscribe(&self, creator_id: &str, tier_id: &str, token: &str) -> Result<Option<Subscription>> {
        let body = json!({ "creatorId": creator_id, "tierId": tier_id });
        let envelope: SubscriptionEnvelope = self
            .send_json(Method::POST, "subscriptions/subscribe", Some(token), &body)
            .await?;
        Ok(envelope.subscription)
    }

    pub async fn unsubscribe(&self, subscription_id: &str, token: &str) -> Result<bool> {
        let body = json!({ "subscriptionId": subscription_id });
        let response: UnsubscribeResponse = self
            .send_json(Method::POST, "subscriptions/unsubscribe", Some(token), &body)
            .await?;
        Ok(response.success)
    }

    pub async fn my_subscriptions(&self, token: &str) -> Result<Vec<Subscription>> {
        let response: SubscriptionListResponse = self.get("subscriptions/my", Some(token)).await?;
        Ok(response.subscriptions)
    }

    // 支付

    pub async fn initialize_payment(
        &self,
        payload: &InitializePaymentPayload,
        token: &str,
    ) -> Result<PaymentInitialization> {
        self.send_json(Method::POST, "payments/paystack/initialize", Some(token), payload)
            .await
    }

    /// 校验结果的非 2xx 响应同样携带状态信息，交由调用方解释
    pub async fn verify_payment(&self, reference: &str) -> Result<VerificationResponse> {
        let url = self.endpoint("payments/paystack/verify")?;
        let response = self
            .http_client
            .get(url)
            .query(&[("reference", reference)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        match serde_json::from_str::<VerificationResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Ok(VerificationResponse {
                message: Some(format!("Payment verification failed with status {}", status)),
                ..Default::default()
            }),
            Err(e) => Err(AppError::Serialization(e)),
        }
    }

    // 通知

    pub async fn notifications(
        &self,
        user_id: &str,
        limit: usize,
        skip: usize,
        token: &str,
    ) -> Result<Vec<Notification>> {
        let builder = self
            .request(Method::GET, "notifications", Some(token))?
            .query(&[
                ("userID", user_id.to_string()),
                ("limit", limit.to_string()),
                ("skip", skip.to_string()),
            ]);
        let response: NotificationListResponse = self.send(builder).await?;
        Ok(response.notifications)
    }

    pub async fn mark_notification_read(&self, notification_id: &str, token: &str) -> Result<()> {
        let path = format!("notifications/{}/read", urlencoding::encode(notification_id));
        self.execute(self.request(Method::PATCH, &path, Some(token))?).await?;
        Ok(())
    }

    // 用户

    pub async fn user(&self, user_id: &str, token: Option<&str>) -> Result<Creator> {
        let path = format!("users/{}", urlencoding::encode(user_id));
        self.get(&path, token).await
    }

    pub async fn users(&self, role: Option<&str>) -> Result<Vec<Creator>> {
        let mut builder = self.request(Method::GET, "users", None)?;
        if let Some(role) = role {
            builder = builder.query(&[("role", role)]);
        }
        self.send(builder).await
    }
}
