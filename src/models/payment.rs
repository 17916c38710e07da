use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{models::content::ContentItem, utils::serde_helpers};

/// 单次购买记录
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    #[serde(alias = "_id", deserialize_with = "serde_helpers::flex_id::deserialize")]
    pub id: String,
    #[serde(alias = "userId", alias = "user", default, deserialize_with = "serde_helpers::flex_id_opt::deserialize")]
    pub viewer_id: Option<String>,
    /// 后端通常会填充完整的内容文档，偶尔只给出 ID
    pub content: Option<PurchasedContentRef>,
    #[serde(default, deserialize_with = "serde_helpers::lenient_decimal::deserialize")]
    pub price_paid: Option<f64>,
    pub currency: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PurchasedContentRef {
    Item(Box<ContentItem>),
    Id(String),
}

impl Purchase {
    pub fn content_id(&self) -> Option<&str> {
        self.content.as_ref().map(|c| match c {
            PurchasedContentRef::Item(item) => item.id.as_str(),
            PurchasedContentRef::Id(id) => id.as_str(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseListResponse {
    #[serde(default)]
    pub purchased_contents: Vec<Purchase>,
}

/// 发起单次购买请求
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    #[validate(length(min = 1, message = "creatorId不能为空"))]
    pub creator_id: String,
    #[validate(length(min = 1, message = "contentId不能为空"))]
    pub content_id: String,
}

/// 通过 Paystack 付费订阅某个等级
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionCheckoutRequest {
    #[validate(length(min = 1, message = "creatorId不能为空"))]
    pub creator_id: String,
    #[validate(length(min = 1, message = "tierId不能为空"))]
    pub tier_id: String,
}

/// 发往后端的 Paystack 初始化请求体，金额由网关根据内容价格计算
#[derive(Debug, Clone, Serialize)]
pub struct InitializePaymentPayload {
    pub paystack_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// 最小货币单位（分）
    pub amount: i64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    /// 创作者的分账子账户
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subaccount: Option<String>,
    pub metadata: PaymentMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMetadata {
    pub user_id: String,
    pub creator_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier_id: Option<String>,
    /// 订阅付款的幂等标识，后端据此创建订阅记录
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_uuid: Option<String>,
    pub purchase_type: PurchaseType,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseType {
    Individual,
    Subscription,
}

/// 价格转换为最小货币单位
pub fn to_minor_units(price: f64) -> i64 {
    (price * 100.0).round() as i64
}

/// 支付初始化结果，客户端跳转至 authorization_url 完成支付
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInitialization {
    #[serde(alias = "authorization_url")]
    pub authorization_url: String,
    /// 后端未回传时使用网关生成的引用号
    #[serde(default)]
    pub reference: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyQuery {
    pub reference: Option<String>,
}

/// 后端返回的原始校验结果
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerificationResponse {
    pub status: Option<String>,
    pub transaction: Option<TransactionStatus>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionStatus {
    pub status: Option<String>,
}

/// 支付结果
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
    pub status: PaymentStatus,
    pub reference: Option<String>,
    pub message: Option<String>,
}

impl VerificationResponse {
    /// 顶层 status 优先，其次 transaction.status，都缺失时视为失败
    pub fn effective_status(&self) -> &str {
        self.status
            .as_deref()
            .or_else(|| self.transaction.as_ref().and_then(|t| t.status.as_deref()))
            .unwrap_or("failed")
    }

    pub fn is_completed(&self) -> bool {
        self.effective_status().eq_ignore_ascii_case("completed")
    }
}
