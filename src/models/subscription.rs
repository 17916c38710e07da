use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::serde_helpers;

/// 用户订阅
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(alias = "_id", deserialize_with = "serde_helpers::flex_id::deserialize")]
    pub id: String,
    /// 订阅者 ID
    #[serde(alias = "userId", alias = "user", default, deserialize_with = "serde_helpers::flex_id_opt::deserialize")]
    pub viewer_id: Option<String>,
    #[serde(alias = "creatorId", rename = "creator", deserialize_with = "serde_helpers::flex_id::deserialize")]
    pub creator_id: String,
    #[serde(alias = "tierId", rename = "tier", default, deserialize_with = "serde_helpers::flex_id_opt::deserialize")]
    pub tier_id: Option<String>,
    #[serde(default)]
    pub status: SubscriptionStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// 订阅状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    Expired,
    #[default]
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Canceled => write!(f, "canceled"),
            Self::Expired => write!(f, "expired"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    /// 仅当订阅处于激活状态且属于该创作者时才授予访问
    pub fn grants_creator(&self, creator_id: &str) -> bool {
        self.is_active() && self.creator_id == creator_id
    }
}

/// 订阅请求
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    #[validate(length(min = 1, message = "creatorId不能为空"))]
    pub creator_id: String,
    #[validate(length(min = 1, message = "tierId不能为空"))]
    pub tier_id: String,
}

/// 取消订阅请求
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UnsubscribeRequest {
    #[validate(length(min = 1, message = "subscriptionId不能为空"))]
    pub subscription_id: String,
    /// 用于推送访问变更事件，可选
    #[serde(default, skip_serializing)]
    pub creator_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionEnvelope {
    pub subscription: Option<Subscription>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionListResponse {
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnsubscribeResponse {
    #[serde(default)]
    pub success: bool,
}
