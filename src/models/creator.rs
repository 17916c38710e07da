use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::serde_helpers;

/// 订阅等级
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionTier {
    #[serde(alias = "_id", deserialize_with = "serde_helpers::flex_id::deserialize")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// 月费
    #[serde(default, deserialize_with = "serde_helpers::lenient_decimal::deserialize")]
    pub price: Option<f64>,
    #[serde(default)]
    pub description: String,
}

/// 创建订阅等级请求
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTierRequest {
    #[validate(length(min = 1, max = 100, message = "等级名称长度必须在1-100字符之间"))]
    pub name: String,

    #[validate(range(min = 0.0, message = "价格不能为负数"))]
    pub price: f64,

    #[validate(length(max = 500, message = "描述不能超过500字符"))]
    #[serde(default)]
    pub description: String,
}

/// 发往后端的创建等级请求体
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTierPayload<'a> {
    pub creator_id: &'a str,
    pub name: &'a str,
    pub price: f64,
    pub description: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TierListResponse {
    #[serde(default)]
    pub tiers: Vec<SubscriptionTier>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TierCreatedResponse {
    pub tier: Option<SubscriptionTier>,
}

/// 平台用户（创作者或粉丝）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    #[serde(alias = "_id", deserialize_with = "serde_helpers::flex_id::deserialize")]
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub niche: Option<String>,
    pub profile_image: Option<String>,
    pub role: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::lenient_datetime::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
    /// 创作者资料，仅创作者拥有
    #[serde(rename = "creator")]
    pub creator_profile: Option<CreatorProfile>,
    pub creator_view: Option<CreatorView>,
    #[serde(default)]
    pub tiers: Vec<SubscriptionTier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorProfile {
    #[serde(default)]
    pub profile_views: i64,
    /// Paystack 分账子账户，付款按此分成给创作者
    pub subaccount_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorView {
    pub viewed_at: Option<DateTime<Utc>>,
}

impl Creator {
    pub fn is_creator(&self) -> bool {
        self.role.as_deref() == Some("creator")
    }

    pub fn profile_views(&self) -> i64 {
        self.creator_profile.as_ref().map(|p| p.profile_views).unwrap_or(0)
    }

    pub fn viewed_at(&self) -> Option<DateTime<Utc>> {
        self.creator_view.as_ref().and_then(|v| v.viewed_at)
    }

    pub fn subaccount_code(&self) -> Option<&str> {
        self.creator_profile
            .as_ref()
            .and_then(|p| p.subaccount_code.as_deref())
            .filter(|code| !code.is_empty())
    }
}

/// 探索页查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExploreQuery {
    pub niche: Option<String>,
    pub q: Option<String>,
}

/// 首页推荐分组
#[derive(Debug, Clone, Serialize)]
pub struct HomeFeed {
    pub recently_viewed: Vec<Creator>,
    pub creators_for_you: Vec<Creator>,
    pub popular_this_week: Vec<Creator>,
    pub new_on_aroyyo: Vec<Creator>,
}
