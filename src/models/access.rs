use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::models::{
    content::ContentItem,
    creator::SubscriptionTier,
    subscription::Subscription,
};

/// 观看者快照，每次判定时由调用方显式传入
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Viewer {
    /// 匿名访客为 None
    pub id: Option<String>,
    /// 观看者对当前创作者的订阅记录
    pub subscription: Option<Subscription>,
    /// 单独购买过的内容 ID
    pub purchased_ids: HashSet<String>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn has_purchased(&self, content_id: &str) -> bool {
        self.purchased_ids.contains(content_id)
    }
}

/// 访问判定结果：每个内容 ID 恰好一项
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccessResolution {
    pub access: BTreeMap<String, bool>,
    pub issues: Vec<SnapshotIssue>,
}

impl AccessResolution {
    /// 未出现在结果中的 ID 一律视为锁定
    pub fn has_access(&self, content_id: &str) -> bool {
        self.access.get(content_id).copied().unwrap_or(false)
    }
}

/// 快照数据问题，不会中断判定，由调用方记录日志
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotIssue {
    /// 付费内容缺少有效价格，已强制锁定
    MissingPrice { content_id: String },
    /// 非免费内容缺少所属创作者，已强制锁定
    MissingCreator { content_id: String },
    /// 无法识别的定价类型，按付费内容处理
    UnknownPriceType { content_id: String },
    /// 同一内容 ID 出现多次
    DuplicateContent { content_id: String },
    /// 订阅指向的创作者与内容均不匹配
    ForeignSubscription { subscription_id: String, creator_id: String },
    /// 订阅指向的等级不在等级列表中
    StaleTierReference { subscription_id: String, tier_id: String },
}

/// 变现动作类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    None,
    Purchase,
    Subscribe,
    Upgrade,
}

/// 锁定内容可用的变现动作，alternatives 中的动作与主动作并列展示
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonetizationAction {
    pub kind: ActionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_due: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<ActionKind>,
}

impl MonetizationAction {
    pub fn none() -> Self {
        Self {
            kind: ActionKind::None,
            price_due: None,
            alternatives: Vec::new(),
        }
    }

    /// 是否提供某个动作（主动作或备选）
    pub fn offers(&self, kind: ActionKind) -> bool {
        self.kind == kind || self.alternatives.contains(&kind)
    }

    /// 去掉某个动作；主动作被去掉时由第一个备选顶替
    pub fn without(mut self, kind: ActionKind) -> Self {
        self.alternatives.retain(|k| *k != kind);
        if self.kind == kind {
            self.price_due = None;
            self.kind = if self.alternatives.is_empty() {
                ActionKind::None
            } else {
                self.alternatives.remove(0)
            };
        }
        self
    }
}

/// 订阅等级及是否为当前订阅
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierState {
    pub tier: SubscriptionTier,
    pub is_current: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TierStateReport {
    pub tiers: Vec<TierState>,
    /// 订阅引用了不存在的等级时记录该等级 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_tier_id: Option<String>,
}

impl TierStateReport {
    pub fn current(&self) -> Option<&TierState> {
        self.tiers.iter().find(|t| t.is_current)
    }
}

/// 单个内容对某观看者的访问状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemAccessState {
    Free,
    Locked,
    UnlockedByPurchase,
    UnlockedBySubscription,
}

/// 影响访问状态的外部事件
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementEvent {
    PurchaseRecorded,
    SubscriptionActivated,
    SubscriptionEnded,
}

impl ItemAccessState {
    pub fn is_unlocked(self) -> bool {
        !matches!(self, ItemAccessState::Locked)
    }

    pub fn apply(self, event: EntitlementEvent) -> Self {
        use EntitlementEvent::*;
        use ItemAccessState::*;

        match (self, event) {
            (Free, _) => Free,
            (UnlockedByPurchase, _) => UnlockedByPurchase,
            (_, PurchaseRecorded) => UnlockedByPurchase,
            (Locked, SubscriptionActivated) => UnlockedBySubscription,
            (UnlockedBySubscription, SubscriptionActivated) => UnlockedBySubscription,
            (UnlockedBySubscription, SubscriptionEnded) => Locked,
            (Locked, SubscriptionEnded) => Locked,
        }
    }
}

/// 单个内容卡片：内容、访问结果与可用动作
#[derive(Debug, Clone, Serialize)]
pub struct ContentCard {
    pub item: ContentItem,
    pub has_access: bool,
    pub state: ItemAccessState,
    pub action: MonetizationAction,
}

/// 创作者主页的完整判定结果
#[derive(Debug, Clone, Serialize)]
pub struct CreatorCatalog {
    pub creator_id: String,
    pub items: Vec<ContentCard>,
    pub tiers: TierStateReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<SnapshotIssue>,
}

/// 批量拉取的一组快照
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub items: Vec<ContentItem>,
    pub tiers: Vec<SubscriptionTier>,
    pub viewer: Viewer,
}
