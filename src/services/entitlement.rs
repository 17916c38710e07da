//! 内容访问权限判定
//!
//! 纯函数：输入为调用方一次性拉取的快照（内容列表、订阅、购买记录、等级列表），
//! 不做任何 I/O，也不读取全局状态。数据有歧义或不完整时一律按最严格的方式处理
//! （锁定内容），并通过 `SnapshotIssue` 把问题交给调用方记录。

use std::collections::{btree_map::Entry, HashSet};

use crate::models::{
    access::{
        AccessResolution, ActionKind, ItemAccessState, MonetizationAction, SnapshotIssue,
        TierState, TierStateReport, Viewer,
    },
    content::{ContentItem, PriceType},
    creator::SubscriptionTier,
    subscription::Subscription,
};

/// 判定单个内容对观看者的访问状态
///
/// 购买优先于订阅：两者同时成立时返回 `UnlockedByPurchase`，因为购买不会失效。
pub fn classify(
    item: &ContentItem,
    viewer: &Viewer,
    subscription: Option<&Subscription>,
) -> ItemAccessState {
    if item.is_free() {
        return ItemAccessState::Free;
    }

    if item.is_malformed() {
        return ItemAccessState::Locked;
    }

    if viewer.has_purchased(&item.id) {
        return ItemAccessState::UnlockedByPurchase;
    }

    if subscription.map_or(false, |s| s.grants_creator(&item.creator)) {
        return ItemAccessState::UnlockedBySubscription;
    }

    ItemAccessState::Locked
}

/// 计算一组内容的访问表
///
/// 结果覆盖每个输入内容 ID 恰好一次。重复的 ID 取逻辑与，只要有一次锁定即锁定。
pub fn resolve_access(
    viewer: &Viewer,
    items: &[ContentItem],
    subscription: Option<&Subscription>,
) -> AccessResolution {
    let mut resolution = AccessResolution::default();

    for item in items {
        match item.price_type {
            PriceType::Unknown => resolution.issues.push(SnapshotIssue::UnknownPriceType {
                content_id: item.id.clone(),
            }),
            PriceType::Paid if item.missing_price() => {
                resolution.issues.push(SnapshotIssue::MissingPrice {
                    content_id: item.id.clone(),
                })
            }
            _ => {}
        }
        if item.missing_creator() {
            resolution.issues.push(SnapshotIssue::MissingCreator {
                content_id: item.id.clone(),
            });
        }

        let granted = classify(item, viewer, subscription).is_unlocked();

        match resolution.access.entry(item.id.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(granted);
            }
            Entry::Occupied(mut entry) => {
                let combined = *entry.get() && granted;
                entry.insert(combined);
                resolution.issues.push(SnapshotIssue::DuplicateContent {
                    content_id: item.id.clone(),
                });
            }
        }
    }

    if let Some(sub) = subscription {
        let creators: HashSet<&str> = items
            .iter()
            .map(|i| i.creator.as_str())
            .filter(|c| !c.is_empty())
            .collect();
        if !creators.is_empty() && !creators.contains(sub.creator_id.as_str()) {
            resolution.issues.push(SnapshotIssue::ForeignSubscription {
                subscription_id: sub.id.clone(),
                creator_id: sub.creator_id.clone(),
            });
        }
    }

    resolution
}

/// 只有定价类型明确为付费且价格有效时才允许单次购买
fn purchasable_price(item: &ContentItem) -> Option<f64> {
    match item.price_type {
        PriceType::Paid if !item.is_malformed() => item.valid_price(),
        _ => None,
    }
}

/// 锁定内容对应的变现动作
pub fn resolve_action(
    item: &ContentItem,
    access: bool,
    subscription: Option<&Subscription>,
) -> MonetizationAction {
    // 归属不明的内容购买或订阅都无法解锁
    if access || item.is_free() || item.missing_creator() {
        return MonetizationAction::none();
    }

    let price = purchasable_price(item);

    // 已有有效订阅仍无法访问：需要更高等级
    if subscription.map_or(false, |s| s.grants_creator(&item.creator)) {
        return MonetizationAction {
            kind: ActionKind::Upgrade,
            price_due: None,
            alternatives: price.map(|_| vec![ActionKind::Purchase]).unwrap_or_default(),
        };
    }

    match price {
        Some(price) => MonetizationAction {
            kind: ActionKind::Purchase,
            price_due: Some(price),
            alternatives: vec![ActionKind::Subscribe],
        },
        None => MonetizationAction {
            kind: ActionKind::Subscribe,
            price_due: None,
            alternatives: Vec::new(),
        },
    }
}

/// 标记当前订阅所在的等级
///
/// 按等级 ID 匹配而非位置，最多标记一个。订阅引用的等级不存在时不标记任何等级，
/// 并在 `stale_tier_id` 中报告。
pub fn compute_subscription_state(
    tiers: &[SubscriptionTier],
    active_subscription: Option<&Subscription>,
) -> TierStateReport {
    let current_tier_id = active_subscription
        .filter(|s| s.is_active())
        .and_then(|s| s.tier_id.as_deref());

    let mut marked = false;
    let states = tiers
        .iter()
        .map(|tier| {
            let is_current = !marked && current_tier_id == Some(tier.id.as_str());
            marked |= is_current;
            TierState {
                tier: tier.clone(),
                is_current,
            }
        })
        .collect();

    TierStateReport {
        tiers: states,
        stale_tier_id: match current_tier_id {
            Some(id) if !marked => Some(id.to_string()),
            _ => None,
        },
    }
}
