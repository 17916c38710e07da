use crate::{
    error::{AppError, Result},
    models::{
        access::{
            ActionKind, CatalogSnapshot, ContentCard, CreatorCatalog, ItemAccessState,
            SnapshotIssue, TierStateReport, Viewer,
        },
        subscription::Subscription,
    },
    services::{
        auth::User,
        backend::BackendClient,
        entitlement::{classify, compute_subscription_state, resolve_access, resolve_action},
    },
};
use tracing::{debug, info, warn};

/// 创作者目录服务：拉取快照并交给判定器
#[derive(Clone)]
pub struct CatalogService {
    backend: BackendClient,
}

impl CatalogService {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// 一轮并发请求拉取判定所需的全部快照
    ///
    /// 匿名访客不调用任何需要身份的接口，购买集合为空且没有订阅。
    pub async fn snapshot(&self, user: Option<&User>, creator_id: &str) -> Result<CatalogSnapshot> {
        match user {
            Some(user) => {
                let (items, tiers, subscription, purchases) = tokio::try_join!(
                    self.backend.creator_content(creator_id, Some(&user.token)),
                    self.backend.creator_tiers(creator_id),
                    self.backend.my_subscription_for(creator_id, &user.token),
                    self.backend.purchased_content(&user.id, &user.token),
                )?;

                let purchased_ids = purchases
                    .iter()
                    .filter_map(|p| p.content_id())
                    .map(str::to_string)
                    .collect();

                Ok(CatalogSnapshot {
                    items,
                    tiers,
                    viewer: Viewer {
                        id: Some(user.id.clone()),
                        subscription,
                        purchased_ids,
                    },
                })
            }
            None => {
                let (items, tiers) = tokio::try_join!(
                    self.backend.creator_content(creator_id, None),
                    self.backend.creator_tiers(creator_id),
                )?;

                Ok(CatalogSnapshot {
                    items,
                    tiers,
                    viewer: Viewer::anonymous(),
                })
            }
        }
    }

    pub async fn creator_catalog(&self, user: Option<&User>, creator_id: &str) -> Result<CreatorCatalog> {
        let snapshot = self.snapshot(user, creator_id).await?;
        let catalog = build_catalog(creator_id, snapshot);

        info!(
            "Resolved catalog for creator {}: {} item(s), {} unlocked",
            creator_id,
            catalog.items.len(),
            catalog.items.iter().filter(|c| c.has_access).count()
        );

        Ok(catalog)
    }

    pub async fn item_access(
        &self,
        user: Option<&User>,
        creator_id: &str,
        content_id: &str,
    ) -> Result<ContentCard> {
        self.creator_catalog(user, creator_id)
            .await?
            .items
            .into_iter()
            .find(|card| card.item.id == content_id)
            .ok_or_else(|| AppError::not_found("Content"))
    }

    /// 创作者的等级列表及观看者当前所在等级
    pub async fn tier_state(&self, user: Option<&User>, creator_id: &str) -> Result<TierStateReport> {
        let (tiers, subscription) = match user {
            Some(user) => tokio::try_join!(
                self.backend.creator_tiers(creator_id),
                self.backend.my_subscription_for(creator_id, &user.token),
            )?,
            None => (self.backend.creator_tiers(creator_id).await?, None),
        };

        let report = compute_subscription_state(&tiers, owned_subscription(subscription.as_ref(), creator_id));
        if let (Some(sub), Some(tier_id)) = (subscription.as_ref(), report.stale_tier_id.as_ref()) {
            log_issue(creator_id, &stale_tier_issue(sub, tier_id));
        }

        Ok(report)
    }
}

/// 只有属于该创作者的订阅才参与等级标记
pub(crate) fn owned_subscription<'a>(subscription: Option<&'a Subscription>, creator_id: &str) -> Option<&'a Subscription> {
    subscription.filter(|s| s.creator_id == creator_id)
}

fn stale_tier_issue(subscription: &Subscription, tier_id: &str) -> SnapshotIssue {
    SnapshotIssue::StaleTierReference {
        subscription_id: subscription.id.clone(),
        tier_id: tier_id.to_string(),
    }
}

fn log_issue(creator_id: &str, issue: &SnapshotIssue) {
    warn!("Snapshot issue for creator {}: {:?}", creator_id, issue);
}

/// 根据快照构造目录，不做任何 I/O
///
/// 锁定内容去掉完整资源地址，只保留缩略图。
pub fn build_catalog(creator_id: &str, snapshot: CatalogSnapshot) -> CreatorCatalog {
    let CatalogSnapshot { items, tiers, viewer } = snapshot;
    let subscription = viewer.subscription.as_ref();

    let resolution = resolve_access(&viewer, &items, subscription);
    let tier_report = compute_subscription_state(&tiers, owned_subscription(subscription, creator_id));

    let mut issues = resolution.issues.clone();
    if let (Some(sub), Some(tier_id)) = (subscription, tier_report.stale_tier_id.as_ref()) {
        issues.push(stale_tier_issue(sub, tier_id));
    }
    for issue in &issues {
        log_issue(creator_id, issue);
    }

    let cards = items
        .into_iter()
        .map(|item| {
            let has_access = resolution.has_access(&item.id);
            let state = match classify(&item, &viewer, subscription) {
                // 重复 ID 合并后被锁定时以访问表为准
                state if state.is_unlocked() && !has_access => ItemAccessState::Locked,
                state => state,
            };
            let mut action = resolve_action(&item, has_access, subscription);
            if viewer.has_purchased(&item.id) {
                // 已购买但因数据问题仍被锁定，不能再次收费
                action = action.without(ActionKind::Purchase);
            }
            debug!("Item {} -> {:?} ({:?})", item.id, state, action.kind);

            ContentCard {
                item: if has_access { item } else { item.into_preview() },
                has_access,
                state,
                action,
            }
        })
        .collect();

    CreatorCatalog {
        creator_id: creator_id.to_string(),
        items: cards,
        tiers: tier_report,
        issues,
    }
}
