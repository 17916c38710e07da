use crate::{
    error::Result,
    models::creator::{Creator, ExploreQuery, HomeFeed},
    services::backend::BackendClient,
};
use rand::{seq::SliceRandom, Rng};
use std::cmp::Reverse;
use tracing::debug;

const RECENTLY_VIEWED_LIMIT: usize = 2;
const SECTION_LIMIT: usize = 5;

/// 创作者发现：探索页与首页推荐
#[derive(Clone)]
pub struct DiscoveryService {
    backend: BackendClient,
}

impl DiscoveryService {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    pub async fn explore(&self, query: &ExploreQuery) -> Result<Vec<Creator>> {
        let creators = self.backend.users(Some("creator")).await?;
        let total = creators.len();
        let filtered = filter_creators(creators, query);
        debug!("Explore matched {} of {} creators", filtered.len(), total);
        Ok(filtered)
    }

    pub async fn home_feed(&self) -> Result<HomeFeed> {
        let users = self.backend.users(None).await?;
        Ok(build_home_feed(users, &mut rand::thread_rng()))
    }
}

/// 按领域筛选后再做不区分大小写的关键字搜索
///
/// 领域为空或 `All` 时不筛选；关键字匹配名、姓、邮箱和领域。
pub fn filter_creators(creators: Vec<Creator>, query: &ExploreQuery) -> Vec<Creator> {
    let niche = query
        .niche
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty() && *n != "All");
    let needle = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    creators
        .into_iter()
        .filter(|c| niche.map_or(true, |n| c.niche.as_deref() == Some(n)))
        .filter(|c| match &needle {
            None => true,
            Some(needle) => [&c.first_name, &c.last_name, &c.email, &c.niche]
                .iter()
                .filter_map(|field| field.as_deref())
                .any(|field| field.to_lowercase().contains(needle.as_str())),
        })
        .collect()
}

pub fn build_home_feed<R: Rng + ?Sized>(users: Vec<Creator>, rng: &mut R) -> HomeFeed {
    let creators: Vec<Creator> = users.into_iter().filter(Creator::is_creator).collect();

    let mut recently_viewed: Vec<Creator> = creators
        .iter()
        .filter(|c| c.viewed_at().is_some())
        .cloned()
        .collect();
    recently_viewed.sort_by_key(|c| Reverse(c.viewed_at()));
    recently_viewed.truncate(RECENTLY_VIEWED_LIMIT);

    let creators_for_you: Vec<Creator> = creators
        .choose_multiple(rng, SECTION_LIMIT)
        .cloned()
        .collect();

    let mut popular_this_week: Vec<Creator> = creators
        .iter()
        .filter(|c| c.creator_profile.is_some())
        .cloned()
        .collect();
    popular_this_week.sort_by_key(|c| Reverse(c.profile_views()));
    popular_this_week.truncate(SECTION_LIMIT);

    // 没有创建时间的排在最后
    let mut new_on_aroyyo = creators;
    new_on_aroyyo.sort_by_key(|c| Reverse(c.created_at));
    new_on_aroyyo.truncate(SECTION_LIMIT);

    HomeFeed {
        recently_viewed,
        creators_for_you,
        popular_this_week,
        new_on_aroyyo,
    }
}
