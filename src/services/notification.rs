use crate::{
    config::Config,
    error::Result,
    models::{
        notification::{Notification, NotificationQuery},
        response::Page,
    },
    services::{auth::User, backend::BackendClient},
};
use tracing::debug;

#[derive(Clone)]
pub struct NotificationService {
    backend: BackendClient,
    page_size: usize,
}

impl NotificationService {
    pub fn new(config: &Config, backend: BackendClient) -> Self {
        Self {
            backend,
            page_size: config.notifications_page_size.max(1),
        }
    }

    /// 分页拉取通知，筛选在网关侧完成
    ///
    /// `has_more` 看的是后端原始页是否满页，与筛选后的条数无关。
    pub async fn list(&self, user: &User, query: NotificationQuery) -> Result<Page<Notification>> {
        let raw = self
            .backend
            .notifications(&user.id, self.page_size, query.skip, &user.token)
            .await?;

        Ok(paginate(raw, query, self.page_size))
    }

    pub async fn mark_read(&self, user: &User, notification_id: &str) -> Result<()> {
        self.backend
            .mark_notification_read(notification_id, &user.token)
            .await?;
        debug!("User {} marked notification {} as read", user.id, notification_id);
        Ok(())
    }
}

fn paginate(raw: Vec<Notification>, query: NotificationQuery, limit: usize) -> Page<Notification> {
    let has_more = raw.len() >= limit;
    let items = raw
        .into_iter()
        .filter(|n| query.filter.matches(n))
        .collect();

    Page {
        items,
        skip: query.skip,
        limit,
        has_more,
    }
}
