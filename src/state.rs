use crate::{
    config::Config,
    error::Result,
    services::{
        AuthService, BackendClient, CatalogService, DiscoveryService, NotificationService,
        PaymentService, RealtimeService, SubscriptionService,
    },
    utils::middleware::ClientRateLimiter,
};
use std::sync::Arc;

/// 应用程序的共享状态
/// 包含所有服务和配置的引用
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 认证服务
    pub auth_service: Arc<AuthService>,

    /// 创作者目录与访问判定
    pub catalog_service: CatalogService,

    /// 订阅服务
    pub subscription_service: SubscriptionService,

    /// 支付服务
    pub payment_service: PaymentService,

    /// 通知服务
    pub notification_service: NotificationService,

    /// 创作者发现
    pub discovery_service: DiscoveryService,

    /// 实时推送
    pub realtime_service: RealtimeService,

    /// 按客户端 IP 限流
    pub rate_limiter: Arc<ClientRateLimiter>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let backend = BackendClient::new(&config)?;
        let realtime_service = RealtimeService::new();
        let catalog_service = CatalogService::new(backend.clone());

        Ok(Self {
            auth_service: Arc::new(AuthService::new(&config)),
            subscription_service: SubscriptionService::new(backend.clone(), realtime_service.clone()),
            payment_service: PaymentService::new(
                &config,
                backend.clone(),
                catalog_service.clone(),
                realtime_service.clone(),
            ),
            notification_service: NotificationService::new(&config, backend.clone()),
            discovery_service: DiscoveryService::new(backend),
            rate_limiter: Arc::new(ClientRateLimiter::new(config.rate_limit_requests)),
            catalog_service,
            realtime_service,
            config,
        })
    }
}
