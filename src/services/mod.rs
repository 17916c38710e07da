pub mod auth;
pub mod backend;
pub mod catalog;
pub mod discovery;
pub mod entitlement;
pub mod notification;
pub mod payment;
pub mod realtime;
pub mod subscription;

// 重新导出常用类型
pub use auth::AuthService;
pub use backend::BackendClient;
pub use catalog::CatalogService;
pub use discovery::DiscoveryService;
pub use notification::NotificationService;
pub use payment::PaymentService;
pub use realtime::RealtimeService;
pub use subscription::SubscriptionService;
