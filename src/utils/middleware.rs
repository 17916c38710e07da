use crate::{error::AppError, state::AppState};
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use governor::{clock::DefaultClock, state::keyed::DashMapStateStore, Quota, RateLimiter};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc};
use tracing::{debug, info, warn};

const DEFAULT_BURST: u32 = 10;

type KeyedRateLimiter = RateLimiter<String, DashMapStateStore<String>, DefaultClock>;

/// 按客户端 IP 的速率限制器
pub struct ClientRateLimiter {
    limiter: KeyedRateLimiter,
}

impl ClientRateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(requests_per_minute.min(DEFAULT_BURST)).unwrap_or(NonZeroU32::MIN);

        Self {
            limiter: RateLimiter::dashmap(Quota::per_minute(per_minute).allow_burst(burst)),
        }
    }

    pub fn check(&self, client: &str) -> bool {
        self.limiter.check_key(&client.to_string()).is_ok()
    }
}

/// 认证中间件
///
/// 有效 token 时把 `User` 放入请求扩展；缺失或无效的 token 不拒绝请求，
/// 由各处理器通过 `User` / `OptionalUser` 提取器决定是否需要身份。
pub async fn auth_middleware(
    State(app_state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    request.extensions_mut().insert(app_state.auth_service.clone());

    if let Some(token) = bearer_token(&request) {
        match app_state.auth_service.authenticate(&token) {
            Ok(user) => {
                debug!("Authenticated user: {}", user.id);
                request.extensions_mut().insert(user);
            }
            Err(e) => {
                debug!("JWT verification failed: {}", e);
                // 不返回错误，让请求继续处理（作为未认证请求）
            }
        }
    }

    Ok(next.run(request).await)
}

/// 速率限制中间件
pub async fn rate_limit_middleware(
    State(app_state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    let client_ip = get_client_ip(&request);

    if app_state.rate_limiter.check(&client_ip) {
        Ok(next.run(request).await)
    } else {
        warn!("Rate limit exceeded for IP: {}", client_ip);
        Err(AppError::RateLimitExceeded)
    }
}

/// 请求日志中间件
pub async fn request_logging_middleware(request: Request<Body>, next: Next<Body>) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client_ip = get_client_ip(&request);

    let start_time = std::time::Instant::now();

    debug!("Incoming request: {} {} from {}", method, uri.path(), client_ip);

    let response = next.run(request).await;

    // 不记录查询串，WebSocket 的 token 可能在其中
    info!(
        "Request completed: {} {} {} - {}ms",
        method,
        uri.path(),
        response.status().as_u16(),
        start_time.elapsed().as_millis()
    );

    response
}

// 辅助函数

/// Authorization 头优先；浏览器建立 WebSocket 时无法设置请求头，回退到 `token` 查询参数
fn bearer_token(request: &Request<Body>) -> Option<String> {
    let from_header = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    from_header.or_else(|| {
        request.uri().query().and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "token")
                .map(|(_, value)| value.into_owned())
        })
    })
}

/// 获取客户端 IP 地址
fn get_client_ip(request: &Request<Body>) -> String {
    let headers = request.headers();

    // 检查常见的代理头
    if let Some(forwarded_for) = headers.get("x-forwarded-for") {
        if let Ok(ip_str) = forwarded_for.to_str() {
            if let Some(ip) = ip_str.split(',').next() {
                return ip.trim().to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return ip_str.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
