use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,

    // Backend configuration
    pub backend_url: String,
    pub backend_timeout_secs: u64,

    // Authentication configuration
    pub jwt_secret: String,

    // CORS configuration
    pub cors_allowed_origins: String,

    // Rate limiting (requests per minute per client IP)
    pub rate_limit_requests: u32,

    // Feed settings
    pub notifications_page_size: usize,

    // Payments
    pub default_currency: String,
    pub payment_callback_url: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "aroyyo_gateway=debug,tower_http=debug".to_string()),

            backend_url: env::var("BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            backend_timeout_secs: env::var("BACKEND_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,

            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),

            rate_limit_requests: env::var("RATE_LIMIT_REQUESTS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,

            notifications_page_size: env::var("NOTIFICATIONS_PAGE_SIZE")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,

            default_currency: env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| "KES".to_string()),
            payment_callback_url: env::var("PAYMENT_CALLBACK_URL").ok(),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    /// 与 `from_env` 的默认值一致，但不包含 JWT 密钥
    fn default() -> Self {
        Config {
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            environment: "development".to_string(),
            log_level: "aroyyo_gateway=debug,tower_http=debug".to_string(),
            backend_url: "http://localhost:8000".to_string(),
            backend_timeout_secs: 30,
            jwt_secret: String::new(),
            cors_allowed_origins: "http://localhost:3001".to_string(),
            rate_limit_requests: 100,
            notifications_page_size: 20,
            default_currency: "KES".to_string(),
            payment_callback_url: None,
        }
    }
}
