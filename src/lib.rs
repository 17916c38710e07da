//! Aroyyo 网关：在 Aroyyo 后端之上为粉丝端提供内容访问判定、订阅、
//! 支付与实时推送接口。

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
