use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::access::EntitlementEvent;

/// WebSocket消息类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WebSocketMessageType {
    // 系统消息
    Connect,
    Ping,
    Pong,
    Error,

    // 通知消息
    Notification,

    // 访问权限变化，客户端收到后应重新拉取目录
    EntitlementChanged,
}

/// WebSocket消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    pub id: String,
    pub message_type: WebSocketMessageType,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub to_user_id: Option<String>,
}

/// 客户端发来的消息
#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub message_type: WebSocketMessageType,
    pub client_timestamp: Option<DateTime<Utc>>,
}

/// 访问权限变化事件
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntitlementChange {
    pub creator_id: Option<String>,
    pub content_id: Option<String>,
    pub event: EntitlementEvent,
}

/// 连接心跳
#[derive(Debug, Serialize, Deserialize)]
pub struct HeartbeatMessage {
    pub connection_id: String,
    pub timestamp: DateTime<Utc>,
    pub client_timestamp: Option<DateTime<Utc>>,
}

/// 错误消息
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
}

/// 连接统计
#[derive(Debug, Serialize)]
pub struct RealtimeStats {
    pub total_connections: usize,
    pub active_users: usize,
}

impl WebSocketMessage {
    /// 创建新消息
    pub fn new(message_type: WebSocketMessageType, data: serde_json::Value) -> Self {
        Self {
            id: format!("msg_{}", uuid::Uuid::new_v4()),
            message_type,
            data,
            timestamp: Utc::now(),
            to_user_id: None,
        }
    }

    /// 创建通知消息
    pub fn notification(data: serde_json::Value, to_user_id: String) -> Self {
        let mut message = Self::new(WebSocketMessageType::Notification, data);
        message.to_user_id = Some(to_user_id);
        message
    }

    /// 创建访问权限变化消息
    pub fn entitlement_changed(change: &EntitlementChange, to_user_id: String) -> Self {
        let mut message = Self::new(
            WebSocketMessageType::EntitlementChanged,
            serde_json::to_value(change).unwrap_or_default(),
        );
        message.to_user_id = Some(to_user_id);
        message
    }

    /// 创建错误消息
    pub fn error(code: &str, message: &str) -> Self {
        let error_data = ErrorMessage {
            code: code.to_string(),
            message: message.to_string(),
        };

        Self::new(
            WebSocketMessageType::Error,
            serde_json::to_value(error_data).unwrap_or_default(),
        )
    }

    /// 创建心跳消息
    pub fn pong(connection_id: &str, client_timestamp: Option<DateTime<Utc>>) -> Self {
        let heartbeat = HeartbeatMessage {
            connection_id: connection_id.to_string(),
            timestamp: Utc::now(),
            client_timestamp,
        };

        Self::new(
            WebSocketMessageType::Pong,
            serde_json::to_value(heartbeat).unwrap_or_default(),
        )
    }
}
