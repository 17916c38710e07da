use crate::{
    error::{AppError, Result},
    models::websocket::*,
};
use axum::extract::ws::{Message, WebSocket};
use chrono::{DateTime, Utc};
use futures::{sink::SinkExt, stream::StreamExt};
use serde_json::json;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info, warn};

/// 实时推送中心
///
/// 只转发事件，不保存任何访问权限状态。客户端收到 `entitlement_changed`
/// 后重新拉取目录即可。
#[derive(Clone, Default)]
pub struct RealtimeService {
    // 连接管理
    connections: Arc<RwLock<HashMap<String, ConnectionInfo>>>,
    // 用户到连接的映射
    user_connections: Arc<RwLock<HashMap<String, HashSet<String>>>>,
}

/// 连接信息
#[derive(Debug, Clone)]
struct ConnectionInfo {
    user_id: String,
    tx: mpsc::UnboundedSender<WebSocketMessage>,
    connected_at: DateTime<Utc>,
}

impl RealtimeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// 处理新的WebSocket连接，直到任意一端关闭
    pub async fn handle_connection(
        &self,
        websocket: WebSocket,
        user_id: String,
        connection_id: String,
    ) -> Result<()> {
        info!("New WebSocket connection: {} for user: {}", connection_id, user_id);

        let (mut ws_tx, mut ws_rx) = websocket.split();
        let mut rx = self.register(&user_id, &connection_id).await;

        let connect_msg = WebSocketMessage::new(
            WebSocketMessageType::Connect,
            json!({
                "connection_id": connection_id,
                "user_id": user_id,
            }),
        );
        self.send_to_connection(&connection_id, connect_msg).await?;

        let connection_id_clone = connection_id.clone();
        let mut send_task = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match serde_json::to_string(&message) {
                    Ok(json_str) => {
                        if let Err(e) = ws_tx.send(Message::Text(json_str)).await {
                            error!("Failed to send WebSocket message: {}", e);
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Failed to serialize message: {}", e);
                    }
                }
            }
            debug!("Send task ended for connection: {}", connection_id_clone);
        });

        let service = self.clone();
        let connection_id_clone = connection_id.clone();
        let mut receive_task = tokio::spawn(async move {
            while let Some(msg_result) = ws_rx.next().await {
                match msg_result {
                    Ok(Message::Text(text)) => {
                        if let Err(e) = service.handle_incoming_message(&connection_id_clone, &text).await {
                            warn!("Error handling incoming message on {}: {}", connection_id_clone, e);
                        }
                    }
                    Ok(Message::Close(_)) => {
                        info!("WebSocket connection closed: {}", connection_id_clone);
                        break;
                    }
                    // 协议层 ping/pong 由 axum 自动应答
                    Ok(_) => {}
                    Err(e) => {
                        error!("WebSocket error for connection {}: {}", connection_id_clone, e);
                        break;
                    }
                }
            }
            debug!("Receive task ended for connection: {}", connection_id_clone);
        });

        tokio::select! {
            _ = &mut send_task => receive_task.abort(),
            _ = &mut receive_task => send_task.abort(),
        }

        self.unregister(&connection_id).await;
        Ok(())
    }

    /// 注册连接并返回该连接的消息接收端
    pub async fn register(
        &self,
        user_id: &str,
        connection_id: &str,
    ) -> mpsc::UnboundedReceiver<WebSocketMessage> {
        let (tx, rx) = mpsc::unbounded_channel();

        self.connections.write().await.insert(
            connection_id.to_string(),
            ConnectionInfo {
                user_id: user_id.to_string(),
                tx,
                connected_at: Utc::now(),
            },
        );

        self.user_connections
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .insert(connection_id.to_string());

        debug!("Registered connection: {} for user: {}", connection_id, user_id);
        rx
    }

    /// 注销连接
    pub async fn unregister(&self, connection_id: &str) {
        let removed = self.connections.write().await.remove(connection_id);

        if let Some(info) = removed {
            let mut user_connections = self.user_connections.write().await;
            if let Some(user_conns) = user_connections.get_mut(&info.user_id) {
                user_conns.remove(connection_id);
                if user_conns.is_empty() {
                    user_connections.remove(&info.user_id);
                }
            }

            let lifetime = Utc::now() - info.connected_at;
            info!(
                "Unregistered connection: {} for user: {} after {}s",
                connection_id,
                info.user_id,
                lifetime.num_seconds()
            );
        }
    }

    async fn handle_incoming_message(&self, connection_id: &str, text: &str) -> Result<()> {
        debug!("Received message from {}: {}", connection_id, text);

        let incoming: IncomingMessage = match serde_json::from_str(text) {
            Ok(incoming) => incoming,
            Err(e) => {
                let reply = WebSocketMessage::error("INVALID_MESSAGE", "Malformed message");
                self.send_to_connection(connection_id, reply).await?;
                return Err(AppError::BadRequest(format!("Invalid JSON: {}", e)));
            }
        };

        let reply = match incoming.message_type {
            WebSocketMessageType::Ping => {
                WebSocketMessage::pong(connection_id, incoming.client_timestamp)
            }
            other => {
                warn!("Unhandled message type: {:?}", other);
                WebSocketMessage::error("UNSUPPORTED_MESSAGE", "Only ping messages are accepted")
            }
        };

        self.send_to_connection(connection_id, reply).await
    }

    async fn send_to_connection(&self, connection_id: &str, message: WebSocketMessage) -> Result<()> {
        let connections = self.connections.read().await;
        let info = connections
            .get(connection_id)
            .ok_or_else(|| AppError::not_found("Connection"))?;

        info.tx
            .send(message)
            .map_err(|_| AppError::Internal(format!("Connection {} is closed", connection_id)))
    }

    /// 向某用户的所有连接发送消息，返回成功投递的连接数
    pub async fn send_to_user(&self, user_id: &str, message: WebSocketMessage) -> usize {
        let connection_ids: Vec<String> = match self.user_connections.read().await.get(user_id) {
            Some(ids) => ids.iter().cloned().collect(),
            None => {
                debug!("User {} has no active connections", user_id);
                return 0;
            }
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        {
            let connections = self.connections.read().await;
            for connection_id in connection_ids {
                match connections.get(&connection_id) {
                    Some(info) if info.tx.send(message.clone()).is_ok() => delivered += 1,
                    _ => dead.push(connection_id),
                }
            }
        }

        for connection_id in dead {
            warn!("Pruning dead connection: {}", connection_id);
            self.unregister(&connection_id).await;
        }

        delivered
    }

    /// 推送访问权限变化，提示客户端重新判定
    pub async fn notify_entitlement_changed(&self, user_id: &str, change: EntitlementChange) {
        let message = WebSocketMessage::entitlement_changed(&change, user_id.to_string());
        let delivered = self.send_to_user(user_id, message).await;
        debug!(
            "Entitlement change {:?} delivered to {} connection(s) of user {}",
            change.event, delivered, user_id
        );
    }

    /// 推送通知
    pub async fn notify(&self, user_id: &str, data: serde_json::Value) -> usize {
        self.send_to_user(user_id, WebSocketMessage::notification(data, user_id.to_string()))
            .await
    }

    pub async fn get_stats(&self) -> RealtimeStats {
        RealtimeStats {
            total_connections: self.connections.read().await.len(),
            active_users: self.user_connections.read().await.len(),
        }
    }
}
