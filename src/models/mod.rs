pub mod access;
pub mod content;
pub mod creator;
pub mod notification;
pub mod payment;
pub mod response;
pub mod subscription;
pub mod websocket;
