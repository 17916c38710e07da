#![allow(dead_code)]

use aroyyo_gateway::{
    routes,
    services::auth::{AuthService, Claims},
    AppState, Config,
};
use axum::{body::Body, http::Request, Router};
use chrono::{Duration, Utc};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-secret";

pub fn config(backend_url: &str) -> Config {
    Config {
        backend_url: backend_url.to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        environment: "test".to_string(),
        cors_allowed_origins: "*".to_string(),
        ..Default::default()
    }
}

pub fn app(config: Config) -> Router {
    routes::app(Arc::new(AppState::new(config).unwrap()))
}

pub fn token(user_id: &str, role: &str) -> String {
    let auth = AuthService::new(&config("http://localhost"));
    let now = Utc::now();
    auth.issue_token(&Claims {
        sub: user_id.to_string(),
        exp: (now + Duration::hours(1)).timestamp(),
        iat: now.timestamp(),
        role: Some(role.to_string()),
        email: Some(format!("{}@aroyyo.com", user_id)),
    })
    .unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> (u16, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status().as_u16();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn send_json(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
