mod common;

use common::{app, config, get, send, send_json, token};
use serde_json::{json, Value};
use wiremock::{
    matchers::{body_partial_json, header, method, path, path_regex, query_param},
    Mock, MockServer, ResponseTemplate,
};

async fn mount_contents(server: &MockServer, contents: Value) {
    Mock::given(method("GET"))
        .and(path("/content/creator/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "contents": contents })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/creators/u1/subscription-tiers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tiers": [
                {"_id": "a", "name": "Basic", "price": 200},
                {"_id": "b", "name": "Premium", "price": 500}
            ]
        })))
        .mount(server)
        .await;
}

async fn mount_creator_snapshot(server: &MockServer) {
    mount_contents(
        server,
        json!([
            {"_id": "1", "creator": "u1", "type": "image", "priceType": "free",
             "url": "https://cdn/1.jpg", "title": "Teaser"},
            {"_id": "2", "creator": "u1", "type": "video", "priceType": "paid", "price": 300,
             "url": "https://cdn/2.mp4", "thumbnail": "https://cdn/2-blur.jpg", "title": "Episode 1"}
        ]),
    )
    .await;
}

/// 观看者 v1 的订阅与购买记录
async fn mount_viewer(server: &MockServer, subscription: Value, purchased: &[&str]) {
    let purchases: Vec<Value> = purchased
        .iter()
        .enumerate()
        .map(|(i, id)| json!({"_id": format!("p{}", i), "user": "v1", "content": id}))
        .collect();

    Mock::given(method("GET"))
        .and(path("/subscriptions/creator/u1/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "subscription": subscription })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/purchased-content/user/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "purchasedContents": purchases })))
        .mount(server)
        .await;
}

/// 任何初始化请求都不应到达后端
async fn forbid_checkout(server: &MockServer) {
    Mock::given(path("/payments/paystack/initialize"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

async fn purchase(app: &axum::Router, content_id: &str) -> (u16, Value) {
    send(
        app,
        send_json(
            "POST",
            "/api/gateway/payments/purchase",
            Some(&token("v1", "fan")),
            json!({"creatorId": "u1", "contentId": content_id}),
        ),
    )
    .await
}

#[tokio::test]
async fn test_health_reports_ok() {
    let app = app(config("http://localhost:9"));
    let (status, body) = send(&app, get("/health", None)).await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["realtime"]["total_connections"], 0);
}

#[tokio::test]
async fn test_anonymous_catalog_locks_paid_content_without_viewer_calls() {
    let server = MockServer::start().await;
    mount_creator_snapshot(&server).await;

    // 匿名访客不应触发任何需要身份的接口
    Mock::given(path_regex("^/(subscriptions|purchased-content)/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let app = app(config(&server.uri()));
    let (status, body) = send(&app, get("/api/gateway/creators/u1/content", None)).await;

    assert_eq!(status, 200);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);

    assert_eq!(items[0]["has_access"], true);
    assert_eq!(items[0]["state"], "free");
    assert_eq!(items[0]["action"]["kind"], "NONE");

    assert_eq!(items[1]["has_access"], false);
    assert_eq!(items[1]["state"], "locked");
    assert!(items[1]["item"]["url"].is_null());
    assert_eq!(items[1]["item"]["thumbnail"], "https://cdn/2-blur.jpg");
    assert_eq!(items[1]["action"]["kind"], "PURCHASE");
    assert_eq!(items[1]["action"]["price_due"], 300.0);
}

#[tokio::test]
async fn test_subscriber_catalog_unlocks_and_marks_current_tier() {
    let server = MockServer::start().await;
    mount_creator_snapshot(&server).await;
    let token = token("v1", "fan");

    Mock::given(method("GET"))
        .and(path("/subscriptions/creator/u1/me"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subscription": {"_id": "s1", "user": "v1", "creator": "u1", "tier": "b", "status": "active"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/purchased-content/user/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"purchasedContents": []})))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(config(&server.uri()));
    let (status, body) = send(&app, get("/api/gateway/creators/u1/content", Some(&token))).await;

    assert_eq!(status, 200);
    let items = body["data"]["items"].as_array().unwrap();
    assert!(items.iter().all(|i| i["has_access"] == true));
    assert_eq!(items[1]["state"], "unlocked_by_subscription");
    assert_eq!(items[1]["item"]["url"], "https://cdn/2.mp4");

    let tiers = body["data"]["tiers"]["tiers"].as_array().unwrap();
    assert_eq!(tiers[0]["is_current"], false);
    assert_eq!(tiers[1]["is_current"], true);
}

#[tokio::test]
async fn test_purchase_unlocks_single_item() {
    let server = MockServer::start().await;
    mount_creator_snapshot(&server).await;

    Mock::given(method("GET"))
        .and(path("/subscriptions/creator/u1/me"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "No subscription"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/purchased-content/user/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "purchasedContents": [{"_id": "p1", "user": "v1", "content": {"_id": "2", "creator": "u1"}}]
        })))
        .mount(&server)
        .await;

    let app = app(config(&server.uri()));
    let (status, body) = send(
        &app,
        get("/api/gateway/creators/u1/content/2/access", Some(&token("v1", "fan"))),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["has_access"], true);
    assert_eq!(body["data"]["state"], "unlocked_by_purchase");
}

#[tokio::test]
async fn test_unknown_item_is_not_found() {
    let server = MockServer::start().await;
    mount_creator_snapshot(&server).await;

    let app = app(config(&server.uri()));
    let (status, body) = send(&app, get("/api/gateway/creators/u1/content/99/access", None)).await;

    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_backend_failure_becomes_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"message": "maintenance"})))
        .mount(&server)
        .await;

    let app = app(config(&server.uri()));
    let (status, body) = send(&app, get("/api/gateway/creators/u1/content", None)).await;

    assert_eq!(status, 502);
    assert_eq!(body["error"]["code"], "BACKEND_ERROR");
    assert_eq!(body["error"]["message"], "maintenance");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = app(config("http://localhost:9"));

    let (status, body) = send(
        &app,
        send_json(
            "POST",
            "/api/gateway/subscriptions/subscribe",
            None,
            json!({"creatorId": "u1", "tierId": "a"}),
        ),
    )
    .await;
    assert_eq!(status, 401);
    assert_eq!(body["error"]["code"], "AUTHENTICATION_ERROR");

    let (status, _) = send(&app, get("/api/gateway/subscriptions/my", Some("not-a-jwt"))).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_subscribe_forwards_to_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/subscriptions/subscribe"))
        .and(body_partial_json(json!({"creatorId": "u1", "tierId": "a"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "subscription": {"_id": "s9", "user": "v1", "creator": "u1", "tier": "a", "status": "active"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(config(&server.uri()));
    let (status, body) = send(
        &app,
        send_json(
            "POST",
            "/api/gateway/subscriptions/subscribe",
            Some(&token("v1", "fan")),
            json!({"creatorId": "u1", "tierId": "a"}),
        ),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["id"], "s9");
    assert_eq!(body["data"]["status"], "active");
}

#[tokio::test]
async fn test_subscribe_validates_payload() {
    let app = app(config("http://localhost:9"));
    let (status, body) = send(
        &app,
        send_json(
            "POST",
            "/api/gateway/subscriptions/subscribe",
            Some(&token("v1", "fan")),
            json!({"creatorId": "", "tierId": "a"}),
        ),
    )
    .await;

    assert_eq!(status, 400);
    assert!(body["error"]["details"]["creator_id"].is_array());
}

#[tokio::test]
async fn test_creators_cannot_create_tiers_for_others() {
    let app = app(config("http://localhost:9"));
    let (status, _) = send(
        &app,
        send_json(
            "POST",
            "/api/gateway/creators/u1/tiers",
            Some(&token("u2", "creator")),
            json!({"name": "Gold", "price": 900}),
        ),
    )
    .await;

    assert_eq!(status, 403);
}

#[tokio::test]
async fn test_purchase_is_priced_from_catalog() {
    let server = MockServer::start().await;
    mount_creator_snapshot(&server).await;

    Mock::given(method("GET"))
        .and(path("/subscriptions/creator/u1/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"subscription": null})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/purchased-content/user/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"purchasedContents": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/payments/paystack/initialize"))
        .and(body_partial_json(json!({
            "amount": 30000,
            "currency": "KES",
            "metadata": {"userId": "v1", "creatorId": "u1", "contentId": "2", "purchaseType": "individual"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "authorization_url": "https://checkout.paystack.com/abc"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(config(&server.uri()));
    let token = token("v1", "fan");

    let (status, body) = send(
        &app,
        send_json(
            "POST",
            "/api/gateway/payments/purchase",
            Some(&token),
            json!({"creatorId": "u1", "contentId": "2"}),
        ),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["authorizationUrl"], "https://checkout.paystack.com/abc");
    assert!(!body["data"]["reference"].as_str().unwrap().is_empty());

    // 免费内容不能购买
    let (status, _) = send(
        &app,
        send_json(
            "POST",
            "/api/gateway/payments/purchase",
            Some(&token),
            json!({"creatorId": "u1", "contentId": "1"}),
        ),
    )
    .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_verify_without_reference_fails_locally() {
    let server = MockServer::start().await;
    Mock::given(path("/payments/paystack/verify"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = app(config(&server.uri()));
    let (status, body) = send(&app, get("/api/gateway/payments/verify?reference=", None)).await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "FAILED");
}

#[tokio::test]
async fn test_verify_reads_transaction_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/payments/paystack/verify"))
        .and(query_param("reference", "ref-ok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"transaction": {"status": "Completed"}})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/payments/paystack/verify"))
        .and(query_param("reference", "ref-bad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "abandoned", "message": "Card declined"})))
        .mount(&server)
        .await;

    let app = app(config(&server.uri()));

    let (_, body) = send(&app, get("/api/gateway/payments/verify?reference=ref-ok", None)).await;
    assert_eq!(body["data"]["status"], "SUCCESS");

    let (_, body) = send(&app, get("/api/gateway/payments/verify?reference=ref-bad", None)).await;
    assert_eq!(body["data"]["status"], "FAILED");
    assert_eq!(body["data"]["message"], "Card declined");
}

#[tokio::test]
async fn test_notifications_are_filtered_gateway_side() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notifications"))
        .and(query_param("userID", "v1"))
        .and(query_param("limit", "2"))
        .and(query_param("skip", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "notifications": [
                {"_id": "n1", "type": "payment", "title": "Payment received"},
                {"_id": "n2", "type": "upload", "title": "New video"}
            ]
        })))
        .mount(&server)
        .await;

    let mut config = config(&server.uri());
    config.notifications_page_size = 2;
    let app = app(config);

    let (status, body) = send(
        &app,
        get("/api/gateway/notifications?filter=upload", Some(&token("v1", "fan"))),
    )
    .await;

    assert_eq!(status, 200);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "n2");
    assert_eq!(body["data"]["has_more"], true);
}

#[tokio::test]
async fn test_mark_read_forwards_token() {
    let server = MockServer::start().await;
    let token = token("v1", "fan");
    Mock::given(method("PATCH"))
        .and(path("/notifications/n1/read"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(config(&server.uri()));
    let request = axum::http::Request::builder()
        .method("PATCH")
        .uri("/api/gateway/notifications/n1/read")
        .header("authorization", format!("Bearer {}", token))
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_explore_filters_creators() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("role", "creator"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "u1", "firstName": "Amani", "niche": "Music", "role": "creator"},
            {"_id": "u2", "firstName": "Baraka", "niche": "Comedy", "role": "creator"}
        ])))
        .mount(&server)
        .await;

    let app = app(config(&server.uri()));
    let (status, body) = send(&app, get("/api/gateway/creators/explore?q=bara", None)).await;

    assert_eq!(status, 200);
    let creators = body["data"].as_array().unwrap();
    assert_eq!(creators.len(), 1);
    assert_eq!(creators[0]["id"], "u2");
}

#[tokio::test]
async fn test_purchase_refused_when_subscribed() {
    let server = MockServer::start().await;
    mount_creator_snapshot(&server).await;
    mount_viewer(
        &server,
        json!({"_id": "s1", "user": "v1", "creator": "u1", "tier": "a", "status": "active"}),
        &[],
    )
    .await;
    forbid_checkout(&server).await;

    let app = app(config(&server.uri()));
    let (status, body) = purchase(&app, "2").await;

    assert_eq!(status, 400);
    assert_eq!(body["error"]["message"], "Content is already unlocked");
}

#[tokio::test]
async fn test_purchase_refused_when_already_bought() {
    let server = MockServer::start().await;
    mount_creator_snapshot(&server).await;
    mount_viewer(&server, Value::Null, &["2"]).await;
    forbid_checkout(&server).await;

    let app = app(config(&server.uri()));
    let (status, body) = purchase(&app, "2").await;

    assert_eq!(status, 400);
    assert_eq!(body["error"]["message"], "Content is already unlocked");
}

#[tokio::test]
async fn test_purchase_refused_for_bought_duplicate() {
    let server = MockServer::start().await;
    // 同一 ID 的第二份数据缺少价格，合并后仍为锁定
    mount_contents(
        &server,
        json!([
            {"_id": "2", "creator": "u1", "priceType": "paid", "price": 300},
            {"_id": "2", "creator": "u1", "priceType": "paid"}
        ]),
    )
    .await;
    mount_viewer(&server, Value::Null, &["2"]).await;
    forbid_checkout(&server).await;

    let app = app(config(&server.uri()));

    let (status, body) = send(&app, get("/api/gateway/creators/u1/content", Some(&token("v1", "fan")))).await;
    assert_eq!(status, 200);
    let items = body["data"]["items"].as_array().unwrap();
    assert!(items.iter().all(|i| i["has_access"] == false));
    assert!(items.iter().all(|i| i["action"]["kind"] != "PURCHASE"));

    let (status, _) = purchase(&app, "2").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_purchase_refused_without_individual_price() {
    let server = MockServer::start().await;
    mount_contents(
        &server,
        json!([
            {"_id": "3", "creator": "u1", "priceType": "bundle", "price": 100},
            {"_id": "4", "creator": "u1", "priceType": "paid"},
            {"_id": "5", "creator": "u1", "priceType": "paid", "price": 0}
        ]),
    )
    .await;
    mount_viewer(&server, Value::Null, &[]).await;
    forbid_checkout(&server).await;

    let app = app(config(&server.uri()));

    for content_id in ["3", "4", "5"] {
        let (status, body) = purchase(&app, content_id).await;
        assert_eq!(status, 400, "content {}", content_id);
        assert_eq!(body["error"]["message"], "Content cannot be purchased individually");
    }
}

#[tokio::test]
async fn test_catalog_survives_broken_item() {
    let server = MockServer::start().await;
    mount_contents(
        &server,
        json!([
            {"_id": "1", "creator": "u1", "priceType": "free", "url": "https://cdn/1.jpg", "createdAt": ""},
            {"_id": "9", "priceType": "paid", "price": 300, "url": "https://cdn/9.mp4"}
        ]),
    )
    .await;

    let app = app(config(&server.uri()));
    let (status, body) = send(&app, get("/api/gateway/creators/u1/content", None)).await;

    assert_eq!(status, 200);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items[0]["has_access"], true);
    assert_eq!(items[0]["item"]["url"], "https://cdn/1.jpg");
    assert_eq!(items[1]["has_access"], false);
    assert!(items[1]["item"]["url"].is_null());
    assert_eq!(body["data"]["issues"][0]["kind"], "missing_creator");
}

#[tokio::test]
async fn test_subscription_checkout_forwards_subaccount() {
    let server = MockServer::start().await;
    mount_creator_snapshot(&server).await;
    mount_viewer(&server, Value::Null, &[]).await;
    Mock::given(method("GET"))
        .and(path("/users/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "u1", "role": "creator", "creator": {"_id": "p1", "subaccountCode": "ACCT_x1"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/payments/paystack/initialize"))
        .and(body_partial_json(json!({
            "amount": 20000,
            "currency": "KES",
            "subaccount": "ACCT_x1",
            "metadata": {"userId": "v1", "creatorId": "u1", "tierId": "a", "purchaseType": "subscription"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "authorization_url": "https://checkout.paystack.com/sub",
            "reference": "backend-ref"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(config(&server.uri()));
    let (status, body) = send(
        &app,
        send_json(
            "POST",
            "/api/gateway/payments/subscribe",
            Some(&token("v1", "fan")),
            json!({"creatorId": "u1", "tierId": "a"}),
        ),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["authorizationUrl"], "https://checkout.paystack.com/sub");
    assert_eq!(body["data"]["reference"], "backend-ref");
}

#[tokio::test]
async fn test_subscription_checkout_refused_for_current_tier() {
    let server = MockServer::start().await;
    mount_creator_snapshot(&server).await;
    mount_viewer(
        &server,
        json!({"_id": "s1", "user": "v1", "creator": "u1", "tier": "b", "status": "active"}),
        &[],
    )
    .await;
    forbid_checkout(&server).await;

    let app = app(config(&server.uri()));
    let (status, body) = send(
        &app,
        send_json(
            "POST",
            "/api/gateway/payments/subscribe",
            Some(&token("v1", "fan")),
            json!({"creatorId": "u1", "tierId": "b"}),
        ),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["error"]["message"], "Already subscribed to this tier");
}
