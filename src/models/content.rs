use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::serde_helpers;

/// 创作者发布的内容
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    #[serde(alias = "_id", deserialize_with = "serde_helpers::flex_id::deserialize")]
    pub id: String,
    /// 所属创作者 ID，引用丢失时为空
    #[serde(default, alias = "creatorId", deserialize_with = "serde_helpers::flex_id_or_empty::deserialize")]
    pub creator: String,
    #[serde(rename = "type", default)]
    pub media_kind: MediaKind,
    #[serde(default)]
    pub price_type: PriceType,
    /// 仅在付费内容上有意义
    #[serde(default, deserialize_with = "serde_helpers::lenient_decimal::deserialize")]
    pub price: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "serde_helpers::lenient_datetime::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub about: String,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
}

/// 媒体类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Image,
    Downloadable,
    #[default]
    #[serde(other)]
    Other,
}

/// 定价类型，无法识别的值一律为 Unknown，按付费内容处理
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    Free,
    Paid,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ContentItem {
    pub fn is_free(&self) -> bool {
        self.price_type == PriceType::Free
    }

    /// 有效的单次购买价格：存在、有限且为正
    pub fn valid_price(&self) -> Option<f64> {
        self.price.filter(|p| p.is_finite() && *p > 0.0)
    }

    pub fn missing_price(&self) -> bool {
        self.price_type == PriceType::Paid && self.valid_price().is_none()
    }

    /// 非免费内容缺少所属创作者时无法判定订阅归属
    pub fn missing_creator(&self) -> bool {
        !self.is_free() && self.creator.trim().is_empty()
    }

    pub fn is_malformed(&self) -> bool {
        self.missing_price() || self.missing_creator()
    }

    /// 锁定状态下的展示版本：去掉完整资源地址，只保留缩略图用于模糊预览
    pub fn into_preview(mut self) -> Self {
        self.url = None;
        self
    }
}

/// 内容列表响应
#[derive(Debug, Clone, Deserialize)]
pub struct ContentListResponse {
    #[serde(default, alias = "content")]
    pub contents: Vec<ContentItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_content_parsing() {
        let item: ContentItem = serde_json::from_str(
            r#"{
                "_id": "c2",
                "creator": "u1",
                "type": "video",
                "priceType": "paid",
                "price": 300,
                "tags": ["comedy"],
                "createdAt": "2024-12-01T10:00:00Z",
                "viewCount": 12,
                "title": "Episode 1",
                "url": "https://cdn/ep1.mp4"
            }"#,
        )
        .unwrap();

        assert_eq!(item.id, "c2");
        assert_eq!(item.media_kind, MediaKind::Video);
        assert_eq!(item.price_type, PriceType::Paid);
        assert_eq!(item.valid_price(), Some(300.0));
        assert!(!item.is_malformed());
    }

    #[test]
    fn test_unknown_enums_fall_back() {
        let item: ContentItem = serde_json::from_str(
            r#"{"id": "c3", "creator": "u1", "type": "podcast", "priceType": "tip-jar"}"#,
        )
        .unwrap();

        assert_eq!(item.media_kind, MediaKind::Other);
        assert_eq!(item.price_type, PriceType::Unknown);
    }

    #[test]
    fn test_paid_without_price_is_malformed() {
        let item: ContentItem =
            serde_json::from_str(r#"{"id": "c4", "creator": "u1", "priceType": "paid", "price": -5}"#).unwrap();
        assert!(item.is_malformed());
    }

    #[test]
    fn test_zero_price_is_malformed() {
        let item: ContentItem =
            serde_json::from_str(r#"{"id": "c6", "creator": "u1", "priceType": "paid", "price": 0}"#).unwrap();
        assert_eq!(item.valid_price(), None);
        assert!(item.is_malformed());
    }

    #[test]
    fn test_lost_creator_and_bad_date_still_parse() {
        let list: ContentListResponse = serde_json::from_str(
            r#"{"contents": [
                {"_id": "1", "creator": "u1", "priceType": "free", "createdAt": ""},
                {"_id": "2", "priceType": "paid", "price": 300},
                {"_id": "3", "creator": null, "priceType": "free"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(list.contents.len(), 3);
        assert_eq!(list.contents[0].created_at, None);
        assert!(!list.contents[0].is_malformed());
        assert!(list.contents[1].missing_creator());
        assert!(list.contents[1].is_malformed());
        // 免费内容不依赖创作者归属
        assert!(!list.contents[2].is_malformed());
    }

    #[test]
    fn test_preview_strips_asset_url() {
        let item: ContentItem = serde_json::from_str(
            r#"{"id": "c5", "creator": "u1", "priceType": "paid", "price": 1, "url": "u", "thumbnail": "t"}"#,
        )
        .unwrap();
        let preview = item.into_preview();
        assert_eq!(preview.url, None);
        assert_eq!(preview.thumbnail.as_deref(), Some("t"));
    }
}
