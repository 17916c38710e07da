/// 用于处理 Aroyyo 后端 JSON 的序列化/反序列化辅助模块
///
/// 后端基于 MongoDB，ID 可能以字符串、`{"$oid": "..."}` 或数字出现；
/// 价格字段可能是数字也可能是字符串。

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum IdValue {
    String(String),
    ObjectId {
        #[serde(rename = "$oid")]
        oid: String,
    },
    Number(serde_json::Number),
    // 被填充 (populate) 的引用，例如 `creator: { _id, firstName, ... }`
    Populated {
        #[serde(alias = "_id")]
        id: Box<IdValue>,
    },
}

impl IdValue {
    fn into_string(self) -> String {
        match self {
            IdValue::String(s) => s,
            IdValue::ObjectId { oid } => oid,
            IdValue::Number(n) => n.to_string(),
            IdValue::Populated { id } => id.into_string(),
        }
    }
}

/// 处理后端的 ID 格式
pub mod flex_id {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(IdValue::deserialize(deserializer)?.into_string())
    }
}

/// 可选 ID，缺失或为 null 时返回 None
pub mod flex_id_opt {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<IdValue>::deserialize(deserializer)?.map(IdValue::into_string))
    }
}

/// 缺失、null 或无法识别的引用记为空字符串，由访问判定逻辑按数据异常处理
pub mod flex_id_or_empty {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(value
            .and_then(|v| IdValue::deserialize(v).ok())
            .map(IdValue::into_string)
            .unwrap_or_default())
    }
}

/// ID 列表
pub mod flex_id_vec {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Vec<IdValue>>::deserialize(deserializer)?
            .unwrap_or_default()
            .into_iter()
            .map(IdValue::into_string)
            .collect())
    }
}

/// 宽松的小数解析：数字或数字字符串，其余形态一律视为缺失。
/// 缺失的价格由访问判定逻辑按失败关闭处理，而不是在反序列化阶段报错。
pub mod lenient_decimal {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(serde_json::Value::Number(n)) => n.as_f64(),
            Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
    }
}

/// 宽松的时间解析：RFC 3339 字符串，空串或其他形态视为缺失
pub mod lenient_datetime {
    use super::*;
    use chrono::{DateTime, Utc};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(serde_json::Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        })
    }
}
