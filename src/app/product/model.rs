//! 产品数据模型

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 存储中的产品记录
///
/// 读取时宽松：字符串形式的 id、null 或缺失的字段都能接受，
/// 旧数据里被写成 null 的价格读作 None。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(deserialize_with = "lenient::id")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub brand: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub category: String,
    #[serde(
        default,
        deserialize_with = "lenient::price",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_filename: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "String::is_empty"
    )]
    pub created_at: String,
    /// 存储文件里已有的其他字段，原样写回
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 通过校验、尚未分配 id 的新产品
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: f64,
    pub description: String,
    pub image_filename: Option<String>,
    pub created_at: String,
}

/// 部分更新：None 表示保留原值
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub image_filename: Option<String>,
}

impl Product {
    pub fn from_new(id: u64, new: NewProduct) -> Self {
        Self {
            id,
            name: new.name,
            brand: new.brand,
            category: new.category,
            price: Some(new.price),
            description: new.description,
            image_filename: new.image_filename,
            created_at: new.created_at,
            extra: Map::new(),
        }
    }

    /// 字段级合并，id 与 createdAt 不变
    pub fn apply(&mut self, patch: ProductPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(brand) = patch.brand {
            self.brand = brand;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(price) = patch.price {
            self.price = Some(price);
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(image_filename) = patch.image_filename {
            self.image_filename = Some(image_filename);
        }
    }
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

mod lenient {
    use serde::{de::Error, Deserialize, Deserializer};
    use serde_json::Value;

    /// 数字或数字字符串
    pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let id = match &value {
            Value::Number(n) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        id.ok_or_else(|| D::Error::custom(format!("invalid product id: {}", value)))
    }

    /// null 读作空字符串，数字转为文本
    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(s),
            Value::Null => Ok(String::new()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(D::Error::custom(format!("expected text, got {}", other))),
        }
    }

    /// 数字或数字字符串；null 与无法解析的值读作 None
    pub fn price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let price = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(price.filter(|p| p.is_finite()))
    }
}
