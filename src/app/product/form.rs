//! 写请求的表单解析
//!
//! 同一个提取器接受 multipart、JSON 与 urlencoded 三种请求体。

use std::collections::HashMap;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde_json::{Map, Value};

use crate::core::error::CoreError;

/// 上传文件的表单字段名
pub const IMAGE_FIELD: &str = "image";

/// 请求中附带的图片
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub bytes: Bytes,
}

/// 解析后的产品写请求
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    /// 原始价格文本，由服务层显式解析
    pub price: Option<String>,
    pub image_filename: Option<String>,
    pub image: Option<UploadedImage>,
}

impl ProductForm {
    /// 按字段名填充，未识别的字段忽略
    fn set_field(&mut self, name: &str, value: String) {
        match name {
            "name" => self.name = Some(value),
            "brand" => self.brand = Some(value),
            "category" => self.category = Some(value),
            "description" => self.description = Some(value),
            "price" => self.price = Some(value),
            "imageFilename" => self.image_filename = Some(value),
            _ => {}
        }
    }

    fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut form = Self::default();
        for (name, value) in pairs {
            form.set_field(&name, value);
        }
        form
    }

    /// 字符串原样保留，数字转为文本，其余类型视为未提供
    ///
    /// 数值 0 的 `price` 同样视为未提供；文本 "0" 不受影响。
    fn from_json(object: Map<String, Value>) -> Self {
        Self::from_pairs(object.into_iter().filter_map(|(name, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) if name == "price" && n.as_f64() == Some(0.0) => return None,
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            Some((name, text))
        }))
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, CoreError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| CoreError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);

            match file_name {
                Some(file_name) if !file_name.is_empty() => {
                    if name != IMAGE_FIELD || form.image.is_some() {
                        return Err(CoreError::BadRequest("Unexpected field".to_string()));
                    }
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| CoreError::BadRequest(e.body_text()))?;
                    form.image = Some(UploadedImage { file_name, bytes });
                }
                // 空文件名是浏览器提交的空文件输入框
                Some(_) => {}
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| CoreError::BadRequest(e.body_text()))?;
                    form.set_field(&name, value);
                }
            }
        }

        Ok(form)
    }
}

#[async_trait]
impl<S> FromRequest<S> for ProductForm
where
    S: Send + Sync,
{
    type Rejection = CoreError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase());

        let Some(content_type) = content_type else {
            return Ok(Self::default());
        };

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| CoreError::BadRequest(e.body_text()))?;
            Self::from_multipart(multipart).await
        } else if content_type.starts_with("application/json") {
            let Json(object) = Json::<Map<String, Value>>::from_request(req, state)
                .await
                .map_err(|e| CoreError::BadRequest(e.body_text()))?;
            Ok(Self::from_json(object))
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| CoreError::BadRequest(e.body_text()))?;
            Ok(Self::from_pairs(pairs))
        } else {
            Err(CoreError::BadRequest(format!(
                "Unsupported content type: {}",
                content_type
            )))
        }
    }
}
