//! 创建产品时的字段校验

use std::collections::BTreeMap;
use validator::{Validate, ValidationErrors};

use super::form::ProductForm;

pub const PRICE_NOT_A_NUMBER: &str = "Price must be a number";

/// 待校验的创建请求，字段缺失为 None
#[derive(Debug, Default, Validate)]
pub struct CreateProductInput {
    #[validate(
        required(message = "Name must be at least 2 characters"),
        length(min = 2, message = "Name must be at least 2 characters")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "Brand must be at least 2 characters"),
        length(min = 2, message = "Brand must be at least 2 characters")
    )]
    pub brand: Option<String>,

    #[validate(
        required(message = "Category must be at least 2 characters"),
        length(min = 2, message = "Category must be at least 2 characters")
    )]
    pub category: Option<String>,

    #[validate(
        required(message = "Price must be greater than 0"),
        range(exclusive_min = 0.0, message = "Price must be greater than 0")
    )]
    pub price: Option<f64>,

    #[validate(
        required(message = "Description must be at least 10 characters"),
        length(min = 10, message = "Description must be at least 10 characters")
    )]
    pub description: Option<String>,

    /// 价格文本无法解析时的错误
    pub price_error: Option<&'static str>,
}

/// 通过校验的创建字段
#[derive(Debug, Clone, PartialEq)]
pub struct ValidProduct {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: f64,
    pub description: String,
}

/// 解析价格文本
///
/// 空白视为未提供；无法解析为有限数值时返回 Err。
pub fn parse_price(raw: Option<&str>) -> Result<Option<f64>, &'static str> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    match raw.parse::<f64>() {
        Ok(price) if price.is_finite() => Ok(Some(price)),
        _ => Err(PRICE_NOT_A_NUMBER),
    }
}

/// 收集全部失败字段，每个字段保留第一条消息
pub fn collect_errors(errors: &ValidationErrors) -> BTreeMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            errs.first().map(|err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                (field.to_string(), message)
            })
        })
        .collect()
}

impl CreateProductInput {
    pub fn from_form(form: &ProductForm) -> Self {
        let (price, price_error) = match parse_price(form.price.as_deref()) {
            Ok(price) => (price, None),
            Err(message) => (None, Some(message)),
        };

        Self {
            name: form.name.clone(),
            brand: form.brand.clone(),
            category: form.category.clone(),
            price,
            description: form.description.clone(),
            price_error,
        }
    }

    /// 执行全部规则；失败时返回字段名到消息的映射
    pub fn check(self) -> Result<ValidProduct, BTreeMap<String, String>> {
        let mut errors = self
            .validate()
            .err()
            .map(|errors| collect_errors(&errors))
            .unwrap_or_default();
        if let Some(message) = self.price_error {
            errors.insert("price".to_string(), message.to_string());
        }

        match (
            self.name,
            self.brand,
            self.category,
            self.price,
            self.description,
        ) {
            (Some(name), Some(brand), Some(category), Some(price), Some(description))
                if errors.is_empty() =>
            {
                Ok(ValidProduct {
                    name,
                    brand,
                    category,
                    price,
                    description,
                })
            }
            _ => Err(errors),
        }
    }
}
