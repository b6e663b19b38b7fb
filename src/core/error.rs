//! 核心错误处理模块

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::infrastructure::store::StoreError;

pub const VALIDATION_ERROR: &str = "Validation error";

/// 核心错误类型
#[derive(Debug)]
pub enum CoreError {
    BadRequest(String),
    /// 字段名到错误消息
    Validation(BTreeMap<String, String>),
    NotFound(String),
    InternalServerError(String),
}

/// 错误响应结构
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

impl CoreError {
    pub fn product_not_found() -> Self {
        CoreError::NotFound("Product not found".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CoreError::BadRequest(_) | CoreError::Validation(_) => StatusCode::BAD_REQUEST,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            CoreError::BadRequest(message) | CoreError::NotFound(message) => ErrorResponse {
                message,
                errors: None,
            },
            CoreError::Validation(errors) => ErrorResponse {
                message: VALIDATION_ERROR.to_string(),
                errors: Some(errors),
            },
            CoreError::InternalServerError(detail) => {
                error!("internal error: {}", detail);
                ErrorResponse {
                    message: "Internal server error".to_string(),
                    errors: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        CoreError::InternalServerError(err.to_string())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::InternalServerError(err.to_string())
    }
}
