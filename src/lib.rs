//! # 产品目录服务
//!
//! 基于 Axum 的产品 CRUD 服务，数据保存在单个 JSON 文件中，支持图片上传。
//!
//! - `app`: 路由、处理器、业务服务
//! - `core`: 错误处理与中间件
//! - `infrastructure`: JSON 文件存储、图片存储、日志
//! - `config`: TOML 配置

pub mod app;
pub mod config;
pub mod core;
pub mod infrastructure;

use std::sync::Arc;

use axum::Router;

use crate::app::product::{handler::AppState, service::ProductService};
use crate::config::Config;
use crate::infrastructure::{image_store::ImageStore, store::ProductStore};

/// 用给定的存储构建完整应用
pub fn build_app(config: &Config, store: Arc<dyn ProductStore>) -> Router {
    let images = ImageStore::new(config.storage.images_dir());
    let state = AppState {
        product_service: ProductService::new(store, images),
    };
    app::build_router(state, &config.http, &config.storage.public_dir)
}
