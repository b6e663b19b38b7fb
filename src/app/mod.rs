//! 应用层：路由与各业务模块

pub mod product;

use std::path::Path;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::HttpConfig;
use crate::core::middleware::request_logging_middleware;
use product::handler::{self, AppState};

/// 组装路由
///
/// 未匹配的路径交给 `public_dir` 静态文件服务，上传的图片因此可通过 `/images/<文件名>` 访问。
pub fn build_router(state: AppState, http: &HttpConfig, public_dir: &Path) -> Router {
    Router::new()
        .route(
            "/products",
            get(handler::list_products).post(handler::create_product),
        )
        .route(
            "/products/:id",
            get(handler::get_product)
                .patch(handler::update_product)
                .delete(handler::delete_product),
        )
        .fallback_service(ServeDir::new(public_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_logging_middleware))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(TimeoutLayer::new(Duration::from_secs(http.timeout_seconds)))
                .layer(DefaultBodyLimit::max(http.max_upload_bytes)),
        )
        .with_state(state)
}
