//! 产品处理器

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use super::{form::ProductForm, model::Product, service::ProductService};
use crate::core::error::CoreError;

#[derive(Clone)]
pub struct AppState {
    pub product_service: ProductService,
}

pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, CoreError> {
    let products = state.product_service.list_products().await?;
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, CoreError> {
    let product = state.product_service.get_product(&id).await?;
    Ok(Json(product))
}

pub async fn create_product(
    State(state): State<AppState>,
    form: ProductForm,
) -> Result<(StatusCode, Json<Product>), CoreError> {
    let product = state.product_service.create_product(form).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: ProductForm,
) -> Result<Json<Product>, CoreError> {
    let product = state.product_service.update_product(&id, form).await?;
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, CoreError> {
    state.product_service.delete_product(&id).await?;
    Ok(Json(json!({})))
}
