//! 产品业务服务

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::SecondsFormat;
use tracing::info;

use super::form::ProductForm;
use super::model::{NewProduct, Product, ProductPatch};
use super::validation::{parse_price, CreateProductInput};
use crate::core::error::CoreError;
use crate::infrastructure::image_store::ImageStore;
use crate::infrastructure::store::{ProductStore, StoreError};

#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn ProductStore>,
    images: ImageStore,
}

/// 解析路径中的 id，非数字按不存在处理
pub fn parse_id(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}

/// ISO-8601 UTC 时间，毫秒精度
fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl ProductService {
    pub fn new(store: Arc<dyn ProductStore>, images: ImageStore) -> Self {
        Self { store, images }
    }

    /// 存储访问是同步文件 I/O，放到阻塞线程池执行
    async fn with_store<T, F>(&self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&dyn ProductStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| CoreError::InternalServerError(format!("store task failed: {}", e)))?;
        Ok(result?)
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, CoreError> {
        self.with_store(|store| store.list()).await
    }

    pub async fn get_product(&self, id: &str) -> Result<Product, CoreError> {
        let id = parse_id(id).ok_or_else(CoreError::product_not_found)?;
        self.with_store(move |store| store.find_by_id(id))
            .await?
            .ok_or_else(CoreError::product_not_found)
    }

    pub async fn create_product(&self, form: ProductForm) -> Result<Product, CoreError> {
        let valid = CreateProductInput::from_form(&form)
            .check()
            .map_err(CoreError::Validation)?;

        let image_filename = match &form.image {
            Some(image) => Some(self.images.save(image).await?),
            None => form.image_filename,
        };

        let new = NewProduct {
            name: valid.name,
            brand: valid.brand,
            category: valid.category,
            price: valid.price,
            description: valid.description,
            image_filename,
            created_at: now_iso(),
        };
        let product = self.with_store(move |store| store.append(new)).await?;

        info!("created product {} ({})", product.id, product.name);
        Ok(product)
    }

    pub async fn update_product(&self, id: &str, form: ProductForm) -> Result<Product, CoreError> {
        let id = parse_id(id).ok_or_else(CoreError::product_not_found)?;
        if self
            .with_store(move |store| store.find_by_id(id))
            .await?
            .is_none()
        {
            return Err(CoreError::product_not_found());
        }

        let price = parse_price(form.price.as_deref()).map_err(|message| {
            CoreError::Validation(BTreeMap::from([("price".to_string(), message.to_string())]))
        })?;

        let image_filename = match &form.image {
            Some(image) => Some(self.images.save(image).await?),
            None => None,
        };

        let patch = ProductPatch {
            name: form.name,
            brand: form.brand,
            category: form.category,
            price,
            description: form.description,
            image_filename,
        };

        let product = self
            .with_store(move |store| store.update_fields(id, patch))
            .await?
            .ok_or_else(CoreError::product_not_found)?;

        info!("updated product {}", product.id);
        Ok(product)
    }

    pub async fn delete_product(&self, id: &str) -> Result<Product, CoreError> {
        let id = parse_id(id).ok_or_else(CoreError::product_not_found)?;
        let product = self
            .with_store(move |store| store.remove(id))
            .await?
            .ok_or_else(CoreError::product_not_found)?;

        info!("deleted product {}", product.id);
        Ok(product)
    }
}
