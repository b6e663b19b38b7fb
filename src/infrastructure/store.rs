//! 产品存储接口
//!
//! `Document` 是整个 JSON 文档在内存中的表示；`ProductStore` 的实现在其上加锁并决定是否落盘。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Mutex;

use crate::app::product::model::{NewProduct, Product, ProductPatch};

/// 存储错误类型
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

/// 产品存储访问接口
pub trait ProductStore: Send + Sync {
    /// 按存储顺序返回全部产品
    fn list(&self) -> Result<Vec<Product>, StoreError>;

    fn find_by_id(&self, id: u64) -> Result<Option<Product>, StoreError>;

    /// 分配下一个 id 并追加，返回写入的记录
    fn append(&self, new: NewProduct) -> Result<Product, StoreError>;

    /// 字段合并更新，记录不存在时返回 None
    fn update_fields(&self, id: u64, patch: ProductPatch) -> Result<Option<Product>, StoreError>;

    fn remove(&self, id: u64) -> Result<Option<Product>, StoreError>;
}

/// `products` 数组中的一项，无法识别的记录原样保留并写回
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    Product(Product),
    Unreadable(Value),
}

impl Record {
    pub fn as_product(&self) -> Option<&Product> {
        match self {
            Record::Product(product) => Some(product),
            Record::Unreadable(_) => None,
        }
    }
}

/// JSON 文档：`products` 集合加上其他原样保留的顶层集合
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub products: Vec<Record>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Document {
    pub fn from_products(products: Vec<Product>) -> Self {
        Self {
            products: products.into_iter().map(Record::Product).collect(),
            other: Map::new(),
        }
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter_map(Record::as_product)
    }

    pub fn unreadable_count(&self) -> usize {
        self.products
            .iter()
            .filter(|r| matches!(r, Record::Unreadable(_)))
            .count()
    }

    /// max(id) + 1，空集合为 1
    pub fn next_id(&self) -> u64 {
        self.products()
            .map(|p| p.id)
            .max()
            .map_or(1, |max| max + 1)
    }

    pub fn find(&self, id: u64) -> Option<&Product> {
        self.products().find(|p| p.id == id)
    }

    pub fn insert(&mut self, new: NewProduct) -> Product {
        let product = Product::from_new(self.next_id(), new);
        self.products.push(Record::Product(product.clone()));
        product
    }

    pub fn merge(&mut self, id: u64, patch: ProductPatch) -> Option<Product> {
        let product = self.products.iter_mut().find_map(|r| match r {
            Record::Product(p) if p.id == id => Some(p),
            _ => None,
        })?;
        product.apply(patch);
        Some(product.clone())
    }

    pub fn remove(&mut self, id: u64) -> Option<Product> {
        let index = self
            .products
            .iter()
            .position(|r| r.as_product().is_some_and(|p| p.id == id))?;
        match self.products.remove(index) {
            Record::Product(product) => Some(product),
            Record::Unreadable(_) => None,
        }
    }
}

/// 内存存储，用于测试或不需要持久化的场景
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<Document>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            document: Mutex::new(Document::from_products(products)),
        }
    }

    fn with_document<T>(&self, f: impl FnOnce(&mut Document) -> T) -> Result<T, StoreError> {
        let mut document = self.document.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&mut document))
    }
}

impl ProductStore for MemoryStore {
    fn list(&self) -> Result<Vec<Product>, StoreError> {
        self.with_document(|doc| doc.products().cloned().collect())
    }

    fn find_by_id(&self, id: u64) -> Result<Option<Product>, StoreError> {
        self.with_document(|doc| doc.find(id).cloned())
    }

    fn append(&self, new: NewProduct) -> Result<Product, StoreError> {
        self.with_document(|doc| doc.insert(new))
    }

    fn update_fields(&self, id: u64, patch: ProductPatch) -> Result<Option<Product>, StoreError> {
        self.with_document(|doc| doc.merge(id, patch))
    }

    fn remove(&self, id: u64) -> Result<Option<Product>, StoreError> {
        self.with_document(|doc| doc.remove(id))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            brand: "Acme".to_string(),
            category: "Peripherals".to_string(),
            price: 19.99,
            description: "Wireless optical mouse".to_string(),
            image_filename: None,
            created_at: "2024-05-01T10:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_ids_start_at_one() {
        let store = MemoryStore::new();
        let first = store.append(new_product("Mouse")).unwrap();
        let second = store.append(new_product("Keyboard")).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[test]
    fn test_next_id_follows_max_not_len() {
        let existing = Product::from_new(41, new_product("Monitor"));
        let store = MemoryStore::with_products(vec![existing]);
        let created = store.append(new_product("Mouse")).unwrap();
        assert_eq!(created.id, 42);

        // 删除最大 id 后重新计算
        store.remove(42).unwrap();
        let again = store.append(new_product("Mouse")).unwrap();
        assert_eq!(again.id, 42);
    }

    #[test]
    fn test_find_and_update() {
        let store = MemoryStore::new();
        let created = store.append(new_product("Mouse")).unwrap();

        assert_eq!(store.find_by_id(created.id).unwrap(), Some(created.clone()));
        assert_eq!(store.find_by_id(99).unwrap(), None);

        let patch = ProductPatch {
            name: Some("Trackball".to_string()),
            ..Default::default()
        };
        let updated = store.update_fields(created.id, patch).unwrap().unwrap();
        assert_eq!(updated.name, "Trackball");
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.price, created.price);

        assert!(store
            .update_fields(99, ProductPatch::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_document_keeps_other_collections() {
        let raw = r#"{"products": [], "categories": [{"id": 1, "name": "Peripherals"}]}"#;
        let mut doc: Document = serde_json::from_str(raw).unwrap();
        doc.insert(new_product("Mouse"));

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["categories"][0]["name"], "Peripherals");
        assert_eq!(value["products"][0]["id"], 1);
    }

    #[test]
    fn test_document_without_products_key() {
        let doc: Document = serde_json::from_str("{}").unwrap();
        assert_eq!(doc.products().count(), 0);
        assert_eq!(doc.next_id(), 1);
    }

    #[test]
    fn test_document_keeps_unreadable_records() {
        let raw = r#"{"products": [
            {"id": "1", "name": "Mouse", "price": null},
            {"id": "abc", "name": "Broken"},
            "not a record",
            {"id": 4, "name": "Keyboard", "price": "45"}
        ]}"#;
        let mut doc: Document = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.unreadable_count(), 2);
        assert_eq!(doc.products().map(|p| p.id).collect::<Vec<_>>(), [1, 4]);
        assert_eq!(doc.find(1).unwrap().price, None);
        assert_eq!(doc.next_id(), 5);

        let created = doc.insert(new_product("Trackball"));
        assert_eq!(created.id, 5);

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["products"][1]["id"], "abc");
        assert_eq!(value["products"][2], "not a record");
        assert_eq!(value["products"][4]["name"], "Trackball");
    }
}
