//! 平面 JSON 文件存储

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use super::store::{Document, ProductStore, StoreError};
use crate::app::product::model::{NewProduct, Product, ProductPatch};

/// 以单个 JSON 文件为后端的产品存储
///
/// 文档常驻内存；每次写操作把整个文档写入临时文件、fsync 后 rename 覆盖原文件，
/// 成功后才更新内存中的文档。
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    document: Mutex<Document>,
}

impl JsonFileStore {
    /// 打开存储文件，不存在时创建 `{"products": []}`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let document = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Document::default()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let document = Document::default();
            persist(&path, &document)?;
            info!("created store file {}", path.display());
            document
        };

        debug!(
            "opened store {} with {} products",
            path.display(),
            document.products().count()
        );
        let unreadable = document.unreadable_count();
        if unreadable > 0 {
            warn!(
                "{} records in {} are not valid products and will be kept as-is",
                unreadable,
                path.display()
            );
        }

        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read<T>(&self, f: impl FnOnce(&Document) -> T) -> Result<T, StoreError> {
        let document = self.document.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&document))
    }

    /// 在副本上修改并落盘，失败时内存文档保持不变
    fn write<T>(&self, f: impl FnOnce(&mut Document) -> T) -> Result<T, StoreError> {
        let mut document = self.document.lock().map_err(|_| StoreError::Poisoned)?;
        let mut next = document.clone();
        let out = f(&mut next);
        persist(&self.path, &next)?;
        *document = next;
        Ok(out)
    }
}

fn persist(path: &Path, document: &Document) -> Result<(), StoreError> {
    let content = serde_json::to_vec_pretty(document)?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut file: File = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp_path)?;
    file.write_all(&content)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)?;
    Ok(())
}

impl ProductStore for JsonFileStore {
    fn list(&self) -> Result<Vec<Product>, StoreError> {
        self.read(|doc| doc.products().cloned().collect())
    }

    fn find_by_id(&self, id: u64) -> Result<Option<Product>, StoreError> {
        self.read(|doc| doc.find(id).cloned())
    }

    fn append(&self, new: NewProduct) -> Result<Product, StoreError> {
        self.write(|doc| doc.insert(new))
    }

    fn update_fields(&self, id: u64, patch: ProductPatch) -> Result<Option<Product>, StoreError> {
        if self.read(|doc| doc.find(id).is_none())? {
            return Ok(None);
        }
        self.write(|doc| doc.merge(id, patch))
    }

    fn remove(&self, id: u64) -> Result<Option<Product>, StoreError> {
        if self.read(|doc| doc.find(id).is_none())? {
            return Ok(None);
        }
        self.write(|doc| doc.remove(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::store::tests::new_product;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("db.json");

        let store = JsonFileStore::open(&path).unwrap();
        assert!(path.exists());
        assert!(store.list().unwrap().is_empty());

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({ "products": [] }));
    }

    #[test]
    fn test_open_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, "").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_open_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(JsonFileStore::open(&path), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_writes_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");

        let store = JsonFileStore::open(&path).unwrap();
        let created = store.append(new_product("Mouse")).unwrap();
        store
            .update_fields(
                created.id,
                ProductPatch {
                    price: Some(25.0),
                    ..Default::default()
                },
            )
            .unwrap();
        store.append(new_product("Keyboard")).unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        let products = reopened.list().unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].price, Some(25.0));
        assert_eq!(products[0].created_at, created.created_at);
        assert_eq!(products[1].id, 2);
        assert!(!dir.path().join("db.json.tmp").exists());
    }

    #[test]
    fn test_preserves_other_collections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(
            &path,
            r#"{"products": [], "orders": [{"id": 1, "total": 10}]}"#,
        )
        .unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        store.append(new_product("Mouse")).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["orders"][0]["total"], 10);
        assert_eq!(value["products"][0]["name"], "Mouse");
    }

    #[test]
    fn test_remove() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("db.json")).unwrap();
        let created = store.append(new_product("Mouse")).unwrap();

        assert_eq!(store.remove(created.id).unwrap(), Some(created));
        assert_eq!(store.remove(1).unwrap(), None);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_open_legacy_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(
            &path,
            r#"{"products": [
                {"id": "1", "name": "Mouse", "brand": "Acme", "category": "Peripherals",
                 "price": "19.99", "description": "Wireless optical mouse",
                 "createdAt": "2024-05-01T10:00:00.000Z"},
                {"id": 2, "name": "Keyboard", "brand": "Acme", "category": "Peripherals",
                 "price": null, "description": "Mechanical keyboard",
                 "createdAt": "2024-05-02T10:00:00.000Z"}
            ]}"#,
        )
        .unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.find_by_id(1).unwrap().unwrap().price, Some(19.99));
        assert_eq!(store.find_by_id(2).unwrap().unwrap().price, None);

        let updated = store
            .update_fields(
                2,
                ProductPatch {
                    price: Some(45.0),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.price, Some(45.0));
        assert_eq!(store.append(new_product("Trackball")).unwrap().id, 3);
    }

    #[test]
    fn test_open_keeps_unreadable_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(
            &path,
            r#"{"products": [{"id": "first", "name": "Broken"}, {"id": 1, "name": "Mouse"}]}"#,
        )
        .unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
        store.append(new_product("Keyboard")).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["products"][0]["id"], "first");
        assert_eq!(value["products"][2]["id"], 2);
    }
}
