//! 商品目录存储
//!
//! 目录是只读的外部协作方，购物车只依赖按 ID 查询商品的能力。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use super::model::{Category, Product};

pub const CATEGORIES_FILE: &str = "categories.json";
pub const PRODUCTS_FILE: &str = "products.json";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("无法读取目录文件 {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("目录文件 {} 格式错误: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError>;

    /// 按分类精确过滤，空字符串视为不过滤
    async fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>, CatalogError>;

    async fn get_product(&self, id: &str) -> Result<Option<Product>, CatalogError> {
        Ok(self
            .list_products(None)
            .await?
            .into_iter()
            .find(|product| product.id == id))
    }
}

fn filter_by_category(products: Vec<Product>, category: Option<&str>) -> Vec<Product> {
    match category.filter(|c| !c.is_empty()) {
        Some(category) => products
            .into_iter()
            .filter(|product| product.category == category)
            .collect(),
        None => products,
    }
}

/// 基于 JSON 文件的目录，每次调用都重新读取文件
#[derive(Debug, Clone)]
pub struct JsonFileCatalog {
    categories_path: PathBuf,
    products_path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            categories_path: data_dir.join(CATEGORIES_FILE),
            products_path: data_dir.join(PRODUCTS_FILE),
        }
    }

    /// 确保数据文件存在，缺失的文件写入空数组
    pub async fn ensure_data_files(&self) -> Result<(), CatalogError> {
        for path in [&self.categories_path, &self.products_path] {
            if tokio::fs::try_exists(path).await.map_err(|e| io_error(path, e))? {
                continue;
            }
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| io_error(parent, e))?;
            }
            tokio::fs::write(path, b"[]")
                .await
                .map_err(|e| io_error(path, e))?;
            info!("已创建空的目录文件: {}", path.display());
        }
        Ok(())
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CatalogError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| io_error(path, e))?;
        debug!("读取目录文件: {}", path.display());
        serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn io_error(path: &Path, source: std::io::Error) -> CatalogError {
    CatalogError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl CatalogStore for JsonFileCatalog {
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        Self::read_json(&self.categories_path).await
    }

    async fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>, CatalogError> {
        let products = Self::read_json(&self.products_path).await?;
        Ok(filter_by_category(products, category))
    }
}

/// 内存目录
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    categories: Vec<Category>,
    products: Vec<Product>,
}

impl InMemoryCatalog {
    pub fn new(categories: Vec<Category>, products: Vec<Product>) -> Self {
        Self {
            categories,
            products,
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.categories.clone())
    }

    async fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>, CatalogError> {
        Ok(filter_by_category(self.products.clone(), category))
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>, CatalogError> {
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }
}
