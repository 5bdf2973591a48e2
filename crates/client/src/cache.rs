//! Last-good product list kept on disk for offline use.
//!
//! Every successful product fetch overwrites the snapshot. When the API
//! cannot be reached, [`ApiClient::products`](crate::ApiClient::products)
//! serves the snapshot instead so inventory stays viewable.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use lpg_core::Product;
use serde::{Deserialize, Serialize};

use crate::ClientError;

/// A product list as it was last fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedProducts {
    /// When the list was fetched from the API.
    pub fetched_at: DateTime<Utc>,
    pub products: Vec<Product>,
}

/// JSON snapshot file of the product list.
#[derive(Debug, Clone)]
pub struct ProductCache {
    path: PathBuf,
}

impl ProductCache {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. A missing file is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Cache` or `ClientError::Parse` if the file cannot
    /// be read or decoded.
    pub async fn load(&self) -> Result<Option<CachedProducts>, ClientError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the snapshot with `products`, stamped now.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Cache` if the file cannot be written.
    pub async fn store(&self, products: &[Product]) -> Result<(), ClientError> {
        let snapshot = CachedProducts {
            fetched_at: Utc::now(),
            products: products.to_vec(),
        };
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        // Write then rename so a crash never leaves a half-written snapshot
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec(&snapshot)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lpg_core::{NewProduct, ProductId};
    use rust_decimal::Decimal;

    use super::*;

    fn scratch(name: &str) -> ProductCache {
        let dir = std::env::temp_dir().join(format!("lpg-client-{}-{name}", std::process::id()));
        ProductCache::new(dir.join("products.json"))
    }

    fn product(name: &str) -> Product {
        Product::create(
            ProductId::generate(),
            NewProduct {
                name: name.to_string(),
                category: "Cylinders".to_string(),
                quantity: 3,
                price: Decimal::new(95_000, 2),
                low_stock_threshold: None,
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_none() {
        assert!(scratch("missing").load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_replaces_snapshot() {
        let cache = scratch("replace");
        cache.store(&[product("11kg Tank"), product("Hose")]).await.unwrap();
        cache.store(&[product("Regulator")]).await.unwrap();

        let snapshot = cache.load().await.unwrap().unwrap();
        assert_eq!(snapshot.products.len(), 1);
        assert_eq!(snapshot.products[0].name, "Regulator");
        assert!(snapshot.fetched_at <= Utc::now());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_error() {
        let cache = scratch("corrupt");
        tokio::fs::create_dir_all(cache.path().parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(cache.path(), b"not json").await.unwrap();
        assert!(matches!(cache.load().await, Err(ClientError::Parse(_))));
    }
}
