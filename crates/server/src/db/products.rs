//! Product repository.
//!
//! Products live under `product:<id>`. IDs are generated by the server when a
//! product is created (see [`ProductId::generate`]).

use serde_json::Value;
use tracing::{instrument, warn};

use lpg_core::{Product, ProductId};

use super::{KvStore, RepositoryError, StoreError, decode};

/// Key namespace for products.
pub const PRODUCT_PREFIX: &str = "product:";

/// Store key for a product.
#[must_use]
pub fn product_key(id: &ProductId) -> String {
    format!("{PRODUCT_PREFIX}{id}")
}

/// Repository for product records.
pub struct ProductRepository<'a> {
    store: &'a dyn KvStore,
}

impl<'a> ProductRepository<'a> {
    /// Create a new repository over a store.
    #[must_use]
    pub const fn new(store: &'a dyn KvStore) -> Self {
        Self { store }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the record is malformed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let key = product_key(id);
        match self.store.get(&key).await? {
            Some(value) => decode(&key, value).map(Some),
            None => Ok(None),
        }
    }

    /// Create or replace a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn put(&self, product: &Product) -> Result<(), RepositoryError> {
        let value = serde_json::to_value(product).map_err(StoreError::from)?;
        self.store.set(&product_key(&product.id), value).await?;
        Ok(())
    }

    /// Write many products in one call.
    ///
    /// # Errors
    ///
    /// Returns an error if any product fails to encode or the store fails.
    #[instrument(skip(self, products), fields(count = products.len()))]
    pub async fn put_many(&self, products: &[Product]) -> Result<(), RepositoryError> {
        let mut entries = Vec::with_capacity(products.len());
        for product in products {
            let value = serde_json::to_value(product).map_err(StoreError::from)?;
            entries.push((product_key(&product.id), value));
        }
        self.store.set_many(entries).await?;
        Ok(())
    }

    /// Delete a product. Deleting an absent product is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        self.store.del(&product_key(id)).await?;
        Ok(())
    }

    /// List every product, in no particular order.
    ///
    /// Malformed values under the namespace are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let values = self.store.get_by_prefix(PRODUCT_PREFIX).await?;
        Ok(decode_all(values))
    }

    /// Whether any value exists under the product namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn any_exists(&self) -> Result<bool, RepositoryError> {
        Ok(!self.store.get_by_prefix(PRODUCT_PREFIX).await?.is_empty())
    }
}

fn decode_all(values: Vec<Value>) -> Vec<Product> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Product>(value) {
            Ok(product) => Some(product),
            Err(e) => {
                warn!(error = %e, "Skipping malformed product record");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use lpg_core::NewProduct;
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::MemoryStore;

    fn product(id: &str, name: &str) -> Product {
        Product::create(
            ProductId::new(id),
            NewProduct {
                name: name.to_owned(),
                category: "LPG Cylinder".to_owned(),
                quantity: 10,
                price: Decimal::new(95000, 2),
                low_stock_threshold: None,
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        let repo = ProductRepository::new(&store);
        let p = product("1", "11kg Cylinder");

        assert!(!repo.any_exists().await.unwrap());
        repo.put(&p).await.unwrap();
        assert!(repo.any_exists().await.unwrap());
        assert_eq!(repo.get(&p.id).await.unwrap(), Some(p.clone()));

        repo.delete(&p.id).await.unwrap();
        assert_eq!(repo.get(&p.id).await.unwrap(), None);
        assert!(!repo.any_exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_put_many_and_list() {
        let store = MemoryStore::new();
        let repo = ProductRepository::new(&store);
        repo.put_many(&[product("a", "Regulator"), product("b", "Hose")])
            .await
            .unwrap();

        let mut names: Vec<_> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["Hose", "Regulator"]);
    }

    #[tokio::test]
    async fn test_any_exists_counts_malformed_values() {
        let store = MemoryStore::new();
        store
            .set("product:junk", serde_json::json!(null))
            .await
            .unwrap();
        let repo = ProductRepository::new(&store);
        assert!(repo.any_exists().await.unwrap());
        assert!(repo.list_all().await.unwrap().is_empty());
    }
}
