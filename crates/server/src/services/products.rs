//! Product inventory service.

use chrono::Utc;
use tracing::instrument;

use lpg_core::{NewProduct, Product, ProductId, ProductPatch};

use crate::db::ProductRepository;
use crate::db::kv::KvStore;
use crate::error::{AppError, Result};

/// Product CRUD over the store.
///
/// Authorization is the caller's job: listing is public, create and delete
/// need an admin, update needs any signed-in user.
pub struct ProductService<'a> {
    products: ProductRepository<'a>,
}

impl<'a> ProductService<'a> {
    /// Create a new product service.
    #[must_use]
    pub const fn new(store: &'a dyn KvStore) -> Self {
        Self {
            products: ProductRepository::new(store),
        }
    }

    /// All products, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn list(&self) -> Result<Vec<Product>> {
        Ok(self.products.list_all().await?)
    }

    /// Create a product with a fresh ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create(&self, draft: NewProduct) -> Result<Product> {
        let product = Product::create(ProductId::generate(), draft, Utc::now());
        self.products.put(&product).await?;
        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Merge `patch` over an existing product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no product has this ID.
    #[instrument(skip(self, patch), fields(product_id = %id))]
    pub async fn update(&self, id: &ProductId, patch: ProductPatch) -> Result<Product> {
        let existing = self
            .products
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        let updated = existing.apply(patch, Utc::now());
        self.products.put(&updated).await?;
        Ok(updated)
    }

    /// Delete a product. Unknown IDs succeed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<()> {
        self.products.delete(id).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::MemoryStore;

    fn draft(name: &str, quantity: i32) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            category: "Accessories".to_string(),
            quantity,
            price: Decimal::new(15000, 2),
            low_stock_threshold: None,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let store = MemoryStore::new();
        let service = ProductService::new(&store);

        let product = service.create(draft("LPG Hose", 50)).await.unwrap();
        assert!(!product.id.as_str().is_empty());
        assert_eq!(product.created_at, product.updated_at);
        assert_eq!(service.list().await.unwrap(), vec![product]);
    }

    #[tokio::test]
    async fn test_update_keeps_id_and_created_at() {
        let store = MemoryStore::new();
        let service = ProductService::new(&store);
        let product = service.create(draft("LPG Hose", 50)).await.unwrap();

        let patch: ProductPatch = serde_json::from_value(serde_json::json!({
            "id": "hijack",
            "quantity": 3,
            "createdAt": "1999-01-01T00:00:00Z"
        }))
        .unwrap();
        let updated = service.update(&product.id, patch).await.unwrap();

        assert_eq!(updated.id, product.id);
        assert_eq!(updated.created_at, product.created_at);
        assert_eq!(updated.quantity, 3);
        assert_eq!(updated.name, "LPG Hose");
        assert!(updated.updated_at >= product.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = MemoryStore::new();
        let service = ProductService::new(&store);
        let err = service
            .update(&ProductId::new("nope"), ProductPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Product not found"));
    }

    #[tokio::test]
    async fn test_list_after_creates_and_deletes() {
        let store = MemoryStore::new();
        let service = ProductService::new(&store);

        let mut ids = Vec::new();
        for i in 0..7 {
            ids.push(service.create(draft(&format!("p{i}"), i)).await.unwrap().id);
        }
        for id in &ids[..3] {
            service.delete(id).await.unwrap();
        }
        service.delete(&ProductId::new("never-existed")).await.unwrap();

        assert_eq!(service.list().await.unwrap().len(), 4);
    }
}
