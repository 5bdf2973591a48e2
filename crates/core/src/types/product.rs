//! Product inventory record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ProductId;

/// Quantity at or below which a product counts as low stock when the record
/// carries no threshold of its own.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 20;

/// A product as stored under `product:<id>`.
///
/// Prices are decimal amounts serialized as JSON numbers for compatibility
/// with existing clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Per-product low stock threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Build a new record from `draft`, stamping both timestamps with `now`.
    #[must_use]
    pub fn create(id: ProductId, draft: NewProduct, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            category: draft.category,
            quantity: draft.quantity,
            price: draft.price,
            low_stock_threshold: draft.low_stock_threshold,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge `patch` over this record and refresh `updated_at`.
    ///
    /// The `id` and `created_at` fields are never touched.
    #[must_use]
    pub fn apply(mut self, patch: ProductPatch, now: DateTime<Utc>) -> Self {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(threshold) = patch.low_stock_threshold {
            self.low_stock_threshold = Some(threshold);
        }
        self.updated_at = now;
        self
    }

    /// Threshold in effect for this product.
    #[must_use]
    pub fn low_stock_threshold(&self) -> i32 {
        self.low_stock_threshold
            .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD)
    }

    /// Whether the quantity on hand is at or below the threshold.
    #[must_use]
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.low_stock_threshold()
    }

    /// Whether `needle` occurs (case-insensitively) in the name or category.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle) || self.category.to_lowercase().contains(&needle)
    }
}

/// Fields required to create a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<i32>,
}

/// Partial update for a [`Product`]. Absent fields keep their current value.
///
/// Unknown fields, including `id` and `createdAt`, are ignored on
/// deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<i32>,
}

impl ProductPatch {
    /// Whether the patch changes nothing but the update timestamp.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.quantity.is_none()
            && self.price.is_none()
            && self.low_stock_threshold.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn hose(quantity: i32) -> Product {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Product::create(
            ProductId::new("1-abc"),
            NewProduct {
                name: "LPG Hose".to_owned(),
                category: "Accessories".to_owned(),
                quantity,
                price: Decimal::new(15000, 2),
                low_stock_threshold: None,
            },
            now,
        )
    }

    #[test]
    fn test_price_is_json_number() {
        let json = serde_json::to_value(hose(50)).unwrap();
        assert!(json["price"].is_number());
        assert_eq!(json["price"].as_f64(), Some(150.0));
        assert_eq!(json["createdAt"], json["updatedAt"]);
    }

    #[test]
    fn test_new_product_from_source_shape() {
        let draft: NewProduct = serde_json::from_str(
            r#"{"name":"O-ring","category":"Accessories","quantity":100,"price":25.0}"#,
        )
        .unwrap();
        assert_eq!(draft.price, Decimal::new(25, 0));
        assert_eq!(draft.low_stock_threshold, None);
    }

    #[test]
    fn test_apply_preserves_id_and_created_at() {
        let product = hose(50);
        let later = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let patch: ProductPatch =
            serde_json::from_str(r#"{"id":"hijack","quantity":3,"price":175.5}"#).unwrap();
        let updated = product.clone().apply(patch, later);

        assert_eq!(updated.id, product.id);
        assert_eq!(updated.created_at, product.created_at);
        assert_eq!(updated.updated_at, later);
        assert_eq!(updated.quantity, 3);
        assert_eq!(updated.price, Decimal::new(1755, 1));
        assert_eq!(updated.name, "LPG Hose");
    }

    #[test]
    fn test_low_stock_default_threshold() {
        assert!(hose(20).is_low_stock());
        assert!(hose(5).is_low_stock());
        assert!(!hose(21).is_low_stock());
    }

    #[test]
    fn test_low_stock_custom_threshold() {
        let mut product = hose(30);
        product.low_stock_threshold = Some(40);
        assert!(product.is_low_stock());
        product.low_stock_threshold = Some(10);
        assert!(!product.is_low_stock());
    }

    #[test]
    fn test_matches_name_or_category() {
        let product = hose(1);
        assert!(product.matches("hose"));
        assert!(product.matches("ACCESS"));
        assert!(!product.matches("stove"));
    }

    #[test]
    fn test_empty_patch() {
        assert!(ProductPatch::default().is_empty());
        let patch: ProductPatch = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert!(!patch.is_empty());
    }
}
