//! Catalog wire and row types
//!
//! Catalog master data is server-owned ("server wins"): terminals only ever
//! read it through the pull endpoint, and the admin upsert is its only
//! writer.

use serde::{Deserialize, Serialize};

/// A sellable product as distributed to terminals
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CatalogProduct {
    pub uuid: String,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub name: String,
    pub category: Option<String>,
    pub price: f64,
    pub tax_rate: f64,
    pub active: bool,
    pub emoji: Option<String>,
    pub track_stock: bool,
    pub stock: f64,
    /// Watermark used for incremental distribution
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CatalogCategory {
    pub uuid: String,
    pub name: String,
    pub updated_at: String,
}

/// Admin upsert input: a full product row minus the server-owned watermark
#[derive(Debug, Clone, Deserialize)]
pub struct ProductUpsert {
    pub uuid: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub track_stock: bool,
    #[serde(default)]
    pub stock: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryUpsert {
    pub uuid: String,
    pub name: String,
}

fn default_true() -> bool {
    true
}

/// Pull response: everything at or after the client's checkpoint, plus a
/// fresh server-time watermark for the next pull
#[derive(Debug, Clone, Serialize)]
pub struct PullResponse {
    pub products: Vec<CatalogProduct>,
    pub categories: Vec<CatalogCategory>,
    pub updated_at: String,
    pub count: usize,
}

/// Admin upsert response
#[derive(Debug, Clone, Serialize)]
pub struct UpsertResponse {
    pub ok: bool,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_upsert_defaults() {
        let product: ProductUpsert =
            serde_json::from_value(serde_json::json!({"uuid": "p1", "name": "Espresso"})).unwrap();

        assert!(product.active);
        assert!(!product.track_stock);
        assert_eq!(product.price, 0.0);
    }

    #[test]
    fn test_product_upsert_requires_name() {
        let result: Result<ProductUpsert, _> =
            serde_json::from_value(serde_json::json!({"uuid": "p1"}));
        assert!(result.is_err());
    }
}
