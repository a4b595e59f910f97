//! Catalog persistence: incremental distribution and admin upserts

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;

use crate::error::Result;

use super::types::{CatalogCategory, CatalogProduct, CategoryUpsert, ProductUpsert};

/// Render a watermark timestamp
///
/// Fixed-width UTC so stored watermarks compare correctly as strings; every
/// catalog write and every parsed `since` checkpoint goes through this.
pub fn watermark(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Repository for catalog master data
pub struct CatalogRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CatalogRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Products changed at or after the checkpoint
    ///
    /// The boundary is inclusive: a row whose watermark ties the checkpoint
    /// is redelivered rather than risk being skipped on timestamp-granularity
    /// ties. Clients treat redelivered rows as idempotent upserts.
    pub async fn products_since(&self, since: &str) -> Result<Vec<CatalogProduct>> {
        let products = sqlx::query_as::<_, CatalogProduct>(
            r#"
            SELECT uuid, sku, barcode, name, category, price, tax_rate,
                   active, emoji, track_stock, stock, updated_at
            FROM catalog_products
            WHERE updated_at >= ?
            ORDER BY updated_at DESC
            "#,
        )
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Categories changed at or after the checkpoint
    pub async fn categories_since(&self, since: &str) -> Result<Vec<CatalogCategory>> {
        let categories = sqlx::query_as::<_, CatalogCategory>(
            r#"
            SELECT uuid, name, updated_at
            FROM catalog_categories
            WHERE updated_at >= ?
            ORDER BY updated_at DESC
            "#,
        )
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Bulk upsert products: create if absent, else replace the entire row
    ///
    /// No partial-field patching — a field omitted from the payload resets
    /// to its default rather than silently keeping a stale value. Every
    /// write bumps the watermark to current server time.
    pub async fn upsert_products(&self, products: &[ProductUpsert]) -> Result<usize> {
        let now = watermark(Utc::now());

        for product in products {
            sqlx::query(
                r#"
                INSERT INTO catalog_products (
                    uuid, sku, barcode, name, category, price, tax_rate,
                    active, emoji, track_stock, stock, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(uuid) DO UPDATE SET
                    sku = excluded.sku,
                    barcode = excluded.barcode,
                    name = excluded.name,
                    category = excluded.category,
                    price = excluded.price,
                    tax_rate = excluded.tax_rate,
                    active = excluded.active,
                    emoji = excluded.emoji,
                    track_stock = excluded.track_stock,
                    stock = excluded.stock,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&product.uuid)
            .bind(&product.sku)
            .bind(&product.barcode)
            .bind(&product.name)
            .bind(&product.category)
            .bind(product.price)
            .bind(product.tax_rate)
            .bind(product.active)
            .bind(&product.emoji)
            .bind(product.track_stock)
            .bind(product.stock)
            .bind(&now)
            .execute(self.pool)
            .await?;
        }

        tracing::info!(count = products.len(), "Upserted catalog products");
        Ok(products.len())
    }

    /// Bulk upsert categories, same full-overwrite semantics
    pub async fn upsert_categories(&self, categories: &[CategoryUpsert]) -> Result<usize> {
        let now = watermark(Utc::now());

        for category in categories {
            sqlx::query(
                r#"
                INSERT INTO catalog_categories (uuid, name, updated_at)
                VALUES (?, ?, ?)
                ON CONFLICT(uuid) DO UPDATE SET
                    name = excluded.name,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&category.uuid)
            .bind(&category.name)
            .bind(&now)
            .execute(self.pool)
            .await?;
        }

        Ok(categories.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use chrono::Duration;

    fn product(uuid: &str, name: &str) -> ProductUpsert {
        serde_json::from_value(serde_json::json!({
            "uuid": uuid,
            "name": name,
            "price": 2.5,
            "sku": "SKU-1",
            "category": "drinks"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_upsert_then_pull_from_epoch() {
        let pool = test_pool().await;
        let repo = CatalogRepository::new(&pool);

        repo.upsert_products(&[product("p1", "Espresso")]).await.unwrap();
        repo.upsert_categories(&[CategoryUpsert {
            uuid: "c1".to_string(),
            name: "Drinks".to_string(),
        }])
        .await
        .unwrap();

        let epoch = watermark(DateTime::<Utc>::UNIX_EPOCH);
        let products = repo.products_since(&epoch).await.unwrap();
        let categories = repo.categories_since(&epoch).await.unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Espresso");
        assert!(products[0].active);
        assert_eq!(categories.len(), 1);
    }

    #[tokio::test]
    async fn test_watermark_boundary_is_inclusive() {
        let pool = test_pool().await;
        let repo = CatalogRepository::new(&pool);

        repo.upsert_products(&[product("p1", "Espresso")]).await.unwrap();

        let (stored,): (String,) =
            sqlx::query_as("SELECT updated_at FROM catalog_products WHERE uuid = 'p1'")
                .fetch_one(&pool)
                .await
                .unwrap();

        // since == T includes the row
        assert_eq!(repo.products_since(&stored).await.unwrap().len(), 1);

        // since == T + 1s excludes it
        let t = DateTime::parse_from_rfc3339(&stored).unwrap().with_timezone(&Utc);
        let after = watermark(t + Duration::seconds(1));
        assert_eq!(repo.products_since(&after).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_upsert_is_full_row_overwrite() {
        let pool = test_pool().await;
        let repo = CatalogRepository::new(&pool);

        repo.upsert_products(&[product("p1", "Espresso")]).await.unwrap();

        // Replacement omits sku and category: they must reset, not persist
        let replacement: ProductUpsert = serde_json::from_value(serde_json::json!({
            "uuid": "p1",
            "name": "Espresso Doppio",
            "price": 3.0
        }))
        .unwrap();
        repo.upsert_products(&[replacement]).await.unwrap();

        let epoch = watermark(DateTime::<Utc>::UNIX_EPOCH);
        let products = repo.products_since(&epoch).await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Espresso Doppio");
        assert_eq!(products[0].price, 3.0);
        assert_eq!(products[0].sku, None);
        assert_eq!(products[0].category, None);
    }

    #[tokio::test]
    async fn test_upsert_bumps_watermark() {
        let pool = test_pool().await;
        let repo = CatalogRepository::new(&pool);

        repo.upsert_products(&[product("p1", "Espresso")]).await.unwrap();

        // Backdate, then overwrite; the watermark must move forward again
        sqlx::query("UPDATE catalog_products SET updated_at = '2000-01-01T00:00:00.000000Z'")
            .execute(&pool)
            .await
            .unwrap();
        repo.upsert_products(&[product("p1", "Espresso")]).await.unwrap();

        let (stored,): (String,) =
            sqlx::query_as("SELECT updated_at FROM catalog_products WHERE uuid = 'p1'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(stored > "2000-01-02".to_string());
    }
}
