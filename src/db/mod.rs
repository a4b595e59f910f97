//! Database pool construction and schema initialization

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};

use crate::error::Result;

/// Open (and create if missing) the SQLite database
pub async fn connect(url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(sqlx::Error::from)?
        .create_if_missing(true)
        .foreign_keys(true);

    Ok(SqlitePool::connect_with(options).await?)
}

/// Create all tables and indexes idempotently
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sync_records (
            client_uuid TEXT PRIMARY KEY,
            entity_type TEXT NOT NULL,
            server_id TEXT NOT NULL,
            device_id TEXT NOT NULL DEFAULT '',
            operation TEXT NOT NULL,
            synced_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS orders (
            server_id TEXT PRIMARY KEY,
            client_uuid TEXT NOT NULL UNIQUE,
            device_id TEXT NOT NULL DEFAULT '',
            receipt_number TEXT NOT NULL UNIQUE,
            shift_uuid TEXT,
            cashier_name TEXT,
            customer TEXT NOT NULL DEFAULT 'Walk-in',
            order_date TEXT NOT NULL,
            subtotal REAL NOT NULL DEFAULT 0,
            discount_amount REAL NOT NULL DEFAULT 0,
            tax_amount REAL NOT NULL DEFAULT 0,
            total REAL NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'completed'
                CHECK (status IN ('completed', 'refunded', 'voided')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_orders_client_uuid ON orders(client_uuid);

        CREATE TABLE IF NOT EXISTS order_items (
            id TEXT PRIMARY KEY,
            order_server_id TEXT NOT NULL REFERENCES orders(server_id),
            product_uuid TEXT,
            product_name TEXT,
            qty REAL NOT NULL DEFAULT 0,
            unit_price REAL NOT NULL DEFAULT 0,
            line_discount REAL NOT NULL DEFAULT 0,
            line_total REAL NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items(order_server_id);

        CREATE TABLE IF NOT EXISTS order_payments (
            id TEXT PRIMARY KEY,
            order_server_id TEXT NOT NULL REFERENCES orders(server_id),
            method TEXT NOT NULL DEFAULT 'cash',
            amount REAL NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_order_payments_order ON order_payments(order_server_id);

        CREATE TABLE IF NOT EXISTS refunds (
            server_id TEXT PRIMARY KEY,
            client_uuid TEXT NOT NULL UNIQUE,
            device_id TEXT NOT NULL DEFAULT '',
            order_uuid TEXT NOT NULL,
            order_server_id TEXT REFERENCES orders(server_id),
            reason TEXT NOT NULL DEFAULT '',
            amount REAL NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'processed',
            refund_date TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_refunds_order_uuid ON refunds(order_uuid);

        CREATE TABLE IF NOT EXISTS shifts (
            server_id TEXT PRIMARY KEY,
            client_uuid TEXT NOT NULL UNIQUE,
            device_id TEXT NOT NULL DEFAULT '',
            cashier_id TEXT,
            status TEXT NOT NULL DEFAULT 'open'
                CHECK (status IN ('open', 'closed')),
            opened_at TEXT NOT NULL,
            closed_at TEXT,
            float_amount REAL NOT NULL DEFAULT 0,
            expected_cash REAL,
            counted_cash REAL,
            variance REAL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS cash_events (
            server_id TEXT PRIMARY KEY,
            client_uuid TEXT NOT NULL UNIQUE,
            device_id TEXT NOT NULL DEFAULT '',
            shift_uuid TEXT,
            event_type TEXT NOT NULL CHECK (event_type IN ('in', 'out')),
            amount REAL NOT NULL DEFAULT 0,
            reason TEXT NOT NULL DEFAULT '',
            event_date TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_cash_events_shift ON cash_events(shift_uuid);

        CREATE TABLE IF NOT EXISTS catalog_products (
            uuid TEXT PRIMARY KEY,
            sku TEXT,
            barcode TEXT,
            name TEXT NOT NULL,
            category TEXT,
            price REAL NOT NULL DEFAULT 0,
            tax_rate REAL NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1,
            emoji TEXT,
            track_stock INTEGER NOT NULL DEFAULT 0,
            stock REAL NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_catalog_products_updated ON catalog_products(updated_at);

        CREATE TABLE IF NOT EXISTS catalog_categories (
            uuid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_catalog_categories_updated ON catalog_categories(updated_at);

        CREATE TABLE IF NOT EXISTS receipt_counters (
            year INTEGER PRIMARY KEY,
            last_seq INTEGER NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// In-memory pool for tests
///
/// Capped at one connection: every pooled connection would otherwise open
/// its own private `:memory:` database.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    init_schema(&pool).await.unwrap();
    pool
}
