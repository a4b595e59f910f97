//! Back-office reporting queries
//!
//! Read-only views over synced orders for the admin dashboard: a paginated
//! order listing (with item and payment lines) and an aggregate summary.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderRecord {
    pub server_id: String,
    pub client_uuid: String,
    pub device_id: String,
    pub receipt_number: String,
    pub shift_uuid: Option<String>,
    pub cashier_name: Option<String>,
    pub customer: String,
    pub order_date: String,
    pub subtotal: f64,
    pub discount_amount: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderLineRecord {
    pub id: String,
    pub product_uuid: Option<String>,
    pub product_name: Option<String>,
    pub qty: f64,
    pub unit_price: f64,
    pub line_discount: f64,
    pub line_total: f64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PaymentRecord {
    pub id: String,
    pub method: String,
    pub amount: f64,
}

/// One order with its lines, as returned by the listing
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithLines {
    #[serde(flatten)]
    pub order: OrderRecord,
    pub items: Vec<OrderLineRecord>,
    pub payments: Vec<PaymentRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentMethodTotal {
    pub method: String,
    pub count: i64,
    pub total: f64,
}

/// Aggregate counters over all synced activity
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    /// Non-voided orders
    pub orders: i64,
    pub revenue: f64,
    pub tax: f64,
    pub discount: f64,
    pub refunds: i64,
    pub refund_total: f64,
    pub payments_by_method: Vec<PaymentMethodTotal>,
}

pub struct ReportsRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ReportsRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Newest-first page of orders with their item and payment lines
    pub async fn list_orders(&self, limit: i64, offset: i64) -> Result<Vec<OrderWithLines>> {
        let orders = sqlx::query_as::<_, OrderRecord>(
            r#"
            SELECT server_id, client_uuid, device_id, receipt_number, shift_uuid,
                   cashier_name, customer, order_date, subtotal, discount_amount,
                   tax_amount, total, status, created_at
            FROM orders
            ORDER BY created_at DESC, receipt_number DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = sqlx::query_as::<_, OrderLineRecord>(
                r#"
                SELECT id, product_uuid, product_name, qty, unit_price,
                       line_discount, line_total
                FROM order_items
                WHERE order_server_id = ?
                "#,
            )
            .bind(&order.server_id)
            .fetch_all(self.pool)
            .await?;

            let payments = sqlx::query_as::<_, PaymentRecord>(
                "SELECT id, method, amount FROM order_payments WHERE order_server_id = ?",
            )
            .bind(&order.server_id)
            .fetch_all(self.pool)
            .await?;

            result.push(OrderWithLines {
                order,
                items,
                payments,
            });
        }

        Ok(result)
    }

    pub async fn count_orders(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    pub async fn summary(&self) -> Result<SummaryReport> {
        let (orders, revenue, tax, discount): (i64, f64, f64, f64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(total), 0.0),
                   COALESCE(SUM(tax_amount), 0.0),
                   COALESCE(SUM(discount_amount), 0.0)
            FROM orders
            WHERE status != 'voided'
            "#,
        )
        .fetch_one(self.pool)
        .await?;

        let (refunds, refund_total): (i64, f64) =
            sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(amount), 0.0) FROM refunds")
                .fetch_one(self.pool)
                .await?;

        let payments_by_method: Vec<(String, i64, f64)> = sqlx::query_as(
            r#"
            SELECT method, COUNT(*), COALESCE(SUM(amount), 0.0)
            FROM order_payments
            GROUP BY method
            ORDER BY method
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(SummaryReport {
            orders,
            revenue,
            tax,
            discount,
            refunds,
            refund_total,
            payments_by_method: payments_by_method
                .into_iter()
                .map(|(method, count, total)| PaymentMethodTotal {
                    method,
                    count,
                    total,
                })
                .collect(),
        })
    }
}
