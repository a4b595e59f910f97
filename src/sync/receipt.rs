//! Receipt number sequencer
//!
//! One counter row per calendar year. The increment runs as a single
//! upsert-returning statement on the order reducer's transaction, so two
//! concurrent order creates can never observe the same prior value: the
//! write either commits with the order it serves or rolls back with it.

use sqlx::SqliteConnection;

/// Receipt prefix; receipt numbers look like `POS-2026-00001`
pub const RECEIPT_PREFIX: &str = "POS";

/// Atomically increment and return the sequence for a year (starts at 1)
pub async fn next_sequence(conn: &mut SqliteConnection, year: i32) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO receipt_counters (year, last_seq)
        VALUES (?, 1)
        ON CONFLICT(year) DO UPDATE SET last_seq = last_seq + 1
        RETURNING last_seq
        "#,
    )
    .bind(year)
    .fetch_one(&mut *conn)
    .await
}

/// Render a receipt number: prefix, year, zero-padded 5-digit sequence
pub fn format_receipt(year: i32, seq: i64) -> String {
    format!("{}-{}-{:05}", RECEIPT_PREFIX, year, seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_fresh_year_starts_at_one() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        assert_eq!(next_sequence(&mut conn, 2026).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sequence_is_gapless_and_monotonic() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let mut seen = Vec::new();
        for _ in 0..10 {
            seen.push(next_sequence(&mut conn, 2026).await.unwrap());
        }

        assert_eq!(seen, (1..=10).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn test_years_count_independently() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        next_sequence(&mut conn, 2025).await.unwrap();
        next_sequence(&mut conn, 2025).await.unwrap();

        assert_eq!(next_sequence(&mut conn, 2026).await.unwrap(), 1);
        assert_eq!(next_sequence(&mut conn, 2025).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_rollback_releases_sequence() {
        let pool = test_pool().await;

        let mut tx = pool.begin().await.unwrap();
        assert_eq!(next_sequence(&mut tx, 2026).await.unwrap(), 1);
        tx.rollback().await.unwrap();

        // An aborted order create must not burn the number
        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(next_sequence(&mut conn, 2026).await.unwrap(), 1);
    }

    #[test]
    fn test_format_receipt() {
        assert_eq!(format_receipt(2026, 1), "POS-2026-00001");
        assert_eq!(format_receipt(2026, 12345), "POS-2026-12345");
    }
}
