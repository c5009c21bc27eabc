//! Stock observation history.
//!
//! Rows are append-only. The newest row (highest ID) is the baseline for the
//! next delta computation.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::{NewObservation, StockObservation};

/// Append a stock observation and return its ID.
pub async fn append_observation(pool: &SqlitePool, observation: &NewObservation) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO stock_history (total_stock, men_count, women_count, stock_change, notified)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(observation.total_stock)
    .bind(observation.men_count)
    .bind(observation.women_count)
    .bind(observation.stock_change)
    .bind(observation.notified)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Get the most recent observation, if any.
pub async fn latest_observation(pool: &SqlitePool) -> Result<Option<StockObservation>> {
    let record = sqlx::query_as::<_, StockObservation>(
        r#"
        SELECT id, created_at, total_stock, men_count, women_count, stock_change, notified
        FROM stock_history
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Count all observations.
pub async fn count_observations(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM stock_history
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn test_db() -> Database {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn observation(men: i64, women: i64) -> NewObservation {
        NewObservation {
            total_stock: men + women,
            men_count: men,
            women_count: women,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_latest_observation_empty() {
        let db = test_db().await;
        assert!(latest_observation(db.pool()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_observation_follows_insertion_order() {
        let db = test_db().await;

        // Same-second inserts share a timestamp, so ordering must rely on the ID.
        for (men, women) in [(3, 10), (9, 2), (1, 40), (5, 5)] {
            append_observation(db.pool(), &observation(men, women))
                .await
                .unwrap();
            let latest = latest_observation(db.pool()).await.unwrap().unwrap();
            assert_eq!(latest.men_count, men);
            assert_eq!(latest.women_count, women);
            assert_eq!(latest.total_stock, men + women);
        }

        assert_eq!(count_observations(db.pool()).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_observation_fields_round_trip() {
        let db = test_db().await;
        let id = append_observation(
            db.pool(),
            &NewObservation {
                total_stock: 12,
                men_count: 7,
                women_count: 5,
                stock_change: 2,
                notified: true,
            },
        )
        .await
        .unwrap();

        let latest = latest_observation(db.pool()).await.unwrap().unwrap();
        assert_eq!(latest.id, id);
        assert_eq!(latest.stock_change, 2);
        assert!(latest.notified);
        assert!(!latest.created_at.is_empty());
    }
}
