//! Notification dedup log.

use std::time::Duration;

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Category, NotificationRecord};

/// Check whether an alert for this exact level was sent within `window`.
pub async fn has_recent_notification(
    pool: &SqlitePool,
    category: Category,
    stock_level: i64,
    window: Duration,
) -> Result<bool> {
    let modifier = format!("-{} seconds", window.as_secs());
    let result = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT id
        FROM stock_notifications
        WHERE stock_level = ?
          AND notification_type = ?
          AND created_at > datetime('now', ?)
        LIMIT 1
        "#,
    )
    .bind(stock_level)
    .bind(category.as_str())
    .bind(modifier)
    .fetch_optional(pool)
    .await?;

    Ok(result.is_some())
}

/// Record that an alert was sent for this level. Returns the record ID.
pub async fn record_notification(
    pool: &SqlitePool,
    category: Category,
    stock_level: i64,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO stock_notifications (stock_level, notification_type)
        VALUES (?, ?)
        "#,
    )
    .bind(stock_level)
    .bind(category.as_str())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Store how many recipients a recorded alert reached.
pub async fn set_notified_count(pool: &SqlitePool, id: i64, notified_count: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE stock_notifications
        SET notified_count = ?
        WHERE id = ?
        "#,
    )
    .bind(notified_count)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "StockNotification",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// List the most recent dedup records, newest first.
pub async fn list_notifications(pool: &SqlitePool, limit: i64) -> Result<Vec<NotificationRecord>> {
    let records = sqlx::query_as::<_, NotificationRecord>(
        r#"
        SELECT id, stock_level, notification_type, created_at, notified_count
        FROM stock_notifications
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    const HOUR: Duration = Duration::from_secs(3600);

    async fn test_db() -> Database {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db
    }

    async fn backdate(db: &Database, id: i64, modifier: &str) {
        sqlx::query("UPDATE stock_notifications SET created_at = datetime('now', ?) WHERE id = ?")
            .bind(modifier)
            .bind(id)
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_recent_notification_matches_exact_level_and_category() {
        let db = test_db().await;
        record_notification(db.pool(), Category::Men, 7).await.unwrap();

        let pool = db.pool();
        assert!(has_recent_notification(pool, Category::Men, 7, HOUR).await.unwrap());
        assert!(!has_recent_notification(pool, Category::Men, 8, HOUR).await.unwrap());
        assert!(!has_recent_notification(pool, Category::Women, 7, HOUR).await.unwrap());
    }

    #[tokio::test]
    async fn test_notification_expires_after_window() {
        let db = test_db().await;
        let id = record_notification(db.pool(), Category::Women, 120).await.unwrap();
        backdate(&db, id, "-61 minutes").await;

        assert!(!has_recent_notification(db.pool(), Category::Women, 120, HOUR)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_notification_inside_window_still_counts() {
        let db = test_db().await;
        let id = record_notification(db.pool(), Category::Men, 3).await.unwrap();
        backdate(&db, id, "-59 minutes").await;

        assert!(has_recent_notification(db.pool(), Category::Men, 3, HOUR)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_set_notified_count() {
        let db = test_db().await;
        let id = record_notification(db.pool(), Category::Men, 4).await.unwrap();
        set_notified_count(db.pool(), id, 12).await.unwrap();

        let records = list_notifications(db.pool(), 10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].notified_count, 12);
        assert_eq!(Category::from_db(&records[0].notification_type), Some(Category::Men));

        let missing = set_notified_count(db.pool(), id + 100, 1).await;
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));
    }
}
