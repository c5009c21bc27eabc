//! Recipient directory operations.
//!
//! Recipients are keyed by Telegram user ID and never hard-deleted; they are
//! deactivated instead.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Recipient, RecipientUpsert};

/// Insert a recipient or refresh an existing one.
///
/// Always marks the recipient active and bumps `last_seen_at`. `joined_at`
/// is kept from the first insert.
pub async fn upsert_recipient(pool: &SqlitePool, recipient: &RecipientUpsert) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO bot_users (user_id, display_name, username, chat_id, is_active)
        VALUES (?, ?, ?, ?, TRUE)
        ON CONFLICT(user_id) DO UPDATE SET
            display_name = excluded.display_name,
            username = excluded.username,
            chat_id = excluded.chat_id,
            is_active = TRUE,
            last_seen_at = datetime('now')
        "#,
    )
    .bind(&recipient.user_id)
    .bind(&recipient.display_name)
    .bind(&recipient.username)
    .bind(&recipient.chat_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a recipient by Telegram user ID.
pub async fn get_recipient(pool: &SqlitePool, user_id: &str) -> Result<Recipient> {
    sqlx::query_as::<_, Recipient>(
        r#"
        SELECT user_id, display_name, username, chat_id, is_active, joined_at, last_seen_at
        FROM bot_users
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Recipient",
        id: user_id.to_string(),
    })
}

/// List all active recipients in join order.
pub async fn list_active_recipients(pool: &SqlitePool) -> Result<Vec<Recipient>> {
    let recipients = sqlx::query_as::<_, Recipient>(
        r#"
        SELECT user_id, display_name, username, chat_id, is_active, joined_at, last_seen_at
        FROM bot_users
        WHERE is_active = TRUE
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(recipients)
}

/// Count active recipients.
pub async fn count_active_recipients(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM bot_users WHERE is_active = TRUE
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Soft-delete a recipient so broadcasts skip them.
pub async fn deactivate_recipient(pool: &SqlitePool, user_id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE bot_users
        SET is_active = FALSE
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Recipient",
            id: user_id.to_string(),
        });
    }

    Ok(())
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

    fn upsert(user_id: &str, name: &str) -> RecipientUpsert {
        RecipientUpsert {
            user_id: user_id.to_string(),
            display_name: name.to_string(),
            username: name.to_lowercase(),
            chat_id: user_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_updates_without_duplicating() {
        let db = test_db().await;
        let pool = db.pool();

        upsert_recipient(pool, &upsert("100", "Alice")).await.unwrap();
        assert_eq!(count_active_recipients(pool).await.unwrap(), 1);

        upsert_recipient(pool, &upsert("100", "Alicia")).await.unwrap();
        upsert_recipient(pool, &upsert("100", "Alicia")).await.unwrap();
        assert_eq!(count_active_recipients(pool).await.unwrap(), 1);

        let fetched = get_recipient(pool, "100").await.unwrap();
        assert_eq!(fetched.display_name, "Alicia");
        assert_eq!(fetched.username, "alicia");
        assert!(fetched.is_active);

        let all = list_active_recipients(pool).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_keeps_joined_at() {
        let db = test_db().await;
        let pool = db.pool();

        upsert_recipient(pool, &upsert("100", "Alice")).await.unwrap();
        sqlx::query("UPDATE bot_users SET joined_at = '2020-01-01 00:00:00', last_seen_at = '2020-01-01 00:00:00'")
            .execute(pool)
            .await
            .unwrap();

        upsert_recipient(pool, &upsert("100", "Alice")).await.unwrap();
        let fetched = get_recipient(pool, "100").await.unwrap();
        assert_eq!(fetched.joined_at, "2020-01-01 00:00:00");
        assert_ne!(fetched.last_seen_at, "2020-01-01 00:00:00");
    }

    #[tokio::test]
    async fn test_deactivate_and_reactivate() {
        let db = test_db().await;
        let pool = db.pool();

        upsert_recipient(pool, &upsert("1", "Alice")).await.unwrap();
        upsert_recipient(pool, &upsert("2", "Bob")).await.unwrap();
        deactivate_recipient(pool, "1").await.unwrap();

        let active = list_active_recipients(pool).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].user_id, "2");
        assert!(!get_recipient(pool, "1").await.unwrap().is_active);

        // Interacting again brings the recipient back.
        upsert_recipient(pool, &upsert("1", "Alice")).await.unwrap();
        assert_eq!(count_active_recipients(pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_missing_recipient() {
        let db = test_db().await;
        let result = get_recipient(db.pool(), "nobody").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));

        let result = deactivate_recipient(db.pool(), "nobody").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }
}
