use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use super::notification_dto::{NewNotification, NotificationFilter};
use super::notification_models::{Notification, NotificationStatus, NotificationView};
use crate::error::Result;

/// Storage operations over the `notification` table.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Writes a new record; `created_at` and `updated_at` are stamped here.
    async fn insert(&self, new: NewNotification) -> Result<Notification>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Notification>>;

    /// Sets every record of the recipient to read and returns how many matched.
    async fn mark_all_read(&self, to_user_id: i64) -> Result<u64>;

    async fn mark_read(&self, id: i64, to_user_id: i64) -> Result<Option<Notification>>;

    /// Newest first, joined to sender and recipient usernames.
    async fn list_for_recipient(
        &self,
        to_user_id: i64,
        filter: &NotificationFilter,
    ) -> Result<(Vec<NotificationView>, i64)>;

    async fn unread_count(&self, to_user_id: i64) -> Result<i64>;
}

#[derive(Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn insert(&self, new: NewNotification) -> Result<Notification> {
        let now = Utc::now();
        let notification = sqlx::query_as::<_, Notification>(
            "INSERT INTO notification
                (user_id, to_user_id, type, source_id, subject, refer_content, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
             RETURNING *"
        )
        .bind(new.user_id)
        .bind(new.to_user_id)
        .bind(&new.notification_type)
        .bind(new.source_id)
        .bind(&new.subject)
        .bind(&new.refer_content)
        .bind(new.status)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Notification>> {
        let notification = sqlx::query_as::<_, Notification>("SELECT * FROM notification WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(notification)
    }

    async fn mark_all_read(&self, to_user_id: i64) -> Result<u64> {
        // updated_at only moves for rows that actually change
        let result = sqlx::query(
            "UPDATE notification
             SET status = $2,
                 updated_at = CASE WHEN status <> $2 THEN $3 ELSE updated_at END
             WHERE to_user_id = $1"
        )
        .bind(to_user_id)
        .bind(NotificationStatus::Read)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn mark_read(&self, id: i64, to_user_id: i64) -> Result<Option<Notification>> {
        let notification = sqlx::query_as::<_, Notification>(
            "UPDATE notification
             SET status = $3,
                 updated_at = CASE WHEN status <> $3 THEN $4 ELSE updated_at END
             WHERE id = $1 AND to_user_id = $2
             RETURNING *"
        )
        .bind(id)
        .bind(to_user_id)
        .bind(NotificationStatus::Read)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn list_for_recipient(
        &self,
        to_user_id: i64,
        filter: &NotificationFilter,
    ) -> Result<(Vec<NotificationView>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notification
             WHERE to_user_id = $1 AND ($2::INT4 IS NULL OR status = $2)"
        )
        .bind(to_user_id)
        .bind(filter.status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, NotificationView>(
            r#"SELECT n.*,
                      sender.username AS sender_username,
                      recipient.username AS recipient_username
               FROM notification n
               LEFT JOIN "user" sender ON sender.id = n.user_id
               LEFT JOIN "user" recipient ON recipient.id = n.to_user_id
               WHERE n.to_user_id = $1 AND ($2::INT4 IS NULL OR n.status = $2)
               ORDER BY n.created_at DESC, n.id DESC
               LIMIT $3 OFFSET $4"#
        )
        .bind(to_user_id)
        .bind(filter.status)
        .bind(filter.limit())
        .bind(filter.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    async fn unread_count(&self, to_user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notification WHERE to_user_id = $1 AND status = $2"
        )
        .bind(to_user_id)
        .bind(NotificationStatus::Unread)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
