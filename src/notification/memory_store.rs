use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::notification_dto::{NewNotification, NotificationFilter};
use super::notification_models::{Notification, NotificationStatus, NotificationView};
use super::notification_repository::NotificationStore;
use crate::error::{AppError, Result};

/// In-process store backed by a `DashMap`, with the same semantics as the
/// Postgres store. Usernames for joined views are registered with `add_user`.
#[derive(Clone, Default)]
pub struct MemoryNotificationStore {
    notifications: Arc<DashMap<i64, Notification>>,
    users: Arc<DashMap<i64, String>>,
    next_id: Arc<AtomicI64>,
    offline: Arc<AtomicBool>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, id: i64, username: impl Into<String>) {
        self.users.insert(id, username.into());
    }

    /// While offline every operation fails with a persistence error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("notification store is offline".to_string()));
        }
        Ok(())
    }

    fn username(&self, id: i64) -> Option<String> {
        self.users.get(&id).map(|name| name.value().clone())
    }

    fn mark_entry_read(notification: &mut Notification) {
        if notification.status != NotificationStatus::Read {
            notification.status = NotificationStatus::Read;
            notification.updated_at = Utc::now();
        }
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, new: NewNotification) -> Result<Notification> {
        self.ensure_online()?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let notification = Notification {
            id,
            user_id: new.user_id,
            to_user_id: new.to_user_id,
            notification_type: new.notification_type,
            source_id: new.source_id,
            subject: new.subject,
            refer_content: new.refer_content,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        self.notifications.insert(id, notification.clone());

        Ok(notification)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Notification>> {
        self.ensure_online()?;
        Ok(self.notifications.get(&id).map(|entry| entry.value().clone()))
    }

    async fn mark_all_read(&self, to_user_id: i64) -> Result<u64> {
        self.ensure_online()?;

        let mut matched = 0;
        for mut entry in self.notifications.iter_mut() {
            if entry.to_user_id == to_user_id {
                Self::mark_entry_read(entry.value_mut());
                matched += 1;
            }
        }

        Ok(matched)
    }

    async fn mark_read(&self, id: i64, to_user_id: i64) -> Result<Option<Notification>> {
        self.ensure_online()?;

        let Some(mut entry) = self.notifications.get_mut(&id) else {
            return Ok(None);
        };
        if entry.to_user_id != to_user_id {
            return Ok(None);
        }
        Self::mark_entry_read(entry.value_mut());

        Ok(Some(entry.value().clone()))
    }

    async fn list_for_recipient(
        &self,
        to_user_id: i64,
        filter: &NotificationFilter,
    ) -> Result<(Vec<NotificationView>, i64)> {
        self.ensure_online()?;

        let mut matching: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|entry| entry.to_user_id == to_user_id)
            .filter(|entry| filter.status.map_or(true, |status| entry.status == status))
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by_key(|n| Reverse((n.created_at, n.id)));

        let total = matching.len() as i64;
        let views = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit() as usize)
            .map(|notification| NotificationView {
                sender_username: notification.user_id.and_then(|id| self.username(id)),
                recipient_username: self.username(notification.to_user_id),
                notification,
            })
            .collect();

        Ok((views, total))
    }

    async fn unread_count(&self, to_user_id: i64) -> Result<i64> {
        self.ensure_online()?;

        let count = self
            .notifications
            .iter()
            .filter(|entry| entry.to_user_id == to_user_id && entry.status == NotificationStatus::Unread)
            .count();

        Ok(count as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::notification_dto::CreateNotification;

    fn new_for(to_user_id: i64, status: NotificationStatus) -> NewNotification {
        let mut new = CreateNotification::new(to_user_id, "follow_user").into_new().unwrap();
        new.status = status;
        new
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_and_timestamps() {
        let store = MemoryNotificationStore::new();
        let first = store.insert(new_for(1, NotificationStatus::Unread)).await.unwrap();
        let second = store.insert(new_for(1, NotificationStatus::Unread)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.created_at, first.updated_at);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_mark_read_leaves_read_rows_untouched() {
        let store = MemoryNotificationStore::new();
        let read = store.insert(new_for(1, NotificationStatus::Read)).await.unwrap();

        assert_eq!(store.mark_all_read(1).await.unwrap(), 1);
        let after = store.find_by_id(read.id).await.unwrap().unwrap();
        assert_eq!(after, read);
    }

    #[tokio::test]
    async fn test_mark_read_checks_recipient() {
        let store = MemoryNotificationStore::new();
        let n = store.insert(new_for(1, NotificationStatus::Unread)).await.unwrap();

        assert!(store.mark_read(n.id, 2).await.unwrap().is_none());
        assert!(store.mark_read(999, 1).await.unwrap().is_none());
        let marked = store.mark_read(n.id, 1).await.unwrap().unwrap();
        assert!(marked.is_read());
    }

    #[tokio::test]
    async fn test_views_join_usernames() {
        let store = MemoryNotificationStore::new();
        store.add_user(1, "alice");
        store.add_user(2, "bob");

        let mut new = new_for(2, NotificationStatus::Unread);
        new.user_id = Some(1);
        store.insert(new).await.unwrap();
        store.insert(new_for(2, NotificationStatus::Unread)).await.unwrap();

        let (views, total) = store
            .list_for_recipient(2, &NotificationFilter::default())
            .await
            .unwrap();
        assert_eq!(total, 2);
        // newest first
        assert_eq!(views[0].sender_username, None);
        assert_eq!(views[1].sender_username.as_deref(), Some("alice"));
        assert!(views.iter().all(|v| v.recipient_username.as_deref() == Some("bob")));
    }

    #[tokio::test]
    async fn test_offline_store_fails_with_persistence_error() {
        let store = MemoryNotificationStore::new();
        store.set_offline(true);

        let err = store.insert(new_for(1, NotificationStatus::Unread)).await.unwrap_err();
        assert!(err.is_persistence());
        assert!(store.mark_all_read(1).await.unwrap_err().is_persistence());

        store.set_offline(false);
        assert!(store.insert(new_for(1, NotificationStatus::Unread)).await.is_ok());
    }
}
