use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::notification_dto::{CreateNotification, NotificationFilter, Page};
use super::notification_models::{resolve_type_label, Notification, NotificationView};
use super::notification_repository::NotificationStore;
use crate::error::{AppError, Result};

/// Entry point used by the rest of the application to record and read notifications.
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    events: broadcast::Sender<Notification>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>, channel_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(channel_capacity.max(1));
        Self { store, events }
    }

    /// Receives every notification created after the call.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }

    pub async fn create(&self, attributes: CreateNotification) -> Result<Notification> {
        let new = attributes.into_new().map_err(|e| {
            warn!("Rejected notification: {}", e);
            e
        })?;

        let notification = self.store.insert(new).await?;
        info!(
            id = notification.id,
            to_user_id = notification.to_user_id,
            notification_type = %notification.notification_type,
            "Created notification"
        );

        // no subscribers is fine
        let _ = self.events.send(notification.clone());

        Ok(notification)
    }

    pub async fn create_from_attributes(&self, attributes: serde_json::Value) -> Result<Notification> {
        self.create(CreateNotification::from_attributes(attributes)?).await
    }

    pub async fn mark_all_read(&self, to_user_id: i64) -> Result<u64> {
        let affected = self.store.mark_all_read(to_user_id).await?;
        info!(to_user_id, affected, "Marked all notifications read");
        Ok(affected)
    }

    pub async fn mark_read(&self, id: i64, to_user_id: i64) -> Result<Notification> {
        self.store
            .mark_read(id, to_user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".into()))
    }

    pub async fn list(&self, to_user_id: i64, filter: NotificationFilter) -> Result<Page<NotificationView>> {
        let (data, total) = self.store.list_for_recipient(to_user_id, &filter).await?;
        debug!(to_user_id, total, returned = data.len(), "Listed notifications");

        Ok(Page {
            data,
            total,
            limit: filter.limit(),
            offset: filter.offset(),
        })
    }

    pub async fn unread_count(&self, to_user_id: i64) -> Result<i64> {
        self.store.unread_count(to_user_id).await
    }

    pub fn type_label(&self, type_code: &str) -> Option<&'static str> {
        resolve_type_label(type_code)
    }
}
