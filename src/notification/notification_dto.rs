use serde::{Deserialize, Serialize};
use validator::Validate;

use super::notification_models::NotificationStatus;
use crate::error::Result;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Attributes accepted when creating a notification.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateNotification {
    pub user_id: Option<i64>,
    pub to_user_id: i64,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 64))]
    pub notification_type: String,
    #[serde(default)]
    pub source_id: i64,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub subject: String,
    #[serde(default)]
    pub refer_content: String,
    pub status: Option<i32>,
}

impl CreateNotification {
    pub fn new(to_user_id: i64, notification_type: impl Into<String>) -> Self {
        Self {
            user_id: None,
            to_user_id,
            notification_type: notification_type.into(),
            source_id: 0,
            subject: String::new(),
            refer_content: String::new(),
            status: None,
        }
    }

    pub fn from_sender(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn about(mut self, source_id: i64, subject: impl Into<String>, refer_content: impl Into<String>) -> Self {
        self.source_id = source_id;
        self.subject = subject.into();
        self.refer_content = refer_content.into();
        self
    }

    pub fn with_status(mut self, status: i32) -> Self {
        self.status = Some(status);
        self
    }

    /// Builds the attributes from a JSON object keyed by column name.
    pub fn from_attributes(attributes: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(attributes)?)
    }

    /// Applies the status default and checks every field.
    pub fn into_new(self) -> Result<NewNotification> {
        let status = match self.status {
            Some(code) => NotificationStatus::try_from(code)?,
            None => NotificationStatus::default(),
        };
        self.validate()?;

        Ok(NewNotification {
            user_id: self.user_id,
            to_user_id: self.to_user_id,
            notification_type: self.notification_type,
            source_id: self.source_id,
            subject: self.subject,
            refer_content: self.refer_content,
            status,
        })
    }
}

/// A validated record ready to be written by a store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: Option<i64>,
    pub to_user_id: i64,
    pub notification_type: String,
    pub source_id: i64,
    pub subject: String,
    pub refer_content: String,
    pub status: NotificationStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationFilter {
    pub status: Option<NotificationStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl NotificationFilter {
    pub fn unread() -> Self {
        Self {
            status: Some(NotificationStatus::Unread),
            ..Self::default()
        }
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}
