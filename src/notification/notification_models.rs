use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "i32", into = "i32")]
#[repr(i32)]
pub enum NotificationStatus {
    #[default]
    Unread = 10,
    Read = 20,
}

impl NotificationStatus {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for NotificationStatus {
    type Error = AppError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            10 => Ok(NotificationStatus::Unread),
            20 => Ok(NotificationStatus::Read),
            other => Err(AppError::Validation(format!(
                "status must be 10 (unread) or 20 (read), got {}",
                other
            ))),
        }
    }
}

impl From<NotificationStatus> for i32 {
    fn from(status: NotificationStatus) -> Self {
        status.code()
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationStatus::Unread => write!(f, "Unread"),
            NotificationStatus::Read => write!(f, "Read"),
        }
    }
}

/// Display labels keyed by notification type code.
pub const TYPE_LABELS: &[(&str, &str)] = &[
    ("follow_user", "follow on you"),
    ("answer_question", "answered the question"),
    ("follow_question", "is concerned about the problem"),
    ("comment_question", "commented on the question"),
    ("invite_answer", "invited you to answer"),
    ("adopt_answer", "accepted your answer"),
];

/// Maps a type code to its label. Unknown codes have no label.
pub fn resolve_type_label(type_code: &str) -> Option<&'static str> {
    TYPE_LABELS
        .iter()
        .find(|(code, _)| *code == type_code)
        .map(|(_, label)| *label)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: i64,
    /// Sender; `None` for system generated notifications.
    pub user_id: Option<i64>,
    pub to_user_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub notification_type: String,
    pub source_id: i64,
    pub subject: String,
    pub refer_content: String,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_read(&self) -> bool {
        self.status == NotificationStatus::Read
    }

    pub fn type_text(&self) -> Option<&'static str> {
        resolve_type_label(&self.notification_type)
    }
}

/// A notification joined to the sender and recipient user rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub notification: Notification,
    pub sender_username: Option<String>,
    pub recipient_username: Option<String>,
}

impl NotificationView {
    pub fn type_text(&self) -> Option<&'static str> {
        self.notification.type_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(NotificationStatus::Unread.code(), 10);
        assert_eq!(NotificationStatus::Read.code(), 20);
        assert_eq!(NotificationStatus::default(), NotificationStatus::Unread);
    }

    #[test]
    fn test_status_try_from() {
        assert_eq!(NotificationStatus::try_from(10).unwrap(), NotificationStatus::Unread);
        assert_eq!(NotificationStatus::try_from(20).unwrap(), NotificationStatus::Read);
        for bad in [0, 11, 15, 30, -10] {
            assert!(matches!(
                NotificationStatus::try_from(bad),
                Err(AppError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_status_serde_uses_codes() {
        assert_eq!(serde_json::to_string(&NotificationStatus::Read).unwrap(), "20");
        let status: NotificationStatus = serde_json::from_str("10").unwrap();
        assert_eq!(status, NotificationStatus::Unread);
        assert!(serde_json::from_str::<NotificationStatus>("30").is_err());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(NotificationStatus::Unread.to_string(), "Unread");
        assert_eq!(NotificationStatus::Read.to_string(), "Read");
    }

    #[test]
    fn test_resolve_type_label() {
        assert_eq!(resolve_type_label("follow_user"), Some("follow on you"));
        assert_eq!(resolve_type_label("adopt_answer"), Some("accepted your answer"));
        assert_eq!(resolve_type_label("unknown_code"), None);
        assert_eq!(resolve_type_label(""), None);
    }

    #[test]
    fn test_every_label_is_non_empty() {
        for (code, _) in TYPE_LABELS {
            assert!(!resolve_type_label(code).unwrap_or_default().is_empty());
        }
    }
}
