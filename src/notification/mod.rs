pub mod memory_store;
pub mod notification_dto;
pub mod notification_models;
pub mod notification_repository;
pub mod notification_service;

pub use memory_store::MemoryNotificationStore;
pub use notification_dto::{CreateNotification, NewNotification, NotificationFilter, Page};
pub use notification_models::{resolve_type_label, Notification, NotificationStatus, NotificationView, TYPE_LABELS};
pub use notification_repository::{NotificationStore, PgNotificationStore};
pub use notification_service::NotificationService;
