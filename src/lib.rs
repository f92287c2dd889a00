pub mod db;
pub mod error;
pub mod notification;
pub mod state;
pub mod telemetry;

pub use error::{AppError, Result};
pub use notification::{
    resolve_type_label, CreateNotification, MemoryNotificationStore, Notification, NotificationFilter,
    NotificationService, NotificationStatus, NotificationStore, NotificationView, PgNotificationStore,
};
pub use state::{AppState, Config};
