pub mod bundle;
pub mod disturb;
pub mod error;
pub mod notification;
pub mod reminder;
pub mod reminder_manager;
pub mod service;
pub mod slot;
pub mod store;
pub mod trigger;

pub use crate::bundle::BundleOption;
pub use crate::error::{AnsError, Result, ERR_OK};
pub use crate::reminder::{ReminderId, ReminderRequest};
pub use crate::reminder_manager::{PublishedReminder, ReminderDataManager};
pub use crate::service::{NotificationService, NotificationServiceBuilder};
pub use crate::slot::{NotificationSlot, SlotArg, SlotType};
