//! Callback-last variants of the agent operations.
//!
//! Each adapter runs the operation on the current tokio runtime and hands the
//! outcome to the callback exactly once. Without a runtime the callback is
//! invoked immediately with [`AnsError::ServiceNotReady`].

use std::future::Future;

use ans_core::{
    AnsError, PublishedReminder, ReminderId, ReminderRequest, Result, SlotArg, SlotType, ERR_OK,
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::agent::ReminderAgent;

/// The `err` half of the `(err, data)` callback convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackError {
    code: u32,
    message: String,
}

impl CallbackError {
    pub fn from_result<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Self {
                code: ERR_OK,
                message: String::new(),
            },
            Err(err) => Self::from(err),
        }
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_ok(&self) -> bool {
        self.code == ERR_OK
    }
}

impl From<&AnsError> for CallbackError {
    fn from(err: &AnsError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

fn spawn_with<T, Fut, F>(future: Fut, callback: F) -> Option<JoinHandle<()>>
where
    T: Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    F: FnOnce(Result<T>) + Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => Some(handle.spawn(async move { callback(future.await) })),
        Err(_) => {
            warn!("no async runtime available for callback operation");
            callback(Err(AnsError::ServiceNotReady));
            None
        }
    }
}

impl ReminderAgent {
    pub fn publish_reminder_with<F>(
        &self,
        request: ReminderRequest,
        callback: F,
    ) -> Option<JoinHandle<()>>
    where
        F: FnOnce(Result<ReminderId>) + Send + 'static,
    {
        let agent = self.clone();
        spawn_with(async move { agent.publish_reminder(request).await }, callback)
    }

    pub fn cancel_reminder_with<F>(&self, id: ReminderId, callback: F) -> Option<JoinHandle<()>>
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let agent = self.clone();
        spawn_with(async move { agent.cancel_reminder(id).await }, callback)
    }

    pub fn get_valid_reminders_with<F>(&self, callback: F) -> Option<JoinHandle<()>>
    where
        F: FnOnce(Result<Vec<PublishedReminder>>) + Send + 'static,
    {
        let agent = self.clone();
        spawn_with(async move { agent.get_valid_reminders().await }, callback)
    }

    pub fn cancel_all_reminders_with<F>(&self, callback: F) -> Option<JoinHandle<()>>
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let agent = self.clone();
        spawn_with(async move { agent.cancel_all_reminders().await }, callback)
    }

    pub fn add_notification_slot_with<F>(
        &self,
        slot: impl Into<SlotArg>,
        callback: F,
    ) -> Option<JoinHandle<()>>
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let agent = self.clone();
        let slot = slot.into();
        spawn_with(async move { agent.add_notification_slot(slot).await }, callback)
    }

    pub fn remove_notification_slot_with<F>(
        &self,
        slot_type: SlotType,
        callback: F,
    ) -> Option<JoinHandle<()>>
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let agent = self.clone();
        spawn_with(async move { agent.remove_notification_slot(slot_type).await }, callback)
    }
}
