use std::sync::Arc;

use ans_core::NotificationService;
use ans_dialog::{DialogEvent, NativeBridge};
use tracing::{info, warn};

/// Applies the permission dialog's answer to the notification service.
pub struct PermissionRelay {
    service: Arc<NotificationService>,
}

impl PermissionRelay {
    pub fn new(service: Arc<NotificationService>) -> Self {
        Self { service }
    }
}

impl NativeBridge for PermissionRelay {
    fn call_native_handler(&self, event: &str, uid: &str) {
        let Ok(uid) = uid.trim().parse::<i32>() else {
            warn!(event, uid, "permission answer with unparsable uid");
            return;
        };
        let allowed = if event == DialogEvent::Allow.as_str() {
            true
        } else if event == DialogEvent::Cancel.as_str() {
            false
        } else {
            warn!(event, uid, "unknown dialog event");
            return;
        };
        info!(uid, allowed, "notification permission answered");
        self.service.set_uid_permission(uid, allowed);
    }
}
