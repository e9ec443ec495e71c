use anyhow::Result;
use tracing::{debug, info, warn};

use crate::bridge::NativeBridge;
use crate::locale::{LocaleTable, ALLOW_BUTTON_KEY, CANCEL_BUTTON_KEY, REQUEST_NOTIFICATION_KEY};
use crate::params::RouteParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogEvent {
    Allow,
    Cancel,
}

impl DialogEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogEvent::Allow => "EVENT_ALLOW",
            DialogEvent::Cancel => "EVENT_CANCEL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    AwaitingInput,
    Dispatched(DialogEvent),
}

/// Where the prompt and button labels come from.
#[derive(Debug, Clone)]
pub enum LabelSource {
    Localized(LocaleTable),
    /// Labels are shown exactly as routed.
    Routed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogLabels {
    pub request_notification: String,
    pub allow_button: String,
    pub cancel_button: String,
}

impl DialogLabels {
    fn resolve(params: &RouteParams, source: &LabelSource) -> Self {
        match source {
            LabelSource::Localized(table) => Self {
                request_notification: table.translate(REQUEST_NOTIFICATION_KEY).to_string(),
                allow_button: table.translate(ALLOW_BUTTON_KEY).to_string(),
                cancel_button: table.translate(CANCEL_BUTTON_KEY).to_string(),
            },
            LabelSource::Routed => Self {
                request_notification: params.request_notification.clone().unwrap_or_default(),
                allow_button: params.allow_button.clone().unwrap_or_default(),
                cancel_button: params.cancel_button.clone().unwrap_or_default(),
            },
        }
    }
}

/// Notification permission prompt. Reports the user's choice to the native
/// host once; later clicks are ignored.
pub struct PermissionDialog<B: NativeBridge> {
    bridge: B,
    message: String,
    labels: DialogLabels,
    uid: String,
    state: DialogState,
}

impl<B: NativeBridge> PermissionDialog<B> {
    pub fn open(params: RouteParams, source: LabelSource, bridge: B) -> Result<Self> {
        debug!(?params, "opening permission dialog");
        let uid = params.uid()?.to_string();
        let labels = DialogLabels::resolve(&params, &source);
        Ok(Self {
            bridge,
            message: params.message.unwrap_or_default(),
            labels,
            uid,
            state: DialogState::AwaitingInput,
        })
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn labels(&self) -> &DialogLabels {
        &self.labels
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn on_allow(&mut self) -> bool {
        info!("clicked allow");
        self.dispatch(DialogEvent::Allow)
    }

    pub fn on_cancel(&mut self) -> bool {
        info!("clicked cancel");
        self.dispatch(DialogEvent::Cancel)
    }

    fn dispatch(&mut self, event: DialogEvent) -> bool {
        if let DialogState::Dispatched(previous) = self.state {
            warn!(?previous, ?event, "dialog already answered, ignoring");
            return false;
        }
        self.bridge.call_native_handler(event.as_str(), &self.uid);
        self.state = DialogState::Dispatched(event);
        true
    }
}
