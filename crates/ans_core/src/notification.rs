use serde::{Deserialize, Serialize};

use crate::bundle::BundleOption;
use crate::reminder::{ActionButton, WantAgent};
use crate::slot::{SlotType, Visibility};

/// Classification marking a notification as an alarm for do-not-disturb purposes.
pub const CLASSIFICATION_ALARM: &str = "alarm";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    BasicText,
    LongText,
    Picture,
    Conversation,
    MultiLine,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicContent {
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub additional_text: String,
}

impl BasicContent {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            additional_text: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongTextContent {
    #[serde(flatten)]
    pub basic: BasicContent,
    pub long_text: String,
    pub brief_text: String,
    pub expanded_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiLineContent {
    #[serde(flatten)]
    pub basic: BasicContent,
    pub brief_text: String,
    pub long_title: String,
    pub lines: Vec<String>,
}

/// The picture itself is held as an opaque uri.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PictureContent {
    #[serde(flatten)]
    pub basic: BasicContent,
    pub brief_text: String,
    pub expanded_title: String,
    pub picture: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageUser {
    pub name: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub is_machine: bool,
    #[serde(default)]
    pub is_user_important: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationalMessage {
    pub text: String,
    pub timestamp: i64,
    pub sender: MessageUser,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationalContent {
    #[serde(flatten)]
    pub basic: BasicContent,
    pub user: MessageUser,
    pub messages: Vec<ConversationalMessage>,
    #[serde(default)]
    pub conversation_group: bool,
    #[serde(default)]
    pub conversation_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "contentType", content = "content")]
pub enum NotificationContent {
    BasicText(BasicContent),
    LongText(LongTextContent),
    MultiLine(MultiLineContent),
    Picture(PictureContent),
    Conversation(ConversationalContent),
}

impl NotificationContent {
    pub fn basic(title: impl Into<String>, text: impl Into<String>) -> Self {
        NotificationContent::BasicText(BasicContent::new(title, text))
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            NotificationContent::BasicText(_) => ContentType::BasicText,
            NotificationContent::LongText(_) => ContentType::LongText,
            NotificationContent::MultiLine(_) => ContentType::MultiLine,
            NotificationContent::Picture(_) => ContentType::Picture,
            NotificationContent::Conversation(_) => ContentType::Conversation,
        }
    }

    pub fn basic_content(&self) -> &BasicContent {
        match self {
            NotificationContent::BasicText(basic) => basic,
            NotificationContent::LongText(content) => &content.basic,
            NotificationContent::MultiLine(content) => &content.basic,
            NotificationContent::Picture(content) => &content.basic,
            NotificationContent::Conversation(content) => &content.basic,
        }
    }

    pub fn title(&self) -> &str {
        &self.basic_content().title
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub id: i32,
    #[serde(default)]
    pub label: String,
    pub slot_type: SlotType,
    pub content: NotificationContent,
    #[serde(default)]
    pub want_agent: Option<WantAgent>,
    #[serde(default)]
    pub is_ongoing: bool,
    #[serde(default)]
    pub is_unremovable: bool,
    #[serde(default = "default_true")]
    pub tap_dismissed: bool,
    #[serde(default)]
    pub auto_deleted_time: Option<i64>,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub delivery_time: Option<i64>,
    #[serde(default)]
    pub show_delivery_time: bool,
    #[serde(default)]
    pub action_buttons: Vec<ActionButton>,
    #[serde(default = "default_visibility")]
    pub visibility: Visibility,
}

fn default_true() -> bool {
    true
}

fn default_visibility() -> Visibility {
    Visibility::NoOverride
}

impl NotificationRequest {
    pub fn new(id: i32, slot_type: SlotType, content: NotificationContent) -> Self {
        Self {
            id,
            label: String::new(),
            slot_type,
            content,
            want_agent: None,
            is_ongoing: false,
            is_unremovable: false,
            tap_dismissed: true,
            auto_deleted_time: None,
            classification: None,
            delivery_time: None,
            show_delivery_time: false,
            action_buttons: Vec::new(),
            visibility: Visibility::NoOverride,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn is_alarm(&self) -> bool {
        self.classification.as_deref() == Some(CLASSIFICATION_ALARM)
    }
}

/// Key under which a published notification is stored; republishing the same
/// key replaces the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NotificationKey {
    pub bundle: String,
    pub id: i32,
    pub label: String,
}

/// A published notification together with the presentation decided by the
/// slot and do-not-disturb filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub bundle: BundleOption,
    pub request: NotificationRequest,
    pub enable_sound: bool,
    pub enable_light: bool,
    pub enable_vibration: bool,
    pub sound: String,
    pub light_color: u32,
    pub vibration_values: Vec<i64>,
}

impl Notification {
    pub fn new(bundle: BundleOption, request: NotificationRequest) -> Self {
        Self {
            bundle,
            request,
            enable_sound: false,
            enable_light: false,
            enable_vibration: false,
            sound: String::new(),
            light_color: 0,
            vibration_values: Vec::new(),
        }
    }

    pub fn key(&self) -> NotificationKey {
        NotificationKey {
            bundle: self.bundle.bundle.clone(),
            id: self.request.id,
            label: self.request.label.clone(),
        }
    }

    pub fn silence(&mut self) {
        self.enable_sound = false;
        self.enable_light = false;
        self.enable_vibration = false;
    }
}

/// Receives every notification the service publishes or cancels.
pub trait NotificationSubscriber: Send + Sync {
    fn on_consumed(&self, notification: &Notification);
    fn on_canceled(&self, notification: &Notification);
    fn on_disturb_date_changed(&self, _date: &crate::disturb::DoNotDisturbDate) {}
}
