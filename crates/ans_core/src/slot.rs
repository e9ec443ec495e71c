use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::bundle::BundleOption;
use crate::error::{AnsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum SlotType {
    UnknownType,
    SocialCommunication,
    ServiceInformation,
    ContentInformation,
    OtherTypes,
}

impl From<SlotType> for i32 {
    fn from(value: SlotType) -> Self {
        match value {
            SlotType::UnknownType => 0,
            SlotType::SocialCommunication => 1,
            SlotType::ServiceInformation => 2,
            SlotType::ContentInformation => 3,
            SlotType::OtherTypes => 0xFFFF,
        }
    }
}

impl TryFrom<i32> for SlotType {
    type Error = AnsError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(SlotType::UnknownType),
            1 => Ok(SlotType::SocialCommunication),
            2 => Ok(SlotType::ServiceInformation),
            3 => Ok(SlotType::ContentInformation),
            0xFFFF => Ok(SlotType::OtherTypes),
            other => Err(AnsError::invalid(format!("unknown slot type {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum SlotLevel {
    None,
    Min,
    Low,
    Default,
    High,
}

impl From<SlotLevel> for i32 {
    fn from(value: SlotLevel) -> Self {
        value as i32
    }
}

impl TryFrom<i32> for SlotLevel {
    type Error = AnsError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(SlotLevel::None),
            1 => Ok(SlotLevel::Min),
            2 => Ok(SlotLevel::Low),
            3 => Ok(SlotLevel::Default),
            4 => Ok(SlotLevel::High),
            other => Err(AnsError::invalid(format!("unknown slot level {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Visibility {
    NoOverride,
    Public,
    Secret,
    Private,
}

impl From<Visibility> for i32 {
    fn from(value: Visibility) -> Self {
        value as i32
    }
}

impl TryFrom<i32> for Visibility {
    type Error = AnsError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Visibility::NoOverride),
            1 => Ok(Visibility::Public),
            2 => Ok(Visibility::Secret),
            3 => Ok(Visibility::Private),
            other => Err(AnsError::invalid(format!("unknown visibility {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSlot {
    #[serde(rename = "type")]
    pub slot_type: SlotType,
    pub level: SlotLevel,
    pub desc: String,
    pub badge_flag: bool,
    pub bypass_dnd: bool,
    pub lockscreen_visibility: Visibility,
    pub vibration_enabled: bool,
    pub sound: String,
    pub light_enabled: bool,
    pub light_color: u32,
    pub vibration_values: Vec<i64>,
}

impl NotificationSlot {
    /// Builds a slot carrying the presentation defaults of its type.
    pub fn new(slot_type: SlotType) -> Self {
        let (visibility, vibration, level) = match slot_type {
            SlotType::SocialCommunication => (Visibility::Public, true, SlotLevel::High),
            SlotType::ServiceInformation => (Visibility::Public, true, SlotLevel::Default),
            SlotType::ContentInformation => (Visibility::Secret, false, SlotLevel::Low),
            SlotType::OtherTypes => (Visibility::Secret, false, SlotLevel::Min),
            SlotType::UnknownType => (Visibility::NoOverride, false, SlotLevel::None),
        };
        Self {
            slot_type,
            level,
            desc: String::new(),
            badge_flag: true,
            bypass_dnd: false,
            lockscreen_visibility: visibility,
            vibration_enabled: vibration,
            sound: String::new(),
            light_enabled: false,
            light_color: 0,
            vibration_values: Vec::new(),
        }
    }

    pub fn can_vibrate(&self) -> bool {
        self.vibration_enabled
    }

    pub fn can_enable_light(&self) -> bool {
        self.light_enabled
    }

    pub fn has_sound(&self) -> bool {
        !self.sound.is_empty()
    }
}

/// Loose slot descriptor: only `type` is mandatory, everything else falls back
/// to the defaults of that type.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotDescriptor {
    #[serde(rename = "type")]
    slot_type: i32,
    level: Option<i32>,
    desc: Option<String>,
    badge_flag: Option<bool>,
    bypass_dnd: Option<bool>,
    lockscreen_visibility: Option<i32>,
    vibration_enabled: Option<bool>,
    sound: Option<String>,
    light_enabled: Option<bool>,
    light_color: Option<u32>,
    vibration_values: Option<Vec<i64>>,
}

impl SlotDescriptor {
    fn into_slot(self) -> Result<NotificationSlot> {
        let mut slot = NotificationSlot::new(SlotType::try_from(self.slot_type)?);
        if let Some(level) = self.level {
            slot.level = SlotLevel::try_from(level)?;
        }
        if let Some(visibility) = self.lockscreen_visibility {
            slot.lockscreen_visibility = Visibility::try_from(visibility)?;
        }
        if let Some(desc) = self.desc {
            slot.desc = desc;
        }
        if let Some(flag) = self.badge_flag {
            slot.badge_flag = flag;
        }
        if let Some(bypass) = self.bypass_dnd {
            slot.bypass_dnd = bypass;
        }
        if let Some(vibration) = self.vibration_enabled {
            slot.vibration_enabled = vibration;
        }
        if let Some(sound) = self.sound {
            slot.sound = sound;
        }
        if let Some(light) = self.light_enabled {
            slot.light_enabled = light;
        }
        if let Some(color) = self.light_color {
            slot.light_color = color;
        }
        if let Some(values) = self.vibration_values {
            slot.vibration_values = values;
        }
        Ok(slot)
    }
}

/// Argument accepted by `addNotificationSlot`: a full descriptor or a bare type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotArg {
    Descriptor(NotificationSlot),
    Type(SlotType),
}

impl SlotArg {
    /// Parses a loosely typed argument. Null, a missing `type` or a number
    /// outside [`SlotType`] are rejected.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Err(AnsError::invalid("slot argument is null")),
            Value::Number(number) => {
                let raw = number
                    .as_i64()
                    .and_then(|n| i32::try_from(n).ok())
                    .ok_or_else(|| AnsError::invalid(format!("slot type {number} out of range")))?;
                Ok(SlotArg::Type(SlotType::try_from(raw)?))
            }
            Value::Object(_) => {
                let descriptor: SlotDescriptor = serde_json::from_value(value.clone())
                    .map_err(|err| AnsError::invalid(format!("malformed slot: {err}")))?;
                Ok(SlotArg::Descriptor(descriptor.into_slot()?))
            }
            other => Err(AnsError::invalid(format!("unsupported slot argument {other}"))),
        }
    }

    pub fn into_slot(self) -> NotificationSlot {
        match self {
            SlotArg::Descriptor(slot) => slot,
            SlotArg::Type(slot_type) => NotificationSlot::new(slot_type),
        }
    }
}

impl From<NotificationSlot> for SlotArg {
    fn from(slot: NotificationSlot) -> Self {
        SlotArg::Descriptor(slot)
    }
}

impl From<SlotType> for SlotArg {
    fn from(slot_type: SlotType) -> Self {
        SlotArg::Type(slot_type)
    }
}

/// Per-bundle slot table. A slot type identifies at most one slot per bundle.
#[derive(Debug, Default)]
pub struct SlotRegistry {
    slots: RwLock<HashMap<String, BTreeMap<SlotType, NotificationSlot>>>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_slot(&self, bundle: &BundleOption, slot: NotificationSlot) -> Result<()> {
        bundle.validate()?;
        if slot.slot_type == SlotType::UnknownType {
            return Err(AnsError::invalid("cannot add a slot of unknown type"));
        }
        debug!(bundle = %bundle.bundle, slot_type = ?slot.slot_type, "adding slot");
        self.slots
            .write()
            .entry(bundle.bundle.clone())
            .or_default()
            .insert(slot.slot_type, slot);
        Ok(())
    }

    pub fn add_slots(&self, bundle: &BundleOption, slots: Vec<NotificationSlot>) -> Result<()> {
        if slots.iter().any(|slot| slot.slot_type == SlotType::UnknownType) {
            return Err(AnsError::invalid("cannot add a slot of unknown type"));
        }
        for slot in slots {
            self.add_slot(bundle, slot)?;
        }
        Ok(())
    }

    pub fn get_slot(&self, bundle: &BundleOption, slot_type: SlotType) -> Option<NotificationSlot> {
        self.slots
            .read()
            .get(&bundle.bundle)
            .and_then(|slots| slots.get(&slot_type))
            .cloned()
    }

    pub fn get_slots(&self, bundle: &BundleOption) -> Vec<NotificationSlot> {
        self.slots
            .read()
            .get(&bundle.bundle)
            .map(|slots| slots.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn slot_num(&self, bundle: &BundleOption) -> usize {
        self.slots
            .read()
            .get(&bundle.bundle)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    /// Returns whether a slot was removed; removing a missing slot is tolerated.
    pub fn remove_slot(&self, bundle: &BundleOption, slot_type: SlotType) -> bool {
        let removed = self
            .slots
            .write()
            .get_mut(&bundle.bundle)
            .and_then(|slots| slots.remove(&slot_type))
            .is_some();
        if !removed {
            debug!(bundle = %bundle.bundle, ?slot_type, "remove of missing slot ignored");
        }
        removed
    }

    pub fn remove_all_slots(&self, bundle: &BundleOption) -> usize {
        self.slots
            .write()
            .remove(&bundle.bundle)
            .map(|slots| slots.len())
            .unwrap_or(0)
    }
}
