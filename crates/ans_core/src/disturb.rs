use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{AnsError, Result};
use crate::notification::NotificationRequest;
use crate::slot::NotificationSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum DoNotDisturbType {
    None,
    Once,
    Daily,
    Clearly,
}

impl From<DoNotDisturbType> for i32 {
    fn from(value: DoNotDisturbType) -> Self {
        value as i32
    }
}

impl TryFrom<i32> for DoNotDisturbType {
    type Error = AnsError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(DoNotDisturbType::None),
            1 => Ok(DoNotDisturbType::Once),
            2 => Ok(DoNotDisturbType::Daily),
            3 => Ok(DoNotDisturbType::Clearly),
            other => Err(AnsError::invalid(format!("unknown do-not-disturb type {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DoNotDisturbMode {
    AllowUnknown,
    #[default]
    AllowAll,
    AllowPriority,
    AllowNone,
    AllowAlarms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoNotDisturbDate {
    #[serde(rename = "type")]
    pub kind: DoNotDisturbType,
    pub begin: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DoNotDisturbDate {
    pub fn new(kind: DoNotDisturbType, begin: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { kind, begin, end }
    }

    pub fn none() -> Self {
        Self::new(DoNotDisturbType::None, NaiveDateTime::MIN, NaiveDateTime::MIN)
    }

    pub fn validate(&self) -> Result<()> {
        if self.kind == DoNotDisturbType::Clearly && self.end <= self.begin {
            return Err(AnsError::invalid("do-not-disturb end must follow begin"));
        }
        Ok(())
    }

    /// `Once` and `Daily` only look at hour and minute of `end`; `Clearly`
    /// compares full date times.
    pub fn is_active(&self, now: NaiveDateTime) -> bool {
        match self.kind {
            DoNotDisturbType::None => false,
            DoNotDisturbType::Once => {
                let mut end = self.begin.date().and_time(self.end.time());
                if end <= self.begin {
                    end += Duration::days(1);
                }
                self.begin <= now && now < end
            }
            DoNotDisturbType::Daily => {
                let (begin, end, time) = (self.begin.time(), self.end.time(), now.time());
                if begin < end {
                    begin <= time && time < end
                } else {
                    time >= begin || time < end
                }
            }
            DoNotDisturbType::Clearly => self.begin <= now && now < self.end,
        }
    }
}

impl Default for DoNotDisturbDate {
    fn default() -> Self {
        Self::none()
    }
}

/// Decides whether a notification may ring, light up or vibrate.
pub struct DisturbFilter;

impl DisturbFilter {
    pub fn allows_alert(
        mode: DoNotDisturbMode,
        date: &DoNotDisturbDate,
        now: NaiveDateTime,
        slot: Option<&NotificationSlot>,
        request: &NotificationRequest,
    ) -> Result<bool> {
        if !date.is_active(now) {
            return Ok(true);
        }
        let bypass = || {
            slot.map(|slot| slot.bypass_dnd)
                .ok_or(AnsError::SlotNotExist(request.slot_type))
        };
        match mode {
            DoNotDisturbMode::AllowAll => Ok(true),
            DoNotDisturbMode::AllowAlarms if request.is_alarm() => Ok(true),
            DoNotDisturbMode::AllowAlarms | DoNotDisturbMode::AllowNone => bypass(),
            DoNotDisturbMode::AllowPriority | DoNotDisturbMode::AllowUnknown => Ok(false),
        }
    }
}
