use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{AnsError, Result};
use crate::slot::SlotType;
use crate::trigger::{
    self, DAYS_PER_WEEK, MAX_DAYS_OF_MONTH, MIN_TIME_INTERVAL_SECS, MONTHS_PER_YEAR,
};

pub type ReminderId = i32;

const DEFAULT_SNOOZE_TIMES: u8 = 3;
const MAX_ACTION_BUTTONS: usize = 2;
const MILLIS_PER_SECOND: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum ReminderType {
    Timer,
    Calendar,
    Alarm,
}

impl From<ReminderType> for i32 {
    fn from(value: ReminderType) -> Self {
        value as i32
    }
}

impl TryFrom<i32> for ReminderType {
    type Error = AnsError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(ReminderType::Timer),
            1 => Ok(ReminderType::Calendar),
            2 => Ok(ReminderType::Alarm),
            other => Err(AnsError::invalid(format!("unknown reminder type {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum ActionButtonType {
    Close,
    Snooze,
}

impl From<ActionButtonType> for i32 {
    fn from(value: ActionButtonType) -> Self {
        value as i32
    }
}

impl TryFrom<i32> for ActionButtonType {
    type Error = AnsError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(ActionButtonType::Close),
            1 => Ok(ActionButtonType::Snooze),
            other => Err(AnsError::invalid(format!("unknown action button type {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionButton {
    pub title: String,
    #[serde(rename = "type")]
    pub button_type: ActionButtonType,
}

impl ActionButton {
    pub fn new(title: impl Into<String>, button_type: ActionButtonType) -> Self {
        Self {
            title: title.into(),
            button_type,
        }
    }
}

/// Ability launched when the reminder notification is tapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WantAgent {
    pub pkg_name: String,
    pub ability_name: String,
}

/// Ability launched full screen when the reminder rings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxScreenWantAgent {
    pub pkg_name: String,
    pub ability_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDateTime {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    #[serde(default)]
    pub second: u8,
}

impl LocalDateTime {
    pub fn to_naive(&self) -> Result<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, u32::from(self.month), u32::from(self.day))
            .and_then(|date| {
                date.and_hms_opt(
                    u32::from(self.hour),
                    u32::from(self.minute),
                    u32::from(self.second),
                )
            })
            .ok_or_else(|| AnsError::invalid(format!("invalid calendar date time {self:?}")))
    }
}

impl From<NaiveDateTime> for LocalDateTime {
    fn from(value: NaiveDateTime) -> Self {
        use chrono::{Datelike, Timelike};
        Self {
            year: value.year(),
            month: value.month() as u8,
            day: value.day() as u8,
            hour: value.hour() as u8,
            minute: value.minute() as u8,
            second: value.second() as u8,
        }
    }
}

/// Kind-specific part of a reminder. Each kind only carries its own fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reminderType", rename_all_fields = "camelCase")]
pub enum ReminderKind {
    #[serde(rename = "REMINDER_TYPE_TIMER")]
    Timer { trigger_time_in_seconds: u64 },
    #[serde(rename = "REMINDER_TYPE_CALENDAR")]
    Calendar {
        date_time: LocalDateTime,
        #[serde(default)]
        repeat_months: Vec<u8>,
        #[serde(default)]
        repeat_days: Vec<u8>,
    },
    #[serde(rename = "REMINDER_TYPE_ALARM")]
    Alarm {
        hour: u8,
        minute: u8,
        #[serde(default)]
        days_of_week: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRequest {
    #[serde(flatten)]
    pub kind: ReminderKind,
    #[serde(default)]
    pub action_buttons: Vec<ActionButton>,
    #[serde(default)]
    pub want_agent: Option<WantAgent>,
    #[serde(default)]
    pub max_screen_want_agent: Option<MaxScreenWantAgent>,
    #[serde(default)]
    pub ring_duration: u64,
    #[serde(default)]
    pub snooze_times: u8,
    #[serde(default)]
    pub time_interval: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub expired_content: String,
    #[serde(default)]
    pub snooze_content: String,
    #[serde(default)]
    pub notification_id: i32,
    #[serde(default = "default_slot_type")]
    pub slot_type: SlotType,
}

fn default_slot_type() -> SlotType {
    SlotType::SocialCommunication
}

impl ReminderRequest {
    pub fn new(kind: ReminderKind) -> Self {
        Self {
            kind,
            action_buttons: Vec::new(),
            want_agent: None,
            max_screen_want_agent: None,
            ring_duration: 0,
            snooze_times: 0,
            time_interval: 0,
            title: String::new(),
            content: String::new(),
            expired_content: String::new(),
            snooze_content: String::new(),
            notification_id: 0,
            slot_type: default_slot_type(),
        }
    }

    pub fn timer(trigger_time_in_seconds: u64) -> Self {
        Self::new(ReminderKind::Timer {
            trigger_time_in_seconds,
        })
    }

    pub fn alarm(hour: u8, minute: u8, days_of_week: Vec<u8>) -> Self {
        Self::new(ReminderKind::Alarm {
            hour,
            minute,
            days_of_week,
        })
    }

    pub fn calendar(
        date_time: LocalDateTime,
        repeat_months: Vec<u8>,
        repeat_days: Vec<u8>,
    ) -> Self {
        Self::new(ReminderKind::Calendar {
            date_time,
            repeat_months,
            repeat_days,
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_action_button(mut self, button: ActionButton) -> Self {
        self.action_buttons.push(button);
        self
    }

    pub fn with_time_interval(mut self, seconds: u64) -> Self {
        self.time_interval = seconds;
        self
    }

    pub fn with_snooze_times(mut self, times: u8) -> Self {
        self.snooze_times = times;
        self
    }

    pub fn reminder_type(&self) -> ReminderType {
        match self.kind {
            ReminderKind::Timer { .. } => ReminderType::Timer,
            ReminderKind::Calendar { .. } => ReminderType::Calendar,
            ReminderKind::Alarm { .. } => ReminderType::Alarm,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match &self.kind {
            ReminderKind::Timer {
                trigger_time_in_seconds,
            } => {
                if *trigger_time_in_seconds == 0
                    || *trigger_time_in_seconds >= u64::MAX / MILLIS_PER_SECOND
                {
                    return Err(AnsError::invalid("illegal count down time"));
                }
            }
            ReminderKind::Alarm {
                hour,
                minute,
                days_of_week,
            } => {
                if *hour >= 24 {
                    return Err(AnsError::invalid("hour is not between [0, 24)"));
                }
                if *minute >= 60 {
                    return Err(AnsError::invalid("minute is not between [0, 60)"));
                }
                if days_of_week.len() > usize::from(DAYS_PER_WEEK) {
                    return Err(AnsError::invalid(
                        "daysOfWeek should not be longer than 7",
                    ));
                }
            }
            ReminderKind::Calendar {
                date_time,
                repeat_months,
                repeat_days,
            } => {
                date_time.to_naive()?;
                if repeat_months.len() > usize::from(MONTHS_PER_YEAR) {
                    return Err(AnsError::invalid(
                        "repeatMonths should not be longer than 12",
                    ));
                }
                if repeat_days.len() > usize::from(MAX_DAYS_OF_MONTH) {
                    return Err(AnsError::invalid(
                        "repeatDays should not be longer than 31",
                    ));
                }
            }
        }

        if self.action_buttons.len() > MAX_ACTION_BUTTONS {
            return Err(AnsError::invalid("at most two action buttons are allowed"));
        }
        if let [first, second] = self.action_buttons.as_slice() {
            if first.button_type == second.button_type {
                return Err(AnsError::invalid("action button types must differ"));
            }
        }
        Ok(())
    }

    /// Ring duration in seconds; zero falls back to one second.
    pub fn effective_ring_duration(&self) -> u64 {
        self.ring_duration.max(1)
    }

    pub fn effective_snooze_times(&self) -> u8 {
        match self.kind {
            ReminderKind::Timer { .. } => self.snooze_times,
            _ if self.snooze_times == 0 => DEFAULT_SNOOZE_TIMES,
            _ => self.snooze_times,
        }
    }

    /// Snooze interval in seconds, raised to the five minute floor when set.
    pub fn effective_time_interval(&self) -> u64 {
        match self.time_interval {
            0 => 0,
            secs => secs.max(MIN_TIME_INTERVAL_SECS),
        }
    }

    pub fn action_button(&self, button_type: ActionButtonType) -> Option<&ActionButton> {
        self.action_buttons
            .iter()
            .find(|button| button.button_type == button_type)
    }

    /// First ring at or after publication.
    pub fn first_trigger(&self, now: NaiveDateTime) -> Result<Option<NaiveDateTime>> {
        Ok(match &self.kind {
            ReminderKind::Timer {
                trigger_time_in_seconds,
            } => trigger::timer_trigger(now, *trigger_time_in_seconds),
            ReminderKind::Alarm {
                hour,
                minute,
                days_of_week,
            } => trigger::alarm_next_trigger(
                *hour,
                *minute,
                trigger::days_of_week_mask(days_of_week),
                now,
                true,
            ),
            ReminderKind::Calendar {
                date_time,
                repeat_months,
                repeat_days,
            } => trigger::calendar_next_trigger(
                date_time.to_naive()?,
                trigger::months_mask(repeat_months),
                trigger::days_of_month_mask(repeat_days),
                now,
            ),
        })
    }

    /// Next regular occurrence after `now`, ignoring snoozes. `None` once a
    /// non-repeating reminder has rung.
    pub fn next_repeat_trigger(&self, now: NaiveDateTime) -> Result<Option<NaiveDateTime>> {
        Ok(match &self.kind {
            ReminderKind::Timer { .. } => None,
            ReminderKind::Alarm {
                hour,
                minute,
                days_of_week,
            } => match trigger::days_of_week_mask(days_of_week) {
                0 => None,
                mask => trigger::alarm_next_trigger(*hour, *minute, mask, now, true),
            },
            ReminderKind::Calendar {
                date_time,
                repeat_months,
                repeat_days,
            } => {
                let months = trigger::months_mask(repeat_months);
                let days = trigger::days_of_month_mask(repeat_days);
                if months == 0 || days == 0 {
                    None
                } else {
                    trigger::calendar_next_trigger(date_time.to_naive()?, months, days, now)
                }
            }
        })
    }

    pub fn is_repeating(&self) -> bool {
        let repeats_by_kind = match &self.kind {
            ReminderKind::Timer { .. } => false,
            ReminderKind::Alarm { days_of_week, .. } => {
                trigger::days_of_week_mask(days_of_week) != 0
            }
            ReminderKind::Calendar {
                repeat_months,
                repeat_days,
                ..
            } => {
                trigger::months_mask(repeat_months) != 0
                    && trigger::days_of_month_mask(repeat_days) != 0
            }
        };
        repeats_by_kind || (self.effective_time_interval() > 0 && self.effective_snooze_times() > 0)
    }
}
