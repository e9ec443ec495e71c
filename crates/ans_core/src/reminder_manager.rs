use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::bundle::BundleOption;
use crate::error::{AnsError, Result};
use crate::notification::{NotificationContent, NotificationRequest, CLASSIFICATION_ALARM};
use crate::reminder::{MaxScreenWantAgent, ReminderId, ReminderKind, ReminderRequest, ReminderType};
use crate::trigger::{self, MIN_TIME_INTERVAL_SECS};

pub const MAX_NUM_REMINDER_LIMIT_APP: usize = 30;
pub const MAX_NUM_REMINDER_LIMIT_SYSTEM: usize = 2000;
/// Label of every notification raised for a reminder.
pub const NOTIFICATION_LABEL: &str = "REMINDER_AGENT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReminderStatus {
    /// Waiting for its trigger time.
    #[default]
    Active,
    Showing {
        alerting: bool,
    },
    /// Dismissed by the user until the snooze trigger.
    Snoozed,
}

impl ReminderStatus {
    pub fn is_showing(&self) -> bool {
        matches!(self, ReminderStatus::Showing { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderEntry {
    pub id: ReminderId,
    pub bundle: BundleOption,
    pub request: ReminderRequest,
    pub trigger_at: Option<NaiveDateTime>,
    pub status: ReminderStatus,
    pub expired: bool,
    pub snooze_remaining: u8,
    pub last_shown: Option<NaiveDateTime>,
}

impl ReminderEntry {
    fn is_due(&self, now: NaiveDateTime) -> bool {
        !self.expired && self.trigger_at.is_some_and(|at| at <= now)
    }

    fn notification(&self, content: &str) -> NotificationRequest {
        let request = &self.request;
        let mut notification = NotificationRequest::new(
            request.notification_id,
            request.slot_type,
            NotificationContent::basic(request.title.clone(), content.to_string()),
        )
        .with_label(NOTIFICATION_LABEL);
        notification.want_agent = request.want_agent.clone();
        notification.action_buttons = request.action_buttons.clone();
        notification.show_delivery_time = true;
        notification.tap_dismissed = true;
        notification.delivery_time = self
            .last_shown
            .and_then(|at| at.and_local_timezone(Local).earliest())
            .map(|at| at.timestamp_millis());
        if request.reminder_type() == ReminderType::Alarm {
            notification.classification = Some(CLASSIFICATION_ALARM.to_string());
        }
        notification
    }
}

/// The reminder that reached its trigger time and must be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderAlert {
    pub bundle: BundleOption,
    pub reminder_id: ReminderId,
    pub notification: NotificationRequest,
    pub ring_duration: Duration,
    pub max_screen_want_agent: Option<MaxScreenWantAgent>,
}

/// A valid reminder as handed back to its owner: the request exactly as published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedReminder {
    pub id: ReminderId,
    pub request: ReminderRequest,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSnapshot {
    pub last_id: ReminderId,
    pub entries: Vec<ReminderEntry>,
}

#[derive(Debug, Default)]
pub struct ReminderDataManager {
    entries: Vec<ReminderEntry>,
    last_id: ReminderId,
}

impl ReminderDataManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restore(snapshot: ReminderSnapshot) -> Self {
        info!(count = snapshot.entries.len(), "restoring reminders");
        Self {
            entries: snapshot.entries,
            last_id: snapshot.last_id,
        }
    }

    pub fn snapshot(&self) -> ReminderSnapshot {
        ReminderSnapshot {
            last_id: self.last_id,
            entries: self.entries.clone(),
        }
    }

    pub fn total_count(&self) -> usize {
        self.entries.len()
    }

    #[instrument(skip(self, bundle, request), fields(bundle = %bundle))]
    pub fn publish(
        &mut self,
        bundle: &BundleOption,
        request: ReminderRequest,
        now: NaiveDateTime,
    ) -> Result<ReminderId> {
        bundle.validate()?;
        request.validate()?;
        self.purge_expired();
        self.check_limits(bundle)?;

        let trigger_at = request.first_trigger(now)?.ok_or(AnsError::NoNextTrigger)?;
        let id = self.allocate_id();
        debug!(reminder_id = id, %trigger_at, "reminder admitted");
        self.entries.push(ReminderEntry {
            id,
            bundle: bundle.clone(),
            snooze_remaining: request.effective_snooze_times(),
            request,
            trigger_at: Some(trigger_at),
            status: ReminderStatus::Active,
            expired: false,
            last_shown: None,
        });
        Ok(id)
    }

    /// Removes one reminder owned by `bundle`. Unknown ids are ignored.
    pub fn cancel(&mut self, bundle: &BundleOption, id: ReminderId) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !(entry.id == id && entry.bundle.bundle == bundle.bundle));
        let removed = self.entries.len() != before;
        if !removed {
            warn!(reminder_id = id, bundle = %bundle, "cancel: reminder not found");
        }
        removed
    }

    pub fn cancel_all(&mut self, bundle: &BundleOption) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|entry| entry.bundle.bundle != bundle.bundle);
        let removed = before - self.entries.len();
        debug!(bundle = %bundle, removed, "cancelled all reminders");
        removed
    }

    pub fn valid_reminders(&self, bundle: &BundleOption) -> Vec<PublishedReminder> {
        let mut reminders: Vec<PublishedReminder> = self
            .entries
            .iter()
            .filter(|entry| !entry.expired && entry.bundle.bundle == bundle.bundle)
            .map(|entry| PublishedReminder {
                id: entry.id,
                request: entry.request.clone(),
            })
            .collect();
        reminders.sort_by_key(|reminder| reminder.id);
        reminders
    }

    pub fn entries(&self) -> &[ReminderEntry] {
        &self.entries
    }

    pub fn get(&self, id: ReminderId) -> Option<&ReminderEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn next_trigger(&self) -> Option<NaiveDateTime> {
        self.entries
            .iter()
            .filter(|entry| !entry.expired)
            .filter_map(|entry| entry.trigger_at)
            .min()
    }

    /// Shows every reminder whose trigger time has come and schedules its
    /// next occurrence.
    pub fn fire_due(&mut self, now: NaiveDateTime) -> Vec<ReminderAlert> {
        let mut due: Vec<usize> = (0..self.entries.len())
            .filter(|&idx| self.entries[idx].is_due(now))
            .collect();
        due.sort_by_key(|&idx| (self.entries[idx].trigger_at, self.entries[idx].id));

        let mut alerts = Vec::with_capacity(due.len());
        for idx in due {
            self.cover_same_notification(idx);
            let entry = &mut self.entries[idx];
            entry.status = ReminderStatus::Showing { alerting: true };
            entry.last_shown = Some(now);
            Self::advance(entry, now);
            info!(
                reminder_id = entry.id,
                expired = entry.expired,
                next = ?entry.trigger_at,
                "reminder shown"
            );
            alerts.push(ReminderAlert {
                bundle: entry.bundle.clone(),
                reminder_id: entry.id,
                notification: entry.notification(&entry.request.content),
                ring_duration: ring_duration(entry.request.effective_ring_duration()),
                max_screen_want_agent: entry.request.max_screen_want_agent.clone(),
            });
        }
        let purged = self.purge_expired();
        if purged > 0 {
            debug!(purged, "dropped covered reminders");
        }
        alerts
    }

    /// Postpones a showing reminder; returns the updated notification.
    pub fn snooze(&mut self, id: ReminderId, now: NaiveDateTime) -> Result<NotificationRequest> {
        let entry = self.showing_entry_mut(id)?;
        let interval = match entry.request.effective_time_interval() {
            0 => MIN_TIME_INTERVAL_SECS,
            secs => secs,
        };
        entry.trigger_at = Some(
            trigger::timer_trigger(now, interval)
                .ok_or_else(|| AnsError::invalid("snooze interval out of range"))?,
        );
        entry.status = ReminderStatus::Snoozed;
        entry.expired = false;
        debug!(reminder_id = id, next = ?entry.trigger_at, "reminder snoozed");
        let content = if entry.request.snooze_content.is_empty() {
            entry.request.content.clone()
        } else {
            entry.request.snooze_content.clone()
        };
        Ok(entry.notification(&content))
    }

    /// Dismisses a showing reminder and moves it to its next regular
    /// occurrence. Returns `false` when the reminder was not showing.
    pub fn close(&mut self, id: ReminderId, now: NaiveDateTime) -> Result<bool> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| AnsError::invalid(format!("reminder {id} does not exist")))?;
        if !entry.status.is_showing() {
            debug!(reminder_id = id, "close ignored, reminder not showing");
            return Ok(false);
        }
        entry.status = ReminderStatus::Active;
        match entry.request.next_repeat_trigger(now)? {
            Some(next) => {
                entry.trigger_at = Some(next);
                entry.snooze_remaining = entry.request.effective_snooze_times();
                entry.expired = false;
            }
            None => entry.expired = true,
        }
        self.purge_expired();
        Ok(true)
    }

    /// Stops the ringing of a reminder once its ring duration elapsed.
    pub fn alert_timeout(&mut self, id: ReminderId) -> Option<NotificationRequest> {
        let entry = self.entries.iter_mut().find(|entry| entry.id == id)?;
        if entry.status != (ReminderStatus::Showing { alerting: true }) {
            return None;
        }
        entry.status = ReminderStatus::Showing { alerting: false };
        let content = if entry.expired && !entry.request.expired_content.is_empty() {
            entry.request.expired_content.clone()
        } else {
            entry.request.content.clone()
        };
        Some(entry.notification(&content))
    }

    /// Reminders still ringing although their ring duration has elapsed.
    pub fn ring_elapsed(&self, now: NaiveDateTime) -> Vec<ReminderId> {
        self.entries
            .iter()
            .filter(|entry| entry.status == ReminderStatus::Showing { alerting: true })
            .filter(|entry| {
                entry
                    .last_shown
                    .and_then(|shown| {
                        let ring = ring_duration(entry.request.effective_ring_duration());
                        shown.checked_add_signed(ring)
                    })
                    .is_some_and(|end| end <= now)
            })
            .map(|entry| entry.id)
            .collect()
    }

    /// Re-evaluates trigger times after the wall clock moved. Overdue
    /// reminders keep their trigger so they ring on the next `fire_due`.
    pub fn refresh(&mut self, now: NaiveDateTime) {
        for entry in self.entries.iter_mut() {
            if entry.expired
                || entry.status != ReminderStatus::Active
                || matches!(entry.request.kind, ReminderKind::Timer { .. })
            {
                continue;
            }
            if entry.trigger_at.is_some_and(|at| at <= now) {
                continue;
            }
            match entry.request.first_trigger(now) {
                Ok(Some(next)) => entry.trigger_at = Some(next),
                Ok(None) => entry.expired = true,
                Err(err) => warn!(reminder_id = entry.id, %err, "unable to refresh trigger"),
            }
        }
    }

    /// Drops expired reminders that are no longer on screen.
    pub fn purge_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !(entry.expired && !entry.status.is_showing()));
        before - self.entries.len()
    }

    pub fn dump(&self) -> String {
        let mut by_bundle: BTreeMap<&str, Vec<&ReminderEntry>> = BTreeMap::new();
        for entry in &self.entries {
            by_bundle.entry(&entry.bundle.bundle).or_default().push(entry);
        }
        let mut out = String::new();
        let _ = writeln!(out, "ReminderDataManager{{ totalCount:{},", self.entries.len());
        for (bundle, mut reminders) in by_bundle {
            reminders.sort_by_key(|entry| (entry.trigger_at, entry.id));
            let _ = writeln!(out, "{bundle}:{{");
            let _ = writeln!(out, "    totalCount:{},", reminders.len());
            for entry in reminders {
                let trigger = entry
                    .trigger_at
                    .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string());
                let _ = writeln!(
                    out,
                    "    [id={}, type={:?}, trigger={}, status={:?}, expired={}, title={:?}]",
                    entry.id,
                    entry.request.reminder_type(),
                    trigger,
                    entry.status,
                    entry.expired,
                    entry.request.title
                );
            }
            let _ = writeln!(out, "}},");
        }
        out.push('}');
        out
    }
}

impl ReminderDataManager {
    fn check_limits(&self, bundle: &BundleOption) -> Result<()> {
        if self.entries.len() >= MAX_NUM_REMINDER_LIMIT_SYSTEM {
            warn!("system reminder limit reached");
            return Err(AnsError::SystemReminderLimitExceeded {
                limit: MAX_NUM_REMINDER_LIMIT_SYSTEM,
            });
        }
        let owned = self
            .entries
            .iter()
            .filter(|entry| !entry.expired && entry.bundle.bundle == bundle.bundle)
            .count();
        if owned >= MAX_NUM_REMINDER_LIMIT_APP {
            warn!(bundle = %bundle, owned, "application reminder limit reached");
            return Err(AnsError::ReminderLimitExceeded {
                bundle: bundle.bundle.clone(),
                limit: MAX_NUM_REMINDER_LIMIT_APP,
            });
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> ReminderId {
        self.last_id = match self.last_id.checked_add(1) {
            Some(id) => id,
            None => {
                warn!("reminder id counter wrapped");
                1
            }
        };
        self.last_id
    }

    fn showing_entry_mut(&mut self, id: ReminderId) -> Result<&mut ReminderEntry> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| AnsError::invalid(format!("reminder {id} does not exist")))?;
        if !entry.status.is_showing() {
            return Err(AnsError::invalid(format!("reminder {id} is not showing")));
        }
        Ok(entry)
    }

    /// A reminder taking over a notification id hides the one showing under it.
    fn cover_same_notification(&mut self, idx: usize) {
        let (bundle, notification_id, id) = {
            let entry = &self.entries[idx];
            (
                entry.bundle.bundle.clone(),
                entry.request.notification_id,
                entry.id,
            )
        };
        for other in self.entries.iter_mut() {
            if other.id != id
                && other.bundle.bundle == bundle
                && other.request.notification_id == notification_id
                && other.status.is_showing()
            {
                debug!(covered = other.id, by = id, "notification id taken over");
                other.status = ReminderStatus::Active;
            }
        }
    }

    fn advance(entry: &mut ReminderEntry, now: NaiveDateTime) {
        if matches!(entry.request.kind, ReminderKind::Timer { .. }) {
            entry.trigger_at = None;
            entry.expired = true;
            return;
        }
        let interval = entry.request.effective_time_interval();
        if interval > 0 && entry.snooze_remaining > 0 {
            entry.snooze_remaining -= 1;
            entry.trigger_at = trigger::timer_trigger(now, interval);
            entry.expired = entry.trigger_at.is_none();
            return;
        }
        entry.snooze_remaining = entry.request.effective_snooze_times();
        match entry.request.next_repeat_trigger(now) {
            Ok(Some(next)) => entry.trigger_at = Some(next),
            Ok(None) => {
                entry.trigger_at = None;
                entry.expired = true;
            }
            Err(err) => {
                warn!(reminder_id = entry.id, %err, "unable to compute next trigger");
                entry.trigger_at = None;
                entry.expired = true;
            }
        }
    }
}

fn ring_duration(seconds: u64) -> Duration {
    i64::try_from(seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::{ActionButton, ActionButtonType, LocalDateTime};
    use chrono::NaiveDate;

    fn at(d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn app() -> BundleOption {
        BundleOption::new("com.example.reminders")
    }

    #[test]
    fn ids_increase_by_one_per_publish() {
        let mut manager = ReminderDataManager::new();
        let now = at(1, 8, 0);
        let first = manager.publish(&app(), ReminderRequest::timer(100), now).unwrap();
        let second = manager.publish(&app(), ReminderRequest::timer(100), now).unwrap();
        assert_eq!(second, first + 1);
    }

    #[test]
    fn application_cap_rejects_the_thirty_first_reminder() {
        let mut manager = ReminderDataManager::new();
        let now = at(1, 8, 0);
        let ids: Vec<_> = (0..MAX_NUM_REMINDER_LIMIT_APP)
            .map(|_| manager.publish(&app(), ReminderRequest::timer(100), now).unwrap())
            .collect();
        assert_eq!(ids[ids.len() - 1] - ids[0], 29);

        let err = manager
            .publish(&app(), ReminderRequest::timer(100), now)
            .unwrap_err();
        assert!(matches!(err, AnsError::ReminderLimitExceeded { limit: 30, .. }));

        // Other applications are unaffected, and the rejected publish used no id.
        let other = manager
            .publish(&BundleOption::new("com.example.other"), ReminderRequest::timer(100), now)
            .unwrap();
        assert_eq!(other, ids[ids.len() - 1] + 1);
    }

    #[test]
    fn cancel_unknown_is_noop_and_cancel_known_removes_one() {
        let mut manager = ReminderDataManager::new();
        let now = at(1, 8, 0);
        let id = manager.publish(&app(), ReminderRequest::timer(100), now).unwrap();
        manager.publish(&app(), ReminderRequest::timer(200), now).unwrap();

        assert!(!manager.cancel(&app(), 9999));
        assert_eq!(manager.valid_reminders(&app()).len(), 2);

        // Another bundle cannot cancel it.
        assert!(!manager.cancel(&BundleOption::new("com.example.other"), id));
        assert!(manager.cancel(&app(), id));
        assert_eq!(manager.valid_reminders(&app()).len(), 1);

        assert_eq!(manager.cancel_all(&app()), 1);
        assert!(manager.valid_reminders(&app()).is_empty());
    }

    #[test]
    fn timer_fires_once_and_expires() {
        let mut manager = ReminderDataManager::new();
        let now = at(1, 8, 0);
        let id = manager
            .publish(&app(), ReminderRequest::timer(60).with_title("tea"), now)
            .unwrap();
        assert!(manager.fire_due(at(1, 8, 0)).is_empty());

        let alerts = manager.fire_due(at(1, 8, 1));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].reminder_id, id);
        assert_eq!(alerts[0].notification.label, NOTIFICATION_LABEL);
        assert_eq!(alerts[0].notification.content.title(), "tea");
        assert!(manager.valid_reminders(&app()).is_empty());
        assert!(manager.fire_due(at(1, 9, 0)).is_empty());

        assert!(manager.close(id, at(1, 8, 2)).unwrap());
        assert_eq!(manager.total_count(), 0);
    }

    #[test]
    fn repeating_alarm_moves_to_next_day() {
        let mut manager = ReminderDataManager::new();
        // 2025-03-03 is a Monday.
        let id = manager
            .publish(&app(), ReminderRequest::alarm(7, 0, vec![1, 3]), at(3, 6, 0))
            .unwrap();
        assert_eq!(manager.next_trigger(), Some(at(3, 7, 0)));

        let alerts = manager.fire_due(at(3, 7, 0));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].notification.classification.as_deref(), Some(CLASSIFICATION_ALARM));
        assert_eq!(manager.get(id).unwrap().trigger_at, Some(at(5, 7, 0)));
        assert!(!manager.get(id).unwrap().expired);
    }

    #[test]
    fn snooze_interval_is_consumed_before_next_repeat() {
        let mut manager = ReminderDataManager::new();
        let request = ReminderRequest::alarm(7, 0, vec![])
            .with_time_interval(600)
            .with_snooze_times(1);
        let id = manager.publish(&app(), request, at(3, 6, 0)).unwrap();

        manager.fire_due(at(3, 7, 0));
        assert_eq!(manager.get(id).unwrap().trigger_at, Some(at(3, 7, 10)));
        manager.fire_due(at(3, 7, 10));
        let entry = manager.get(id).unwrap();
        assert!(entry.expired, "one-shot alarm expires once snoozes are used up");
    }

    #[test]
    fn user_snooze_and_close() {
        let mut manager = ReminderDataManager::new();
        let mut request = ReminderRequest::alarm(7, 0, vec![2])
            .with_action_button(ActionButton::new("later", ActionButtonType::Snooze));
        request.snooze_content = "snoozing".into();
        let id = manager.publish(&app(), request, at(3, 6, 0)).unwrap();

        assert!(manager.snooze(id, at(3, 6, 30)).is_err(), "only showing reminders snooze");
        manager.fire_due(at(4, 7, 0));

        let updated = manager.snooze(id, at(4, 7, 1)).unwrap();
        assert_eq!(updated.content.basic_content().text, "snoozing");
        assert_eq!(manager.get(id).unwrap().status, ReminderStatus::Snoozed);
        assert_eq!(manager.get(id).unwrap().trigger_at, Some(at(4, 7, 6)));

        manager.fire_due(at(4, 7, 6));
        assert!(manager.close(id, at(4, 7, 7)).unwrap());
        assert_eq!(manager.get(id).unwrap().trigger_at, Some(at(11, 7, 0)));
        assert!(!manager.close(id, at(4, 7, 8)).unwrap());
    }

    #[test]
    fn alert_timeout_switches_to_expired_content() {
        let mut manager = ReminderDataManager::new();
        let mut request = ReminderRequest::timer(1);
        request.expired_content = "missed".into();
        let id = manager.publish(&app(), request, at(1, 8, 0)).unwrap();
        manager.fire_due(at(1, 8, 1));

        assert!(manager.ring_elapsed(at(1, 8, 1)).is_empty());
        assert_eq!(manager.ring_elapsed(at(1, 8, 2)), vec![id]);
        let notification = manager.alert_timeout(id).unwrap();
        assert_eq!(notification.content.basic_content().text, "missed");
        assert!(manager.alert_timeout(id).is_none());
    }

    #[test]
    fn past_one_shot_calendar_is_rejected() {
        let mut manager = ReminderDataManager::new();
        let date_time = LocalDateTime::from(at(1, 8, 0));
        let err = manager
            .publish(&app(), ReminderRequest::calendar(date_time, vec![], vec![]), at(2, 8, 0))
            .unwrap_err();
        assert!(matches!(err, AnsError::NoNextTrigger));
    }

    #[test]
    fn same_notification_id_is_covered() {
        let mut manager = ReminderDataManager::new();
        let every_day = vec![1, 2, 3, 4, 5, 6, 7];
        let first = manager
            .publish(&app(), ReminderRequest::alarm(7, 0, every_day.clone()), at(3, 6, 0))
            .unwrap();
        let second = manager
            .publish(&app(), ReminderRequest::alarm(7, 5, every_day), at(3, 6, 0))
            .unwrap();
        manager.fire_due(at(3, 7, 0));
        assert!(manager.get(first).unwrap().status.is_showing());
        manager.fire_due(at(3, 7, 5));
        assert!(!manager.get(first).unwrap().status.is_showing());
        assert!(manager.get(second).unwrap().status.is_showing());
    }

    #[test]
    fn covered_timers_do_not_fill_the_system_cap() {
        let mut manager = ReminderDataManager::new();
        let now = at(1, 8, 0);
        for _ in 0..=MAX_NUM_REMINDER_LIMIT_SYSTEM {
            manager.publish(&app(), ReminderRequest::timer(1), now).unwrap();
            assert_eq!(manager.fire_due(now + Duration::seconds(1)).len(), 1);
        }
        // Only the timer currently on screen is kept.
        assert_eq!(manager.total_count(), 1);
        assert!(manager.valid_reminders(&app()).is_empty());
        manager.publish(&app(), ReminderRequest::timer(1), now).unwrap();
    }

    #[test]
    fn delivery_time_is_the_local_show_time() {
        let mut manager = ReminderDataManager::new();
        manager.publish(&app(), ReminderRequest::timer(60), at(1, 8, 0)).unwrap();
        let alerts = manager.fire_due(at(1, 8, 1));
        let expected = at(1, 8, 1)
            .and_local_timezone(Local)
            .earliest()
            .map(|at| at.timestamp_millis());
        assert_eq!(alerts[0].notification.delivery_time, expected);
    }

    #[test]
    fn refresh_recomputes_future_triggers_after_clock_change() {
        let mut manager = ReminderDataManager::new();
        let alarm = manager
            .publish(&app(), ReminderRequest::alarm(7, 0, vec![]), at(3, 6, 0))
            .unwrap();
        let timer = manager.publish(&app(), ReminderRequest::timer(600), at(3, 6, 0)).unwrap();
        assert_eq!(manager.get(alarm).unwrap().trigger_at, Some(at(3, 7, 0)));

        // Clock set back one day.
        manager.refresh(at(2, 6, 0));
        assert_eq!(manager.get(alarm).unwrap().trigger_at, Some(at(2, 7, 0)));
        assert_eq!(manager.get(timer).unwrap().trigger_at, Some(at(3, 6, 10)));
    }

    #[test]
    fn refresh_keeps_overdue_triggers() {
        let mut manager = ReminderDataManager::new();
        let id = manager
            .publish(&app(), ReminderRequest::alarm(7, 0, vec![]), at(3, 6, 0))
            .unwrap();
        manager.refresh(at(3, 9, 0));
        assert_eq!(manager.get(id).unwrap().trigger_at, Some(at(3, 7, 0)));
        assert_eq!(manager.fire_due(at(3, 9, 0)).len(), 1);
    }

    #[test]
    fn refresh_expires_passed_calendar_and_purge_drops_it() {
        let mut manager = ReminderDataManager::new();
        let date_time = LocalDateTime::from(at(2, 8, 0));
        let id = manager
            .publish(&app(), ReminderRequest::calendar(date_time, vec![], vec![]), at(1, 8, 0))
            .unwrap();
        // Stored trigger still ahead of the clock, but the date itself has passed.
        let mut snapshot = manager.snapshot();
        snapshot.entries[0].trigger_at = Some(at(9, 8, 0));
        let mut restored = ReminderDataManager::restore(snapshot);

        restored.refresh(at(3, 8, 0));
        assert!(restored.get(id).unwrap().expired);
        assert_eq!(restored.purge_expired(), 1);
        assert_eq!(restored.total_count(), 0);
    }

    #[test]
    fn purge_keeps_expired_reminders_on_screen() {
        let mut manager = ReminderDataManager::new();
        let id = manager.publish(&app(), ReminderRequest::timer(60), at(1, 8, 0)).unwrap();
        manager.fire_due(at(1, 8, 1));
        assert!(manager.get(id).unwrap().expired);

        assert_eq!(manager.purge_expired(), 0);
        assert!(manager.get(id).unwrap().status.is_showing());
    }

    #[test]
    fn snapshot_restores_counter() {
        let mut manager = ReminderDataManager::new();
        let now = at(1, 8, 0);
        let id = manager.publish(&app(), ReminderRequest::timer(100), now).unwrap();
        let mut restored = ReminderDataManager::restore(manager.snapshot());
        let next = restored.publish(&app(), ReminderRequest::timer(100), now).unwrap();
        assert_eq!(next, id + 1);
        assert!(restored.dump().contains("com.example.reminders"));
    }
}
