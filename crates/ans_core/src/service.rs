use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use parking_lot::RwLock;
use tracing::{debug, info, instrument};

use crate::bundle::BundleOption;
use crate::disturb::{DisturbFilter, DoNotDisturbDate, DoNotDisturbMode};
use crate::error::{AnsError, Result};
use crate::notification::{
    Notification, NotificationKey, NotificationRequest, NotificationSubscriber,
};
use crate::slot::{NotificationSlot, SlotRegistry, SlotType, Visibility};

pub struct NotificationService {
    slots: SlotRegistry,
    notifications: RwLock<BTreeMap<NotificationKey, Notification>>,
    disabled_bundles: RwLock<HashSet<String>>,
    denied_uids: RwLock<HashSet<i32>>,
    disturb: RwLock<(DoNotDisturbMode, DoNotDisturbDate)>,
    subscribers: RwLock<Vec<Box<dyn NotificationSubscriber>>>,
}

pub struct NotificationServiceBuilder {
    subscribers: Vec<Box<dyn NotificationSubscriber>>,
    disturb_mode: DoNotDisturbMode,
}

impl NotificationServiceBuilder {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            disturb_mode: DoNotDisturbMode::default(),
        }
    }

    pub fn with_subscriber(mut self, subscriber: Box<dyn NotificationSubscriber>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    pub fn with_disturb_mode(mut self, mode: DoNotDisturbMode) -> Self {
        self.disturb_mode = mode;
        self
    }

    pub fn build(self) -> NotificationService {
        NotificationService {
            slots: SlotRegistry::new(),
            notifications: RwLock::new(BTreeMap::new()),
            disabled_bundles: RwLock::new(HashSet::new()),
            denied_uids: RwLock::new(HashSet::new()),
            disturb: RwLock::new((self.disturb_mode, DoNotDisturbDate::none())),
            subscribers: RwLock::new(self.subscribers),
        }
    }
}

impl Default for NotificationServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationService {
    pub fn builder() -> NotificationServiceBuilder {
        NotificationServiceBuilder::new()
    }

    pub fn subscribe(&self, subscriber: Box<dyn NotificationSubscriber>) {
        self.subscribers.write().push(subscriber);
    }

    /// Publishes or replaces the notification stored under `(bundle, id, label)`.
    #[instrument(skip(self, bundle, request), fields(bundle = %bundle, id = request.id))]
    pub fn publish(
        &self,
        bundle: &BundleOption,
        request: NotificationRequest,
        now: NaiveDateTime,
    ) -> Result<()> {
        bundle.validate()?;
        if !self.is_notification_enabled(bundle) {
            return Err(AnsError::NotAllowed(bundle.bundle.clone()));
        }
        let slot = self.slot_for(bundle, request.slot_type)?;

        let mut notification = Notification::new(bundle.clone(), request);
        apply_slot(&mut notification, &slot);

        let allowed = {
            let disturb = self.disturb.read();
            let (mode, date) = &*disturb;
            DisturbFilter::allows_alert(*mode, date, now, Some(&slot), &notification.request)?
        };
        if !allowed {
            debug!("do-not-disturb active, publishing silently");
            notification.silence();
        }

        let key = notification.key();
        let replaced = self
            .notifications
            .write()
            .insert(key, notification.clone())
            .is_some();
        info!(replaced, "notification published");
        for subscriber in self.subscribers.read().iter() {
            subscriber.on_consumed(&notification);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn cancel(&self, bundle: &BundleOption, id: i32, label: &str) -> Result<()> {
        let key = NotificationKey {
            bundle: bundle.bundle.clone(),
            id,
            label: label.to_string(),
        };
        let removed = self
            .notifications
            .write()
            .remove(&key)
            .ok_or_else(|| AnsError::NotificationNotExists {
                id,
                label: label.to_string(),
            })?;
        for subscriber in self.subscribers.read().iter() {
            subscriber.on_canceled(&removed);
        }
        Ok(())
    }

    pub fn cancel_all(&self, bundle: &BundleOption) -> usize {
        let removed: Vec<Notification> = {
            let mut notifications = self.notifications.write();
            let keys: Vec<NotificationKey> = notifications
                .keys()
                .filter(|key| key.bundle == bundle.bundle)
                .cloned()
                .collect();
            keys.iter()
                .filter_map(|key| notifications.remove(key))
                .collect()
        };
        let subscribers = self.subscribers.read();
        for notification in &removed {
            for subscriber in subscribers.iter() {
                subscriber.on_canceled(notification);
            }
        }
        removed.len()
    }

    pub fn active_notifications(&self, bundle: &BundleOption) -> Vec<Notification> {
        self.notifications
            .read()
            .values()
            .filter(|notification| notification.bundle.bundle == bundle.bundle)
            .cloned()
            .collect()
    }

    pub fn active_notification_count(&self, bundle: &BundleOption) -> usize {
        self.notifications
            .read()
            .keys()
            .filter(|key| key.bundle == bundle.bundle)
            .count()
    }

    pub fn all_active_notifications(&self) -> Vec<Notification> {
        self.notifications.read().values().cloned().collect()
    }

    pub fn add_slot(&self, bundle: &BundleOption, slot: NotificationSlot) -> Result<()> {
        self.slots.add_slot(bundle, slot)
    }

    pub fn add_slots(&self, bundle: &BundleOption, slots: Vec<NotificationSlot>) -> Result<()> {
        self.slots.add_slots(bundle, slots)
    }

    pub fn get_slot(&self, bundle: &BundleOption, slot_type: SlotType) -> Option<NotificationSlot> {
        self.slots.get_slot(bundle, slot_type)
    }

    pub fn get_slots(&self, bundle: &BundleOption) -> Vec<NotificationSlot> {
        self.slots.get_slots(bundle)
    }

    pub fn remove_slot(&self, bundle: &BundleOption, slot_type: SlotType) -> bool {
        self.slots.remove_slot(bundle, slot_type)
    }

    pub fn remove_all_slots(&self, bundle: &BundleOption) -> usize {
        self.slots.remove_all_slots(bundle)
    }

    pub fn set_do_not_disturb_date(&self, date: DoNotDisturbDate) -> Result<()> {
        date.validate()?;
        self.disturb.write().1 = date;
        info!(
            kind = ?date.kind,
            begin = %date.begin,
            end = %date.end,
            "do-not-disturb date changed"
        );
        for subscriber in self.subscribers.read().iter() {
            subscriber.on_disturb_date_changed(&date);
        }
        Ok(())
    }

    pub fn do_not_disturb_date(&self) -> DoNotDisturbDate {
        self.disturb.read().1
    }

    pub fn set_disturb_mode(&self, mode: DoNotDisturbMode) {
        self.disturb.write().0 = mode;
    }

    pub fn disturb_mode(&self) -> DoNotDisturbMode {
        self.disturb.read().0
    }

    pub fn supports_do_not_disturb_mode(&self) -> bool {
        true
    }

    pub fn enable_notification(&self, bundle: &BundleOption, enabled: bool) {
        let mut disabled = self.disabled_bundles.write();
        if enabled {
            disabled.remove(&bundle.bundle);
        } else {
            disabled.insert(bundle.bundle.clone());
        }
        debug!(bundle = %bundle, enabled, "notification permission changed");
    }

    pub fn set_uid_permission(&self, uid: i32, allowed: bool) {
        let mut denied = self.denied_uids.write();
        if allowed {
            denied.remove(&uid);
        } else {
            denied.insert(uid);
        }
        debug!(uid, allowed, "uid permission changed");
    }

    pub fn is_notification_enabled(&self, bundle: &BundleOption) -> bool {
        if self.disabled_bundles.read().contains(&bundle.bundle) {
            return false;
        }
        bundle
            .uid
            .map_or(true, |uid| !self.denied_uids.read().contains(&uid))
    }

    fn slot_for(&self, bundle: &BundleOption, slot_type: SlotType) -> Result<NotificationSlot> {
        if let Some(slot) = self.slots.get_slot(bundle, slot_type) {
            return Ok(slot);
        }
        if slot_type == SlotType::UnknownType {
            return Err(AnsError::SlotNotExist(slot_type));
        }
        debug!(bundle = %bundle, ?slot_type, "creating default slot");
        let slot = NotificationSlot::new(slot_type);
        self.slots.add_slot(bundle, slot.clone())?;
        Ok(slot)
    }
}

fn apply_slot(notification: &mut Notification, slot: &NotificationSlot) {
    notification.enable_sound = slot.has_sound();
    notification.sound = slot.sound.clone();
    notification.enable_light = slot.can_enable_light();
    notification.light_color = slot.light_color;
    notification.enable_vibration = slot.can_vibrate();
    notification.vibration_values = slot.vibration_values.clone();
    if notification.request.visibility == Visibility::NoOverride {
        notification.request.visibility = slot.lockscreen_visibility;
    }
}
