use std::sync::Arc;
use std::time::Duration;

use ans_core::notification::NotificationRequest;
use ans_core::reminder_manager::{
    ReminderAlert, ReminderDataManager, ReminderEntry, NOTIFICATION_LABEL,
};
use ans_core::store::ReminderStore;
use ans_core::{
    AnsError, BundleOption, NotificationService, PublishedReminder, ReminderId, ReminderRequest,
    Result, SlotArg, SlotType,
};
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

/// Source of the local wall-clock time used for trigger computations.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

struct Shared {
    manager: Mutex<ReminderDataManager>,
    service: Arc<NotificationService>,
    store: Option<ReminderStore>,
    clock: Arc<dyn Clock>,
}

/// Reminder API as seen by one application. Clones share the same engine.
#[derive(Clone)]
pub struct ReminderAgent {
    bundle: BundleOption,
    shared: Arc<Shared>,
}

pub struct ReminderAgentBuilder {
    bundle: BundleOption,
    service: Option<Arc<NotificationService>>,
    store: Option<ReminderStore>,
    clock: Option<Arc<dyn Clock>>,
}

impl ReminderAgentBuilder {
    pub fn new(bundle: BundleOption) -> Self {
        Self {
            bundle,
            service: None,
            store: None,
            clock: None,
        }
    }

    pub fn with_service(mut self, service: Arc<NotificationService>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_store(mut self, store: ReminderStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<ReminderAgent> {
        self.bundle.validate()?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let manager = match self.store.as_ref().map(ReminderStore::load).transpose()? {
            Some(Some(snapshot)) => {
                let mut manager = ReminderDataManager::restore(snapshot);
                manager.refresh(clock.now());
                manager.purge_expired();
                manager
            }
            _ => ReminderDataManager::new(),
        };
        let service = self
            .service
            .unwrap_or_else(|| Arc::new(NotificationService::builder().build()));
        info!(bundle = %self.bundle, "reminder agent ready");
        Ok(ReminderAgent {
            bundle: self.bundle,
            shared: Arc::new(Shared {
                manager: Mutex::new(manager),
                service,
                store: self.store,
                clock,
            }),
        })
    }
}

impl ReminderAgent {
    pub fn builder(bundle: BundleOption) -> ReminderAgentBuilder {
        ReminderAgentBuilder::new(bundle)
    }

    /// The same engine, acting on behalf of another application.
    pub fn with_bundle(&self, bundle: BundleOption) -> Self {
        Self {
            bundle,
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn bundle(&self) -> &BundleOption {
        &self.bundle
    }

    pub fn service(&self) -> &Arc<NotificationService> {
        &self.shared.service
    }

    pub fn now(&self) -> NaiveDateTime {
        self.shared.clock.now()
    }

    #[instrument(skip(self, request), fields(bundle = %self.bundle))]
    pub async fn publish_reminder(&self, request: ReminderRequest) -> Result<ReminderId> {
        if !self.shared.service.is_notification_enabled(&self.bundle) {
            return Err(AnsError::NotAllowed(self.bundle.bundle.clone()));
        }
        let now = self.now();
        let mut manager = self.shared.manager.lock();
        let id = manager.publish(&self.bundle, request, now)?;
        self.persist(&manager);
        info!(reminder_id = id, "reminder published");
        Ok(id)
    }

    /// Unknown ids are accepted silently.
    pub async fn cancel_reminder(&self, id: ReminderId) -> Result<()> {
        let showing = {
            let mut manager = self.shared.manager.lock();
            let showing = manager
                .get(id)
                .filter(|entry| self.owns(entry) && entry.status.is_showing())
                .map(|entry| entry.request.notification_id);
            if manager.cancel(&self.bundle, id) {
                self.persist(&manager);
            }
            showing
        };
        if let Some(notification_id) = showing {
            self.dismiss(notification_id);
        }
        Ok(())
    }

    pub async fn get_valid_reminders(&self) -> Result<Vec<PublishedReminder>> {
        Ok(self.shared.manager.lock().valid_reminders(&self.bundle))
    }

    pub async fn cancel_all_reminders(&self) -> Result<()> {
        let showing: Vec<i32> = {
            let mut manager = self.shared.manager.lock();
            let showing = manager
                .entries()
                .iter()
                .filter(|entry| self.owns(entry) && entry.status.is_showing())
                .map(|entry| entry.request.notification_id)
                .collect();
            manager.cancel_all(&self.bundle);
            self.persist(&manager);
            showing
        };
        for notification_id in showing {
            self.dismiss(notification_id);
        }
        Ok(())
    }

    pub async fn add_notification_slot(&self, slot: impl Into<SlotArg>) -> Result<()> {
        let slot = slot.into().into_slot();
        self.shared.service.add_slot(&self.bundle, slot)
    }

    /// Accepts the loose form: either a bare slot type number or a descriptor
    /// object carrying at least `type`.
    pub async fn add_notification_slot_value(&self, value: Value) -> Result<()> {
        let slot = SlotArg::from_value(&value)?;
        self.add_notification_slot(slot).await
    }

    /// Removing a slot that does not exist is not an error.
    pub async fn remove_notification_slot(&self, slot_type: SlotType) -> Result<()> {
        if !self.shared.service.remove_slot(&self.bundle, slot_type) {
            debug!(?slot_type, "no slot to remove");
        }
        Ok(())
    }

    pub async fn snooze_reminder(&self, id: ReminderId) -> Result<()> {
        if !self.shared.service.is_notification_enabled(&self.bundle) {
            return Err(AnsError::NotAllowed(self.bundle.bundle.clone()));
        }
        let now = self.now();
        let notification = {
            let mut manager = self.shared.manager.lock();
            self.ensure_owned(&manager, id)?;
            let notification = manager.snooze(id, now)?;
            self.persist(&manager);
            notification
        };
        self.shared.service.publish(&self.bundle, notification, now)
    }

    pub async fn close_reminder(&self, id: ReminderId) -> Result<()> {
        let now = self.now();
        let closed = {
            let mut manager = self.shared.manager.lock();
            let notification_id = self.ensure_owned(&manager, id)?;
            let closed = manager.close(id, now)?;
            self.persist(&manager);
            closed.then_some(notification_id)
        };
        if let Some(notification_id) = closed {
            self.dismiss(notification_id);
        }
        Ok(())
    }

    /// Shows every reminder due at `now` and stops the ringing of those whose
    /// ring duration has elapsed.
    pub async fn tick(&self, now: NaiveDateTime) -> Result<Vec<ReminderAlert>> {
        let (alerts, silenced) = {
            let mut manager = self.shared.manager.lock();
            let alerts = manager.fire_due(now);
            let silenced: Vec<(BundleOption, NotificationRequest)> = manager
                .ring_elapsed(now)
                .into_iter()
                .filter_map(|id| {
                    let bundle = manager.get(id)?.bundle.clone();
                    manager.alert_timeout(id).map(|request| (bundle, request))
                })
                .collect();
            if !alerts.is_empty() || !silenced.is_empty() {
                self.persist(&manager);
            }
            (alerts, silenced)
        };

        for alert in &alerts {
            let notification = alert.notification.clone();
            if let Err(err) = self.shared.service.publish(&alert.bundle, notification, now) {
                warn!(
                    reminder_id = alert.reminder_id,
                    %err,
                    "failed to publish reminder notification"
                );
            }
        }
        for (bundle, request) in silenced {
            if let Err(err) = self.shared.service.publish(&bundle, request, now) {
                warn!(%err, "failed to update reminder notification");
            }
        }
        Ok(alerts)
    }

    pub fn next_trigger(&self) -> Option<NaiveDateTime> {
        self.shared.manager.lock().next_trigger()
    }

    pub fn dump(&self) -> String {
        self.shared.manager.lock().dump()
    }

    /// Runs `tick` every `period` on the current tokio runtime. Fails with
    /// [`AnsError::ServiceNotReady`] outside a runtime.
    pub fn spawn_trigger_loop(&self, period: Duration) -> Result<TriggerLoop> {
        let runtime = Handle::try_current().map_err(|err| {
            warn!(%err, "no async runtime for the trigger loop");
            AnsError::ServiceNotReady
        })?;
        let agent = self.clone();
        let period = period.max(Duration::from_millis(1));
        let (shutdown, mut stop) = watch::channel(false);
        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let now = agent.now();
                        if let Err(err) = agent.tick(now).await {
                            error!(%err, "trigger tick failed");
                        }
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            debug!("trigger loop stopping");
                            break;
                        }
                    }
                }
            }
        });
        Ok(TriggerLoop { shutdown, handle })
    }

    fn owns(&self, entry: &ReminderEntry) -> bool {
        entry.bundle.bundle == self.bundle.bundle
    }

    fn ensure_owned(&self, manager: &ReminderDataManager, id: ReminderId) -> Result<i32> {
        manager
            .get(id)
            .filter(|entry| self.owns(entry))
            .map(|entry| entry.request.notification_id)
            .ok_or_else(|| AnsError::invalid(format!("reminder {id} does not exist")))
    }

    fn dismiss(&self, notification_id: i32) {
        if let Err(err) = self
            .shared
            .service
            .cancel(&self.bundle, notification_id, NOTIFICATION_LABEL)
        {
            debug!(notification_id, %err, "reminder notification already gone");
        }
    }

    fn persist(&self, manager: &ReminderDataManager) {
        if let Some(store) = &self.shared.store {
            if let Err(err) = store.save(&manager.snapshot()) {
                error!(path = %store.path().display(), %err, "failed to persist reminders");
            }
        }
    }
}

/// Handle to the background trigger task.
pub struct TriggerLoop {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl TriggerLoop {
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.handle.await {
            warn!(%err, "trigger loop ended abnormally");
        }
    }
}
