use std::sync::Arc;
use std::time::Duration;

use ans_agent::{CallbackError, Clock, ReminderAgent};
use ans_core::reminder::{ActionButton, ActionButtonType, LocalDateTime};
use ans_core::reminder_manager::NOTIFICATION_LABEL;
use ans_core::store::ReminderStore;
use ans_core::{AnsError, BundleOption, NotificationService, ReminderRequest, SlotType};
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use serde_json::json;
use tempfile::tempdir;
use tokio::sync::oneshot;

struct ManualClock(Mutex<NaiveDateTime>);

impl ManualClock {
    fn at(now: NaiveDateTime) -> Arc<Self> {
        Arc::new(Self(Mutex::new(now)))
    }

    fn set(&self, now: NaiveDateTime) {
        *self.0.lock() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.0.lock()
    }
}

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 9, 1)
        .expect("date")
        .and_hms_opt(8, 0, 0)
        .expect("time")
}

fn app() -> BundleOption {
    BundleOption::new("com.example.clock").with_uid(20010042)
}

fn agent_with(clock: Arc<ManualClock>) -> ReminderAgent {
    ReminderAgent::builder(app())
        .with_clock(clock)
        .build()
        .expect("build agent")
}

#[tokio::test]
async fn published_fields_survive_the_round_trip() {
    let agent = agent_with(ManualClock::at(start()));
    let mut request = ReminderRequest::alarm(6, 45, vec![1, 2, 3, 4, 5])
        .with_title("Wake up")
        .with_content("Time to get up")
        .with_action_button(ActionButton::new("Stop", ActionButtonType::Close))
        .with_action_button(ActionButton::new("Snooze", ActionButtonType::Snooze))
        .with_time_interval(300)
        .with_snooze_times(2);
    request.ring_duration = 30;
    request.snooze_content = "Snoozed".into();
    request.expired_content = "Missed".into();
    request.notification_id = 100;
    request.slot_type = SlotType::ContentInformation;

    let id = agent.publish_reminder(request.clone()).await.expect("publish");
    let valid = agent.get_valid_reminders().await.expect("valid reminders");
    assert_eq!(valid.len(), 1);
    assert_eq!(valid[0].id, id);
    assert_eq!(valid[0].request, request);
}

#[tokio::test]
async fn concurrent_publishes_get_consecutive_ids() {
    let agent = agent_with(ManualClock::at(start()));
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let agent = agent.clone();
            tokio::spawn(async move { agent.publish_reminder(ReminderRequest::timer(600)).await })
        })
        .collect();
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.expect("join").expect("publish"));
    }
    ids.sort();
    let first = ids[0];
    assert_eq!(ids, (first..first + 10).collect::<Vec<_>>());
}

#[tokio::test]
async fn thirty_first_reminder_is_rejected() {
    let agent = agent_with(ManualClock::at(start()));
    for _ in 0..30 {
        agent
            .publish_reminder(ReminderRequest::timer(600))
            .await
            .expect("publish under cap");
    }
    let err = agent
        .publish_reminder(ReminderRequest::timer(600))
        .await
        .expect_err("cap reached");
    assert!(matches!(err, AnsError::ReminderLimitExceeded { .. }));
    assert_eq!(agent.get_valid_reminders().await.expect("valid").len(), 30);
}

#[tokio::test]
async fn cancel_semantics() {
    let agent = agent_with(ManualClock::at(start()));
    let first = agent.publish_reminder(ReminderRequest::timer(600)).await.expect("publish");
    let second = agent.publish_reminder(ReminderRequest::timer(900)).await.expect("publish");

    agent.cancel_reminder(9999).await.expect("unknown id is a no-op");
    assert_eq!(agent.get_valid_reminders().await.expect("valid").len(), 2);

    agent.cancel_reminder(first).await.expect("cancel");
    let remaining: Vec<_> = agent
        .get_valid_reminders()
        .await
        .expect("valid")
        .into_iter()
        .map(|reminder| reminder.id)
        .collect();
    assert_eq!(remaining, vec![second]);

    agent.cancel_all_reminders().await.expect("cancel all");
    assert!(agent.get_valid_reminders().await.expect("valid").is_empty());
}

#[tokio::test]
async fn reminders_are_scoped_to_their_bundle() {
    let agent = agent_with(ManualClock::at(start()));
    let other = agent.with_bundle(BundleOption::new("com.example.other"));
    let id = agent.publish_reminder(ReminderRequest::timer(600)).await.expect("publish");

    other.cancel_reminder(id).await.expect("foreign cancel is a no-op");
    assert!(other.get_valid_reminders().await.expect("valid").is_empty());
    assert_eq!(agent.get_valid_reminders().await.expect("valid").len(), 1);
}

#[tokio::test]
async fn slot_operations_accept_loose_arguments() {
    let agent = agent_with(ManualClock::at(start()));
    agent
        .add_notification_slot(SlotType::SocialCommunication)
        .await
        .expect("add by type");
    agent
        .add_notification_slot_value(json!({"type": 2, "bypassDnd": true}))
        .await
        .expect("add by descriptor");
    assert_eq!(agent.service().get_slots(&app()).len(), 2);

    let err = agent
        .add_notification_slot_value(serde_json::Value::Null)
        .await
        .expect_err("null slot");
    assert_eq!(err.code(), 3);

    agent
        .remove_notification_slot(SlotType::OtherTypes)
        .await
        .expect("missing slot removal is tolerated");
    agent
        .remove_notification_slot(SlotType::SocialCommunication)
        .await
        .expect("remove");
    assert_eq!(agent.service().get_slots(&app()).len(), 1);
}

#[tokio::test]
async fn tick_publishes_due_reminders_and_actions_update_them() {
    let clock = ManualClock::at(start());
    let agent = agent_with(clock.clone());
    let mut request = ReminderRequest::calendar(
        LocalDateTime::from(start() + chrono::Duration::minutes(30)),
        vec![],
        vec![],
    )
    .with_title("Standup")
    .with_action_button(ActionButton::new("Later", ActionButtonType::Snooze));
    request.notification_id = 5;
    request.snooze_content = "In five minutes".into();
    let id = agent.publish_reminder(request).await.expect("publish");
    assert_eq!(agent.next_trigger(), Some(start() + chrono::Duration::minutes(30)));

    assert!(agent.tick(start()).await.expect("tick").is_empty());

    let due = start() + chrono::Duration::minutes(30);
    clock.set(due);
    let alerts = agent.tick(due).await.expect("tick");
    assert_eq!(alerts.len(), 1);
    let shown = agent.service().active_notifications(&app());
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].request.label, NOTIFICATION_LABEL);
    assert_eq!(shown[0].request.content.title(), "Standup");

    agent.snooze_reminder(id).await.expect("snooze");
    let shown = agent.service().active_notifications(&app());
    assert_eq!(shown[0].request.content.basic_content().text, "In five minutes");

    let again = due + chrono::Duration::minutes(5);
    clock.set(again);
    assert_eq!(agent.tick(again).await.expect("tick").len(), 1);

    agent.close_reminder(id).await.expect("close");
    assert!(agent.service().active_notifications(&app()).is_empty());
    assert!(agent.get_valid_reminders().await.expect("valid").is_empty());
}

#[test]
fn trigger_loop_needs_a_runtime() {
    let agent = agent_with(ManualClock::at(start()));
    let err = agent
        .spawn_trigger_loop(Duration::from_millis(10))
        .err()
        .expect("no runtime");
    assert!(matches!(err, AnsError::ServiceNotReady));
}

#[tokio::test]
async fn snooze_is_refused_without_rescheduling_once_disabled() {
    let clock = ManualClock::at(start());
    let agent = agent_with(clock.clone());
    let due = start() + chrono::Duration::minutes(10);
    let request = ReminderRequest::calendar(LocalDateTime::from(due), vec![], vec![])
        .with_action_button(ActionButton::new("Later", ActionButtonType::Snooze));
    let id = agent.publish_reminder(request).await.expect("publish");
    clock.set(due);
    assert_eq!(agent.tick(due).await.expect("tick").len(), 1);
    assert_eq!(agent.next_trigger(), None);

    agent.service().enable_notification(&app(), false);
    let err = agent.snooze_reminder(id).await.expect_err("not allowed");
    assert!(matches!(err, AnsError::NotAllowed(_)));
    assert_eq!(agent.next_trigger(), None);

    agent.service().enable_notification(&app(), true);
    agent.snooze_reminder(id).await.expect("snooze");
    assert_eq!(agent.next_trigger(), Some(due + chrono::Duration::minutes(5)));
}

#[tokio::test]
async fn disabled_application_cannot_publish() {
    let service = Arc::new(NotificationService::builder().build());
    service.set_uid_permission(20010042, false);
    let agent = ReminderAgent::builder(app())
        .with_service(service)
        .with_clock(ManualClock::at(start()))
        .build()
        .expect("build");
    let err = agent
        .publish_reminder(ReminderRequest::timer(60))
        .await
        .expect_err("not allowed");
    assert!(matches!(err, AnsError::NotAllowed(_)));
}

#[tokio::test]
async fn callbacks_are_invoked_once_with_the_outcome() {
    let agent = agent_with(ManualClock::at(start()));

    let (tx, rx) = oneshot::channel();
    agent
        .publish_reminder_with(ReminderRequest::timer(60), move |result| {
            let _ = tx.send(result);
        })
        .expect("runtime present")
        .await
        .expect("join");
    let id = rx.await.expect("callback").expect("publish");

    let (tx, rx) = oneshot::channel();
    agent
        .get_valid_reminders_with(move |result| {
            let _ = tx.send(result.map(|reminders| reminders.len()));
        })
        .expect("runtime present")
        .await
        .expect("join");
    assert_eq!(rx.await.expect("callback").expect("list"), 1);

    let (tx, rx) = oneshot::channel();
    agent
        .publish_reminder_with(ReminderRequest::alarm(25, 0, vec![]), move |result| {
            let _ = tx.send(CallbackError::from_result(&result));
        })
        .expect("runtime present")
        .await
        .expect("join");
    assert_eq!(rx.await.expect("callback").code(), 3);

    let (tx, rx) = oneshot::channel();
    agent
        .cancel_reminder_with(id, move |result| {
            let _ = tx.send(CallbackError::from_result(&result));
        })
        .expect("runtime present")
        .await
        .expect("join");
    assert!(rx.await.expect("callback").is_ok());
}

#[tokio::test]
async fn trigger_loop_fires_and_shuts_down() {
    let clock = ManualClock::at(start());
    let agent = agent_with(clock.clone());
    agent
        .publish_reminder(ReminderRequest::timer(10).with_title("Tea"))
        .await
        .expect("publish");
    clock.set(start() + chrono::Duration::seconds(10));

    let trigger_loop = agent
        .spawn_trigger_loop(Duration::from_millis(10))
        .expect("runtime present");
    let mut shown = Vec::new();
    for _ in 0..100 {
        shown = agent.service().active_notifications(&app());
        if !shown.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    trigger_loop.shutdown().await;
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].request.content.title(), "Tea");
}

#[tokio::test]
async fn store_restores_reminders_across_agents() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("reminders.json");
    let clock = ManualClock::at(start());

    let first = ReminderAgent::builder(app())
        .with_store(ReminderStore::new(&path))
        .with_clock(clock.clone())
        .build()
        .expect("build");
    let id = first
        .publish_reminder(ReminderRequest::alarm(9, 0, vec![1]).with_title("Weekly"))
        .await
        .expect("publish");
    drop(first);

    let second = ReminderAgent::builder(app())
        .with_store(ReminderStore::new(&path))
        .with_clock(clock)
        .build()
        .expect("rebuild");
    let valid = second.get_valid_reminders().await.expect("valid");
    assert_eq!(valid.len(), 1);
    assert_eq!(valid[0].id, id);
    let next = second
        .publish_reminder(ReminderRequest::timer(60))
        .await
        .expect("publish");
    assert_eq!(next, id + 1);
    assert!(second.dump().contains("com.example.clock"));
}
