//! Reminder Scheduler
//!
//! Keeps the per-user reminder registry in sync with the store and
//! delivers due reminders through the push sender.

use super::{derive_reminders, Reminder};
use crate::push::{PushMessage, PushSender};
use crate::storage::{SalonStore, StoreResult};
use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Configuration for reminder scheduling
#[derive(Debug, Clone)]
pub struct ReminderConfig {
    /// How long before the appointment the reminder fires
    pub lead: Duration,
    /// How often the background loop looks for due reminders
    pub tick_interval: std::time::Duration,
    /// Offset used to render the appointment time in the message
    pub salon_offset: FixedOffset,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            lead: Duration::hours(1),
            tick_interval: std::time::Duration::from_secs(15),
            salon_offset: Utc.fix(),
        }
    }
}

type Registry = HashMap<String, HashMap<String, Reminder>>;

/// Schedules and fires appointment reminders
pub struct ReminderScheduler {
    store: Arc<SalonStore>,
    push: Arc<dyn PushSender>,
    registry: Arc<RwLock<Registry>>,
    running: Arc<RwLock<bool>>,
    config: ReminderConfig,
}

impl ReminderScheduler {
    pub fn new(store: Arc<SalonStore>, push: Arc<dyn PushSender>, config: ReminderConfig) -> Self {
        Self {
            store,
            push,
            registry: Arc::new(RwLock::new(HashMap::new())),
            running: Arc::new(RwLock::new(false)),
            config,
        }
    }

    pub fn config(&self) -> &ReminderConfig {
        &self.config
    }

    /// Cancel and re-derive every reminder of a user
    ///
    /// Errors are logged and swallowed; the user then has no reminders.
    /// Returns the number of reminders now scheduled.
    pub async fn resync(&self, user_id: &str) -> usize {
        self.resync_at(user_id, Utc::now()).await
    }

    pub async fn resync_at(&self, user_id: &str, now: DateTime<Utc>) -> usize {
        // Held from removal to insert: resyncs of a user never interleave
        let mut registry = self.registry.write().await;
        registry.remove(user_id);

        let reminders = match self.derive_for_user(user_id, now) {
            Ok(reminders) => reminders,
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Failed to schedule reminders");
                return 0;
            }
        };

        let count = reminders.len();
        if count > 0 {
            let set = reminders.into_iter().map(|r| (r.key.clone(), r)).collect();
            registry.insert(user_id.to_string(), set);
        }
        drop(registry);

        tracing::debug!(user_id = %user_id, scheduled = count, "Reminders resynced");
        count
    }

    fn derive_for_user(&self, user_id: &str, now: DateTime<Utc>) -> StoreResult<Vec<Reminder>> {
        let Some(profile) = self.store.get_user(user_id)? else {
            return Ok(Vec::new());
        };
        if !profile.notifications.reminders {
            return Ok(Vec::new());
        }

        let upcoming = self.store.upcoming_for_user(user_id, now)?;
        Ok(derive_reminders(&upcoming, now, self.config.lead))
    }

    /// Drop every pending reminder of a user
    pub async fn cancel_all(&self, user_id: &str) -> usize {
        self.registry
            .write()
            .await
            .remove(user_id)
            .map(|set| set.len())
            .unwrap_or(0)
    }

    /// Pending reminders of a user, soonest first
    pub async fn scheduled(&self, user_id: &str) -> Vec<Reminder> {
        let registry = self.registry.read().await;
        let mut reminders: Vec<Reminder> = registry
            .get(user_id)
            .map(|set| set.values().cloned().collect())
            .unwrap_or_default();
        reminders.sort_by_key(|r| r.fire_at);
        reminders
    }

    /// Total number of pending reminders across users
    pub async fn pending_count(&self) -> usize {
        self.registry.read().await.values().map(|set| set.len()).sum()
    }

    /// Remove and deliver every reminder whose instant has come
    ///
    /// Returns the number of messages handed to the push sender.
    pub async fn fire_due(&self, now: DateTime<Utc>) -> usize {
        let due: Vec<Reminder> = {
            let mut registry = self.registry.write().await;
            let mut due = Vec::new();
            for set in registry.values_mut() {
                let keys: Vec<String> = set
                    .iter()
                    .filter(|(_, r)| r.fire_at <= now)
                    .map(|(k, _)| k.clone())
                    .collect();
                for key in keys {
                    if let Some(reminder) = set.remove(&key) {
                        due.push(reminder);
                    }
                }
            }
            registry.retain(|_, set| !set.is_empty());
            due
        };

        let mut delivered = 0;
        for reminder in due {
            if self.deliver(&reminder).await {
                delivered += 1;
            }
        }
        delivered
    }

    async fn deliver(&self, reminder: &Reminder) -> bool {
        let token = match self.store.get_user(&reminder.user_id) {
            Ok(Some(profile)) => profile.push_token,
            Ok(None) => None,
            Err(e) => {
                tracing::error!(user_id = %reminder.user_id, error = %e, "Failed to load reminder recipient");
                return false;
            }
        };

        let Some(token) = token else {
            tracing::debug!(user_id = %reminder.user_id, key = %reminder.key, "No push token, reminder dropped");
            return false;
        };

        let message = self.reminder_message(reminder, token);
        match self.push.send(&message).await {
            Ok(()) => {
                tracing::info!(user_id = %reminder.user_id, key = %reminder.key, "Reminder sent");
                true
            }
            Err(e) => {
                tracing::error!(user_id = %reminder.user_id, key = %reminder.key, error = %e, "Reminder delivery failed");
                false
            }
        }
    }

    fn reminder_message(&self, reminder: &Reminder, token: String) -> PushMessage {
        let local = reminder.appointment_date.with_timezone(&self.config.salon_offset);
        PushMessage::new(
            token,
            "Appointment reminder",
            format!(
                "Your {} appointment is at {}.",
                reminder.service_name,
                local.format("%H:%M")
            ),
        )
        .data(json!({ "appointmentId": reminder.appointment_id }))
    }

    /// Start the reminder background task
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let scheduler = self.clone();

        tokio::spawn(async move {
            *scheduler.running.write().await = true;

            let mut interval = tokio::time::interval(scheduler.config.tick_interval);

            loop {
                interval.tick().await;

                if !*scheduler.running.read().await {
                    break;
                }

                let fired = scheduler.fire_due(Utc::now()).await;
                if fired > 0 {
                    tracing::info!("Delivered {} reminders", fired);
                }
            }
        })
    }

    /// Stop the background task
    pub async fn stop(&self) {
        *self.running.write().await = false;
    }
}
