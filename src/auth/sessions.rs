//! Bearer sessions and failed-login throttling
//!
//! Both are in-memory: a restart signs everybody out and clears lockouts.

use crate::storage::Role;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// An authenticated session
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Registry of live sessions keyed by token
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Open a new session for a user
    pub async fn create(&self, user_id: &str, role: Role) -> Session {
        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            role,
            created_at: now,
            expires_at: now + self.ttl,
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !s.is_expired(now));
        sessions.insert(session.token.clone(), session.clone());
        session
    }

    /// Look up a live session; expired sessions are evicted
    pub async fn get(&self, token: &str) -> Option<Session> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                Some(session) if !session.is_expired(now) => return Some(session.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        self.sessions.write().await.remove(token);
        None
    }

    /// Drop a session, returning it if it existed
    pub async fn remove(&self, token: &str) -> Option<Session> {
        self.sessions.write().await.remove(token)
    }

    /// Drop every session of a user (after a password reset)
    pub async fn remove_for_user(&self, user_id: &str) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Sliding-window counter of failed logins per email
pub struct LoginThrottle {
    failures: RwLock<HashMap<String, Vec<DateTime<Utc>>>>,
    max_failures: usize,
    window: Duration,
}

impl LoginThrottle {
    pub fn new(max_failures: usize, window: Duration) -> Self {
        Self {
            failures: RwLock::new(HashMap::new()),
            max_failures,
            window,
        }
    }

    /// Check whether an email has hit the failure limit within the window
    ///
    /// Failures that aged out are dropped, along with the emptied entry.
    pub async fn is_locked(&self, email: &str, now: DateTime<Utc>) -> bool {
        let mut failures = self.failures.write().await;
        let Some(attempts) = failures.get_mut(email) else {
            return false;
        };

        attempts.retain(|t| now - *t < self.window);
        if attempts.is_empty() {
            failures.remove(email);
            return false;
        }
        attempts.len() >= self.max_failures
    }

    /// Record a failed login and sweep entries whose window has passed
    pub async fn record_failure(&self, email: &str, now: DateTime<Utc>) {
        let mut failures = self.failures.write().await;
        failures.retain(|_, attempts| {
            attempts.retain(|t| now - *t < self.window);
            !attempts.is_empty()
        });
        failures.entry(email.to_string()).or_default().push(now);
    }

    /// Number of emails with failures still being tracked
    pub async fn tracked(&self) -> usize {
        self.failures.read().await.len()
    }

    pub async fn clear(&self, email: &str) {
        self.failures.write().await.remove(email);
    }
}
