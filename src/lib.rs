//! # Salon Console
//!
//! Backend for a beauty-salon admin console and its client app: accounts,
//! appointment board, service catalog, published salon info, monthly
//! revenue, realtime collection feeds and appointment reminders.
//!
//! ## Modules
//!
//! - [`storage`]: SQLite document store and avatar blob store
//! - [`auth`]: Accounts, password hashing, sessions and login throttling
//! - [`reminders`]: Reminder derivation and the delivery loop
//! - [`push`]: Push relay client and in-process outbox
//! - [`finance`]: Monthly revenue summary
//! - [`dashboard`]: Board filters, counters and input checks
//! - [`websocket`]: Realtime topic feeds
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use salon::storage::{default_services, SalonStore, StoreConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SalonStore::open(&StoreConfig::new("./salon_data"))?;
//!
//!     // Seed the catalog on a fresh install
//!     let inserted = store.seed_services(&default_services())?;
//!     println!("Seeded {} services", inserted.len());
//!
//!     for service in store.list_services()? {
//!         println!("{} - {:.2}", service.name, service.price);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod finance;
pub mod push;
pub mod reminders;
pub mod storage;
pub mod websocket;

// Re-export top-level types for convenience
pub use storage::{
    Appointment, AppointmentStatus, BlobStore, SalonSettings, SalonStore, Service, StoreConfig,
    StoreError, StoreResult, UserProfile,
};

pub use auth::{AuthError, AuthManager, AuthPolicy, AuthUser};

pub use reminders::{Reminder, ReminderConfig, ReminderScheduler};

pub use push::{OutboxPushSender, PushConfig, PushError, PushMessage, PushRelayClient, PushSender};

pub use finance::{monthly_summary, Month, MonthlySummary};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use websocket::{
    websocket_handler, ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage, WsEvent,
};

pub use config::{generate_default_config, Config, ConfigError, LoggingConfig};
