//! API Routes
//!
//! Route handlers organized by functionality.

pub mod appointments;
pub mod auth;
pub mod finance;
pub mod health;
pub mod profile;
pub mod reminders;
pub mod services;
pub mod settings;
