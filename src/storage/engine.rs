//! Salon Document Store
//!
//! SQLite-backed store for the four salon collections:
//! `users`, `services`, `appointments` and `settings`.
//!
//! Every operation is a single statement (or a single-document write);
//! there is no cross-document transactional logic. The connection lives
//! behind a mutex so the store can be shared across async handlers.

use crate::storage::error::{StoreError, StoreResult};
use crate::storage::new_id;
use crate::storage::types::{
    Appointment, AppointmentStatus, NewAppointment, NotificationPrefs, NotificationPrefsUpdate,
    Role, SalonSettings, Service, ServiceDraft, UserProfile, DEFAULT_MONTHLY_GOAL,
};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const SALON_INFO_KEY: &str = "salon_info";

/// Configuration for the document store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root directory for the database and blobs
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("salon_data"),
        }
    }
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Get path to the SQLite database file
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("salon.db")
    }

    /// Get path to the blob directory
    pub fn blobs_dir(&self) -> PathBuf {
        self.data_dir.join("blobs")
    }
}

/// Document store for all salon collections
pub struct SalonStore {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl SalonStore {
    /// Open (or create) the store under the configured data directory
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let path = config.db_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        Self::from_connection(conn, path)
    }

    /// Open a throwaway in-memory store
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, PathBuf::from(":memory:"))
    }

    fn from_connection(conn: Connection, path: PathBuf) -> StoreResult<Self> {
        Self::create_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    fn create_schema(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                role TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                push_token TEXT,
                notifications TEXT NOT NULL,
                monthly_goal REAL NOT NULL,
                avatar TEXT,
                member_since INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS services (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                duration INTEGER NOT NULL,
                price REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS appointments (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                user_name TEXT,
                service_id TEXT NOT NULL,
                service_name TEXT NOT NULL,
                price REAL NOT NULL,
                professional TEXT NOT NULL,
                date INTEGER NOT NULL,
                status TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_appointments_date ON appointments(date);
            CREATE INDEX IF NOT EXISTS idx_appointments_user ON appointments(user_id, date);

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                body TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lightweight liveness check of the database connection
    pub fn ping(&self) -> bool {
        match self.lock() {
            Ok(conn) => conn
                .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .is_ok(),
            Err(_) => false,
        }
    }

    // ============================================
    // USERS
    // ============================================

    /// Create a user document with default preferences and goal
    pub fn create_user(
        &self,
        email: &str,
        name: &str,
        role: Role,
        password_hash: &str,
    ) -> StoreResult<UserProfile> {
        let profile = UserProfile {
            id: new_id(),
            email: email.to_string(),
            name: name.to_string(),
            role,
            push_token: None,
            notifications: NotificationPrefs::default(),
            monthly_goal: DEFAULT_MONTHLY_GOAL,
            avatar: None,
            member_since: Utc::now(),
        };

        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO users (id, email, name, role, password_hash, push_token,
                                notifications, monthly_goal, avatar, member_since)
             VALUES (?, ?, ?, ?, ?, NULL, ?, ?, NULL, ?)",
            params![
                profile.id,
                profile.email,
                profile.name,
                profile.role.as_str(),
                password_hash,
                serde_json::to_string(&profile.notifications)?,
                profile.monthly_goal,
                profile.member_since.timestamp_millis(),
            ],
        );

        match result {
            Ok(_) => Ok(profile),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Duplicate {
                    field: "email",
                    value: email.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get a user by id
    pub fn get_user(&self, id: &str) -> StoreResult<Option<UserProfile>> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
                params![id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Get a user and its password hash by (case-insensitive) email
    pub fn find_credentials(&self, email: &str) -> StoreResult<Option<(UserProfile, String)>> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                &format!(
                    "SELECT {USER_COLUMNS}, password_hash FROM users
                     WHERE email = ? COLLATE NOCASE"
                ),
                params![email],
                |row| Ok((row_to_user(row)?, row.get::<_, String>(9)?)),
            )
            .optional()?;
        Ok(found)
    }

    /// Get a user's password hash by id
    pub fn password_hash(&self, id: &str) -> StoreResult<String> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT password_hash FROM users WHERE id = ?",
            params![id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("users", id))
    }

    pub fn set_password_hash(&self, id: &str, password_hash: &str) -> StoreResult<()> {
        self.update_user_field(id, "password_hash", password_hash)
    }

    /// Store (or clear) the opaque push-relay token of a user
    pub fn set_push_token(&self, id: &str, token: Option<&str>) -> StoreResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE users SET push_token = ? WHERE id = ?",
            params![token, id],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("users", id));
        }
        Ok(())
    }

    pub fn set_avatar(&self, id: &str, url: &str) -> StoreResult<()> {
        self.update_user_field(id, "avatar", url)
    }

    pub fn set_monthly_goal(&self, id: &str, goal: f64) -> StoreResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE users SET monthly_goal = ? WHERE id = ?",
            params![goal, id],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("users", id));
        }
        Ok(())
    }

    /// Apply a partial update to a user's notification flags
    ///
    /// Untouched flags keep their stored value.
    pub fn update_notifications(
        &self,
        id: &str,
        update: NotificationPrefsUpdate,
    ) -> StoreResult<UserProfile> {
        let mut profile = self
            .get_user(id)?
            .ok_or_else(|| StoreError::not_found("users", id))?;
        profile.notifications.apply(update);

        let conn = self.lock()?;
        conn.execute(
            "UPDATE users SET notifications = ? WHERE id = ?",
            params![serde_json::to_string(&profile.notifications)?, id],
        )?;
        Ok(profile)
    }

    /// Count administrators (used for bootstrap seeding)
    pub fn count_admins(&self) -> StoreResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = ?",
            params![Role::Admin.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn update_user_field(&self, id: &str, column: &str, value: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            &format!("UPDATE users SET {column} = ? WHERE id = ?"),
            params![value, id],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("users", id));
        }
        Ok(())
    }

    // ============================================
    // SERVICES
    // ============================================

    /// List services ordered by name
    pub fn list_services(&self) -> StoreResult<Vec<Service>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, duration, price FROM services ORDER BY name COLLATE NOCASE ASC",
        )?;
        let services = stmt
            .query_map([], row_to_service)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(services)
    }

    pub fn get_service(&self, id: &str) -> StoreResult<Option<Service>> {
        let conn = self.lock()?;
        let service = conn
            .query_row(
                "SELECT id, name, duration, price FROM services WHERE id = ?",
                params![id],
                row_to_service,
            )
            .optional()?;
        Ok(service)
    }

    pub fn create_service(&self, draft: &ServiceDraft) -> StoreResult<Service> {
        let service = Service {
            id: new_id(),
            name: draft.name.clone(),
            duration: draft.duration,
            price: draft.price,
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO services (id, name, duration, price) VALUES (?, ?, ?, ?)",
            params![service.id, service.name, service.duration, service.price],
        )?;
        Ok(service)
    }

    pub fn update_service(&self, id: &str, draft: &ServiceDraft) -> StoreResult<Service> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE services SET name = ?, duration = ?, price = ? WHERE id = ?",
            params![draft.name, draft.duration, draft.price, id],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("services", id));
        }
        Ok(Service {
            id: id.to_string(),
            name: draft.name.clone(),
            duration: draft.duration,
            price: draft.price,
        })
    }

    /// Delete a service
    ///
    /// Appointments referencing it are left untouched.
    pub fn delete_service(&self, id: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM services WHERE id = ?", params![id])?;
        if changed == 0 {
            return Err(StoreError::not_found("services", id));
        }
        Ok(())
    }

    /// Insert the given catalog only if no service exists yet
    ///
    /// Returns the inserted services (empty when the catalog was already populated).
    pub fn seed_services(&self, drafts: &[ServiceDraft]) -> StoreResult<Vec<Service>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let existing: i64 = tx.query_row("SELECT COUNT(*) FROM services", [], |row| row.get(0))?;
        if existing > 0 {
            return Ok(Vec::new());
        }

        let mut inserted = Vec::with_capacity(drafts.len());
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO services (id, name, duration, price) VALUES (?, ?, ?, ?)",
            )?;
            for draft in drafts {
                let service = Service {
                    id: new_id(),
                    name: draft.name.clone(),
                    duration: draft.duration,
                    price: draft.price,
                };
                stmt.execute(params![service.id, service.name, service.duration, service.price])?;
                inserted.push(service);
            }
        }
        tx.commit()?;

        Ok(inserted)
    }

    // ============================================
    // APPOINTMENTS
    // ============================================

    pub fn create_appointment(&self, new: NewAppointment) -> StoreResult<Appointment> {
        let appointment = Appointment {
            id: new_id(),
            user_id: new.user_id,
            user_name: new.user_name,
            service_id: new.service_id,
            service_name: new.service_name,
            price: new.price,
            professional: new.professional,
            date: new.date,
            status: AppointmentStatus::Pending,
            created_at: Utc::now(),
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO appointments (id, user_id, user_name, service_id, service_name,
                                       price, professional, date, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                appointment.id,
                appointment.user_id,
                appointment.user_name,
                appointment.service_id,
                appointment.service_name,
                appointment.price,
                appointment.professional,
                appointment.date.timestamp_millis(),
                appointment.status.as_str(),
                appointment.created_at.timestamp_millis(),
            ],
        )?;
        Ok(appointment)
    }

    pub fn get_appointment(&self, id: &str) -> StoreResult<Option<Appointment>> {
        let conn = self.lock()?;
        let appointment = conn
            .query_row(
                &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?"),
                params![id],
                row_to_appointment,
            )
            .optional()?;
        Ok(appointment)
    }

    /// List all appointments, most recent date first
    pub fn list_appointments(&self) -> StoreResult<Vec<Appointment>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments ORDER BY date DESC"
        ))?;
        let appointments = stmt
            .query_map([], row_to_appointment)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(appointments)
    }

    /// List a client's appointments, most recent date first
    pub fn appointments_for_user(&self, user_id: &str) -> StoreResult<Vec<Appointment>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments
             WHERE user_id = ? ORDER BY date DESC"
        ))?;
        let appointments = stmt
            .query_map(params![user_id], row_to_appointment)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(appointments)
    }

    /// List a client's appointments strictly after `now`, soonest first
    pub fn upcoming_for_user(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<Appointment>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments
             WHERE user_id = ? AND date > ? ORDER BY date ASC"
        ))?;
        let appointments = stmt
            .query_map(params![user_id, now.timestamp_millis()], row_to_appointment)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(appointments)
    }

    /// Set an appointment's status and return the updated document
    pub fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> StoreResult<Appointment> {
        {
            let conn = self.lock()?;
            let changed = conn.execute(
                "UPDATE appointments SET status = ? WHERE id = ?",
                params![status.as_str(), id],
            )?;
            if changed == 0 {
                return Err(StoreError::not_found("appointments", id));
            }
        }

        self.get_appointment(id)?
            .ok_or_else(|| StoreError::not_found("appointments", id))
    }

    pub fn delete_appointment(&self, id: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM appointments WHERE id = ?", params![id])?;
        if changed == 0 {
            return Err(StoreError::not_found("appointments", id));
        }
        Ok(())
    }

    // ============================================
    // SETTINGS
    // ============================================

    /// Get the salon info document (empty if never published)
    pub fn salon_settings(&self) -> StoreResult<SalonSettings> {
        let conn = self.lock()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM settings WHERE key = ?",
                params![SALON_INFO_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match body {
            Some(body) => Ok(serde_json::from_str(&body)?),
            None => Ok(SalonSettings::default()),
        }
    }

    pub fn save_salon_settings(&self, settings: &SalonSettings) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO settings (key, body) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET body = excluded.body",
            params![SALON_INFO_KEY, serde_json::to_string(settings)?],
        )?;
        Ok(())
    }
}

const USER_COLUMNS: &str =
    "id, email, name, role, push_token, notifications, monthly_goal, avatar, member_since";

const APPOINTMENT_COLUMNS: &str = "id, user_id, user_name, service_id, service_name, price, \
     professional, date, status, created_at";

fn conversion_error(idx: usize, ty: Type, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, message.into())
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| conversion_error(idx, Type::Integer, format!("invalid timestamp {ms}")))
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    let role: String = row.get(3)?;
    let notifications: String = row.get(5)?;

    Ok(UserProfile {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        role: Role::parse(&role)
            .ok_or_else(|| conversion_error(3, Type::Text, format!("unknown role {role}")))?,
        push_token: row.get(4)?,
        notifications: serde_json::from_str(&notifications)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?,
        monthly_goal: row.get(6)?,
        avatar: row.get(7)?,
        member_since: timestamp_at(row, 8)?,
    })
}

fn row_to_service(row: &Row<'_>) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        duration: row.get(2)?,
        price: row.get(3)?,
    })
}

fn row_to_appointment(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    let status: String = row.get(8)?;

    Ok(Appointment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        user_name: row.get(2)?,
        service_id: row.get(3)?,
        service_name: row.get(4)?,
        price: row.get(5)?,
        professional: row.get(6)?,
        date: timestamp_at(row, 7)?,
        status: AppointmentStatus::parse(&status)
            .ok_or_else(|| conversion_error(8, Type::Text, format!("unknown status {status}")))?,
        created_at: timestamp_at(row, 9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::default_services;
    use chrono::Duration;
    use tempfile::tempdir;

    fn booking(user_id: &str, service: &Service, date: DateTime<Utc>) -> NewAppointment {
        NewAppointment {
            user_id: user_id.to_string(),
            user_name: Some("Carla".to_string()),
            service_id: service.id.clone(),
            service_name: service.name.clone(),
            price: service.price,
            professional: "Salon team".to_string(),
            date,
        }
    }

    #[test]
    fn test_store_creation_on_disk() {
        let dir = tempdir().unwrap();
        let store = SalonStore::open(&StoreConfig::new(dir.path())).unwrap();
        assert!(store.ping());
        assert!(dir.path().join("salon.db").exists());
    }

    #[test]
    fn test_user_roundtrip_and_duplicate_email() {
        let store = SalonStore::open_in_memory().unwrap();
        let user = store
            .create_user("amanda@salon.test", "Amanda", Role::Admin, "hash")
            .unwrap();

        let loaded = store.get_user(&user.id).unwrap().unwrap();
        assert_eq!(loaded.email, "amanda@salon.test");
        assert_eq!(loaded.monthly_goal, DEFAULT_MONTHLY_GOAL);
        assert!(loaded.notifications.reminders);

        let (found, hash) = store.find_credentials("AMANDA@salon.test").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(hash, "hash");

        let dup = store.create_user("amanda@salon.test", "Other", Role::Client, "x");
        assert!(matches!(dup, Err(StoreError::Duplicate { field: "email", .. })));
        assert_eq!(store.count_admins().unwrap(), 1);
    }

    #[test]
    fn test_notification_update_keeps_other_flags() {
        let store = SalonStore::open_in_memory().unwrap();
        let user = store
            .create_user("c@salon.test", "Carla", Role::Client, "hash")
            .unwrap();

        let updated = store
            .update_notifications(
                &user.id,
                NotificationPrefsUpdate {
                    reminders: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!updated.notifications.reminders);
        assert!(updated.notifications.marketing);

        let reloaded = store.get_user(&user.id).unwrap().unwrap();
        assert_eq!(reloaded.notifications, updated.notifications);
    }

    #[test]
    fn test_services_ordered_by_name() {
        let store = SalonStore::open_in_memory().unwrap();
        store.create_service(&ServiceDraft::new("pedicure", 35.0, 40)).unwrap();
        store.create_service(&ServiceDraft::new("Coloring", 250.0, 120)).unwrap();
        store.create_service(&ServiceDraft::new("Manicure", 35.0, 40)).unwrap();

        let names: Vec<_> = store
            .list_services()
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Coloring", "Manicure", "pedicure"]);
    }

    #[test]
    fn test_update_and_delete_missing_service() {
        let store = SalonStore::open_in_memory().unwrap();
        let draft = ServiceDraft::new("Manicure", 35.0, 40);

        assert!(matches!(
            store.update_service("missing", &draft),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete_service("missing"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_seed_only_when_empty() {
        let store = SalonStore::open_in_memory().unwrap();
        let seeded = store.seed_services(&default_services()).unwrap();
        assert_eq!(seeded.len(), 7);

        let again = store.seed_services(&default_services()).unwrap();
        assert!(again.is_empty());
        assert_eq!(store.list_services().unwrap().len(), 7);
    }

    #[test]
    fn test_deleting_service_keeps_appointments() {
        let store = SalonStore::open_in_memory().unwrap();
        let service = store
            .create_service(&ServiceDraft::new("Manicure", 35.0, 40))
            .unwrap();
        let appointment = store
            .create_appointment(booking("u1", &service, Utc::now() + Duration::days(1)))
            .unwrap();

        store.delete_service(&service.id).unwrap();

        let kept = store.get_appointment(&appointment.id).unwrap().unwrap();
        assert_eq!(kept.service_id, service.id);
        assert_eq!(kept.service_name, "Manicure");
        assert_eq!(kept.price, 35.0);
    }

    #[test]
    fn test_appointment_listing_order_and_upcoming() {
        let store = SalonStore::open_in_memory().unwrap();
        let service = store
            .create_service(&ServiceDraft::new("Manicure", 35.0, 40))
            .unwrap();
        let now = Utc::now();

        store.create_appointment(booking("u1", &service, now - Duration::days(2))).unwrap();
        store.create_appointment(booking("u1", &service, now + Duration::days(3))).unwrap();
        store.create_appointment(booking("u1", &service, now + Duration::days(1))).unwrap();
        store.create_appointment(booking("u2", &service, now + Duration::days(2))).unwrap();

        let all = store.list_appointments().unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].date >= w[1].date));

        let upcoming = store.upcoming_for_user("u1", now).unwrap();
        assert_eq!(upcoming.len(), 2);
        assert!(upcoming[0].date < upcoming[1].date);
        assert!(upcoming.iter().all(|a| a.user_id == "u1"));
    }

    #[test]
    fn test_status_update_any_direction() {
        let store = SalonStore::open_in_memory().unwrap();
        let service = store
            .create_service(&ServiceDraft::new("Manicure", 35.0, 40))
            .unwrap();
        let appointment = store
            .create_appointment(booking("u1", &service, Utc::now()))
            .unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Pending);

        let finished = store
            .update_appointment_status(&appointment.id, AppointmentStatus::Finished)
            .unwrap();
        assert_eq!(finished.status, AppointmentStatus::Finished);

        let back = store
            .update_appointment_status(&appointment.id, AppointmentStatus::Pending)
            .unwrap();
        assert_eq!(back.status, AppointmentStatus::Pending);

        store.delete_appointment(&appointment.id).unwrap();
        assert!(store.get_appointment(&appointment.id).unwrap().is_none());
    }

    #[test]
    fn test_settings_default_and_persist() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new(dir.path());

        {
            let store = SalonStore::open(&config).unwrap();
            assert_eq!(store.salon_settings().unwrap(), SalonSettings::default());

            let mut settings = SalonSettings::default();
            settings.city = "Campinas".to_string();
            store.save_salon_settings(&settings).unwrap();
        }

        let reopened = SalonStore::open(&config).unwrap();
        assert_eq!(reopened.salon_settings().unwrap().city, "Campinas");
    }
}
