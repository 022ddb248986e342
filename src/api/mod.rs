//! Salon Console REST API
//!
//! HTTP API layer for the salon console and client app, built with Axum.
//! Signed-in requests carry `Authorization: Bearer <token>`.
//!
//! # Endpoints
//!
//! ## Auth
//! - `POST /api/v1/auth/register` - Create a client account
//! - `POST /api/v1/auth/login` - Sign in
//! - `POST /api/v1/auth/logout` - Sign out
//! - `POST /api/v1/auth/password-reset` - Request a reset token
//! - `POST /api/v1/auth/password-reset/confirm` - Redeem a reset token
//! - `POST /api/v1/auth/change-password` - Change password
//!
//! ## Appointments
//! - `GET /api/v1/appointments` - Board listing (admin)
//! - `POST /api/v1/appointments` - Book
//! - `GET /api/v1/appointments/stats` - Board counters (admin)
//! - `GET /api/v1/appointments/mine` - Caller's appointments
//! - `PUT /api/v1/appointments/:id/status` - Change status (admin)
//! - `DELETE /api/v1/appointments/:id` - Delete (admin)
//!
//! ## Services
//! - `GET /api/v1/services` - Catalog
//! - `POST /api/v1/services` - Create (admin)
//! - `GET /api/v1/services/stats` - Catalog counters
//! - `PUT /api/v1/services/:id` - Update (admin)
//! - `DELETE /api/v1/services/:id` - Delete (admin)
//! - `POST /api/v1/services/seed` - Seed the default catalog (admin)
//!
//! ## Settings, profile, finance, reminders
//! - `GET|PUT /api/v1/settings`
//! - `GET /api/v1/profile`
//! - `PATCH /api/v1/profile/notifications`
//! - `PUT /api/v1/profile/goal`
//! - `PUT /api/v1/profile/push-token`
//! - `PUT /api/v1/profile/avatar`
//! - `GET /api/v1/users/:id/avatar`
//! - `GET /api/v1/finance/summary`
//! - `GET /api/v1/reminders`
//! - `POST /api/v1/reminders/resync`
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /ws?token=...` - Realtime collection feeds

pub mod dto;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::websocket::websocket_handler;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let max_body_size = state.config.max_body_size;

    let api_routes = Router::new()
        // Auth routes
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/password-reset", post(routes::auth::request_password_reset))
        .route(
            "/auth/password-reset/confirm",
            post(routes::auth::confirm_password_reset),
        )
        .route("/auth/change-password", post(routes::auth::change_password))
        // Appointment routes
        .route(
            "/appointments",
            get(routes::appointments::list_appointments).post(routes::appointments::book_appointment),
        )
        .route("/appointments/stats", get(routes::appointments::appointment_stats))
        .route("/appointments/mine", get(routes::appointments::my_appointments))
        .route("/appointments/:id/status", put(routes::appointments::update_status))
        .route("/appointments/:id", delete(routes::appointments::delete_appointment))
        // Service catalog routes
        .route(
            "/services",
            get(routes::services::list_services).post(routes::services::create_service),
        )
        .route("/services/stats", get(routes::services::service_stats))
        .route("/services/seed", post(routes::services::seed_services))
        .route(
            "/services/:id",
            put(routes::services::update_service).delete(routes::services::delete_service),
        )
        // Salon settings
        .route(
            "/settings",
            get(routes::settings::get_settings).put(routes::settings::publish_settings),
        )
        // Profile routes
        .route("/profile", get(routes::profile::get_profile))
        .route("/profile/notifications", patch(routes::profile::update_notifications))
        .route("/profile/goal", put(routes::profile::set_monthly_goal))
        .route("/profile/push-token", put(routes::profile::set_push_token))
        .route("/profile/avatar", put(routes::profile::upload_avatar))
        .route("/users/:id/avatar", get(routes::profile::get_avatar))
        // Finance
        .route("/finance/summary", get(routes::finance::summary))
        // Reminders
        .route("/reminders", get(routes::reminders::list_reminders))
        .route("/reminders/resync", post(routes::reminders::resync_reminders))
        .layer(DefaultBodyLimit::max(max_body_size));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        // WebSocket route
        .route("/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Salon API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Salon API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthPolicy, AuthUser};
    use crate::push::OutboxPushSender;
    use crate::reminders::ReminderConfig;
    use crate::storage::{BlobStore, Role, SalonStore};
    use crate::websocket::{ChangeKind, ConnectionHub, WsEvent};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::{Datelike, Duration, Utc};
    use serde_json::{json, Value};
    use tempfile::tempdir;
    use tower::util::ServiceExt;

    const ADMIN_EMAIL: &str = "owner@salon.test";
    const ADMIN_PASSWORD: &str = "owner-secret";

    struct TestApp {
        router: Router,
        outbox: Arc<OutboxPushSender>,
        hub: Arc<ConnectionHub>,
        _dir: tempfile::TempDir,
    }

    async fn create_test_harness() -> TestApp {
        let dir = tempdir().unwrap();
        let store = Arc::new(SalonStore::open_in_memory().unwrap());
        let blobs = BlobStore::new(dir.path().join("blobs"));
        let outbox = Arc::new(OutboxPushSender::new());

        let state = AppState::new(
            store,
            blobs,
            outbox.clone(),
            AuthPolicy::default(),
            ReminderConfig::default(),
            ApiConfig::default(),
        );
        state
            .auth
            .ensure_admin(ADMIN_EMAIL, ADMIN_PASSWORD, "Owner")
            .await
            .unwrap();

        let hub = Arc::clone(&state.ws_hub);
        TestApp {
            router: build_router(state),
            outbox,
            hub,
            _dir: dir,
        }
    }

    async fn create_test_app() -> (Router, tempfile::TempDir) {
        let app = create_test_harness().await;
        (app.router, app._dir)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn admin_token(app: &Router) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    async fn client_token(app: &Router, email: &str) -> String {
        let (status, _) = send(
            app,
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({ "email": email, "password": "client-pass", "name": "Ana" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            app,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": "client-pass", "audience": "client" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_service(app: &Router, admin: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/v1/services",
            Some(admin),
            Some(json!({ "name": "Corte Feminino", "price": 80.0, "duration": 60 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let (app, _dir) = create_test_app().await;

        for uri in ["/health/live", "/health/ready", "/health"] {
            let (status, _) = send(&app, "GET", uri, None, None).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
        }

        let (_, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(body["push"], "outbox");
    }

    #[tokio::test]
    async fn test_console_login_rejects_clients() {
        let (app, _dir) = create_test_app().await;
        client_token(&app, "ana@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "ana@example.com", "password": "client-pass" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "access-denied");
        assert!(body.get("token").is_none());
    }

    #[tokio::test]
    async fn test_wrong_password_code() {
        let (app, _dir) = create_test_app().await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": ADMIN_EMAIL, "password": "nope-nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "wrong-password");
    }

    #[tokio::test]
    async fn test_board_requires_admin() {
        let (app, _dir) = create_test_app().await;

        let (status, _) = send(&app, "GET", "/api/v1/appointments", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let client = client_token(&app, "ana@example.com").await;
        let (status, _) = send(&app, "GET", "/api/v1/appointments", Some(&client), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_booking_shows_on_board() {
        let (app, _dir) = create_test_app().await;
        let admin = admin_token(&app).await;
        let service_id = create_service(&app, &admin).await;
        let client = client_token(&app, "ana@example.com").await;

        let date = Utc::now() + Duration::days(2);
        let (status, booked) = send(
            &app,
            "POST",
            "/api/v1/appointments",
            Some(&client),
            Some(json!({ "service_id": service_id, "date": date })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(booked["status"], "pending");
        assert_eq!(booked["service_name"], "Corte Feminino");

        let (status, board) = send(
            &app,
            "GET",
            "/api/v1/appointments?filter=pending",
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(board["total"], 1);

        let (status, _) = send(
            &app,
            "GET",
            "/api/v1/appointments?filter=someday",
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, mine) = send(&app, "GET", "/api/v1/appointments/mine", Some(&client), None).await;
        assert_eq!(mine["total"], 1);
    }

    #[tokio::test]
    async fn test_booking_in_the_past_is_rejected() {
        let (app, _dir) = create_test_app().await;
        let admin = admin_token(&app).await;
        let service_id = create_service(&app, &admin).await;
        let client = client_token(&app, "ana@example.com").await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/appointments",
            Some(&client),
            Some(json!({ "service_id": service_id, "date": Utc::now() - Duration::hours(1) })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_service_crud_and_validation() {
        let (app, _dir) = create_test_app().await;
        let admin = admin_token(&app).await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/services",
            Some(&admin),
            Some(json!({ "name": "  ", "price": 10.0, "duration": 30 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let id = create_service(&app, &admin).await;
        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/api/v1/services/{}", id),
            Some(&admin),
            Some(json!({ "name": "Corte Curto", "price": 60.0, "duration": 45 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Corte Curto");

        let (_, listed) = send(&app, "GET", "/api/v1/services?search=curto", None, None).await;
        assert_eq!(listed["services"].as_array().unwrap().len(), 1);
        assert_eq!(listed["stats"]["total"], 1);

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/v1/services/{}", id),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, seeded) = send(&app, "POST", "/api/v1/services/seed", Some(&admin), None).await;
        assert_eq!(seeded["seeded"], true);
        let (_, again) = send(&app, "POST", "/api/v1/services/seed", Some(&admin), None).await;
        assert_eq!(again["seeded"], false);
    }

    #[tokio::test]
    async fn test_settings_publish() {
        let (app, _dir) = create_test_app().await;
        let admin = admin_token(&app).await;

        let (status, _) = send(
            &app,
            "PUT",
            "/api/v1/settings",
            Some(&admin),
            Some(json!({ "whatsapp": "5511999999999", "city": "São Paulo" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, saved) = send(
            &app,
            "PUT",
            "/api/v1/settings",
            Some(&admin),
            Some(json!({
                "whatsapp": "5511999999999",
                "street": "Rua Augusta",
                "number": "100",
                "neighborhood": "Consolação",
                "city": "São Paulo"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(saved["address"].as_str().unwrap().contains("Rua Augusta"));

        let (status, public) = send(&app, "GET", "/api/v1/settings", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(public["city"], "São Paulo");
    }

    #[tokio::test]
    async fn test_finished_appointment_counts_in_finance() {
        let (app, _dir) = create_test_app().await;
        let admin = admin_token(&app).await;
        let service_id = create_service(&app, &admin).await;
        let client = client_token(&app, "ana@example.com").await;

        let date = Utc::now() + Duration::days(1);
        let (_, booked) = send(
            &app,
            "POST",
            "/api/v1/appointments",
            Some(&client),
            Some(json!({ "service_id": service_id, "date": date })),
        )
        .await;
        let id = booked["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/v1/appointments/{}/status", id),
            Some(&admin),
            Some(json!({ "status": "finished" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, summary) = send(
            &app,
            "GET",
            &format!(
                "/api/v1/finance/summary?year={}&month={}",
                date.year(),
                date.month()
            ),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["real"], 80.0);
        assert_eq!(summary["count"], 1);

        let (status, _) = send(
            &app,
            "GET",
            "/api/v1/finance/summary?month=13",
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reminders_follow_preference() {
        let (app, _dir) = create_test_app().await;
        let admin = admin_token(&app).await;
        let service_id = create_service(&app, &admin).await;
        let client = client_token(&app, "ana@example.com").await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/appointments",
            Some(&client),
            Some(json!({ "service_id": service_id, "date": Utc::now() + Duration::hours(3) })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, listed) = send(&app, "GET", "/api/v1/reminders", Some(&client), None).await;
        assert_eq!(listed["reminders"].as_array().unwrap().len(), 1);

        let (status, _) = send(
            &app,
            "PATCH",
            "/api/v1/profile/notifications",
            Some(&client),
            Some(json!({ "reminders": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, listed) = send(&app, "GET", "/api/v1/reminders", Some(&client), None).await;
        assert!(listed["reminders"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logout_invalidates_token() {
        let (app, _dir) = create_test_app().await;
        let admin = admin_token(&app).await;

        let (status, _) = send(&app, "POST", "/api/v1/auth/logout", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", "/api/v1/profile", Some(&admin), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "invalid-session");
    }

    #[tokio::test]
    async fn test_logout_closes_realtime_connections() {
        let harness = create_test_harness().await;
        let app = &harness.router;

        let (_, body) = send(
            app,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
        )
        .await;
        let admin = body["token"].as_str().unwrap().to_string();
        let user = AuthUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            name: "Owner".to_string(),
            email: ADMIN_EMAIL.to_string(),
            role: Role::Admin,
        };

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let connection = harness.hub.register(user, tx).await.unwrap();
        harness
            .hub
            .subscribe(&connection, vec!["appointments".to_string()])
            .await
            .unwrap();

        let (status, _) = send(app, "POST", "/api/v1/auth/logout", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(harness.hub.connection_count().await, 0);

        let event = WsEvent::change("appointments", ChangeKind::Deleted, "a1", None);
        assert_eq!(harness.hub.broadcast(&event).await, 0);
        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn test_confirming_notifies_client() {
        let harness = create_test_harness().await;
        let app = &harness.router;
        let admin = admin_token(app).await;
        let service_id = create_service(app, &admin).await;
        let client = client_token(app, "ana@example.com").await;

        let (status, _) = send(
            app,
            "PUT",
            "/api/v1/profile/push-token",
            Some(&client),
            Some(json!({ "push_token": "ExponentPushToken[ana]" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, booked) = send(
            app,
            "POST",
            "/api/v1/appointments",
            Some(&client),
            Some(json!({ "service_id": service_id, "date": Utc::now() + Duration::days(2) })),
        )
        .await;
        let uri = format!("/api/v1/appointments/{}/status", booked["id"].as_str().unwrap());

        let (status, _) = send(app, "PUT", &uri, Some(&admin), Some(json!({ "status": "confirmed" }))).await;
        assert_eq!(status, StatusCode::OK);

        let sent = harness.outbox.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ExponentPushToken[ana]");
        assert_eq!(sent[0].title, "Confirmed! ✅");
        assert_eq!(sent[0].data["screen"], "appointments");

        let (status, _) = send(app, "PUT", &uri, Some(&admin), Some(json!({ "status": "finished" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(harness.outbox.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn test_avatar_upload_and_download() {
        let (app, _dir) = create_test_app().await;
        let admin = admin_token(&app).await;

        let request = Request::builder()
            .method("PUT")
            .uri("/api/v1/profile/avatar")
            .header("Authorization", format!("Bearer {}", admin))
            .header("Content-Type", "image/jpeg")
            .body(Body::from(vec![0xFF, 0xD8, 0xFF, 0xE0]))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (_, profile) = send(&app, "GET", "/api/v1/profile", Some(&admin), None).await;
        let avatar = profile["avatar"].as_str().unwrap().to_string();
        let path = avatar.trim_start_matches("http://localhost:8082");

        let response = app
            .clone()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], &[0xFF, 0xD8, 0xFF, 0xE0]);
    }
}
