//! Account flows: register, login, logout, password reset and change
//!
//! Reminder resynchronisation on login/logout is driven by the API layer;
//! this module only deals with identities and credentials.

use super::password::{hash_password, verify_password, PasswordStrength};
use super::sessions::{LoginThrottle, Session, SessionStore};
use super::{
    is_valid_email, normalize_email, Audience, AuthError, AuthResult, AuthUser, MIN_PASSWORD_LEN,
};
use crate::storage::{Role, SalonStore, StoreError, UserProfile};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Tunables for the auth flows
#[derive(Debug, Clone)]
pub struct AuthPolicy {
    pub session_ttl: Duration,
    pub max_failed_attempts: usize,
    pub lockout_window: Duration,
    pub reset_token_ttl: Duration,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            session_ttl: Duration::days(30),
            max_failed_attempts: 5,
            lockout_window: Duration::minutes(15),
            reset_token_ttl: Duration::hours(1),
        }
    }
}

/// Login request body
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub audience: Audience,
    /// Push-relay token of the device signing in
    pub push_token: Option<String>,
}

#[derive(Debug, Clone)]
struct ResetToken {
    user_id: String,
    expires_at: DateTime<Utc>,
}

/// Coordinates credentials, sessions and throttling
pub struct AuthManager {
    store: Arc<SalonStore>,
    sessions: SessionStore,
    throttle: LoginThrottle,
    resets: RwLock<HashMap<String, ResetToken>>,
    policy: AuthPolicy,
}

impl AuthManager {
    pub fn new(store: Arc<SalonStore>, policy: AuthPolicy) -> Self {
        Self {
            sessions: SessionStore::new(policy.session_ttl),
            throttle: LoginThrottle::new(policy.max_failed_attempts, policy.lockout_window),
            resets: RwLock::new(HashMap::new()),
            store,
            policy,
        }
    }

    fn validate_new_password(password: &str) -> AuthResult<()> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        Ok(())
    }

    /// Create a client account
    pub async fn register(&self, email: &str, password: &str, name: &str) -> AuthResult<UserProfile> {
        self.create_account(email, password, name, Role::Client)
    }

    fn create_account(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: Role,
    ) -> AuthResult<UserProfile> {
        if !is_valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        Self::validate_new_password(password)?;

        let hash = hash_password(password)?;
        let email = normalize_email(email);
        let name = if name.trim().is_empty() {
            email.split('@').next().unwrap_or_default().to_string()
        } else {
            name.trim().to_string()
        };

        match self.store.create_user(&email, &name, role, &hash) {
            Ok(profile) => {
                tracing::info!(user_id = %profile.id, role = %role.as_str(), "Account created");
                Ok(profile)
            }
            Err(StoreError::Duplicate { .. }) => Err(AuthError::EmailInUse),
            Err(e) => Err(e.into()),
        }
    }

    /// Ensure the bootstrap administrator exists
    ///
    /// Returns the created profile, or `None` when an account with that email
    /// is already present.
    pub async fn ensure_admin(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> AuthResult<Option<UserProfile>> {
        if self.store.find_credentials(&normalize_email(email))?.is_some() {
            return Ok(None);
        }
        self.create_account(email, password, name, Role::Admin)
            .map(Some)
    }

    /// Sign in and open a session
    ///
    /// Console logins by non-administrators fail with `AccessDenied` and
    /// leave no session behind.
    pub async fn login(&self, request: &LoginRequest) -> AuthResult<(Session, UserProfile)> {
        if !is_valid_email(&request.email) {
            return Err(AuthError::InvalidEmail);
        }

        let email = normalize_email(&request.email);
        let now = Utc::now();

        if self.throttle.is_locked(&email, now).await {
            tracing::warn!(email = %email, "Login throttled");
            return Err(AuthError::TooManyRequests);
        }

        let (mut profile, hash) = match self.store.find_credentials(&email)? {
            Some(found) => found,
            None => {
                self.throttle.record_failure(&email, now).await;
                return Err(AuthError::UserNotFound);
            }
        };

        if !verify_password(&request.password, &hash) {
            self.throttle.record_failure(&email, now).await;
            tracing::debug!(user_id = %profile.id, "Wrong password");
            return Err(AuthError::WrongPassword);
        }
        self.throttle.clear(&email).await;

        if request.audience == Audience::Console && !profile.is_admin() {
            tracing::warn!(user_id = %profile.id, "Console login refused for non-admin");
            return Err(AuthError::AccessDenied);
        }

        if let Some(token) = request.push_token.as_deref().filter(|t| !t.is_empty()) {
            self.store.set_push_token(&profile.id, Some(token))?;
            profile.push_token = Some(token.to_string());
        }

        let session = self.sessions.create(&profile.id, profile.role).await;
        tracing::info!(user_id = %profile.id, audience = ?request.audience, "Signed in");

        Ok((session, profile))
    }

    /// Resolve a bearer token to the signed-in user
    pub async fn authenticate(&self, token: &str) -> AuthResult<AuthUser> {
        let session = self
            .sessions
            .get(token)
            .await
            .ok_or(AuthError::InvalidSession)?;

        let Some(profile) = self.store.get_user(&session.user_id)? else {
            self.sessions.remove(token).await;
            return Err(AuthError::InvalidSession);
        };

        Ok(AuthUser {
            id: profile.id,
            name: profile.name,
            email: profile.email,
            role: profile.role,
        })
    }

    /// End a session, returning the user it belonged to
    pub async fn logout(&self, token: &str) -> Option<String> {
        let session = self.sessions.remove(token).await?;
        tracing::info!(user_id = %session.user_id, "Signed out");
        Some(session.user_id)
    }

    /// Issue a single-use password reset token
    ///
    /// Mail delivery is not wired up; the token is logged for the operator.
    pub async fn request_password_reset(&self, email: &str) -> AuthResult<String> {
        if !is_valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }

        let email = normalize_email(email);
        let now = Utc::now();
        if self.throttle.is_locked(&email, now).await {
            return Err(AuthError::TooManyRequests);
        }

        let (profile, _) = self
            .store
            .find_credentials(&email)?
            .ok_or(AuthError::UserNotFound)?;

        let token = Uuid::new_v4().to_string();
        let expires_at = now + self.policy.reset_token_ttl;

        let mut resets = self.resets.write().await;
        resets.retain(|_, r| r.expires_at > now && r.user_id != profile.id);
        resets.insert(
            token.clone(),
            ResetToken {
                user_id: profile.id.clone(),
                expires_at,
            },
        );

        tracing::info!(
            user_id = %profile.id,
            email = %email,
            reset_token = %token,
            expires_at = %expires_at,
            "Password reset requested"
        );

        Ok(token)
    }

    /// Redeem a reset token and set a new password
    ///
    /// Every session of the user is dropped. Returns the user's id.
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> AuthResult<String> {
        Self::validate_new_password(new_password)?;

        let reset = self
            .resets
            .write()
            .await
            .remove(token)
            .filter(|r| r.expires_at > Utc::now())
            .ok_or(AuthError::InvalidResetToken)?;

        let hash = hash_password(new_password)?;
        self.store.set_password_hash(&reset.user_id, &hash)?;
        let dropped = self.sessions.remove_for_user(&reset.user_id).await;

        tracing::info!(user_id = %reset.user_id, sessions_dropped = dropped, "Password reset completed");
        Ok(reset.user_id)
    }

    /// Change a signed-in user's password after re-authenticating
    ///
    /// Open sessions, including the caller's, stay valid.
    pub async fn change_password(
        &self,
        user_id: &str,
        current: &str,
        new_password: &str,
        confirmation: &str,
    ) -> AuthResult<PasswordStrength> {
        Self::validate_new_password(new_password)?;
        if new_password != confirmation {
            return Err(AuthError::PasswordMismatch);
        }

        let hash = self.store.password_hash(user_id)?;
        if !verify_password(current, &hash) {
            return Err(AuthError::WrongPassword);
        }

        self.store
            .set_password_hash(user_id, &hash_password(new_password)?)?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(PasswordStrength::evaluate(new_password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> AuthManager {
        let store = Arc::new(SalonStore::open_in_memory().unwrap());
        AuthManager::new(store, AuthPolicy::default())
    }

    fn login(email: &str, password: &str, audience: Audience) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            audience,
            push_token: None,
        }
    }

    #[tokio::test]
    async fn test_register_validation() {
        let auth = manager();
        assert!(matches!(
            auth.register("bad-email", "secret1", "X").await,
            Err(AuthError::InvalidEmail)
        ));
        assert!(matches!(
            auth.register("c@salon.com", "12345", "X").await,
            Err(AuthError::WeakPassword)
        ));

        auth.register("c@salon.com", "secret1", "Carla").await.unwrap();
        assert!(matches!(
            auth.register("C@salon.com", "secret1", "Carla").await,
            Err(AuthError::EmailInUse)
        ));
    }

    #[tokio::test]
    async fn test_admin_console_login() {
        let auth = manager();
        auth.ensure_admin("amanda@salon.com", "secret1", "Amanda")
            .await
            .unwrap()
            .unwrap();

        let mut request = login("amanda@salon.com", "secret1", Audience::Console);
        request.push_token = Some("ExponentPushToken[abc]".to_string());
        let (session, profile) = auth.login(&request).await.unwrap();

        assert!(profile.is_admin());
        assert_eq!(profile.push_token.as_deref(), Some("ExponentPushToken[abc]"));

        let user = auth.authenticate(&session.token).await.unwrap();
        assert_eq!(user.id, profile.id);
        assert!(user.is_admin());
    }

    #[tokio::test]
    async fn test_non_admin_console_login_creates_no_session() {
        let auth = manager();
        auth.register("carla@mail.com", "secret1", "Carla").await.unwrap();

        let result = auth
            .login(&login("carla@mail.com", "secret1", Audience::Console))
            .await;
        assert!(matches!(result, Err(AuthError::AccessDenied)));
        assert_eq!(auth.sessions.len().await, 0);

        // The client app admits the same account
        let (session, _) = auth
            .login(&login("carla@mail.com", "secret1", Audience::Client))
            .await
            .unwrap();
        assert!(auth.authenticate(&session.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_error_codes_and_throttle() {
        let auth = manager();
        auth.register("carla@mail.com", "secret1", "Carla").await.unwrap();

        assert!(matches!(
            auth.login(&login("nobody@mail.com", "secret1", Audience::Client)).await,
            Err(AuthError::UserNotFound)
        ));
        assert!(matches!(
            auth.login(&login("carla", "secret1", Audience::Client)).await,
            Err(AuthError::InvalidEmail)
        ));

        for _ in 0..5 {
            assert!(matches!(
                auth.login(&login("carla@mail.com", "wrong!", Audience::Client)).await,
                Err(AuthError::WrongPassword)
            ));
        }

        // Locked even with the right password
        assert!(matches!(
            auth.login(&login("carla@mail.com", "secret1", Audience::Client)).await,
            Err(AuthError::TooManyRequests)
        ));
    }

    #[tokio::test]
    async fn test_logout_drops_session() {
        let auth = manager();
        auth.register("carla@mail.com", "secret1", "Carla").await.unwrap();
        let (session, profile) = auth
            .login(&login("carla@mail.com", "secret1", Audience::Client))
            .await
            .unwrap();

        assert_eq!(auth.logout(&session.token).await, Some(profile.id));
        assert!(matches!(
            auth.authenticate(&session.token).await,
            Err(AuthError::InvalidSession)
        ));
        assert_eq!(auth.logout(&session.token).await, None);
    }

    #[tokio::test]
    async fn test_password_reset_single_use() {
        let auth = manager();
        auth.register("carla@mail.com", "secret1", "Carla").await.unwrap();

        assert!(matches!(
            auth.request_password_reset("ghost@mail.com").await,
            Err(AuthError::UserNotFound)
        ));

        let (session, profile) = auth
            .login(&login("carla@mail.com", "secret1", Audience::Client))
            .await
            .unwrap();

        let token = auth.request_password_reset("carla@mail.com").await.unwrap();
        assert_eq!(
            auth.confirm_password_reset(&token, "brandnew1").await.unwrap(),
            profile.id
        );
        assert!(matches!(
            auth.authenticate(&session.token).await,
            Err(AuthError::InvalidSession)
        ));
        assert!(matches!(
            auth.confirm_password_reset(&token, "another1").await,
            Err(AuthError::InvalidResetToken)
        ));

        assert!(auth
            .login(&login("carla@mail.com", "brandnew1", Audience::Client))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_change_password() {
        let auth = manager();
        let profile = auth.register("carla@mail.com", "secret1", "Carla").await.unwrap();
        let (session, _) = auth
            .login(&login("carla@mail.com", "secret1", Audience::Client))
            .await
            .unwrap();

        assert!(matches!(
            auth.change_password(&profile.id, "nope", "longerpassword", "longerpassword").await,
            Err(AuthError::WrongPassword)
        ));
        assert!(matches!(
            auth.change_password(&profile.id, "secret1", "longerpassword", "different").await,
            Err(AuthError::PasswordMismatch)
        ));

        let strength = auth
            .change_password(&profile.id, "secret1", "longerpassword", "longerpassword")
            .await
            .unwrap();
        assert_eq!(strength, PasswordStrength::Strong);

        // The caller stays signed in
        assert_eq!(auth.authenticate(&session.token).await.unwrap().id, profile.id);
    }
}
