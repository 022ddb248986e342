//! Request extractors for bearer-session authentication
//!
//! - [`BearerToken`]: the raw token from `Authorization: Bearer ...`
//! - [`CurrentUser`]: any signed-in user
//! - [`AdminUser`]: a signed-in administrator

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::auth::AuthUser;

/// Bearer token of the request
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// The signed-in user
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

/// The signed-in user, required to be an administrator
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

fn bearer_from_parts(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_from_parts(parts)
            .map(BearerToken)
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let user = state.auth.authenticate(&token).await?;
        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, "Administrator route refused");
            return Err(ApiError::Forbidden(
                "This area is restricted to administrators".to_string(),
            ));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_parsing() {
        assert_eq!(bearer_from_parts(&parts_with(Some("Bearer abc"))).as_deref(), Some("abc"));
        assert_eq!(bearer_from_parts(&parts_with(Some("bearer  abc "))).as_deref(), Some("abc"));
        assert!(bearer_from_parts(&parts_with(Some("Basic abc"))).is_none());
        assert!(bearer_from_parts(&parts_with(Some("Bearer "))).is_none());
        assert!(bearer_from_parts(&parts_with(None)).is_none());
    }
}
