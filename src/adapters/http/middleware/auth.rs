//! Identity extractors for axum.
//!
//! Authentication happens upstream; this service trusts the identity the
//! gateway forwards:
//! - `X-User-Id` - the authenticated user id
//! - `X-User-Role` - `admin` for administrators, anything else is a customer
//!
//! ```text
//! Request → CurrentUser extractor → Actor
//!                   ↓
//!           AdminUser extractor → Actor (403 unless admin)
//! ```

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::foundation::{Actor, Role, UserId};

use super::super::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Any authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Actor);

/// A caller carrying the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Actor);

fn actor_from(parts: &Parts) -> Result<Actor, ApiError> {
    let user_id = parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| UserId::new(s.trim()).ok())
        .ok_or_else(ApiError::unauthenticated)?;

    let role = match parts
        .headers
        .get(USER_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some(role) if role.trim().eq_ignore_ascii_case("admin") => Role::Admin,
        _ => Role::Customer,
    };

    Ok(Actor { user_id, role })
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        actor_from(parts).map(CurrentUser)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = actor_from(parts)?;
        if !actor.is_admin() {
            tracing::warn!(user_id = %actor.user_id, path = %parts.uri.path(), "Admin endpoint refused");
            return Err(ApiError::forbidden("Administrator role required"));
        }
        Ok(AdminUser(actor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/api/orders");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn reads_customer_identity() {
        let mut parts = parts(&[("X-User-Id", "user-1")]);

        let CurrentUser(actor) = CurrentUser::from_request_parts(&mut parts, &()).await.unwrap();

        assert_eq!(actor.user_id.as_str(), "user-1");
        assert!(!actor.is_admin());
    }

    #[tokio::test]
    async fn missing_identity_is_401() {
        let mut parts = parts(&[]);

        let err = CurrentUser::from_request_parts(&mut parts, &()).await.unwrap_err();

        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_role_is_case_insensitive() {
        let mut parts = parts(&[("X-User-Id", "ops"), ("X-User-Role", "Admin")]);

        let AdminUser(actor) = AdminUser::from_request_parts(&mut parts, &()).await.unwrap();

        assert!(actor.is_admin());
    }

    #[tokio::test]
    async fn customer_on_admin_route_is_403() {
        let mut parts = parts(&[("X-User-Id", "user-1"), ("X-User-Role", "customer")]);

        let err = AdminUser::from_request_parts(&mut parts, &()).await.unwrap_err();

        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }
}
