//! Caller identity extraction
//!
//! Authentication itself happens upstream at the platform gateway, which
//! forwards the verified identity as headers. This module only lifts those
//! headers into a typed `CallerIdentity`; a request without them never
//! reaches a handler body.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the authenticated user's uuid.
pub const USER_HEADER: &str = "x-solfa-user";

/// Header carrying the user's comma-separated roles.
pub const ROLES_HEADER: &str = "x-solfa-roles";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    /// Parse one role name; unknown names are dropped rather than rejected
    /// so new upstream roles don't break this service.
    pub fn parse(value: &str) -> Option<Role> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "teacher" => Some(Role::Teacher),
            "student" => Some(Role::Student),
            _ => None,
        }
    }
}

/// The authenticated caller, as asserted by the gateway.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub user_id: Uuid,
    pub roles: Vec<Role>,
}

impl CallerIdentity {
    /// Admins and teachers may run syncs and resolve matches.
    pub fn is_operator(&self) -> bool {
        self.roles
            .iter()
            .any(|role| matches!(role, Role::Admin | Role::Teacher))
    }

    pub fn require_operator(&self) -> Result<(), ApiError> {
        if self.is_operator() {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let user_id = Uuid::parse_str(user.trim()).map_err(|_| ApiError::Unauthorized)?;

        let roles = parts
            .headers
            .get(ROLES_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|raw| raw.split(',').filter_map(Role::parse).collect())
            .unwrap_or_default();

        Ok(CallerIdentity { user_id, roles })
    }
}
