//! Request identity
//!
//! Authentication lives in a fronting auth service; this core trusts
//! the identity it forwards and never re-authenticates. The gateway in
//! front strips any client-supplied `x-user-*` headers before
//! injecting its own, so their presence here is proof of an
//! authenticated session.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

/// Role as asserted by the auth collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

/// The authenticated caller for the current request
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Guard for admin-only operations
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("Admin role required"))
        }
    }
}

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Already extracted earlier in this request?
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|h| h.to_str().ok())
            .filter(|s| !s.is_empty());

        let Some(user_id) = user_id else {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", parts.uri));
            return Err(AppError::Unauthorized);
        };

        let role = match parts
            .headers
            .get("x-user-role")
            .and_then(|h| h.to_str().ok())
        {
            Some("admin") => Role::Admin,
            _ => Role::Customer,
        };

        let user = CurrentUser {
            user_id: user_id.to_string(),
            role,
        };
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
