//! Explicit admin session context
//!
//! Every portal operation takes an [`AdminSession`]. A session can only be
//! obtained from an [`AuthProvider`] that reports a signed-in user, so
//! holding one is proof that authentication happened for this request.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::traits::AuthProvider;
use crate::types::*;

/// A signed-in administrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    /// Identifier assigned by the authentication provider
    pub id: String,
    pub email: String,
}

/// Authenticated request context
#[derive(Debug, Clone, PartialEq)]
pub struct AdminSession {
    user: AdminUser,
    established_at: NaiveDateTime,
}

impl AdminSession {
    /// Resolve the current user through `provider`, failing when nobody is
    /// signed in
    pub async fn establish<A: AuthProvider + ?Sized>(provider: &A) -> PortalResult<Self> {
        match provider.current_user().await? {
            Some(user) => {
                debug!(user_id = %user.id, "Admin session established");
                Ok(Self {
                    user,
                    established_at: chrono::Utc::now().naive_utc(),
                })
            }
            None => Err(PortalError::Unauthorized(
                "No signed-in admin user".to_string(),
            )),
        }
    }

    pub fn user(&self) -> &AdminUser {
        &self.user
    }

    pub fn established_at(&self) -> NaiveDateTime {
        self.established_at
    }

    /// Sign out through `provider`, consuming the session
    pub async fn sign_out<A: AuthProvider + ?Sized>(self, provider: &A) -> PortalResult<()> {
        provider.sign_out(&self).await?;
        info!(user_id = %self.user.id, "Admin signed out");
        Ok(())
    }
}
