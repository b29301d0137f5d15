//! Fixed-user authentication provider for tests and demos

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::session::{AdminSession, AdminUser};
use crate::traits::AuthProvider;
use crate::types::*;

/// Authentication provider holding at most one signed-in user in memory
#[derive(Debug, Clone, Default)]
pub struct StaticAuthProvider {
    user: Arc<RwLock<Option<AdminUser>>>,
}

impl StaticAuthProvider {
    /// Provider with `email` signed in
    pub fn signed_in(id: &str, email: &str) -> Self {
        Self {
            user: Arc::new(RwLock::new(Some(AdminUser {
                id: id.to_string(),
                email: email.to_string(),
            }))),
        }
    }

    /// Provider with nobody signed in
    pub fn signed_out() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn current_user(&self) -> PortalResult<Option<AdminUser>> {
        self.user
            .read()
            .map(|user| user.clone())
            .map_err(|e| PortalError::Storage(format!("auth state lock poisoned: {e}")))
    }

    async fn sign_out(&self, session: &AdminSession) -> PortalResult<()> {
        let mut user = self
            .user
            .write()
            .map_err(|e| PortalError::Storage(format!("auth state lock poisoned: {e}")))?;
        if user.as_ref() != Some(session.user()) {
            return Err(PortalError::Unauthorized(
                "Session does not belong to the signed-in user".to_string(),
            ));
        }
        *user = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_requires_signed_in_user() {
        let result = AdminSession::establish(&StaticAuthProvider::signed_out()).await;
        assert!(matches!(result, Err(PortalError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_sign_out_ends_session() {
        let auth = StaticAuthProvider::signed_in("admin-1", "admin@example.com");
        let session = AdminSession::establish(&auth).await.unwrap();
        assert_eq!(session.user().email, "admin@example.com");

        session.sign_out(&auth).await.unwrap();

        assert!(auth.current_user().await.unwrap().is_none());
        assert!(AdminSession::establish(&auth).await.is_err());
    }
}
