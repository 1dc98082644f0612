//! Session/admin gate.
//!
//! The latest auth session lives in a `watch` channel; every subscriber sees
//! each change.  Having a session is the only admin signal there is.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: SessionUser,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// Message from the auth service, shown to the user as-is.
    #[error("{0}")]
    Rejected(String),
    #[error("network error: {0}")]
    Network(String),
}

impl AuthError {
    pub fn message(&self) -> String {
        self.to_string()
    }
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<Session, AuthError>;
    async fn sign_out(&self, session: &Session) -> Result<(), AuthError>;
}

pub fn is_admin(session: Option<&Session>) -> bool {
    session.is_some()
}

pub struct SessionGate {
    auth: Arc<dyn AuthService>,
    tx: watch::Sender<Option<Session>>,
}

impl SessionGate {
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { auth, tx }
    }

    /// Session-change stream. The current value is available immediately.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn is_admin(&self) -> bool {
        is_admin(self.tx.borrow().as_ref())
    }

    /// Forward credentials to the auth service and publish the new session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        match self.auth.sign_in_with_password(email, password).await {
            Ok(session) => {
                info!(
                    "[auth] signed in as {}",
                    session.user.email.as_deref().unwrap_or(&session.user.id)
                );
                self.tx.send_replace(Some(session));
                Ok(())
            }
            Err(e) => {
                warn!("[auth] sign-in rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Drop the local session even when the remote logout fails.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(session) = self.tx.send_replace(None) else {
            return Ok(());
        };
        info!("[auth] signed out");
        self.auth.sign_out(&session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedAuth;

    #[async_trait]
    impl AuthService for FixedAuth {
        async fn sign_in_with_password(
            &self,
            email: &str,
            password: &str,
        ) -> Result<Session, AuthError> {
            if password != "secret" {
                return Err(AuthError::Rejected("Invalid login credentials".into()));
            }
            Ok(Session {
                access_token: "tok".into(),
                refresh_token: None,
                expires_in: Some(3600),
                user: SessionUser {
                    id: "u-1".into(),
                    email: Some(email.to_string()),
                },
            })
        }

        async fn sign_out(&self, _session: &Session) -> Result<(), AuthError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_sign_in_publishes_session() {
        let gate = SessionGate::new(Arc::new(FixedAuth));
        let mut rx = gate.subscribe();
        assert!(!gate.is_admin());

        gate.sign_in("admin@example.com", "secret").await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_some());
        assert!(gate.is_admin());

        gate.sign_out().await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
        assert!(!gate.is_admin());
    }

    #[tokio::test]
    async fn test_rejected_message_is_verbatim() {
        let gate = SessionGate::new(Arc::new(FixedAuth));
        let err = gate.sign_in("a@b.c", "nope").await.unwrap_err();
        assert_eq!(err.message(), "Invalid login credentials");
        assert!(!gate.is_admin());
    }
}
