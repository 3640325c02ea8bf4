use std::env;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::error::AppError;

/// A signed-in user as handed over by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub id_token: String,
}

impl Session {
    pub fn from_env() -> Option<Self> {
        let id_token = env::var("TODO_ID_TOKEN").ok().filter(|t| !t.is_empty())?;
        let username = env::var("TODO_USERNAME").unwrap_or_else(|_| "user".to_string());
        Some(Self { username, id_token })
    }
}

/// The signed-in user's ID token, shared with the backend clients.
///
/// Cloning hands out the same slot, so sign-in and sign-out are seen by every
/// holder on its next request.
#[derive(Debug, Clone, Default)]
pub struct SessionCredentials {
    id_token: Arc<RwLock<Option<String>>>,
}

impl SessionCredentials {
    pub fn new(id_token: Option<String>) -> Self {
        Self { id_token: Arc::new(RwLock::new(id_token)) }
    }

    pub async fn id_token(&self) -> Option<String> {
        self.id_token.read().await.clone()
    }

    async fn replace(&self, id_token: Option<String>) {
        *self.id_token.write().await = id_token;
    }
}

/// Proof that a session existed when the page was requested. Only
/// [`IdentityGate::require`] hands these out.
#[derive(Debug, Clone)]
pub struct Authenticated {
    username: String,
}

impl Authenticated {
    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Blocks the page until a session exists.
#[derive(Debug, Default)]
pub struct IdentityGate {
    session: RwLock<Option<Session>>,
    credentials: SessionCredentials,
}

impl IdentityGate {
    pub fn new(session: Option<Session>) -> Self {
        let credentials = SessionCredentials::new(session.as_ref().map(|s| s.id_token.clone()));
        Self { session: RwLock::new(session), credentials }
    }

    pub fn credentials(&self) -> SessionCredentials {
        self.credentials.clone()
    }

    pub async fn require(&self) -> Result<Authenticated, AppError> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| Authenticated { username: s.username.clone() })
            .ok_or(AppError::Unauthorized)
    }

    pub async fn sign_in(&self, session: Session) -> Result<(), AppError> {
        if session.username.is_empty() || session.id_token.is_empty() {
            return Err(AppError::BadRequest("username and id_token are required".to_string()));
        }
        info!("signed in as {}", session.username);
        let mut current = self.session.write().await;
        self.credentials.replace(Some(session.id_token.clone())).await;
        *current = Some(session);
        Ok(())
    }

    /// Returns the session that was cleared, if any.
    pub async fn sign_out(&self) -> Option<Session> {
        let mut current = self.session.write().await;
        self.credentials.replace(None).await;
        let previous = current.take();
        drop(current);
        if let Some(session) = &previous {
            info!("signed out {}", session.username);
        }
        previous
    }
}
