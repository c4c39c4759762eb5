//! Session lifecycle
//!
//! Tracks the current access token and identity through login, silent
//! restoration from the token store, and logout. A logout invalidates
//! every in-flight login or refresh: results from before the logout are
//! rejected instead of resurrecting the cleared session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use serde_json::json;

use storefront_core::models::{TokenGrant, UserIdentity};

use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::token::TokenStore;

/// Where the session currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Nothing attempted yet
    Idle,
    /// Restoration from the token store is in progress
    Restoring,
    /// A token and identity are present
    Authenticated,
    /// No usable credentials
    Anonymous,
}

/// Snapshot of the session state
#[derive(Debug, Clone)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<UserIdentity>,
    pub status: SessionStatus,
}

impl Session {
    fn idle() -> Self {
        Self {
            token: None,
            user: None,
            status: SessionStatus::Idle,
        }
    }
}

/// Read-only view of the session token, for consumers that only
/// need credentials
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Owns the session state and drives its transitions
///
/// The epoch counter is bumped on logout, under the session write lock.
/// Async flows capture the epoch when they start and commit their
/// results under the same lock only if it has not moved, so a logout
/// that lands mid-flight wins.
pub struct SessionManager<S: TokenStore> {
    api: ApiClient,
    store: S,
    session: RwLock<Session>,
    epoch: AtomicU64,
}

impl<S: TokenStore> SessionManager<S> {
    pub fn new(api: ApiClient, store: S) -> Self {
        Self {
            api,
            store,
            session: RwLock::new(Session::idle()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Current session state
    pub fn snapshot(&self) -> Session {
        self.session.read().unwrap().clone()
    }

    /// Current session status
    pub fn status(&self) -> SessionStatus {
        self.session.read().unwrap().status
    }

    /// Current identity, if authenticated
    pub fn user(&self) -> Option<UserIdentity> {
        self.session.read().unwrap().user.clone()
    }

    /// Current access token, if any
    pub fn token(&self) -> Option<String> {
        self.session.read().unwrap().token.clone()
    }

    /// Restore a session from the token store without user interaction
    ///
    /// A stored token that the backend rejects is purged so the next
    /// launch does not retry it. Always lands on `Authenticated` or
    /// `Anonymous`.
    pub async fn restore(&self) -> SessionStatus {
        // Epoch is read under the same lock that flips the status, so a
        // concurrent logout is either fully before or fully after this.
        let epoch = {
            let mut session = self.session.write().unwrap();
            session.status = SessionStatus::Restoring;
            self.epoch.load(Ordering::SeqCst)
        };

        let token = match self.store.load() {
            Ok(Some(token)) => token,
            Ok(None) => return self.finish_restore(epoch, None, None),
            Err(e) => {
                tracing::warn!("failed to read token store: {}", e);
                return self.finish_restore(epoch, None, None);
            }
        };

        match self.fetch_identity(&token).await {
            Ok(user) => self.finish_restore(epoch, Some(token), Some(user)),
            Err(e) => {
                tracing::info!("stored token rejected, clearing it: {}", e);
                if let Err(e) = self.store.clear() {
                    tracing::warn!("failed to clear token store: {}", e);
                }
                self.finish_restore(epoch, None, None)
            }
        }
    }

    fn finish_restore(
        &self,
        epoch: u64,
        token: Option<String>,
        user: Option<UserIdentity>,
    ) -> SessionStatus {
        let mut session = self.session.write().unwrap();
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return session.status;
        }
        session.status = if user.is_some() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Anonymous
        };
        session.token = token;
        session.user = user;
        session.status
    }

    /// Exchange credentials for a token, persist it, and load the identity
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<UserIdentity> {
        let epoch = self.epoch.load(Ordering::SeqCst);

        let grant: TokenGrant = self
            .api
            .post_data(
                "/auth/login",
                &json!({ "email": email, "password": password }),
                None,
            )
            .await?;
        self.commit_token(epoch, &grant.access_token)?;

        let user = self.fetch_identity(&grant.access_token).await?;
        self.commit_user(epoch, user)
    }

    /// Create an account, then log in with the same credentials
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> ClientResult<UserIdentity> {
        self.api
            .request(
                reqwest::Method::POST,
                "/auth/register",
                Some(&json!({ "name": name, "email": email, "password": password })),
                None,
            )
            .await?;
        self.login(email, password).await
    }

    /// Drop the session and the persisted token
    ///
    /// Takes effect immediately; concurrent logins or refreshes started
    /// before this call fail with `Cancelled` instead of committing.
    pub fn logout(&self) {
        let mut session = self.session.write().unwrap();
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.store.clear() {
            tracing::warn!("failed to clear token store: {}", e);
        }
        session.token = None;
        session.user = None;
        session.status = SessionStatus::Anonymous;
        tracing::info!("session cleared");
    }

    /// Re-fetch the identity for the current token
    ///
    /// Returns `Ok(None)` when there is no token. On a rejected token
    /// the identity is dropped but the token is kept, so the caller can
    /// decide whether to log out.
    pub async fn refresh_identity(&self) -> ClientResult<Option<UserIdentity>> {
        let epoch = self.epoch.load(Ordering::SeqCst);

        let token = match self.token() {
            Some(token) => token,
            None => {
                let mut session = self.session.write().unwrap();
                session.user = None;
                if session.status == SessionStatus::Authenticated {
                    session.status = SessionStatus::Anonymous;
                }
                return Ok(None);
            }
        };

        match self.fetch_identity(&token).await {
            Ok(user) => Ok(Some(self.commit_user(epoch, user)?)),
            Err(e) => {
                let mut session = self.session.write().unwrap();
                if self.epoch.load(Ordering::SeqCst) == epoch {
                    session.user = None;
                    session.status = SessionStatus::Anonymous;
                }
                Err(e)
            }
        }
    }

    fn commit_token(&self, epoch: u64, token: &str) -> ClientResult<()> {
        let mut session = self.session.write().unwrap();
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return Err(ClientError::Cancelled);
        }
        self.store.save(token)?;
        session.token = Some(token.to_string());
        Ok(())
    }

    fn commit_user(&self, epoch: u64, user: UserIdentity) -> ClientResult<UserIdentity> {
        let mut session = self.session.write().unwrap();
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return Err(ClientError::Cancelled);
        }
        session.user = Some(user.clone());
        session.status = SessionStatus::Authenticated;
        Ok(user)
    }

    async fn fetch_identity(&self, token: &str) -> ClientResult<UserIdentity> {
        self.api.get_data("/me", Some(token)).await
    }
}

impl<S: TokenStore> TokenProvider for SessionManager<S> {
    fn token(&self) -> Option<String> {
        SessionManager::token(self)
    }
}
