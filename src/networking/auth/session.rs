//! Session guard
//!
//! Wraps every collaborator call. A 401 from any call flips the session to
//! unauthenticated and suspends further calls until a login succeeds; any
//! other failure requests a full client reload.

use super::LoginForm;
use crate::networking::{Collaborator, ErrorKind, NetworkError, NetworkResult};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info, warn};

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Waiting for a login; collaborator calls are suspended
    Unauthenticated,
    /// Authenticated, startup sequence running
    Loading,
    Ready,
}

impl std::fmt::Display for GuardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuardState::Unauthenticated => write!(f, "Unauthenticated"),
            GuardState::Loading => write!(f, "Loading"),
            GuardState::Ready => write!(f, "Ready"),
        }
    }
}

/// Notifications for whoever drives the UI
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Show the login prompt
    LoginRequired,
    /// Login failed; message is the server's, verbatim
    LoginRejected { message: String },
    Authenticated,
    Ready,
    /// Unrecoverable collaborator failure; the client must reload
    ReloadRequested { reason: String },
}

#[derive(Debug)]
struct GuardInner {
    state: GuardState,
    authenticated: bool,
    /// Startup must (re)run after the next successful login
    replay_pending: bool,
    reload_requested: bool,
    suspended_calls: u64,
}

pub struct SessionGuard {
    collaborator: Arc<dyn Collaborator>,
    inner: RwLock<GuardInner>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionGuard {
    /// `auth_required` comes from deployment configuration; without it the
    /// session starts authenticated.
    pub fn new(collaborator: Arc<dyn Collaborator>, auth_required: bool) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let state = if auth_required { GuardState::Unauthenticated } else { GuardState::Loading };
        info!("🔐 Session guard starting in {} (auth required: {})", state, auth_required);

        let guard = Self {
            collaborator,
            inner: RwLock::new(GuardInner {
                state,
                authenticated: !auth_required,
                replay_pending: true,
                reload_requested: false,
                suspended_calls: 0,
            }),
            event_tx,
        };
        if auth_required {
            guard.emit(SessionEvent::LoginRequired);
        }
        (guard, event_rx)
    }

    fn emit(&self, event: SessionEvent) {
        debug!("🔐 Session event: {:?}", event);
        // Nobody listening is fine
        let _ = self.event_tx.send(event);
    }

    pub async fn state(&self) -> GuardState {
        self.inner.read().await.state
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.authenticated
    }

    /// Calls refused while unauthenticated
    pub async fn suspended_calls(&self) -> u64 {
        self.inner.read().await.suspended_calls
    }

    /// Run one collaborator call under the guard.
    ///
    /// The call is not started at all while the session is unauthenticated.
    pub async fn call<T, F, Fut>(&self, what: &str, call: F) -> NetworkResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = NetworkResult<T>>,
    {
        {
            let mut inner = self.inner.write().await;
            if !inner.authenticated {
                inner.suspended_calls += 1;
                debug!("⏸️ {} suspended: not authenticated", what);
                return Err(NetworkError::Suspended);
            }
        }

        match call().await {
            Ok(value) => Ok(value),
            Err(e) => {
                match e.kind() {
                    ErrorKind::AuthExpired => self.expire(what).await,
                    ErrorKind::LoginRejected | ErrorKind::OtherCollaboratorFailure => {
                        self.request_reload(what, &e).await
                    }
                }
                Err(e)
            }
        }
    }

    /// Session lost: prompt for login, replay startup afterwards
    async fn expire(&self, what: &str) {
        let mut inner = self.inner.write().await;
        inner.replay_pending = true;
        if !inner.authenticated {
            return;
        }
        warn!("🔒 {} returned 401, session expired", what);
        inner.authenticated = false;
        inner.state = GuardState::Unauthenticated;
        drop(inner);
        self.emit(SessionEvent::LoginRequired);
    }

    async fn request_reload(&self, what: &str, e: &NetworkError) {
        error!("💥 {} failed: {}; full reload required", what, e);
        let mut inner = self.inner.write().await;
        let first = !inner.reload_requested;
        inner.reload_requested = true;
        drop(inner);
        if first {
            self.emit(SessionEvent::ReloadRequested { reason: e.to_string() });
        }
    }

    /// True once after a reload was requested
    pub async fn take_reload_request(&self) -> bool {
        std::mem::take(&mut self.inner.write().await.reload_requested)
    }

    /// Submit the login form. Returns whether the startup sequence is due.
    ///
    /// Failures surface the server's message on the form and clear the
    /// credential; there is no retry or backoff.
    pub async fn login(&self, form: &mut LoginForm) -> NetworkResult<bool> {
        if let Err(message) = form.validate() {
            form.reject(message.clone());
            return Err(NetworkError::LoginRejected { message });
        }
        let password = form.take_password();

        match self.collaborator.login(&password).await {
            Ok(()) => {
                form.error = None;
                let replay = {
                    let mut inner = self.inner.write().await;
                    inner.authenticated = true;
                    inner.state = GuardState::Loading;
                    std::mem::take(&mut inner.replay_pending)
                };
                info!("🔓 Authenticated (startup replay due: {})", replay);
                self.emit(SessionEvent::Authenticated);
                Ok(replay)
            }
            Err(NetworkError::LoginRejected { message }) => {
                warn!("❌ Login rejected: {}", message);
                form.reject(message.clone());
                self.emit(SessionEvent::LoginRejected { message: message.clone() });
                Err(NetworkError::LoginRejected { message })
            }
            Err(e) => {
                form.reject(e.to_string());
                self.request_reload("login", &e).await;
                Err(e)
            }
        }
    }

    /// Enter `Loading` for a startup run. `false` while unauthenticated.
    pub async fn begin_startup(&self) -> bool {
        let mut inner = self.inner.write().await;
        if !inner.authenticated {
            inner.replay_pending = true;
            return false;
        }
        inner.state = GuardState::Loading;
        inner.replay_pending = false;
        true
    }

    pub async fn mark_ready(&self) {
        let mut inner = self.inner.write().await;
        if inner.state != GuardState::Loading {
            return;
        }
        inner.state = GuardState::Ready;
        drop(inner);
        self.emit(SessionEvent::Ready);
    }

    /// Log out. With `auth_required` the session drops back to
    /// unauthenticated; otherwise it stays usable.
    pub async fn logout(&self, auth_required: bool) -> NetworkResult<()> {
        let collaborator = Arc::clone(&self.collaborator);
        self.call("logout", || async move { collaborator.logout().await }).await?;
        let mut inner = self.inner.write().await;
        inner.replay_pending = true;
        if auth_required {
            inner.authenticated = false;
            inner.state = GuardState::Unauthenticated;
            drop(inner);
            self.emit(SessionEvent::LoginRequired);
        } else {
            inner.state = GuardState::Loading;
        }
        Ok(())
    }
}
