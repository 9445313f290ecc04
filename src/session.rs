//! Tracks who is signed in and tells interested parties when that changes.
//!
//! The [`SessionManager`] follows the auth client's change stream and keeps
//! the current session. Registered listeners run in registration order, and
//! the navigation state (login controls vs. a user menu) is refreshed after
//! them. A session past its expiry counts as signed out.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::auth::{AuthChange, AuthChangeEvent, Session, SignUpResponse, User};
use crate::manager::Outcome;
use crate::services::AuthApi;

/// Who is signed in
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticated(User),
}

/// What the navigation bar should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavState {
    /// Login and sign-up controls
    pub login_visible: bool,
    /// Label of the user menu; `None` hides it
    pub user_menu: Option<String>,
}

impl NavState {
    fn for_state(state: &AuthState) -> Self {
        match state {
            AuthState::Unauthenticated => Self {
                login_visible: true,
                user_menu: None,
            },
            AuthState::Authenticated(user) => Self {
                login_visible: false,
                user_menu: Some(user.display_name().to_string()),
            },
        }
    }
}

/// Handle returned by [`SessionManager::on_auth_state_change`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Subscription(u64);

type Listener = Arc<dyn Fn(&AuthChange) + Send + Sync>;

pub struct SessionManager {
    auth: Arc<dyn AuthApi>,
    session: RwLock<Option<Session>>,
    nav: RwLock<NavState>,
    // ids only grow, so iteration order is registration order
    listeners: Mutex<BTreeMap<u64, Listener>>,
    next_id: AtomicU64,
}

impl SessionManager {
    pub fn new(auth: Arc<dyn AuthApi>) -> Self {
        Self {
            auth,
            session: RwLock::new(None),
            nav: RwLock::new(NavState::for_state(&AuthState::Unauthenticated)),
            listeners: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Pick up the session the auth client holds, once the backend confirms it
    pub async fn init(&self) -> AuthState {
        let session = self.verified_session().await;
        self.apply(&AuthChange {
            event: AuthChangeEvent::InitialSession,
            session,
        });
        self.state()
    }

    async fn verified_session(&self) -> Option<Session> {
        let session = self.auth.current_session()?;
        if session.is_expired() {
            tracing::debug!(user = %session.user.id, "stored session expired");
            return None;
        }

        match self.auth.get_user().await {
            Ok(user) => Some(Session { user, ..session }),
            Err(err) => {
                tracing::warn!(error = %err, "stored session rejected by the backend");
                None
            }
        }
    }

    /// Follow the auth client's change stream until it closes
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let mut changes = self.auth.subscribe();
        let manager = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => manager.apply(&change),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "session change stream lagged");
                        // the newest state is what matters
                        manager.apply(&AuthChange {
                            event: AuthChangeEvent::TokenRefreshed,
                            session: manager.auth.current_session(),
                        });
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::debug!("session change stream closed");
        })
    }

    /// Record a session change, notify listeners, then refresh navigation
    pub fn apply(&self, change: &AuthChange) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = change.session.clone();
        let state = self.state();
        tracing::debug!(event = ?change.event, authenticated = matches!(state, AuthState::Authenticated(_)), "auth state changed");

        let listeners: Vec<(u64, Listener)> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect();

        for (id, listener) in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(change))).is_err() {
                tracing::error!(subscription = id, "auth state listener panicked");
            }
        }

        *self.nav.write().unwrap_or_else(PoisonError::into_inner) = NavState::for_state(&state);
    }

    /// Register a listener for every later change
    pub fn on_auth_state_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&AuthChange) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(listener));
        Subscription(id)
    }

    /// Remove the listener behind `subscription`; false if it was already gone
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&subscription.0)
            .is_some()
    }

    pub fn state(&self) -> AuthState {
        match &*self.session.read().unwrap_or_else(PoisonError::into_inner) {
            Some(session) if !session.is_expired() => AuthState::Authenticated(session.user.clone()),
            _ => AuthState::Unauthenticated,
        }
    }

    pub fn nav(&self) -> NavState {
        self.nav.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state(), AuthState::Authenticated(_))
    }

    pub fn user(&self) -> Option<User> {
        match self.state() {
            AuthState::Authenticated(user) => Some(user),
            AuthState::Unauthenticated => None,
        }
    }

    pub fn user_id(&self) -> Option<String> {
        self.user().map(|user| user.id)
    }

    /// Create an account; `full_name` goes to the user's metadata
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Outcome<SignUpResponse> {
        let metadata = json!({ "full_name": full_name });
        self.auth
            .sign_up(email, password, Some(metadata))
            .await
            .into()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Outcome<Session> {
        self.auth.sign_in(email, password).await.into()
    }

    pub async fn sign_out(&self) -> Outcome<()> {
        self.auth.sign_out().await.into()
    }
}
